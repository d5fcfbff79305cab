// Joinery CLI - restore extract links and fill a submission template

mod exit_codes;
mod run;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use exit_codes::EXIT_SUCCESS;

#[derive(Parser)]
#[command(name = "joinery")]
#[command(about = "Reconcile per-node extracts against a submission template")]
#[command(long_version = long_version())]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug); RUST_LOG overrides
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Restore links in a directory of extracts and write the filled template
    #[command(after_help = "\
Examples:
  joinery run --directory nodes/ --template CCDI_Submission_Template.xlsx
  joinery run -d nodes/ -t template.xlsx --output submission.xlsx
  joinery run -d nodes/ -t template.xlsx --config joinery.toml --json")]
    Run {
        /// Directory of .tsv/.csv extracts, one per record type
        #[arg(long, short = 'd')]
        directory: PathBuf,

        /// Submission template (.xlsx)
        #[arg(long, short = 't')]
        template: PathBuf,

        /// Config file (TOML); defaults apply when omitted
        #[arg(long, short = 'c', env = "JOINERY_CONFIG")]
        config: Option<PathBuf>,

        /// Output workbook (default: next to the input directory, named from the study id)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Print the reconciliation report as JSON to stdout
        #[arg(long)]
        json: bool,
    },

    /// Validate a template and list its record-type sheets
    #[command(after_help = "\
Examples:
  joinery check --template CCDI_Submission_Template.xlsx")]
    Check {
        /// Submission template (.xlsx)
        #[arg(long, short = 't')]
        template: PathBuf,

        /// Config file (TOML); defaults apply when omitted
        #[arg(long, short = 'c', env = "JOINERY_CONFIG")]
        config: Option<PathBuf>,
    },
}

fn long_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  joinery-recon ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   debug",
            "\ntarget:  ", env!("TARGET"),
        )
    } else {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  joinery-recon ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   release",
            "\ntarget:  ", env!("TARGET"),
        )
    }
}

/// Log to stderr. RUST_LOG wins over the -v count.
fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // `log` records from the library crates are bridged by tracing-log
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        None => {
            // No subcommand = show help
            eprintln!("Usage: joinery <command> [options]");
            eprintln!("       joinery --help for more information");
            Ok(())
        }
        Some(Commands::Run { directory, template, config, output, json }) => {
            run::cmd_run(directory, template, config, output, json)
        }
        Some(Commands::Check { template, config }) => run::cmd_check(template, config),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
