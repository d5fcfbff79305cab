//! `joinery run` / `joinery check`: extract directory to submission workbook.

use std::path::{Path, PathBuf};

use joinery_io::discover::SkippedFile;
use joinery_io::{naming, IoError, Template};
use joinery_recon::model::{RecordSet, ReconReport};
use joinery_recon::JoineryConfig;
use serde::Serialize;

use crate::exit_codes::{recon_exit_code, EXIT_ERROR, EXIT_IO, EXIT_PARSE, EXIT_USAGE};
use crate::CliError;

fn run_err(code: u8, msg: impl Into<String>) -> CliError {
    CliError { code, message: msg.into(), hint: None }
}

fn recon_err(err: joinery_recon::ReconError) -> CliError {
    run_err(recon_exit_code(&err), err.to_string())
}

fn io_err(err: IoError) -> CliError {
    let code = match &err {
        IoError::Io(_) => EXIT_IO,
        IoError::Parse(_) => EXIT_PARSE,
        IoError::NoExtracts(_) => EXIT_USAGE,
    };
    run_err(code, err.to_string())
}

/// Machine-readable result of `joinery run --json`.
#[derive(Serialize)]
struct RunOutput<'a> {
    output: String,
    template_version: Option<&'a str>,
    report: &'a ReconReport,
    skipped_files: Vec<SkippedFileOutput<'a>>,
    unwritten_datasets: &'a [String],
}

#[derive(Serialize)]
struct SkippedFileOutput<'a> {
    file: &'a str,
    reason: &'a str,
}

impl<'a> From<&'a SkippedFile> for SkippedFileOutput<'a> {
    fn from(s: &'a SkippedFile) -> Self {
        Self { file: &s.file_name, reason: &s.reason }
    }
}

/// Load the config file if given, otherwise use the defaults.
pub fn load_config(path: Option<&Path>) -> Result<JoineryConfig, CliError> {
    let Some(path) = path else {
        return Ok(JoineryConfig::default());
    };
    log::info!("loading config {}", path.display());
    let config_str = std::fs::read_to_string(path)
        .map_err(|e| run_err(EXIT_IO, format!("cannot read config {}: {e}", path.display())))?;
    JoineryConfig::from_toml(&config_str).map_err(recon_err)
}

fn load_template(path: &Path) -> Result<Template, CliError> {
    if !path.is_file() {
        return Err(run_err(EXIT_USAGE, format!("template not found: {}", path.display()))
            .with_hint("pass the submission template .xlsx with --template"));
    }
    Template::load(path).map_err(io_err)
}

pub fn cmd_run(
    directory: PathBuf,
    template_path: PathBuf,
    config_path: Option<PathBuf>,
    output: Option<PathBuf>,
    json_output: bool,
) -> Result<(), CliError> {
    let config = load_config(config_path.as_deref())?;

    if !directory.is_dir() {
        return Err(run_err(EXIT_USAGE, format!("not a directory: {}", directory.display()))
            .with_hint("--directory must point at the folder of .tsv/.csv extracts"));
    }

    let template = load_template(&template_path)?;
    let registry = template.registry(&config.template).map_err(recon_err)?;

    let discovery = joinery_io::discover(&directory, &config.input).map_err(io_err)?;
    let mut records = RecordSet::new();
    for dataset in discovery.datasets {
        records.insert(dataset, &config.input).map_err(recon_err)?;
    }

    let reconciliation = joinery_recon::run(&registry, records, &config).map_err(recon_err)?;

    let template_version = template.version(&config.template);
    let output_path = match output {
        Some(path) => path,
        None => {
            let dir = naming::default_output_dir(&directory).map_err(|e| run_err(EXIT_IO, e))?;
            let study_id = naming::study_id(&reconciliation, &config.input);
            let date = chrono::Local::now().date_naive();
            dir.join(naming::output_file_name(&study_id, template_version, date))
        }
    };

    log::debug!("output workbook: {}", output_path.display());
    let written = joinery_io::write_workbook(&template, &reconciliation, &output_path)
        .map_err(|e| run_err(EXIT_IO, e))?;

    if json_output {
        let out = RunOutput {
            output: output_path.display().to_string(),
            template_version,
            report: &reconciliation.report,
            skipped_files: discovery.skipped.iter().map(SkippedFileOutput::from).collect(),
            unwritten_datasets: &written.skipped,
        };
        let json_str = serde_json::to_string_pretty(&out)
            .map_err(|e| run_err(EXIT_ERROR, format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    }

    // Human summary to stderr
    let s = &reconciliation.report.summary;
    eprintln!(
        "reconciled {} record type(s), {} auxiliary: {} rows, {} restored link column(s), {} malformed value(s)",
        s.record_types, s.auxiliary, s.rows, s.restored_links, s.malformed_links,
    );
    if s.replaced_sources > 0 {
        eprintln!("replaced {} duplicate extract(s):", s.replaced_sources);
        for r in &reconciliation.report.replaced {
            eprintln!("  {}: {} replaced by {}", r.record_type, r.replaced, r.by);
        }
    }
    for skipped in &discovery.skipped {
        eprintln!("skipped {}: {}", skipped.file_name, skipped.reason);
    }
    eprintln!("wrote {} ({} ms)", output_path.display(), written.export_duration_ms);

    Ok(())
}

pub fn cmd_check(template_path: PathBuf, config_path: Option<PathBuf>) -> Result<(), CliError> {
    let config = load_config(config_path.as_deref())?;
    let template = load_template(&template_path)?;
    let registry = template.registry(&config.template).map_err(recon_err)?;

    println!(
        "template: {} (version {})",
        template_path.display(),
        template.version(&config.template).unwrap_or("unknown")
    );
    for sheet in registry.record_type_sheets(&config.template) {
        println!("  {:<40} {:>4} column(s)", sheet.name, sheet.columns.len());
    }

    Ok(())
}
