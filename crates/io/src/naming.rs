// Output file naming

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use joinery_recon::config::InputConfig;
use joinery_recon::Reconciliation;

/// `{study_id}_CCDI_{template_version}_JoineRy{YYYYMMDD}.xlsx`
pub fn output_file_name(study_id: &str, template_version: Option<&str>, date: NaiveDate) -> String {
    format!(
        "{}_CCDI_{}_JoineRy{}.xlsx",
        sanitize(study_id),
        sanitize(template_version.unwrap_or("unknown")),
        date.format("%Y%m%d")
    )
}

/// Study id naming the output: the first non-empty id of the study record type.
pub fn study_id(reconciliation: &Reconciliation, config: &InputConfig) -> String {
    reconciliation
        .get(&config.study_type)
        .and_then(|ds| ds.first_value(&config.study_column))
        .map(str::to_string)
        .unwrap_or_else(|| {
            log::warn!(
                "no '{}' value in '{}', naming output 'study'",
                config.study_column,
                config.study_type
            );
            "study".to_string()
        })
}

/// Output lands next to the input directory, in its parent.
pub fn default_output_dir(input_dir: &Path) -> Result<PathBuf, String> {
    let absolute = std::fs::canonicalize(input_dir)
        .map_err(|e| format!("{}: {e}", input_dir.display()))?;
    Ok(absolute
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(".")))
}

/// Replace path separators and other characters that cannot appear in a file name.
fn sanitize(part: &str) -> String {
    part.trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}
