// Extract discovery: find the per-node files in a directory and tag them by record type

use std::path::{Path, PathBuf};

use joinery_recon::config::InputConfig;
use joinery_recon::Dataset;

use crate::csv::delimiter_for;
use crate::error::IoError;

/// A file that was found but not loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub file_name: String,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct Discovery {
    /// Loaded extracts in read order: TSV files first, then CSV files.
    pub datasets: Vec<Dataset>,
    pub skipped: Vec<SkippedFile>,
}

/// List extract files: `.tsv` files by name, then `.csv` files by name.
pub fn list_extracts(dir: &Path) -> Result<Vec<PathBuf>, IoError> {
    let io_err = |e: std::io::Error| IoError::Io(format!("{}: {e}", dir.display()));
    let entries = std::fs::read_dir(dir).map_err(io_err)?;

    let mut tsv_files = Vec::new();
    let mut csv_files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(io_err)?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        match delimiter_for(&path) {
            Some(b'\t') => tsv_files.push(path),
            Some(_) => csv_files.push(path),
            None => {}
        }
    }

    tsv_files.sort();
    csv_files.sort();
    tsv_files.extend(csv_files);
    Ok(tsv_files)
}

/// Load every extract in `dir` and name each by its record type.
///
/// The record type is the first non-empty value of the type column. Files
/// without a type column keep their file stem as an auxiliary dataset.
pub fn discover(dir: &Path, config: &InputConfig) -> Result<Discovery, IoError> {
    let paths = list_extracts(dir)?;
    if paths.is_empty() {
        return Err(IoError::NoExtracts(dir.display().to_string()));
    }

    let mut discovery = Discovery::default();
    for path in paths {
        let mut dataset = crate::csv::import(&path)?;

        if dataset.has_column(&config.type_column) {
            let Some(record_type) = dataset.first_value(&config.type_column).map(str::to_string)
            else {
                log::warn!(
                    "{}: '{}' column has no values, skipping",
                    dataset.source,
                    config.type_column
                );
                discovery.skipped.push(SkippedFile {
                    file_name: dataset.source.clone(),
                    reason: format!("'{}' column has no values", config.type_column),
                });
                continue;
            };
            dataset.name = record_type;
        } else {
            log::info!(
                "{}: no '{}' column, treating as auxiliary '{}'",
                dataset.source,
                config.type_column,
                dataset.name
            );
        }

        log::debug!("{}: {} row(s) as '{}'", dataset.source, dataset.rows.len(), dataset.name);
        discovery.datasets.push(dataset);
    }

    Ok(discovery)
}
