// CSV/TSV extract import

use std::io::Read;
use std::path::Path;

use joinery_recon::model::Cell;
use joinery_recon::Dataset;

use crate::error::IoError;

/// Field delimiter implied by a file's extension: tab for `.tsv`, comma for `.csv`.
pub fn delimiter_for(path: &Path) -> Option<u8> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "tsv" => Some(b'\t'),
        "csv" => Some(b','),
        _ => None,
    }
}

/// Read an extract file, choosing the delimiter from its extension.
///
/// The dataset is named after the file stem; discovery renames it once the
/// record type is known.
pub fn import(path: &Path) -> Result<Dataset, IoError> {
    let delimiter = delimiter_for(path)
        .ok_or_else(|| IoError::Parse(format!("{}: not a .csv or .tsv file", path.display())))?;
    let content = read_file_as_utf8(path)?;

    let source = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = path
        .file_stem()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    import_from_string(&content, delimiter, &stem, &source)
        .map_err(|e| IoError::Parse(format!("{}: {e}", path.display())))
}

/// Read file and convert to UTF-8 if needed (handles Windows-1252, Latin-1, etc.)
pub fn read_file_as_utf8(path: &Path) -> Result<String, IoError> {
    let io_err = |e: std::io::Error| IoError::Io(format!("{}: {e}", path.display()));
    let mut file = std::fs::File::open(path).map_err(io_err)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(io_err)?;

    // Try UTF-8 first; on failure, recover the buffer from the error
    let content = match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => {
            let bytes = e.into_bytes();
            // Fall back to Windows-1252 (common for Excel-exported CSVs)
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            log::debug!("{}: not UTF-8, decoded as Windows-1252", path.display());
            decoded.into_owned()
        }
    };

    Ok(match content.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => content,
    })
}

/// Parse delimited text with a header row. Empty fields become absent cells.
pub fn import_from_string(
    content: &str,
    delimiter: u8,
    name: &str,
    source: &str,
) -> Result<Dataset, String> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let columns: Vec<String> = reader
        .headers()
        .map_err(|e| e.to_string())?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut dataset = Dataset::new(name, source, columns);

    for (row_idx, result) in reader.records().enumerate() {
        let record = result.map_err(|e| e.to_string())?;

        // Blank lines come through as a single empty field
        if record.len() == 1 && record.get(0) == Some("") {
            continue;
        }

        if record.len() > dataset.columns.len() {
            return Err(format!(
                "row {}: expected {} field(s), found {}",
                row_idx + 2,
                dataset.columns.len(),
                record.len()
            ));
        }

        let row: Vec<Cell> = record
            .iter()
            .map(|field| {
                if field.is_empty() {
                    None
                } else {
                    Some(field.to_string())
                }
            })
            .collect();
        dataset.push_row(row);
    }

    Ok(dataset)
}
