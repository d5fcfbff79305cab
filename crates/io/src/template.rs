// Submission template import (xlsx, read with calamine)

use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Reader, Sheets};
use joinery_recon::config::TemplateConfig;
use joinery_recon::{ReconError, SchemaRegistry};

use crate::error::IoError;

/// Maximum dimensions copied from a template sheet
const MAX_ROWS: usize = 1_048_576;
const MAX_COLS: usize = 16_384;

/// A template cell value, kept so untouched sheets can be copied through.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateCell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl TemplateCell {
    fn from_data(data: &Data) -> Self {
        match data {
            Data::Empty => Self::Empty,
            Data::String(s) if s.is_empty() => Self::Empty,
            Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Self::Text(s.clone()),
            Data::Float(f) => Self::Number(*f),
            Data::Int(i) => Self::Number(*i as f64),
            Data::Bool(b) => Self::Bool(*b),
            // Serial value; the date format itself is not carried over
            Data::DateTime(dt) => Self::Number(dt.as_f64()),
            Data::Error(e) => Self::Text(e.to_string()),
        }
    }

    /// Header text for this cell, empty for blanks.
    pub fn as_header(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text(s) => s.trim().to_string(),
            Self::Number(n) => n.to_string(),
            Self::Bool(b) => b.to_string().to_uppercase(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TemplateSheet {
    pub name: String,
    /// Row index of the header (the first row of the used range).
    pub header_row: usize,
    /// Header text by absolute column index; trailing blanks removed.
    pub header: Vec<String>,
    /// Every cell, indexed from A1.
    pub cells: Vec<Vec<TemplateCell>>,
}

impl TemplateSheet {
    /// Absolute column of a header name (first occurrence).
    pub fn column_position(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }
}

#[derive(Debug, Clone)]
pub struct Template {
    pub path: PathBuf,
    pub sheets: Vec<TemplateSheet>,
}

impl Template {
    /// Read every sheet of an xlsx template.
    pub fn load(path: &Path) -> Result<Self, IoError> {
        // Unreadable files are reported apart from files calamine rejects
        std::fs::File::open(path).map_err(|e| IoError::Io(format!("{}: {e}", path.display())))?;
        let mut workbook: Sheets<_> = open_workbook_auto(path).map_err(|e| {
            IoError::Parse(format!("{}: failed to open Excel file: {e}", path.display()))
        })?;

        let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
        if sheet_names.is_empty() {
            return Err(IoError::Parse(format!("{}: Excel file contains no sheets", path.display())));
        }

        let mut sheets = Vec::with_capacity(sheet_names.len());
        for sheet_name in &sheet_names {
            let range = workbook
                .worksheet_range(sheet_name)
                .map_err(|e| {
                    IoError::Parse(format!("{}: failed to read sheet '{sheet_name}': {e}", path.display()))
                })?;

            // Range start offset (data may not begin at A1)
            let (start_row, start_col) = range
                .start()
                .map(|(r, c)| (r as usize, c as usize))
                .unwrap_or((0, 0));

            let mut cells: Vec<Vec<TemplateCell>> = vec![Vec::new(); start_row];
            for row in range.rows() {
                if cells.len() >= MAX_ROWS {
                    log::warn!("sheet '{sheet_name}' truncated at {MAX_ROWS} rows");
                    break;
                }
                let mut out = vec![TemplateCell::Empty; start_col];
                out.extend(row.iter().take(MAX_COLS.saturating_sub(start_col)).map(TemplateCell::from_data));
                cells.push(out);
            }

            let header = header_from_row(sheet_name, cells.get(start_row).map(Vec::as_slice).unwrap_or(&[]));
            log::debug!("template sheet '{sheet_name}': {} header column(s)", header.len());

            sheets.push(TemplateSheet {
                name: sheet_name.clone(),
                header_row: start_row,
                header,
                cells,
            });
        }

        Ok(Self {
            path: path.to_path_buf(),
            sheets,
        })
    }

    pub fn sheet(&self, name: &str) -> Option<&TemplateSheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    /// Build the schema registry from the sheet headers.
    pub fn registry(&self, config: &TemplateConfig) -> Result<SchemaRegistry, ReconError> {
        SchemaRegistry::from_sheets(
            self.sheets.iter().map(|s| (s.name.clone(), s.header.clone())),
            config,
        )
    }

    /// Template version: a header cell of the readme sheet.
    pub fn version(&self, config: &TemplateConfig) -> Option<&str> {
        self.sheet(&config.readme_sheet)?
            .header
            .get(config.version_column)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

fn header_from_row(sheet_name: &str, row: &[TemplateCell]) -> Vec<String> {
    let mut header: Vec<String> = row.iter().map(TemplateCell::as_header).collect();
    while header.last().is_some_and(|h| h.is_empty()) {
        header.pop();
    }
    for (idx, h) in header.iter().enumerate() {
        if h.is_empty() {
            log::warn!("sheet '{sheet_name}': blank header in column {}", idx + 1);
        }
    }
    header
}
