// Submission workbook export (xlsx, written with rust_xlsxwriter)

use std::path::Path;
use std::time::Instant;

use joinery_recon::{FinalizedDataset, Reconciliation};
use rust_xlsxwriter::{Workbook as XlsxWorkbook, Worksheet};

use crate::template::{Template, TemplateCell, TemplateSheet};

/// Excel sheet limits
const MAX_ROWS: usize = 1_048_576;
const MAX_COLS: usize = 16_384;

#[derive(Debug, Default)]
pub struct WriteResult {
    /// Template sheets that received reconciled rows.
    pub sheets_written: usize,
    /// Template sheets copied through unchanged.
    pub sheets_copied: usize,
    pub rows_written: usize,
    /// Reconciled datasets with no template sheet of the same name.
    pub skipped: Vec<String>,
    pub export_duration_ms: u128,
}

/// Write the template with each reconciled dataset replacing the data rows of
/// its sheet. Sheet order and names follow the template.
pub fn write_workbook(
    template: &Template,
    reconciliation: &Reconciliation,
    path: &Path,
) -> Result<WriteResult, String> {
    let start_time = Instant::now();
    let mut result = WriteResult::default();

    for name in reconciliation.datasets.keys() {
        if template.sheet(name).is_none() {
            log::warn!("no template sheet named '{name}', dataset not written");
            result.skipped.push(name.clone());
        }
    }

    let mut xlsx_workbook = XlsxWorkbook::new();

    for sheet in &template.sheets {
        let worksheet = xlsx_workbook
            .add_worksheet()
            .set_name(&sheet.name)
            .map_err(|e| format!("Failed to create sheet '{}': {}", sheet.name, e))?;

        match reconciliation.get(&sheet.name) {
            Some(dataset) => {
                // Keep everything down to and including the header row
                let keep = (sheet.header_row + 1).min(sheet.cells.len());
                write_template_rows(worksheet, &sheet.cells[..keep])?;
                result.rows_written += write_dataset(worksheet, sheet, dataset)?;
                result.sheets_written += 1;
            }
            None => {
                write_template_rows(worksheet, &sheet.cells)?;
                result.sheets_copied += 1;
            }
        }
    }

    xlsx_workbook
        .save(path)
        .map_err(|e| format!("Failed to save XLSX file: {}", e))?;

    result.export_duration_ms = start_time.elapsed().as_millis();
    log::info!(
        "wrote {} sheet(s), {} row(s) to {}",
        result.sheets_written,
        result.rows_written,
        path.display()
    );
    Ok(result)
}

fn write_template_rows(worksheet: &mut Worksheet, rows: &[Vec<TemplateCell>]) -> Result<(), String> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, cell) in row.iter().enumerate() {
            let (r, c) = (row_idx as u32, col_idx as u16);
            let written = match cell {
                TemplateCell::Empty => continue,
                TemplateCell::Text(s) => worksheet.write_string(r, c, s),
                TemplateCell::Number(n) => worksheet.write_number(r, c, *n),
                TemplateCell::Bool(b) => worksheet.write_boolean(r, c, *b),
            };
            written.map_err(|e| format!("Failed to write cell ({row_idx}, {col_idx}): {e}"))?;
        }
    }
    Ok(())
}

/// Place each dataset column under its header cell. Columns the header does
/// not name are appended after it with their own header.
fn write_dataset(
    worksheet: &mut Worksheet,
    sheet: &TemplateSheet,
    dataset: &FinalizedDataset,
) -> Result<usize, String> {
    let mut next_free = sheet.header.len();
    let mut positions = Vec::with_capacity(dataset.columns.len());
    for column in &dataset.columns {
        let pos = match sheet.column_position(column) {
            Some(pos) => pos,
            None => {
                let pos = next_free;
                next_free += 1;
                worksheet
                    .write_string(sheet.header_row as u32, pos as u16, column)
                    .map_err(|e| format!("Failed to write header '{column}': {e}"))?;
                pos
            }
        };
        positions.push(pos);
    }

    if next_free > MAX_COLS {
        return Err(format!(
            "sheet '{}': {} columns exceed the Excel limit of {MAX_COLS}",
            sheet.name, next_free
        ));
    }
    if sheet.header_row + 1 + dataset.rows.len() > MAX_ROWS {
        return Err(format!(
            "sheet '{}': {} rows exceed the Excel limit of {MAX_ROWS}",
            sheet.name,
            dataset.rows.len()
        ));
    }

    for (i, row) in dataset.rows.iter().enumerate() {
        let r = (sheet.header_row + 1 + i) as u32;
        for (value, &pos) in row.iter().zip(&positions) {
            if value.is_empty() {
                continue;
            }
            worksheet
                .write_string(r, pos as u16, value)
                .map_err(|e| format!("Failed to write '{}' row {}: {e}", sheet.name, i + 1))?;
        }
    }

    Ok(dataset.rows.len())
}
