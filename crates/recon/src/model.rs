use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::{DuplicatePolicy, InputConfig};
use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// A cell as read from an extract. `None` is an absent value.
pub type Cell = Option<String>;

/// Returns the cell text unless it is absent or empty.
pub fn present(cell: &Cell) -> Option<&str> {
    cell.as_deref().filter(|v| !v.is_empty())
}

/// Text of cell `idx` in a row. Cells past the end of a short row are absent.
pub fn cell_at(row: &[Cell], idx: usize) -> Option<&str> {
    row.get(idx).and_then(present)
}

/// One extract as parsed upstream: a header plus rectangular rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    /// Record type (from the type column) or, for auxiliary extracts, the file stem.
    pub name: String,
    /// Where the rows came from, usually a file name.
    pub source: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Dataset {
    pub fn new(name: impl Into<String>, source: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row, padding short rows with absent cells.
    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.columns.len(), None);
        self.rows.push(row);
    }

    /// Position of the first column with this name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// First non-empty value of a column, top to bottom.
    pub fn first_value(&self, column: &str) -> Option<&str> {
        let idx = self.column_index(column)?;
        self.rows.iter().find_map(|row| cell_at(row, idx))
    }

    /// Replace a column's values, or append the column if it does not exist yet.
    ///
    /// `values` must hold one cell per row.
    pub fn set_column(&mut self, name: &str, values: Vec<Cell>) {
        debug_assert_eq!(values.len(), self.rows.len());
        let idx = match self.column_index(name) {
            Some(idx) => idx,
            None => {
                self.columns.push(name.to_string());
                self.columns.len() - 1
            }
        };
        let width = self.columns.len();
        for (row, value) in self.rows.iter_mut().zip(values) {
            if row.len() < width {
                row.resize(width, None);
            }
            row[idx] = value;
        }
    }
}

/// Pre-loaded extracts keyed by record type.
#[derive(Debug, Default)]
pub struct RecordSet {
    datasets: BTreeMap<String, Dataset>,
    replaced: Vec<ReplacedSource>,
}

impl RecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a dataset under its name, applying the duplicate policy when the
    /// name is already taken by another record-type extract.
    ///
    /// A record-type extract and an auxiliary one (no type column) sharing a
    /// name are not duplicates: the record-type extract is kept whichever
    /// arrives first, and the auxiliary one is dropped with a warning.
    pub fn insert(&mut self, dataset: Dataset, config: &InputConfig) -> Result<(), ReconError> {
        if let Some(previous) = self.datasets.get(&dataset.name) {
            let previous_typed = previous.has_column(&config.type_column);
            let typed = dataset.has_column(&config.type_column);

            if previous_typed != typed {
                let (kept, dropped) = if previous_typed {
                    (previous.source.clone(), dataset.source.clone())
                } else {
                    (dataset.source.clone(), previous.source.clone())
                };
                log::warn!(
                    "auxiliary extract '{dropped}' has the same name as record type '{}' in '{kept}', dropping it",
                    dataset.name
                );
                self.replaced.push(ReplacedSource {
                    record_type: dataset.name.clone(),
                    replaced: dropped,
                    by: kept,
                });
                if previous_typed {
                    return Ok(());
                }
            } else {
                match config.on_duplicate {
                    DuplicatePolicy::Error => {
                        return Err(ReconError::DuplicateRecordType {
                            record_type: dataset.name.clone(),
                            previous: previous.source.clone(),
                            source: dataset.source.clone(),
                        });
                    }
                    DuplicatePolicy::Replace => {
                        log::warn!(
                            "record type '{}' in '{}' replaces the one read from '{}'",
                            dataset.name,
                            dataset.source,
                            previous.source
                        );
                        self.replaced.push(ReplacedSource {
                            record_type: dataset.name.clone(),
                            replaced: previous.source.clone(),
                            by: dataset.source.clone(),
                        });
                    }
                }
            }
        }
        self.datasets.insert(dataset.name.clone(), dataset);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Dataset> {
        self.datasets.get(name)
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Dataset> {
        self.datasets.values()
    }

    /// Sources dropped by last-read-wins, in the order they were replaced.
    pub fn replaced(&self) -> &[ReplacedSource] {
        &self.replaced
    }

    pub fn into_parts(self) -> (Vec<Dataset>, Vec<ReplacedSource>) {
        (self.datasets.into_values().collect(), self.replaced)
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SheetKind {
    /// Conformed to a template sheet.
    RecordType,
    /// No type column; passed through with its own columns.
    Auxiliary,
}

impl std::fmt::Display for SheetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RecordType => write!(f, "record_type"),
            Self::Auxiliary => write!(f, "auxiliary"),
        }
    }
}

/// A rectangular, null-free table ready for the writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizedDataset {
    pub name: String,
    pub source: String,
    pub kind: SheetKind,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl FinalizedDataset {
    /// Keep an auxiliary dataset's columns as they are, blanking absent cells.
    pub fn passthrough(dataset: Dataset) -> Self {
        let width = dataset.columns.len();
        Self {
            name: dataset.name,
            source: dataset.source,
            kind: SheetKind::Auxiliary,
            columns: dataset.columns,
            rows: dataset
                .rows
                .into_iter()
                .map(|mut row| {
                    row.resize(width, None);
                    row.into_iter().map(Option::unwrap_or_default).collect()
                })
                .collect(),
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// First non-empty value of a column, top to bottom.
    pub fn first_value(&self, column: &str) -> Option<&str> {
        let idx = self.column_index(column)?;
        self.rows
            .iter()
            .filter_map(|row| row.get(idx))
            .map(String::as_str)
            .find(|v| !v.is_empty())
    }
}

impl From<FinalizedDataset> for Dataset {
    fn from(finalized: FinalizedDataset) -> Self {
        Self {
            name: finalized.name,
            source: finalized.source,
            columns: finalized.columns,
            rows: finalized
                .rows
                .into_iter()
                .map(|row| row.into_iter().map(Some).collect())
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestoredLink {
    pub source_column: String,
    pub restored_column: String,
    /// Rows that received a non-empty restored value.
    pub values: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplacedSource {
    pub record_type: String,
    pub replaced: String,
    pub by: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SheetReport {
    pub name: String,
    pub source: String,
    pub kind: SheetKind,
    pub rows: usize,
    pub restored_links: Vec<RestoredLink>,
    pub malformed_links: usize,
    /// Declared columns missing from the extract, filled with empty strings.
    pub added_columns: Vec<String>,
    /// Extract columns not declared by the template.
    pub dropped_columns: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReconSummary {
    pub sheets: usize,
    pub record_types: usize,
    pub auxiliary: usize,
    pub rows: usize,
    pub restored_links: usize,
    pub malformed_links: usize,
    pub replaced_sources: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub engine_version: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconReport {
    pub meta: ReconMeta,
    pub summary: ReconSummary,
    pub sheets: Vec<SheetReport>,
    pub replaced: Vec<ReplacedSource>,
}

/// Result of a run: finalized datasets by sheet name plus the report.
#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub datasets: BTreeMap<String, FinalizedDataset>,
    pub report: ReconReport,
}

impl Reconciliation {
    pub fn get(&self, name: &str) -> Option<&FinalizedDataset> {
        self.datasets.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset(name: &str, source: &str) -> Dataset {
        let mut ds = Dataset::new(name, source, vec!["type".into(), "sample_id".into()]);
        ds.push_row(vec![Some(name.into()), Some("S1".into())]);
        ds
    }

    #[test]
    fn push_row_pads_short_rows() {
        let mut ds = Dataset::new("sample", "s.tsv", vec!["a".into(), "b".into(), "c".into()]);
        ds.push_row(vec![Some("1".into())]);
        assert_eq!(ds.rows[0], vec![Some("1".into()), None, None]);
    }

    #[test]
    fn set_column_appends_then_replaces() {
        let mut ds = dataset("sample", "s.tsv");
        ds.set_column("extra", vec![Some("x".into())]);
        assert_eq!(ds.columns, vec!["type", "sample_id", "extra"]);
        ds.set_column("extra", vec![Some("y".into())]);
        assert_eq!(ds.columns.len(), 3);
        assert_eq!(ds.rows[0][2].as_deref(), Some("y"));
    }

    #[test]
    fn first_value_skips_blank_cells() {
        let mut ds = Dataset::new("study", "study.tsv", vec!["study_id".into()]);
        ds.push_row(vec![None]);
        ds.push_row(vec![Some(String::new())]);
        ds.push_row(vec![Some("phs001".into())]);
        assert_eq!(ds.first_value("study_id"), Some("phs001"));
        assert_eq!(ds.first_value("missing"), None);
    }

    #[test]
    fn duplicate_replace_keeps_last_and_records_it() {
        let mut set = RecordSet::new();
        set.insert(dataset("sample", "a.tsv"), &InputConfig::default()).unwrap();
        set.insert(dataset("sample", "b.csv"), &InputConfig::default()).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.get("sample").unwrap().source, "b.csv");
        assert_eq!(
            set.replaced(),
            &[ReplacedSource {
                record_type: "sample".into(),
                replaced: "a.tsv".into(),
                by: "b.csv".into(),
            }]
        );
    }

    #[test]
    fn duplicate_error_policy_rejects() {
        let strict = InputConfig {
            on_duplicate: DuplicatePolicy::Error,
            ..InputConfig::default()
        };
        let mut set = RecordSet::new();
        set.insert(dataset("sample", "a.tsv"), &strict).unwrap();
        let err = set.insert(dataset("sample", "b.csv"), &strict).unwrap_err();
        assert!(matches!(err, ReconError::DuplicateRecordType { .. }));
        assert_eq!(set.get("sample").unwrap().source, "a.tsv");
    }

    fn auxiliary(name: &str, source: &str) -> Dataset {
        let mut ds = Dataset::new(name, source, vec!["comment".into()]);
        ds.push_row(vec![Some("note".into())]);
        ds
    }

    #[test]
    fn auxiliary_never_replaces_record_type() {
        let strict = InputConfig {
            on_duplicate: DuplicatePolicy::Error,
            ..InputConfig::default()
        };
        let mut set = RecordSet::new();
        set.insert(dataset("sample", "a.tsv"), &strict).unwrap();
        set.insert(auxiliary("sample", "sample.csv"), &strict).unwrap();

        assert_eq!(set.get("sample").unwrap().source, "a.tsv");
        assert_eq!(set.replaced()[0].replaced, "sample.csv");
        assert_eq!(set.replaced()[0].by, "a.tsv");
    }

    #[test]
    fn record_type_displaces_earlier_auxiliary() {
        let mut set = RecordSet::new();
        set.insert(auxiliary("sample", "sample.tsv"), &InputConfig::default()).unwrap();
        set.insert(dataset("sample", "b.csv"), &InputConfig::default()).unwrap();

        assert_eq!(set.get("sample").unwrap().source, "b.csv");
        assert_eq!(set.replaced()[0].replaced, "sample.tsv");
    }

    #[test]
    fn ragged_rows_read_as_absent() {
        let mut ds = Dataset::new("sample", "s.tsv", vec!["type".into(), "sample_id".into()]);
        ds.rows.push(vec![Some("sample".into())]);
        ds.rows.push(vec![Some("sample".into()), Some("S2".into())]);
        assert_eq!(ds.first_value("sample_id"), Some("S2"));

        ds.set_column("extra", vec![Some("x".into()), None]);
        assert_eq!(ds.rows[0], vec![Some("sample".into()), None, Some("x".into())]);

        let fin = FinalizedDataset::passthrough(ds);
        assert_eq!(fin.rows[0], vec!["sample", "", "x"]);
    }

    #[test]
    fn passthrough_blanks_absent_cells() {
        let mut ds = Dataset::new("notes", "notes.csv", vec!["a".into(), "b".into()]);
        ds.push_row(vec![Some("1".into()), None]);
        let fin = FinalizedDataset::passthrough(ds);
        assert_eq!(fin.kind, SheetKind::Auxiliary);
        assert_eq!(fin.rows, vec![vec!["1".to_string(), String::new()]]);
    }
}
