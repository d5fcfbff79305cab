use std::collections::HashSet;

use crate::error::ReconError;
use crate::model::{Dataset, FinalizedDataset, SheetKind};
use crate::registry::SchemaRegistry;

/// A dataset conformed to its declared columns.
#[derive(Debug)]
pub struct Alignment {
    pub dataset: FinalizedDataset,
    /// Declared columns the dataset lacked (filled with empty strings).
    pub added: Vec<String>,
    /// Dataset columns not in the declaration (removed).
    pub dropped: Vec<String>,
}

/// Conform a dataset to the registry entry for its record type.
pub fn align(dataset: Dataset, registry: &SchemaRegistry) -> Result<Alignment, ReconError> {
    let declared = registry.columns_for(&dataset.name)?;
    Ok(align_columns(dataset, declared))
}

/// Reshape `dataset` so its columns are exactly `declared`, in that order.
///
/// Missing columns come out as empty strings, undeclared ones are removed and
/// absent cells become empty strings. A repeated source column contributes
/// only its first occurrence.
pub fn align_columns(dataset: Dataset, declared: &[String]) -> Alignment {
    let sources: Vec<Option<usize>> = declared.iter().map(|c| dataset.column_index(c)).collect();

    let added: Vec<String> = declared
        .iter()
        .zip(&sources)
        .filter(|(_, src)| src.is_none())
        .map(|(c, _)| c.clone())
        .collect();

    let declared_set: HashSet<&str> = declared.iter().map(String::as_str).collect();
    let mut dropped: Vec<String> = Vec::new();
    for column in &dataset.columns {
        if !declared_set.contains(column.as_str()) && !dropped.contains(column) {
            dropped.push(column.clone());
        }
    }

    if !added.is_empty() || !dropped.is_empty() {
        log::debug!(
            "{}: {} column(s) added, {} dropped",
            dataset.name,
            added.len(),
            dropped.len()
        );
    }

    let rows: Vec<Vec<String>> = dataset
        .rows
        .into_iter()
        .map(|mut row| {
            sources
                .iter()
                .map(|src| match src {
                    Some(idx) => row.get_mut(*idx).and_then(Option::take).unwrap_or_default(),
                    None => String::new(),
                })
                .collect()
        })
        .collect();

    Alignment {
        dataset: FinalizedDataset {
            name: dataset.name,
            source: dataset.source,
            kind: SheetKind::RecordType,
            columns: declared.to_vec(),
            rows,
        },
        added,
        dropped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TemplateConfig;
    use proptest::prelude::*;

    fn names(cols: &[&str]) -> Vec<String> {
        cols.iter().map(|s| s.to_string()).collect()
    }

    fn dataset(columns: &[&str], rows: &[&[Option<&str>]]) -> Dataset {
        let mut ds = Dataset::new("sample", "sample.tsv", names(columns));
        for row in rows {
            ds.push_row(row.iter().map(|v| v.map(str::to_string)).collect());
        }
        ds
    }

    #[test]
    fn reorders_fills_and_drops() {
        let ds = dataset(
            &["parent.id", "type", "sample_id", "notes"],
            &[&[Some("p::P1"), Some("sample"), Some("S1"), Some("x")]],
        );
        let declared = names(&["type", "sample_id", "sample_tumor_status"]);
        let out = align_columns(ds, &declared);

        assert_eq!(out.dataset.columns, declared);
        assert_eq!(out.dataset.rows, vec![names(&["sample", "S1", ""])]);
        assert_eq!(out.added, vec!["sample_tumor_status"]);
        assert_eq!(out.dropped, vec!["parent.id", "notes"]);
        assert_eq!(out.dataset.kind, SheetKind::RecordType);
    }

    #[test]
    fn absent_cells_become_empty_strings() {
        let ds = dataset(&["a", "b"], &[&[None, Some("2")], &[Some("1"), None]]);
        let out = align_columns(ds, &names(&["b", "a"]));
        assert_eq!(out.dataset.rows, vec![names(&["2", ""]), names(&["", "1"])]);
    }

    #[test]
    fn repeated_source_column_uses_first() {
        let ds = dataset(&["a", "a"], &[&[Some("first"), Some("second")]]);
        let out = align_columns(ds, &names(&["a"]));
        assert_eq!(out.dataset.rows, vec![names(&["first"])]);
    }

    #[test]
    fn unknown_record_type_fails() {
        let registry = SchemaRegistry::from_sheets(
            vec![
                ("Dictionary".to_string(), names(&["Property"])),
                ("Terms and Value Sets".to_string(), names(&["Term"])),
            ],
            &TemplateConfig::default(),
        )
        .unwrap();
        let err = align(dataset(&["type"], &[]), &registry).unwrap_err();
        assert_eq!(err, ReconError::UnknownRecordType("sample".into()));
    }

    fn column_name() -> impl Strategy<Value = String> {
        prop::sample::select(vec!["type", "a", "b", "c", "d", "e", "parent.id", "x.x_id"])
            .prop_map(str::to_string)
    }

    fn declared_columns() -> impl Strategy<Value = Vec<String>> {
        prop::collection::hash_set(column_name(), 0..6)
            .prop_map(|set| {
                let mut v: Vec<String> = set.into_iter().collect();
                v.sort();
                v
            })
            .prop_shuffle()
    }

    fn raw_dataset() -> impl Strategy<Value = Dataset> {
        declared_columns().prop_flat_map(|columns| {
            let width = columns.len();
            let cell = prop::option::of("[a-z0-9:]{0,6}");
            prop::collection::vec(prop::collection::vec(cell, width), 0..5).prop_map(
                move |rows| {
                    let mut ds = Dataset::new("sample", "sample.tsv", columns.clone());
                    for row in rows {
                        ds.push_row(row);
                    }
                    ds
                },
            )
        })
    }

    proptest! {
        #[test]
        fn output_matches_declaration(ds in raw_dataset(), declared in declared_columns()) {
            let rows = ds.rows.len();
            let out = align_columns(ds, &declared);
            prop_assert_eq!(&out.dataset.columns, &declared);
            prop_assert_eq!(out.dataset.rows.len(), rows);
            for row in &out.dataset.rows {
                prop_assert_eq!(row.len(), declared.len());
            }
        }

        #[test]
        fn declared_values_survive(ds in raw_dataset(), declared in declared_columns()) {
            let raw = ds.clone();
            let out = align_columns(ds, &declared);
            for (c, column) in declared.iter().enumerate() {
                let Some(src) = raw.column_index(column) else { continue };
                for (r, row) in raw.rows.iter().enumerate() {
                    let expected = row[src].clone().unwrap_or_default();
                    prop_assert_eq!(&out.dataset.rows[r][c], &expected);
                }
            }
        }

        #[test]
        fn realigning_is_a_no_op(ds in raw_dataset(), declared in declared_columns()) {
            let once = align_columns(ds, &declared).dataset;
            let twice = align_columns(Dataset::from(once.clone()), &declared);
            prop_assert_eq!(&twice.dataset, &once);
            prop_assert!(twice.added.is_empty());
            prop_assert!(twice.dropped.is_empty());
        }
    }
}
