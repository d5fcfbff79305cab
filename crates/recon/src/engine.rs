use std::collections::BTreeMap;

use crate::align::align;
use crate::config::JoineryConfig;
use crate::error::ReconError;
use crate::link::restore_links;
use crate::model::{
    Dataset, FinalizedDataset, RecordSet, ReconMeta, ReconReport, ReconSummary, Reconciliation,
    ReplacedSource, SheetKind, SheetReport,
};
use crate::registry::SchemaRegistry;

/// Finalized datasets and their reports collected so far.
#[derive(Debug, Default)]
struct Accumulator {
    datasets: BTreeMap<String, FinalizedDataset>,
    reports: Vec<SheetReport>,
}

impl Accumulator {
    fn with(mut self, dataset: FinalizedDataset, report: SheetReport) -> Self {
        self.reports.push(report);
        self.datasets.insert(dataset.name.clone(), dataset);
        self
    }
}

/// Reconcile every dataset against the registry.
///
/// Stops at the first failing dataset; there is no partial output.
pub fn run(
    registry: &SchemaRegistry,
    input: RecordSet,
    config: &JoineryConfig,
) -> Result<Reconciliation, ReconError> {
    let (datasets, replaced) = input.into_parts();
    log::info!("reconciling {} dataset(s)", datasets.len());

    let acc = datasets
        .into_iter()
        .try_fold(Accumulator::default(), |acc, dataset| {
            let (finalized, report) = reconcile_dataset(dataset, registry, config)?;
            Ok::<_, ReconError>(acc.with(finalized, report))
        })?;

    let summary = compute_summary(&acc.reports, &replaced);

    Ok(Reconciliation {
        datasets: acc.datasets,
        report: ReconReport {
            meta: ReconMeta {
                engine_version: env!("CARGO_PKG_VERSION").to_string(),
            },
            summary,
            sheets: acc.reports,
            replaced,
        },
    })
}

/// Restore links then align one dataset. Datasets without the type column
/// pass through with their own columns.
pub fn reconcile_dataset(
    dataset: Dataset,
    registry: &SchemaRegistry,
    config: &JoineryConfig,
) -> Result<(FinalizedDataset, SheetReport), ReconError> {
    if !dataset.has_column(&config.input.type_column) {
        log::debug!("{}: no '{}' column, passing through", dataset.name, config.input.type_column);
        let finalized = FinalizedDataset::passthrough(dataset);
        let report = SheetReport {
            name: finalized.name.clone(),
            source: finalized.source.clone(),
            kind: SheetKind::Auxiliary,
            rows: finalized.rows.len(),
            restored_links: Vec::new(),
            malformed_links: 0,
            added_columns: Vec::new(),
            dropped_columns: Vec::new(),
        };
        return Ok((finalized, report));
    }

    let linked = restore_links(dataset, &config.input.type_column, &config.links)?;
    let aligned = align(linked.dataset, registry)?;

    let report = SheetReport {
        name: aligned.dataset.name.clone(),
        source: aligned.dataset.source.clone(),
        kind: SheetKind::RecordType,
        rows: aligned.dataset.rows.len(),
        restored_links: linked.restored,
        malformed_links: linked.malformed,
        added_columns: aligned.added,
        dropped_columns: aligned.dropped,
    };
    Ok((aligned.dataset, report))
}

/// Roll per-sheet reports up into run totals.
pub fn compute_summary(reports: &[SheetReport], replaced: &[ReplacedSource]) -> ReconSummary {
    let mut summary = ReconSummary {
        sheets: reports.len(),
        replaced_sources: replaced.len(),
        ..ReconSummary::default()
    };

    for r in reports {
        match r.kind {
            SheetKind::RecordType => summary.record_types += 1,
            SheetKind::Auxiliary => summary.auxiliary += 1,
        }
        summary.rows += r.rows;
        summary.restored_links += r.restored_links.len();
        summary.malformed_links += r.malformed_links;
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{InputConfig, MalformedPolicy, TemplateConfig};
    use crate::model::Cell;

    fn names(cols: &[&str]) -> Vec<String> {
        cols.iter().map(|s| s.to_string()).collect()
    }

    fn registry() -> SchemaRegistry {
        SchemaRegistry::from_sheets(
            vec![
                ("Dictionary".to_string(), names(&["Property"])),
                ("Terms and Value Sets".to_string(), names(&["Term"])),
                ("study".to_string(), names(&["type", "study_id"])),
                ("sample".to_string(), names(&["sample_id", "parent.parent_id"])),
            ],
            &TemplateConfig::default(),
        )
        .unwrap()
    }

    fn dataset(name: &str, source: &str, columns: &[&str], rows: &[&[&str]]) -> Dataset {
        let mut ds = Dataset::new(name, source, names(columns));
        for row in rows {
            let cells: Vec<Cell> = row
                .iter()
                .map(|v| if v.is_empty() { None } else { Some(v.to_string()) })
                .collect();
            ds.push_row(cells);
        }
        ds
    }

    fn input(datasets: Vec<Dataset>) -> RecordSet {
        let mut set = RecordSet::new();
        for ds in datasets {
            set.insert(ds, &InputConfig::default()).unwrap();
        }
        set
    }

    #[test]
    fn end_to_end_sample() {
        let ds = dataset(
            "sample",
            "sample.tsv",
            &["type", "sample_id", "parent.id"],
            &[&["sample", "S1", "PARENT::P9"]],
        );
        let result = run(&registry(), input(vec![ds]), &JoineryConfig::default()).unwrap();

        let sample = result.get("sample").unwrap();
        assert_eq!(sample.columns, vec!["sample_id", "parent.parent_id"]);
        assert_eq!(sample.rows, vec![names(&["S1", "P9"])]);

        let report = &result.report.sheets[0];
        assert_eq!(report.kind, SheetKind::RecordType);
        assert_eq!(report.dropped_columns, vec!["type", "parent.id"]);
        assert!(report.added_columns.is_empty());
        assert_eq!(report.restored_links[0].restored_column, "parent.parent_id");
    }

    #[test]
    fn every_record_type_conforms() {
        let study = dataset("study", "study.tsv", &["study_id", "type", "extra"], &[&["phs1", "study", "x"]]);
        let sample = dataset("sample", "sample.tsv", &["type", "sample_id"], &[&["sample", "S1"], &["sample", "S2"]]);
        let reg = registry();
        let result = run(&reg, input(vec![study, sample]), &JoineryConfig::default()).unwrap();

        for (name, ds) in &result.datasets {
            assert_eq!(ds.columns.as_slice(), reg.columns_for(name).unwrap());
        }
        assert_eq!(result.get("sample").unwrap().rows, vec![names(&["S1", ""]), names(&["S2", ""])]);
        assert_eq!(result.report.summary.record_types, 2);
        assert_eq!(result.report.summary.rows, 3);
    }

    #[test]
    fn auxiliary_dataset_passes_through() {
        let notes = dataset("notes", "notes.csv", &["parent.id", "comment"], &[&["p::P1", ""]]);
        let result = run(&registry(), input(vec![notes]), &JoineryConfig::default()).unwrap();

        let out = result.get("notes").unwrap();
        assert_eq!(out.kind, SheetKind::Auxiliary);
        assert_eq!(out.columns, vec!["parent.id", "comment"]);
        assert_eq!(out.rows, vec![names(&["p::P1", ""])]);
        assert_eq!(result.report.summary.auxiliary, 1);
    }

    #[test]
    fn unknown_record_type_aborts_run() {
        let sample = dataset("sample", "sample.tsv", &["type", "sample_id"], &[&["sample", "S1"]]);
        let diagnosis = dataset("diagnosis", "diagnosis.tsv", &["type"], &[&["diagnosis"]]);
        let err = run(&registry(), input(vec![sample, diagnosis]), &JoineryConfig::default()).unwrap_err();
        assert_eq!(err, ReconError::UnknownRecordType("diagnosis".into()));
    }

    #[test]
    fn strict_malformed_links_abort_run() {
        let mut config = JoineryConfig::default();
        config.links.on_malformed = MalformedPolicy::Error;
        let ds = dataset("sample", "sample.tsv", &["type", "parent.id"], &[&["sample", "P9"]]);
        let err = run(&registry(), input(vec![ds]), &config).unwrap_err();
        assert!(matches!(err, ReconError::MalformedLink { .. }));
    }

    #[test]
    fn summary_counts_replacements_and_malformed() {
        let first = dataset("sample", "a.tsv", &["type", "sample_id"], &[&["sample", "OLD"]]);
        let second = dataset(
            "sample",
            "b.csv",
            &["type", "sample_id", "parent.id"],
            &[&["sample", "NEW", "P9"], &["sample", "NEW2", "parent::P1"]],
        );
        let result = run(&registry(), input(vec![first, second]), &JoineryConfig::default()).unwrap();

        let s = &result.report.summary;
        assert_eq!(s.replaced_sources, 1);
        assert_eq!(s.malformed_links, 1);
        assert_eq!(s.restored_links, 1);
        assert_eq!(result.report.replaced[0].replaced, "a.tsv");
        assert_eq!(
            result.get("sample").unwrap().rows,
            vec![names(&["NEW", ""]), names(&["NEW2", "P1"])]
        );
    }

    #[test]
    fn ragged_rows_are_absent_cells() {
        let mut ds = Dataset::new("sample", "sample.tsv", names(&["type", "sample_id", "parent.id"]));
        ds.rows.push(vec![Some("sample".into()), Some("S1".into())]);
        ds.rows.push(vec![Some("sample".into()), Some("S2".into()), Some("parent::P2".into())]);
        let result = run(&registry(), input(vec![ds]), &JoineryConfig::default()).unwrap();

        assert_eq!(
            result.get("sample").unwrap().rows,
            vec![names(&["S1", ""]), names(&["S2", "P2"])]
        );
    }

    #[test]
    fn report_serializes() {
        let ds = dataset("sample", "sample.tsv", &["type", "sample_id"], &[&["sample", "S1"]]);
        let result = run(&registry(), input(vec![ds]), &JoineryConfig::default()).unwrap();
        let json = serde_json::to_value(&result.report).unwrap();
        assert_eq!(json["summary"]["sheets"], 1);
        assert_eq!(json["sheets"][0]["kind"], "record_type");
        assert_eq!(json["meta"]["engine_version"], env!("CARGO_PKG_VERSION"));
    }
}
