//! Restores `[node].[node]_id` linking columns from their compact `[node].id` form.
//!
//! Extracts carry one `parent.id` column per parent node, holding values like
//! `parent::P9`. The loader wants `parent.parent_id = P9` instead.

use crate::config::{LinkConfig, MalformedPolicy};
use crate::error::ReconError;
use crate::model::{cell_at, present, Cell, Dataset, RestoredLink};

/// A dataset with its restored columns appended, plus what was done.
#[derive(Debug)]
pub struct LinkOutcome {
    pub dataset: Dataset,
    pub restored: Vec<RestoredLink>,
    /// Non-empty encoded values without the delimiter, restored as empty.
    pub malformed: usize,
}

/// Node name of an encoded column: everything before the first `.`.
pub fn parent_node(column: &str) -> &str {
    column.split('.').next().unwrap_or(column)
}

/// Name of the restored column for a parent node.
pub fn restored_column_name(parent: &str) -> String {
    format!("{parent}.{parent}_id")
}

/// Second delimiter-separated segment of an encoded value, if there is one.
pub fn split_link<'a>(value: &'a str, delimiter: &str) -> Option<&'a str> {
    value.split(delimiter).nth(1)
}

/// Add a restored linking column for every encoded column.
///
/// Datasets without `type_column` are returned untouched. Encoded columns stay
/// in place; alignment drops them later. When two encoded columns share a
/// parent node, the one further right wins.
pub fn restore_links(
    mut dataset: Dataset,
    type_column: &str,
    config: &LinkConfig,
) -> Result<LinkOutcome, ReconError> {
    let mut restored = Vec::new();
    let mut malformed = 0;

    if !dataset.has_column(type_column) {
        return Ok(LinkOutcome { dataset, restored, malformed });
    }

    let encoded: Vec<(usize, String)> = dataset
        .columns
        .iter()
        .enumerate()
        .filter(|(_, c)| c.contains(config.marker.as_str()))
        .map(|(idx, c)| (idx, c.clone()))
        .collect();

    for (idx, column) in encoded {
        let restored_name = restored_column_name(parent_node(&column));

        let all_blank = dataset.rows.iter().all(|row| cell_at(row, idx).is_none());
        let values: Vec<Cell> = if all_blank {
            // Nothing to split; carry the blank cells over as they are
            dataset.rows.iter().map(|row| row.get(idx).cloned().flatten()).collect()
        } else {
            let mut values = Vec::with_capacity(dataset.rows.len());
            for (row_no, row) in dataset.rows.iter().enumerate() {
                let Some(raw) = cell_at(row, idx) else {
                    values.push(None);
                    continue;
                };
                match split_link(raw, &config.delimiter) {
                    Some(id) => values.push(Some(id.to_string())),
                    None => match config.on_malformed {
                        MalformedPolicy::Error => {
                            return Err(ReconError::MalformedLink {
                                record_type: dataset.name.clone(),
                                column: column.clone(),
                                row: row_no + 1,
                                value: raw.to_string(),
                            });
                        }
                        MalformedPolicy::Empty => {
                            log::warn!(
                                "{}: column '{}', row {}: no '{}' in '{}', restored as empty",
                                dataset.name,
                                column,
                                row_no + 1,
                                config.delimiter,
                                raw
                            );
                            malformed += 1;
                            values.push(None);
                        }
                    },
                }
            }
            values
        };

        if let Some(pos) = restored
            .iter()
            .position(|r: &RestoredLink| r.restored_column == restored_name)
        {
            log::warn!(
                "{}: '{}' overwrites '{}' restored from '{}'",
                dataset.name,
                column,
                restored_name,
                restored[pos].source_column
            );
            restored.remove(pos);
        }

        let filled = values.iter().filter(|v| present(v).is_some()).count();
        log::debug!(
            "{}: restored '{}' from '{}' ({} value(s))",
            dataset.name,
            restored_name,
            column,
            filled
        );
        dataset.set_column(&restored_name, values);
        restored.push(RestoredLink {
            source_column: column,
            restored_column: restored_name,
            values: filled,
        });
    }

    Ok(LinkOutcome {
        dataset,
        restored,
        malformed,
    })
}
