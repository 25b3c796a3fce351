//! CSV input and output tables

use crate::batch::{InputRecord, OutputRecord};
use crate::error::{ResolveError, Result};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::debug;

const NAME_COLUMN: &str = "name";
const PROBLEM_COLUMN: &str = "problem";

const RANK_ROOTS: [&str; 7] = ["domain", "kingdom", "phylum", "class", "order", "family", "tribe"];
const RANK_PREFIXES: [&str; 5] = ["super", "", "sub", "infra", "parv"];

/// Read every row of `path`. The table must have a `name` column; short rows
/// are padded with empty values.
pub fn read_records(path: &Path) -> Result<Vec<InputRecord>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers = reader.headers()?.clone();
    let name_index = headers
        .iter()
        .position(|h| h.trim() == NAME_COLUMN)
        .ok_or_else(|| {
            ResolveError::Input(format!("{}: no `{}` column", path.display(), NAME_COLUMN))
        })?;

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let value = |i: usize| row.get(i).unwrap_or_default().to_string();
        records.push(InputRecord {
            name: value(name_index),
            extra: headers
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != name_index)
                .map(|(i, header)| (header.to_string(), value(i)))
                .collect(),
        });
    }
    Ok(records)
}

/// Rank columns present in any record: the usual Linnaean ranks in
/// descending order, then anything else alphabetically
fn rank_columns(records: &[OutputRecord]) -> Vec<String> {
    let present: BTreeSet<&str> = records
        .iter()
        .flat_map(|r| r.ranks.keys().map(String::as_str))
        .collect();

    let canonical: Vec<String> = RANK_ROOTS
        .iter()
        .flat_map(|root| RANK_PREFIXES.iter().map(move |prefix| format!("{}{}", prefix, root)))
        .collect();

    let mut columns: Vec<String> = canonical
        .iter()
        .filter(|rank| present.contains(rank.as_str()))
        .cloned()
        .collect();
    columns.extend(
        present
            .iter()
            .filter(|rank| !canonical.iter().any(|c| c == *rank))
            .map(|rank| rank.to_string()),
    );
    columns
}

/// Write `records` to `path`; nothing is written for an empty slice
pub fn write_records(path: &Path, records: &[OutputRecord]) -> Result<()> {
    let Some(first) = records.first() else {
        debug!(path = %path.display(), "No records, skipping output table");
        return Ok(());
    };
    let ranks = rank_columns(records);
    // Pass-through columns named like a resolved column are replaced by it
    let extra: Vec<&str> = first
        .extra
        .iter()
        .map(|(h, _)| h.as_str())
        .filter(|h| {
            !OutputRecord::HEADERS.iter().any(|c| c == h)
                && !ranks.iter().any(|r| r == h)
                && *h != PROBLEM_COLUMN
        })
        .collect();

    let mut writer = csv::Writer::from_path(path)?;
    let header = OutputRecord::HEADERS
        .iter()
        .copied()
        .chain(ranks.iter().map(String::as_str))
        .chain(extra.iter().copied())
        .chain(std::iter::once(PROBLEM_COLUMN));
    writer.write_record(header)?;

    for record in records {
        let mut row = record.fixed_values();
        row.extend(ranks.iter().map(|rank| record.ranks.get(rank).cloned().unwrap_or_default()));
        row.extend(extra.iter().map(|column| {
            record
                .extra
                .iter()
                .find(|(h, _)| h == column)
                .map(|(_, v)| v.clone())
                .unwrap_or_default()
        }));
        row.push(record.problem.map(|p| p.to_string()).unwrap_or_default());
        writer.write_record(&row)?;
    }
    writer.flush()?;
    debug!(path = %path.display(), rows = records.len(), "Wrote output table");
    Ok(())
}
