use tracing::{info, instrument};

use crate::error::{NormalizeError, Result};
use crate::table::Table;

/// Remove the derived columns from `table`.
///
/// A table that already has none of `derived` is returned unchanged, so pruning
/// twice is a no-op. A table that has only some of them has drifted from the
/// expected schema and is rejected.
#[instrument(skip_all, fields(table = %table.name))]
pub fn prune_columns(table: &Table, derived: &[&str]) -> Result<Table> {
    let present: Vec<&str> = derived
        .iter()
        .copied()
        .filter(|c| table.column_index(c).is_some())
        .collect();

    if present.is_empty() {
        info!("Table already pruned");
        return Ok(table.clone());
    }

    if present.len() != derived.len() {
        let absent: Vec<&str> = derived
            .iter()
            .copied()
            .filter(|c| !present.contains(c))
            .collect();
        return Err(NormalizeError::Schema(format!(
            "prunable columns missing from '{}': [{}]",
            table.name,
            absent.join(", ")
        )));
    }

    let keep: Vec<usize> = table
        .columns
        .iter()
        .enumerate()
        .filter(|(_, c)| !derived.contains(&c.as_str()))
        .map(|(i, _)| i)
        .collect();

    let columns = keep.iter().map(|&i| table.columns[i].clone()).collect();
    let rows = table
        .rows
        .iter()
        .map(|row| keep.iter().map(|&i| row[i].clone()).collect())
        .collect();

    info!(removed = derived.len(), remaining = keep.len(), "✂️ Pruned derived columns");
    Ok(Table::with_rows(table.name.clone(), columns, rows))
}
