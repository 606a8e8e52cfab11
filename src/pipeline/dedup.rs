use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info, instrument, warn};

use crate::constants::*;
use crate::error::Result;
use crate::table::Table;

/// Outcome of collapsing one table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DedupStats {
    pub table: String,
    pub input_rows: usize,
    /// Rows identical to an earlier row across every column
    pub exact_duplicates: usize,
    /// Rows whose natural key was already taken by a different earlier row
    pub key_conflicts: usize,
    pub output_rows: usize,
}

/// Natural key for each table that must be collapsed, `None` for tables left as-is.
pub fn natural_key(table: &str) -> Option<&'static [&'static str]> {
    match table {
        TABLE_PRODUCT => Some(&[PRODUCT_ID]),
        TABLE_CATEGORY => Some(&[CATEGORY_ID]),
        TABLE_CUSTOMER => Some(&[CUSTOMER_ID]),
        TABLE_ORDERS => Some(&[ORDER_ID]),
        TABLE_ORDER_ITEM => Some(&[ORDER_ID, PRODUCT_ID]),
        _ => None,
    }
}

/// Collapse fully identical rows, keeping the first occurrence, then keep only
/// the first row for each natural key.
///
/// Key conflicts are a data-quality issue: they are counted and logged, never fatal.
#[instrument(skip_all, fields(table = %table.name))]
pub fn deduplicate(table: &Table, key_columns: &[&str]) -> Result<(Table, DedupStats)> {
    let key_idx = key_columns
        .iter()
        .map(|c| table.require_column(c))
        .collect::<Result<Vec<usize>>>()?;

    let mut stats = DedupStats {
        table: table.name.clone(),
        input_rows: table.len(),
        ..Default::default()
    };

    let mut seen_rows: HashSet<&[String]> = HashSet::with_capacity(table.len());
    let mut seen_keys: HashSet<Vec<&str>> = HashSet::with_capacity(table.len());
    let mut rows = Vec::new();

    for row in &table.rows {
        if !seen_rows.insert(row.as_slice()) {
            stats.exact_duplicates += 1;
            continue;
        }
        let key: Vec<&str> = key_idx.iter().map(|&i| row[i].as_str()).collect();
        if seen_keys.contains(&key) {
            stats.key_conflicts += 1;
            debug!(key = ?key, "Dropping row with conflicting natural key");
            continue;
        }
        seen_keys.insert(key);
        rows.push(row.clone());
    }

    stats.output_rows = rows.len();
    if stats.key_conflicts > 0 {
        warn!(
            conflicts = stats.key_conflicts,
            key = %key_columns.join("+"),
            "⚠️ Rows shared a natural key but differed elsewhere; kept first occurrence"
        );
    }
    info!(
        input = stats.input_rows,
        output = stats.output_rows,
        "🧹 Deduplicated table"
    );
    ::metrics::counter!(crate::metrics::ROWS_DEDUPLICATED)
        .increment((stats.input_rows - stats.output_rows) as u64);

    Ok((
        Table::with_rows(table.name.clone(), table.columns.clone(), rows),
        stats,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product_rows(n: usize) -> Table {
        // Every order line repeats its product, like the flat export does
        let mut table = Table::new(
            TABLE_PRODUCT,
            vec![PRODUCT_ID.into(), "name".into(), CATEGORY_ID.into()],
        );
        for i in 0..n {
            let id = (i % 3) + 1;
            table
                .push_row(vec![id.to_string(), format!("Product {id}"), "7".into()])
                .unwrap();
        }
        table
    }

    #[test]
    fn collapses_repeated_products_in_first_seen_order() {
        let (out, stats) = deduplicate(&product_rows(30), &[PRODUCT_ID]).unwrap();
        assert_eq!(out.len(), 3);
        let ids: Vec<&str> = out.column_values(PRODUCT_ID).unwrap().collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert_eq!(stats.exact_duplicates, 27);
        assert_eq!(stats.key_conflicts, 0);
    }

    #[test]
    fn conflicting_key_keeps_first_and_counts() {
        let table = Table::with_rows(
            TABLE_CATEGORY,
            vec![CATEGORY_ID.into(), "name".into()],
            vec![
                vec!["1".into(), "Cleats".into()],
                vec!["1".into(), "Cleats ".into()],
                vec!["2".into(), "Fishing".into()],
            ],
        );
        let (out, stats) = deduplicate(&table, &[CATEGORY_ID]).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out.rows[0][1], "Cleats");
        assert_eq!(stats.key_conflicts, 1);

        let keys: HashSet<&str> = out.column_values(CATEGORY_ID).unwrap().collect();
        assert_eq!(keys.len(), out.len());
    }

    #[test]
    fn composite_key() {
        let table = Table::with_rows(
            TABLE_ORDER_ITEM,
            vec![ORDER_ID.into(), PRODUCT_ID.into(), "quantity".into()],
            vec![
                vec!["1".into(), "10".into(), "1".into()],
                vec!["1".into(), "11".into(), "1".into()],
                vec!["1".into(), "10".into(), "2".into()],
            ],
        );
        let (out, stats) = deduplicate(&table, natural_key(TABLE_ORDER_ITEM).unwrap()).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(stats.key_conflicts, 1);
    }

    #[test]
    fn dimension_tables_have_no_natural_key_rule() {
        assert!(natural_key(TABLE_SHIPPING_MODE).is_none());
        assert!(natural_key(TABLE_PRODUCT).is_some());
    }
}
