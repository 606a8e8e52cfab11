use std::collections::HashMap;
use tracing::{info, instrument};

use crate::constants::*;
use crate::error::Result;
use crate::table::Table;

/// Label stored for empty categorical values. It takes a key like any other value.
pub const UNKNOWN_VALUE: &str = "Unknown";

/// A categorical column replaced by a surrogate key into a generated dimension table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DimensionSpec {
    pub parent_table: &'static str,
    /// Column in the parent holding the text value; it is overwritten with keys
    pub parent_column: &'static str,
    pub dimension_table: &'static str,
    pub key_column: &'static str,
    pub value_column: &'static str,
}

pub const CUSTOMER_SEGMENT: DimensionSpec = DimensionSpec {
    parent_table: TABLE_CUSTOMER,
    parent_column: SEGMENT_ID,
    dimension_table: TABLE_CUSTOMER_SEGMENT,
    key_column: SEGMENT_ID,
    value_column: SEGMENT_NAME,
};

pub const SHIPPING_MODE: DimensionSpec = DimensionSpec {
    parent_table: TABLE_ORDERS,
    parent_column: SHIPPING_MODE_ID,
    dimension_table: TABLE_SHIPPING_MODE,
    key_column: SHIPPING_MODE_ID,
    value_column: MODE_NAME,
};

pub const PAYMENT_TYPE: DimensionSpec = DimensionSpec {
    parent_table: TABLE_ORDERS,
    parent_column: PAYMENT_ID,
    dimension_table: TABLE_PAYMENT_TYPE,
    key_column: PAYMENT_ID,
    value_column: TYPE_NAME,
};

pub const DIMENSIONS: [DimensionSpec; 3] = [CUSTOMER_SEGMENT, SHIPPING_MODE, PAYMENT_TYPE];

/// Canonical form of a categorical value before it is keyed.
pub fn normalize_value(value: &str) -> &str {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        UNKNOWN_VALUE
    } else {
        trimmed
    }
}

/// Key every distinct value of `spec.parent_column` in first-seen order, 1..=N.
///
/// Returns the parent with the column overwritten by keys (same position,
/// renamed to `spec.key_column`) and the dimension table of (key, value) pairs.
#[instrument(skip_all, fields(dimension = spec.dimension_table))]
pub fn assign_keys(parent: &Table, spec: &DimensionSpec) -> Result<(Table, Table)> {
    let idx = parent.require_column(spec.parent_column)?;

    let mut keys: HashMap<String, usize> = HashMap::new();
    let mut dimension = Table::new(
        spec.dimension_table,
        vec![spec.key_column.to_string(), spec.value_column.to_string()],
    );

    let mut out = parent.clone();
    out.columns[idx] = spec.key_column.to_string();

    for row in &mut out.rows {
        let value = normalize_value(&row[idx]).to_string();
        let next = keys.len() + 1;
        let key = *keys.entry(value.clone()).or_insert_with(|| {
            dimension.rows.push(vec![next.to_string(), value]);
            next
        });
        row[idx] = key.to_string();
    }

    info!(
        distinct = dimension.len(),
        rows = out.len(),
        "🔑 Assigned surrogate keys"
    );
    Ok((out, dimension))
}

/// Map from surrogate key to original value, for stages that need the label back.
pub fn key_lookup(dimension: &Table, spec: &DimensionSpec) -> Result<HashMap<String, String>> {
    let key_idx = dimension.require_column(spec.key_column)?;
    let value_idx = dimension.require_column(spec.value_column)?;
    Ok(dimension
        .rows
        .iter()
        .map(|row| (row[key_idx].clone(), row[value_idx].clone()))
        .collect())
}
