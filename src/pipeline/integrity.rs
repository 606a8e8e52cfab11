use std::collections::HashSet;
use tracing::{error, info, instrument};

use crate::constants::*;
use crate::error::{NormalizeError, Result};
use crate::pipeline::schema::NormalizedSchema;

/// Sample size of offending values kept per violation.
const SAMPLE: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForeignKey {
    pub child_table: &'static str,
    pub child_column: &'static str,
    pub parent_table: &'static str,
    pub parent_column: &'static str,
}

const fn fk(
    child_table: &'static str,
    child_column: &'static str,
    parent_table: &'static str,
    parent_column: &'static str,
) -> ForeignKey {
    ForeignKey {
        child_table,
        child_column,
        parent_table,
        parent_column,
    }
}

pub const FOREIGN_KEYS: [ForeignKey; 7] = [
    fk(TABLE_CUSTOMER, SEGMENT_ID, TABLE_CUSTOMER_SEGMENT, SEGMENT_ID),
    fk(TABLE_PRODUCT, CATEGORY_ID, TABLE_CATEGORY, CATEGORY_ID),
    fk(TABLE_ORDERS, CUSTOMER_ID, TABLE_CUSTOMER, CUSTOMER_ID),
    fk(TABLE_ORDERS, SHIPPING_MODE_ID, TABLE_SHIPPING_MODE, SHIPPING_MODE_ID),
    fk(TABLE_ORDERS, PAYMENT_ID, TABLE_PAYMENT_TYPE, PAYMENT_ID),
    fk(TABLE_ORDER_ITEM, ORDER_ID, TABLE_ORDERS, ORDER_ID),
    fk(TABLE_ORDER_ITEM, PRODUCT_ID, TABLE_PRODUCT, PRODUCT_ID),
];

pub const PRIMARY_KEYS: [(&str, &[&str]); 8] = [
    (TABLE_CUSTOMER, &[CUSTOMER_ID]),
    (TABLE_CUSTOMER_SEGMENT, &[SEGMENT_ID]),
    (TABLE_PRODUCT, &[PRODUCT_ID]),
    (TABLE_CATEGORY, &[CATEGORY_ID]),
    (TABLE_ORDERS, &[ORDER_ID]),
    (TABLE_SHIPPING_MODE, &[SHIPPING_MODE_ID]),
    (TABLE_PAYMENT_TYPE, &[PAYMENT_ID]),
    (TABLE_ORDER_ITEM, &[ORDER_ID, PRODUCT_ID]),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub constraint: String,
    pub count: usize,
    pub sample: Vec<String>,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({} rows, e.g. {})",
            self.constraint,
            self.count,
            self.sample.join(", ")
        )
    }
}

/// Every primary-key duplicate and dangling foreign key in the schema.
pub fn find_violations(schema: &NormalizedSchema) -> Result<Vec<Violation>> {
    let mut violations = Vec::new();

    for (table_name, key) in PRIMARY_KEYS {
        let table = lookup(schema, table_name)?;
        let idx = key
            .iter()
            .map(|c| table.require_column(c))
            .collect::<Result<Vec<usize>>>()?;
        let mut seen = HashSet::new();
        let duplicates: Vec<String> = table
            .rows
            .iter()
            .map(|row| idx.iter().map(|&i| row[i].as_str()).collect::<Vec<_>>().join("|"))
            .filter(|k| !seen.insert(k.clone()))
            .collect();
        if !duplicates.is_empty() {
            violations.push(Violation {
                constraint: format!("{}({}) is not unique", table_name, key.join(", ")),
                count: duplicates.len(),
                sample: duplicates.into_iter().take(SAMPLE).collect(),
            });
        }
    }

    for key in FOREIGN_KEYS {
        let child = lookup(schema, key.child_table)?;
        let parent = lookup(schema, key.parent_table)?;
        let parent_keys: HashSet<&str> = parent.column_values(key.parent_column)?.collect();
        let dangling: Vec<&str> = child
            .column_values(key.child_column)?
            .filter(|v| !parent_keys.contains(v))
            .collect();
        if !dangling.is_empty() {
            violations.push(Violation {
                constraint: format!(
                    "{}.{} -> {}.{}",
                    key.child_table, key.child_column, key.parent_table, key.parent_column
                ),
                count: dangling.len(),
                sample: dangling.iter().take(SAMPLE).map(|v| v.to_string()).collect(),
            });
        }
    }

    Ok(violations)
}

/// Fail with an integrity error if any key constraint is broken.
#[instrument(skip_all)]
pub fn check_integrity(schema: &NormalizedSchema) -> Result<()> {
    let violations = find_violations(schema)?;
    if violations.is_empty() {
        info!(
            foreign_keys = FOREIGN_KEYS.len(),
            primary_keys = PRIMARY_KEYS.len(),
            "🔗 Referential integrity holds"
        );
        return Ok(());
    }
    for v in &violations {
        error!(violation = %v, "❌ Integrity violation");
    }
    Err(NormalizeError::Integrity(
        violations
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; "),
    ))
}

fn lookup<'a>(schema: &'a NormalizedSchema, name: &str) -> Result<&'a crate::table::Table> {
    schema
        .table(name)
        .ok_or_else(|| NormalizeError::Schema(format!("missing table '{name}'")))
}
