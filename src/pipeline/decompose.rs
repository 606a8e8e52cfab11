use tracing::{debug, info, instrument};

use crate::constants::*;
use crate::error::{NormalizeError, Result};
use crate::table::Table;

/// One target table: which source columns it takes, and what they are called there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableProjection {
    pub target: String,
    /// (source column, output column) in output order
    pub columns: Vec<(String, String)>,
}

impl TableProjection {
    pub fn new(target: &str, columns: &[(&str, &str)]) -> Self {
        Self {
            target: target.to_string(),
            columns: columns
                .iter()
                .map(|(src, out)| (src.to_string(), out.to_string()))
                .collect(),
        }
    }
}

/// The order export split into its entity tables.
pub fn default_manifest() -> Vec<TableProjection> {
    vec![
        TableProjection::new(
            TABLE_CUSTOMER,
            &[
                (COL_CUSTOMER_ID, CUSTOMER_ID),
                (COL_CUSTOMER_CITY, CITY),
                (COL_CUSTOMER_STATE, STATE),
                (COL_CUSTOMER_ZIPCODE, ZIPCODE),
                (COL_CUSTOMER_COUNTRY, COUNTRY),
                (COL_CUSTOMER_SEGMENT, SEGMENT_ID),
            ],
        ),
        TableProjection::new(
            TABLE_PRODUCT,
            &[
                (COL_PRODUCT_CARD_ID, PRODUCT_ID),
                (COL_PRODUCT_NAME, "name"),
                (COL_PRODUCT_CATEGORY_ID, CATEGORY_ID),
            ],
        ),
        TableProjection::new(
            TABLE_CATEGORY,
            &[
                (COL_CATEGORY_ID, CATEGORY_ID),
                (COL_CATEGORY_NAME, "name"),
                (COL_DEPARTMENT_NAME, "department_name"),
            ],
        ),
        TableProjection::new(
            TABLE_ORDERS,
            &[
                (COL_ORDER_ID, ORDER_ID),
                (COL_ORDER_CUSTOMER_ID, CUSTOMER_ID),
                (COL_ORDER_DATE, ORDER_DATE),
                (COL_SHIPPING_DATE, SHIPPING_DATE),
                (COL_ORDER_STATUS, "status"),
                (COL_ORDER_CITY, CITY),
                (COL_ORDER_STATE, STATE),
                (COL_ORDER_COUNTRY, COUNTRY),
                (COL_MARKET, "market"),
                (COL_ORDER_REGION, "region"),
                (COL_SHIPPING_MODE, SHIPPING_MODE_ID),
                (COL_TYPE, PAYMENT_ID),
            ],
        ),
        TableProjection::new(
            TABLE_ORDER_ITEM,
            &[
                (COL_ORDER_ID, ORDER_ID),
                (COL_PRODUCT_CARD_ID, PRODUCT_ID),
                (COL_ORDER_ITEM_PRODUCT_PRICE, "price"),
                (COL_ORDER_ITEM_QUANTITY, "quantity"),
                (COL_ORDER_ITEM_DISCOUNT, "discount"),
                (COL_ORDER_ITEM_DISCOUNT_RATE, "discount_rate"),
            ],
        ),
    ]
}

/// Project `table` into one table per manifest entry, in manifest order.
///
/// Every output keeps the input's row count and row order. All column
/// references are checked before anything is projected.
#[instrument(skip_all, fields(table = %table.name, targets = manifest.len()))]
pub fn decompose(table: &Table, manifest: &[TableProjection]) -> Result<Vec<Table>> {
    let mut plans = Vec::with_capacity(manifest.len());
    for projection in manifest {
        let mut indices = Vec::with_capacity(projection.columns.len());
        for (source, _) in &projection.columns {
            let idx = table.column_index(source).ok_or_else(|| {
                NormalizeError::Schema(format!(
                    "manifest entry '{}' references unknown column '{}'",
                    projection.target, source
                ))
            })?;
            indices.push(idx);
        }
        plans.push((projection, indices));
    }

    let outputs: Vec<Table> = plans
        .into_iter()
        .map(|(projection, indices)| {
            let columns = projection.columns.iter().map(|(_, out)| out.clone()).collect();
            let rows = table
                .rows
                .iter()
                .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
                .collect();
            debug!(target_table = %projection.target, "Projected table");
            Table::with_rows(projection.target.clone(), columns, rows)
        })
        .collect();

    info!(tables = outputs.len(), rows = table.len(), "🧩 Decomposed flat table");
    Ok(outputs)
}
