use std::collections::HashMap;

use crate::constants::*;
use crate::error::{NormalizeError, Result};
use crate::table::Table;

/// The eight finished tables of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedSchema {
    pub customer: Table,
    pub customer_segment: Table,
    pub product: Table,
    pub category: Table,
    pub orders: Table,
    pub shipping_mode: Table,
    pub payment_type: Table,
    pub order_item: Table,
}

impl NormalizedSchema {
    /// Tables in [`EXPORT_ORDER`], parents before children.
    pub fn tables(&self) -> [&Table; 8] {
        [
            &self.customer_segment,
            &self.category,
            &self.payment_type,
            &self.shipping_mode,
            &self.customer,
            &self.product,
            &self.orders,
            &self.order_item,
        ]
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables().into_iter().find(|t| t.name == name)
    }

    /// Assemble from named tables, e.g. ones reloaded from an export directory.
    pub fn from_tables(tables: Vec<Table>) -> Result<Self> {
        let mut by_name: HashMap<String, Table> =
            tables.into_iter().map(|t| (t.name.clone(), t)).collect();
        let mut take = |name: &str| {
            by_name
                .remove(name)
                .ok_or_else(|| NormalizeError::Schema(format!("missing table '{name}'")))
        };
        Ok(Self {
            customer: take(TABLE_CUSTOMER)?,
            customer_segment: take(TABLE_CUSTOMER_SEGMENT)?,
            product: take(TABLE_PRODUCT)?,
            category: take(TABLE_CATEGORY)?,
            orders: take(TABLE_ORDERS)?,
            shipping_mode: take(TABLE_SHIPPING_MODE)?,
            payment_type: take(TABLE_PAYMENT_TYPE)?,
            order_item: take(TABLE_ORDER_ITEM)?,
        })
    }
}
