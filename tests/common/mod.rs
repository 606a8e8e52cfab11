#![allow(dead_code)]

use anyhow::Result;
use std::collections::BTreeMap;
use std::path::Path;

use supply_chain_normalizer::constants::*;

pub const PRODUCTS: u32 = 12;
pub const ORDERS: u32 = 150;
pub const ITEMS_PER_ORDER: u32 = 4;
pub const CUSTOMERS: u32 = 30;

pub const MODES: [&str; 4] = ["Standard Class", "First Class", "Second Class", "Same Day"];
pub const PAYMENTS: [&str; 4] = ["DEBIT", "TRANSFER", "CASH", "PAYMENT"];
pub const SEGMENTS: [&str; 3] = ["Consumer", "Corporate", "Home Office"];

pub type SourceRow = BTreeMap<&'static str, String>;

fn category_of(product: u32) -> u32 {
    product % 4 + 1
}

/// Customer fields depend only on the id, so every copy of a customer agrees.
fn customer_fields(row: &mut SourceRow, customer: u32) {
    let (city, state, zip, country) = match customer {
        // ZIP code in the state field, California city beside it
        1 => ("Elk Grove", "95758", "95758", "EE. UU."),
        // state code in the city field
        2 => ("CA", "CA", "90001", "EE. UU."),
        3 => ("Chicago", "IL", "60601", "EE. UU."),
        _ => ("Caguas", "PR", "725", "EE. UU."),
    };
    row.insert(COL_CUSTOMER_ID, customer.to_string());
    row.insert(COL_CUSTOMER_CITY, city.to_string());
    row.insert(COL_CUSTOMER_STATE, state.to_string());
    row.insert(COL_CUSTOMER_ZIPCODE, zip.to_string());
    row.insert(COL_CUSTOMER_COUNTRY, country.to_string());
    row.insert(
        COL_CUSTOMER_SEGMENT,
        SEGMENTS[(customer % SEGMENTS.len() as u32) as usize].to_string(),
    );
}

/// Order-level fields, including the dirty date patterns.
fn order_fields(row: &mut SourceRow, order: u32) {
    let day = order % 28 + 1;
    let month = order % 12 + 1;
    let mut order_date = format!("{month:02}/{day:02}/2017 10:30");
    let mut shipping_date = format!("{month:02}/{day:02}/2017 18:45");
    if order % 5 == 0 {
        order_date = "0000-00-00".to_string();
    }
    if order % 7 == 0 {
        shipping_date = String::new();
    }
    if order % 11 == 0 && order % 5 != 0 && order % 7 != 0 {
        // shipped before it was ordered
        shipping_date = format!("{month:02}/{day:02}/2016 09:00");
    }
    let customer = order % CUSTOMERS + 1;

    row.insert(COL_ORDER_ID, order.to_string());
    row.insert(COL_ORDER_CUSTOMER_ID, customer.to_string());
    row.insert(COL_ORDER_DATE, order_date);
    row.insert(COL_SHIPPING_DATE, shipping_date);
    row.insert(COL_ORDER_STATUS, "COMPLETE".to_string());
    row.insert(COL_ORDER_CITY, "Bekasi".to_string());
    row.insert(COL_ORDER_STATE, "Java Occidental".to_string());
    row.insert(
        COL_ORDER_COUNTRY,
        if order % 2 == 0 { "Indonesia" } else { "Francia" }.to_string(),
    );
    row.insert(COL_MARKET, "Pacific Asia".to_string());
    row.insert(COL_ORDER_REGION, "Southeast Asia".to_string());
    row.insert(
        COL_SHIPPING_MODE,
        MODES[(order % MODES.len() as u32) as usize].to_string(),
    );
    row.insert(
        COL_TYPE,
        PAYMENTS[(order % PAYMENTS.len() as u32) as usize].to_string(),
    );
    customer_fields(row, customer);
}

fn product_fields(row: &mut SourceRow, product: u32) {
    let category = category_of(product);
    row.insert(COL_PRODUCT_CARD_ID, product.to_string());
    row.insert(COL_ORDER_ITEM_CARDPROD_ID, product.to_string());
    row.insert(COL_PRODUCT_NAME, format!("Product {product}"));
    row.insert(COL_PRODUCT_CATEGORY_ID, category.to_string());
    row.insert(COL_PRODUCT_PRICE, format!("{}.99", product * 10));
    row.insert(COL_CATEGORY_ID, category.to_string());
    row.insert(COL_CATEGORY_NAME, format!("Category {category}"));
    row.insert(COL_DEPARTMENT_ID, "2".to_string());
    row.insert(COL_DEPARTMENT_NAME, "Fitness".to_string());
}

/// One line item of the flat export.
pub fn source_row(order: u32, product: u32) -> SourceRow {
    let mut row = SourceRow::new();
    for (column, value) in [
        (COL_DAYS_SHIPPING_REAL, "3"),
        (COL_DAYS_SHIPMENT_SCHEDULED, "4"),
        (COL_BENEFIT_PER_ORDER, "91.25"),
        (COL_SALES_PER_CUSTOMER, "314.64"),
        (COL_DELIVERY_STATUS, "Advance shipping"),
        (COL_LATE_DELIVERY_RISK, "0"),
        (COL_ORDER_ITEM_DISCOUNT, "13.11"),
        (COL_ORDER_ITEM_DISCOUNT_RATE, "0.04"),
        (COL_ORDER_ITEM_PROFIT_RATIO, "0.29"),
        (COL_ORDER_ITEM_QUANTITY, "1"),
        (COL_SALES, "327.75"),
        (COL_ORDER_ITEM_TOTAL, "314.64"),
        (COL_ORDER_PROFIT_PER_ORDER, "91.25"),
    ] {
        row.insert(column, value.to_string());
    }
    order_fields(&mut row, order);
    product_fields(&mut row, product);
    row.insert(COL_ORDER_ITEM_PRODUCT_PRICE, format!("{}.99", product * 10));
    row
}

/// Many line items drawn from a small product catalogue: every order has
/// `ITEMS_PER_ORDER` distinct products out of `PRODUCTS`.
pub fn order_export() -> Vec<SourceRow> {
    let mut rows = Vec::new();
    for order in 1..=ORDERS {
        for k in 0..ITEMS_PER_ORDER {
            let product = (order + k * 3) % PRODUCTS + 1;
            rows.push(source_row(order, product));
        }
    }
    rows
}

/// Write rows in the full source layout, optionally leaving out one column.
pub fn write_source(path: &Path, rows: &[SourceRow], without: Option<&str>) -> Result<()> {
    let columns: Vec<&str> = SOURCE_COLUMNS
        .iter()
        .copied()
        .filter(|c| Some(*c) != without)
        .collect();
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(&columns)?;
    for row in rows {
        writer.write_record(columns.iter().map(|c| row.get(c).map(String::as_str).unwrap_or("")))?;
    }
    writer.flush()?;
    Ok(())
}
