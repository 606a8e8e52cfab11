//! Column and table name constants shared across the pipeline.
//! Source column names are an external contract with the order export and must
//! match its header byte for byte.

// Source columns
pub const COL_TYPE: &str = "Type";
pub const COL_DAYS_SHIPPING_REAL: &str = "Days for shipping (real)";
pub const COL_DAYS_SHIPMENT_SCHEDULED: &str = "Days for shipment (scheduled)";
pub const COL_BENEFIT_PER_ORDER: &str = "Benefit per order";
pub const COL_SALES_PER_CUSTOMER: &str = "Sales per customer";
pub const COL_DELIVERY_STATUS: &str = "Delivery Status";
pub const COL_LATE_DELIVERY_RISK: &str = "Late_delivery_risk";
pub const COL_CATEGORY_ID: &str = "Category Id";
pub const COL_CATEGORY_NAME: &str = "Category Name";
pub const COL_CUSTOMER_CITY: &str = "Customer City";
pub const COL_CUSTOMER_COUNTRY: &str = "Customer Country";
pub const COL_CUSTOMER_ID: &str = "Customer Id";
pub const COL_CUSTOMER_SEGMENT: &str = "Customer Segment";
pub const COL_CUSTOMER_STATE: &str = "Customer State";
pub const COL_CUSTOMER_ZIPCODE: &str = "Customer Zipcode";
pub const COL_DEPARTMENT_ID: &str = "Department Id";
pub const COL_DEPARTMENT_NAME: &str = "Department Name";
pub const COL_MARKET: &str = "Market";
pub const COL_ORDER_CITY: &str = "Order City";
pub const COL_ORDER_COUNTRY: &str = "Order Country";
pub const COL_ORDER_CUSTOMER_ID: &str = "Order Customer Id";
pub const COL_ORDER_DATE: &str = "order date (DateOrders)";
pub const COL_ORDER_ID: &str = "Order Id";
pub const COL_ORDER_ITEM_CARDPROD_ID: &str = "Order Item Cardprod Id";
pub const COL_ORDER_ITEM_DISCOUNT: &str = "Order Item Discount";
pub const COL_ORDER_ITEM_DISCOUNT_RATE: &str = "Order Item Discount Rate";
pub const COL_ORDER_ITEM_PRODUCT_PRICE: &str = "Order Item Product Price";
pub const COL_ORDER_ITEM_PROFIT_RATIO: &str = "Order Item Profit Ratio";
pub const COL_ORDER_ITEM_QUANTITY: &str = "Order Item Quantity";
pub const COL_SALES: &str = "Sales";
pub const COL_ORDER_ITEM_TOTAL: &str = "Order Item Total";
pub const COL_ORDER_PROFIT_PER_ORDER: &str = "Order Profit Per Order";
pub const COL_ORDER_REGION: &str = "Order Region";
pub const COL_ORDER_STATE: &str = "Order State";
pub const COL_ORDER_STATUS: &str = "Order Status";
pub const COL_PRODUCT_CARD_ID: &str = "Product Card Id";
pub const COL_PRODUCT_CATEGORY_ID: &str = "Product Category Id";
pub const COL_PRODUCT_NAME: &str = "Product Name";
pub const COL_PRODUCT_PRICE: &str = "Product Price";
pub const COL_SHIPPING_DATE: &str = "shipping date (DateOrders)";
pub const COL_SHIPPING_MODE: &str = "Shipping Mode";

/// The full source header, in export order.
pub const SOURCE_COLUMNS: [&str; 41] = [
    COL_TYPE,
    COL_DAYS_SHIPPING_REAL,
    COL_DAYS_SHIPMENT_SCHEDULED,
    COL_BENEFIT_PER_ORDER,
    COL_SALES_PER_CUSTOMER,
    COL_DELIVERY_STATUS,
    COL_LATE_DELIVERY_RISK,
    COL_CATEGORY_ID,
    COL_CATEGORY_NAME,
    COL_CUSTOMER_CITY,
    COL_CUSTOMER_COUNTRY,
    COL_CUSTOMER_ID,
    COL_CUSTOMER_SEGMENT,
    COL_CUSTOMER_STATE,
    COL_CUSTOMER_ZIPCODE,
    COL_DEPARTMENT_ID,
    COL_DEPARTMENT_NAME,
    COL_MARKET,
    COL_ORDER_CITY,
    COL_ORDER_COUNTRY,
    COL_ORDER_CUSTOMER_ID,
    COL_ORDER_DATE,
    COL_ORDER_ID,
    COL_ORDER_ITEM_CARDPROD_ID,
    COL_ORDER_ITEM_DISCOUNT,
    COL_ORDER_ITEM_DISCOUNT_RATE,
    COL_ORDER_ITEM_PRODUCT_PRICE,
    COL_ORDER_ITEM_PROFIT_RATIO,
    COL_ORDER_ITEM_QUANTITY,
    COL_SALES,
    COL_ORDER_ITEM_TOTAL,
    COL_ORDER_PROFIT_PER_ORDER,
    COL_ORDER_REGION,
    COL_ORDER_STATE,
    COL_ORDER_STATUS,
    COL_PRODUCT_CARD_ID,
    COL_PRODUCT_CATEGORY_ID,
    COL_PRODUCT_NAME,
    COL_PRODUCT_PRICE,
    COL_SHIPPING_DATE,
    COL_SHIPPING_MODE,
];

/// Metrics recomputable from base fields, plus the duplicated product id.
pub const DERIVED_COLUMNS: [&str; 11] = [
    COL_DAYS_SHIPPING_REAL,
    COL_DAYS_SHIPMENT_SCHEDULED,
    COL_BENEFIT_PER_ORDER,
    COL_SALES_PER_CUSTOMER,
    COL_DELIVERY_STATUS,
    COL_LATE_DELIVERY_RISK,
    COL_ORDER_ITEM_PROFIT_RATIO,
    COL_SALES,
    COL_ORDER_ITEM_TOTAL,
    COL_ORDER_PROFIT_PER_ORDER,
    COL_ORDER_ITEM_CARDPROD_ID,
];

// Target tables
pub const TABLE_CUSTOMER: &str = "customer";
pub const TABLE_CUSTOMER_SEGMENT: &str = "customer_segment";
pub const TABLE_PRODUCT: &str = "product";
pub const TABLE_CATEGORY: &str = "category";
pub const TABLE_ORDERS: &str = "orders";
pub const TABLE_SHIPPING_MODE: &str = "shipping_mode";
pub const TABLE_PAYMENT_TYPE: &str = "payment_type";
pub const TABLE_ORDER_ITEM: &str = "order_item";

/// Export order: dimensions before the tables that reference them.
pub const EXPORT_ORDER: [&str; 8] = [
    TABLE_CUSTOMER_SEGMENT,
    TABLE_CATEGORY,
    TABLE_PAYMENT_TYPE,
    TABLE_SHIPPING_MODE,
    TABLE_CUSTOMER,
    TABLE_PRODUCT,
    TABLE_ORDERS,
    TABLE_ORDER_ITEM,
];

// Target columns
pub const CUSTOMER_ID: &str = "customer_id";
pub const SEGMENT_ID: &str = "segment_id";
pub const SEGMENT_NAME: &str = "segment_name";
pub const PRODUCT_ID: &str = "product_id";
pub const CATEGORY_ID: &str = "category_id";
pub const ORDER_ID: &str = "order_id";
pub const ORDER_DATE: &str = "order_date";
pub const SHIPPING_DATE: &str = "shipping_date";
pub const SHIPPING_MODE_ID: &str = "shipping_mode_id";
pub const MODE_NAME: &str = "mode_name";
pub const PAYMENT_ID: &str = "payment_id";
pub const TYPE_NAME: &str = "type_name";
pub const CITY: &str = "city";
pub const STATE: &str = "state";
pub const COUNTRY: &str = "country";
pub const ZIPCODE: &str = "zipcode";

pub const MANIFEST_FILE: &str = "manifest.json";

/// File name for an exported table.
pub fn table_file_name(table: &str) -> String {
    format!("{table}.csv")
}
