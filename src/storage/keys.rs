//! Names of the persisted keys.

/// Cart used for delivery and pickup ordering.
pub const GLOBAL_CART: &str = "cart";
/// Snapshot of the last order placed from the global cart.
pub const GLOBAL_LAST_ORDER: &str = "lastOrder";
/// Local mirror of the orders placed from this device.
pub const ORDER_HISTORY: &str = "orderHistory";
/// Phone number most recently used at checkout.
pub const USER_PHONE: &str = "userPhone";

/// Cart key for a table.
#[must_use]
pub fn table_cart(table: &str) -> String {
    format!("table_{table}_cart")
}

/// Last order snapshot key for a table.
#[must_use]
pub fn table_last_order(table: &str) -> String {
    format!("table_{table}_last_order")
}
