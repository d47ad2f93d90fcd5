//! Plain-text rendering of menus, carts, orders, and admin views.
//!
//! Every function returns a `String` so the output can be checked in tests. Positions shown
//! to the user are 1-based.

use crate::core::{
    admin::{DashboardStats, OrderBoard, OrderRecord, OrderStatus, UserRecord},
    cart::Cart,
    history::HistoryEntry,
    menu::MenuSection,
    order::{Confirmation, LastOrderSnapshot},
    price::format_rupees,
    table::Route,
};
use std::fmt::Write;

fn price_or_dash(amount: crate::errors::Result<f64>) -> String {
    amount.map_or_else(|_| "-".to_string(), format_rupees)
}

/// The menu grouped by category.
#[must_use]
pub fn menu(sections: &[MenuSection]) -> String {
    if sections.is_empty() {
        return "The menu is empty.".to_string();
    }
    let mut out = String::new();
    for section in sections {
        let _ = writeln!(out, "== {} ==", section.title());
        for item in &section.items {
            let _ = writeln!(
                out,
                "  {:<28} {:>8}",
                item.name,
                price_or_dash(item.price.amount())
            );
            if !item.description.is_empty() {
                let _ = writeln!(out, "    {}", item.description);
            }
        }
    }
    out
}

/// Cart lines with 1-based positions, the total, and the unit count.
#[must_use]
pub fn cart(cart: &Cart) -> String {
    if cart.is_empty() {
        return "Your cart is empty".to_string();
    }
    let mut out = String::new();
    for (position, item) in cart.items().iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>2}. {} - {} x {} = {}",
            position + 1,
            item.name,
            item.price,
            item.quantity,
            price_or_dash(item.line_total()),
        );
    }
    let _ = writeln!(out, "Total: {}", price_or_dash(cart.total()));
    let _ = write!(out, "View Cart ({})", cart.item_count());
    out
}

/// Success message for a placed order.
#[must_use]
pub fn confirmation(confirmation: &Confirmation) -> String {
    let mut out = String::from("✅ Order placed successfully!");
    if let Some(order_id) = &confirmation.order_id {
        let _ = write!(out, "\nOrder #{order_id}");
    }
    let _ = write!(
        out,
        "\nTotal: {}\n{}",
        format_rupees(confirmation.order.total),
        route(&confirmation.route)
    );
    match &confirmation.order.table_id {
        Some(table) => {
            let _ = write!(
                out,
                "\nYour order has been received and will be prepared shortly. \
                 Please wait at Table {table}."
            );
        }
        None => {
            let _ = write!(out, "\nPast orders: {}", route(&Route::OrderHistory));
        }
    }
    out
}

/// The snapshot kept after the last order.
#[must_use]
pub fn last_order(snapshot: &LastOrderSnapshot) -> String {
    let mut out = String::new();
    if let Some(order_id) = &snapshot.order_id {
        let _ = writeln!(out, "Order #{order_id}");
    }
    let _ = writeln!(out, "Name: {}", snapshot.customer_name);
    let _ = writeln!(out, "Phone: {}", snapshot.phone_number);
    if let Some(table) = &snapshot.table_id {
        let _ = writeln!(out, "Table: {table}");
    }
    let _ = writeln!(
        out,
        "Placed: {}",
        snapshot.order_time.format("%Y-%m-%d %H:%M")
    );
    for line in &snapshot.items {
        let _ = writeln!(out, "  {}x {}", line.quantity, line.name);
    }
    let _ = write!(out, "Total: {}", format_rupees(snapshot.total));
    out
}

/// Past orders, newest last.
#[must_use]
pub fn history(entries: &[HistoryEntry]) -> String {
    if entries.is_empty() {
        return "No orders yet.".to_string();
    }
    let mut out = String::new();
    for entry in entries {
        let _ = writeln!(
            out,
            "Order #{} [{}] {}",
            entry.display_id(),
            entry.status_label(),
            entry.order_time
        );
        for line in &entry.items {
            let _ = writeln!(out, "  {}x {} @ {}", line.quantity, line.name, line.price);
        }
        let _ = writeln!(out, "  Total: {}", format_rupees(entry.total));
    }
    out
}

fn status_marker(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Pending => "⏳",
        OrderStatus::Completed => "✅",
        OrderStatus::Cancelled => "❌",
    }
}

fn order_record(out: &mut String, order: &OrderRecord) {
    let table = if order.table_id.is_empty() {
        "online".to_string()
    } else {
        format!("table {}", order.table_id)
    };
    let _ = writeln!(
        out,
        "{} {} [{}] {} ({}, {}) {}",
        status_marker(order.status),
        order.id,
        order.status,
        table,
        order.customer_name,
        order.phone_number,
        order.order_time
    );
    for line in &order.items {
        let amount = line
            .price
            .amount()
            .map(|price| price * f64::from(line.quantity));
        let _ = writeln!(
            out,
            "    {}x {} - {}",
            line.quantity,
            line.name,
            price_or_dash(amount)
        );
    }
    let _ = writeln!(out, "    Total: {}", format_rupees(order.total));
}

/// The admin order board, with the last poll error if there was one.
#[must_use]
pub fn order_board(board: &OrderBoard) -> String {
    let mut out = String::new();
    if let Some(message) = board.last_error() {
        let _ = writeln!(out, "❌ {message}");
    }
    if board.orders().is_empty() {
        out.push_str("No orders found.");
        return out;
    }
    for order in board.orders() {
        order_record(&mut out, order);
    }
    let _ = write!(out, "{} pending", board.pending().count());
    out
}

/// Dashboard aggregates.
#[must_use]
pub fn stats(stats: &DashboardStats) -> String {
    format!(
        "Total Orders: {}\nPending Orders: {}\nRevenue: {}\nActive Users: {}\nVisitors: {}",
        stats.total_orders,
        stats.pending_orders,
        format_rupees(stats.revenue),
        stats.active_users,
        stats.visitor_count
    )
}

/// Registered users with their orders.
#[must_use]
pub fn users(users: &[UserRecord]) -> String {
    if users.is_empty() {
        return "No users found.".to_string();
    }
    let mut out = String::new();
    for user in users {
        let _ = writeln!(
            out,
            "{} <{}> - {} orders, spent {}",
            user.name.as_deref().unwrap_or("-"),
            user.email,
            user.orders.len(),
            format_rupees(user.total_spent.unwrap_or_default())
        );
        for order in &user.orders {
            let _ = writeln!(
                out,
                "    {} {} {} {}",
                order.id,
                order.status,
                format_rupees(order.total),
                order.order_time
            );
        }
    }
    out
}

/// Where the user should go next.
#[must_use]
pub fn route(route: &Route) -> String {
    format!("→ {}", route.path())
}
