//! Admin back office - order status changes, the live order board, dashboard stats,
//! registered users, and menu maintenance.

use crate::{
    api::CafeApi,
    core::{
        history::HistoryLine,
        menu::{MenuItem, MenuItemForm},
    },
    errors::{Error, Result},
};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, instrument, warn};

/// Notification shown when an order poll fails.
pub const FETCH_ORDERS_FAILED: &str = "Failed to fetch orders";

/// Lifecycle of an order on the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Waiting to be prepared
    #[default]
    Pending,
    /// Served
    Completed,
    /// Called off
    Cancelled,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(label)
    }
}

/// An order as listed by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
    /// Backend identifier
    #[serde(rename = "_id")]
    pub id: String,
    /// Table the order came from, empty for global orders
    #[serde(default)]
    pub table_id: String,
    /// Name the order is for
    #[serde(default)]
    pub customer_name: String,
    /// Contact number
    #[serde(default)]
    pub phone_number: String,
    /// Ordered lines
    #[serde(default)]
    pub items: Vec<HistoryLine>,
    /// Order total
    #[serde(default)]
    pub total: f64,
    /// Current status
    #[serde(default)]
    pub status: OrderStatus,
    /// Submission time as sent by the backend
    #[serde(default)]
    pub order_time: String,
}

impl OrderRecord {
    /// Only pending orders can change status.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == OrderStatus::Pending
    }
}

/// Aggregates shown on the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardStats {
    /// Orders ever placed
    pub total_orders: u64,
    /// Revenue in rupees
    pub revenue: f64,
    /// Users with recent activity
    pub active_users: u64,
    /// Orders still pending
    pub pending_orders: u64,
    /// Site visitors
    pub visitor_count: u64,
}

/// A registered customer account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    /// Backend identifier
    #[serde(rename = "_id", default)]
    pub id: String,
    /// Account email
    pub email: String,
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
    /// Avatar URL
    #[serde(default)]
    pub image: Option<String>,
    /// Registration time
    #[serde(default)]
    pub created_at: Option<String>,
    /// Lifetime spend
    #[serde(default)]
    pub total_spent: Option<f64>,
    /// Orders placed by this user
    #[serde(default)]
    pub orders: Vec<OrderRecord>,
}

/// The admin's view of all orders, refreshed by polling.
#[derive(Debug, Clone, Default)]
pub struct OrderBoard {
    orders: Vec<OrderRecord>,
    last_error: Option<String>,
}

impl OrderBoard {
    /// An empty board.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Orders from the last successful refresh.
    #[must_use]
    pub fn orders(&self) -> &[OrderRecord] {
        &self.orders
    }

    /// Notification from the last refresh, if it failed.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Finds an order by backend id.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&OrderRecord> {
        self.orders.iter().find(|order| order.id == id)
    }

    /// Orders still waiting to be prepared.
    pub fn pending(&self) -> impl Iterator<Item = &OrderRecord> {
        self.orders.iter().filter(|order| order.is_pending())
    }

    /// Applies one poll result. A snapshot replaces the whole list; a failure keeps the
    /// previous list. Returns whether the list was replaced.
    pub fn apply(&mut self, snapshot: Result<Vec<OrderRecord>>) -> bool {
        match snapshot {
            Ok(orders) => {
                self.orders = orders;
                self.last_error = None;
                true
            }
            Err(e) => {
                warn!("Error fetching orders: {}", e);
                self.last_error = Some(FETCH_ORDERS_FAILED.to_string());
                false
            }
        }
    }

    /// Fetches the full list and applies it. A failed fetch is recorded on the board
    /// like a failed poll.
    pub async fn refresh<A: CafeApi + ?Sized>(&mut self, api: &A) -> bool {
        self.apply(api.list_orders().await)
    }
}

/// Moves a pending order to `status` and refreshes the board.
///
/// The board is reloaded first when it does not know the order yet.
///
/// # Errors
/// Returns [`Error::OrderNotFound`], [`Error::OrderNotPending`] for orders that already
/// left the pending state, or the API error from the reload or the update.
#[instrument(skip(api, board))]
pub async fn set_order_status<A: CafeApi + ?Sized>(
    api: &A,
    board: &mut OrderBoard,
    id: &str,
    status: OrderStatus,
) -> Result<()> {
    if board.find(id).is_none() {
        let orders = api.list_orders().await?;
        board.apply(Ok(orders));
    }
    let order = board.find(id).ok_or_else(|| Error::OrderNotFound { id: id.to_string() })?;
    if !order.is_pending() {
        return Err(Error::OrderNotPending { id: id.to_string() });
    }

    api.update_order_status(id, status).await?;
    info!("Order {} marked {}", id, status);
    board.refresh(api).await;
    Ok(())
}

/// Marks a pending order completed.
///
/// # Errors
/// See [`set_order_status`].
pub async fn complete_order<A: CafeApi + ?Sized>(
    api: &A,
    board: &mut OrderBoard,
    id: &str,
) -> Result<()> {
    set_order_status(api, board, id, OrderStatus::Completed).await
}

/// Marks a pending order cancelled.
///
/// # Errors
/// See [`set_order_status`].
pub async fn cancel_order<A: CafeApi + ?Sized>(
    api: &A,
    board: &mut OrderBoard,
    id: &str,
) -> Result<()> {
    set_order_status(api, board, id, OrderStatus::Cancelled).await
}

/// Validates the form and creates a menu item. An image is required.
///
/// # Errors
/// Returns a validation error before any request, or the API error.
#[instrument(skip_all, fields(name = %form.name))]
pub async fn create_menu_item<A: CafeApi + ?Sized>(
    api: &A,
    form: MenuItemForm,
) -> Result<Option<MenuItem>> {
    let item = form.validate(true)?;
    let stored = api.add_menu_item(&item).await?;
    info!("Menu item {} added", item.name);
    Ok(stored)
}

/// Validates the form and updates menu item `id`. The image is optional.
///
/// # Errors
/// Returns a validation error before any request, or the API error.
#[instrument(skip(api, form))]
pub async fn edit_menu_item<A: CafeApi + ?Sized>(
    api: &A,
    id: &str,
    form: MenuItemForm,
) -> Result<()> {
    let item = form.validate(false)?;
    api.update_menu_item(id, &item).await?;
    info!("Menu item {} updated", id);
    Ok(())
}
