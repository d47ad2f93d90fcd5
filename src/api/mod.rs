//! REST client for the café backend.
//!
//! [`CafeApi`] is the seam the business logic talks to. [`HttpCafeApi`] implements it over
//! HTTP with the base URL taken from configuration; tests substitute a scripted double.

mod http;
pub mod models;

pub use http::HttpCafeApi;

use crate::{
    core::{
        admin::{DashboardStats, OrderRecord, OrderStatus, UserRecord},
        history::HistoryEntry,
        menu::{MenuItem, ValidMenuItem},
        order::Order,
    },
    errors::Result,
};
use async_trait::async_trait;

/// Operations offered by the backend.
#[async_trait]
pub trait CafeApi: Send + Sync {
    /// `GET /api/menu/all`
    async fn list_menu(&self) -> Result<Vec<MenuItem>>;

    /// `POST /api/menu/add` as multipart form data. Returns the stored item when the
    /// backend echoes it.
    async fn add_menu_item(&self, item: &ValidMenuItem) -> Result<Option<MenuItem>>;

    /// `PUT /api/menu/update/{id}` as multipart form data; the image part is optional.
    async fn update_menu_item(&self, id: &str, item: &ValidMenuItem) -> Result<()>;

    /// `DELETE /api/menu/delete/{id}`
    async fn delete_menu_item(&self, id: &str) -> Result<()>;

    /// `POST /api/orders/place`. Returns the backend order id when one is sent back.
    async fn place_order(&self, order: &Order) -> Result<Option<String>>;

    /// `GET /api/orders`
    async fn list_orders(&self) -> Result<Vec<OrderRecord>>;

    /// `PUT /api/orders/{id}/status`
    async fn update_order_status(&self, id: &str, status: OrderStatus) -> Result<()>;

    /// `GET /api/orders/user/{email}`
    async fn user_orders(&self, email: &str) -> Result<Vec<HistoryEntry>>;

    /// `GET /api/admin/users`
    async fn list_users(&self) -> Result<Vec<UserRecord>>;

    /// `GET /api/admin/stats`
    async fn admin_stats(&self) -> Result<DashboardStats>;

    /// `PUT /api/users/phone`
    async fn update_phone(&self, email: &str, phone: &str) -> Result<()>;
}
