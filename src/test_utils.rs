//! Shared test utilities for `cafe-order`.
//!
//! This module provides database and tracing setup, sample data with sensible defaults,
//! and two doubles: [`FakeCafeApi`], a scripted backend, and [`CountingStore`], a store
//! that records how often it was touched.
#![allow(clippy::unwrap_used)]

use crate::{
    api::CafeApi,
    core::{
        admin::{DashboardStats, OrderRecord, OrderStatus, UserRecord},
        cart::CartItem,
        history::{HistoryEntry, HistoryLine},
        menu::{MenuItem, ValidMenuItem},
        order::{Order, OrderLine},
        price::PriceValue,
        table::{CartScope, TableId},
    },
    errors::{Error, Result},
    storage::{KeyValueStore, MemoryStore},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use std::sync::{
    Mutex,
    atomic::{AtomicUsize, Ordering},
};
use tracing_subscriber::EnvFilter;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all store tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Routes `tracing` output through the test harness. Safe to call from every test.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

/// Creates a cart entry with sensible defaults.
///
/// # Defaults
/// * `quantity`: 1
/// * `img`: `"/images/{name}.jpg"`
/// * `description`: empty
pub fn cart_item(name: &str, price: f64) -> CartItem {
    CartItem {
        name: name.to_string(),
        price: PriceValue::Amount(price),
        quantity: 1,
        img: format!("/images/{}.jpg", name.to_lowercase()),
        description: String::new(),
    }
}

/// Creates a menu item as the backend would serve it.
pub fn menu_item(name: &str, price: f64, category: &str) -> MenuItem {
    MenuItem {
        id: format!("id-{}", name.to_lowercase().replace(' ', "-")),
        name: name.to_string(),
        description: format!("{name} from the kitchen"),
        price: PriceValue::Amount(price),
        category: category.to_string(),
        img: format!("/images/{}.jpg", name.to_lowercase()),
    }
}

/// Scope of table `id`, which must be one of 1-10.
pub fn table_scope(id: &str) -> CartScope {
    let allowed: Vec<String> = (1..=10).map(|n| n.to_string()).collect();
    CartScope::Table(TableId::parse(id, &allowed).unwrap())
}

/// The canonical test order: two lattes at ₹150 for Asha at table 3.
pub fn sample_order() -> Order {
    Order {
        table_id: Some("3".to_string()),
        customer_name: "Asha".to_string(),
        phone_number: "9876543210".to_string(),
        user_email: None,
        items: vec![OrderLine {
            name: "Latte".to_string(),
            price: 150.0,
            quantity: 2,
        }],
        total: 300.0,
        order_time: "2026-10-19T10:00:00Z".parse::<DateTime<Utc>>().unwrap(),
    }
}

/// Creates an order as listed by the backend.
///
/// # Defaults
/// * one Momos at ₹90 for Ravi at table 2
pub fn order_record(id: &str, status: OrderStatus) -> OrderRecord {
    OrderRecord {
        id: id.to_string(),
        table_id: "2".to_string(),
        customer_name: "Ravi".to_string(),
        phone_number: "9876543210".to_string(),
        items: vec![HistoryLine {
            name: "Momos".to_string(),
            quantity: 1,
            price: PriceValue::Amount(90.0),
        }],
        total: 90.0,
        status,
        order_time: "2026-10-19T10:00:00Z".to_string(),
    }
}

/// Creates a registered user.
///
/// # Defaults
/// * one completed order `o-{name}` worth ₹90, which is also the total spent
pub fn user_record(email: &str, name: &str) -> UserRecord {
    UserRecord {
        id: format!("u-{}", name.to_lowercase()),
        email: email.to_string(),
        name: Some(name.to_string()),
        image: None,
        created_at: Some("2026-01-02T03:04:05.000Z".to_string()),
        total_spent: Some(90.0),
        orders: vec![order_record(
            &format!("o-{}", name.to_lowercase()),
            OrderStatus::Completed,
        )],
    }
}

/// How [`FakeCafeApi`] answers `place_order`.
#[derive(Debug, Clone)]
pub enum PlaceBehavior {
    /// `success: true`, optionally with a backend id
    Accept(Option<String>),
    /// `success: false` with an optional message
    Reject(Option<String>),
    /// The backend could not be reached
    Transport,
}

impl Default for PlaceBehavior {
    fn default() -> Self {
        Self::Accept(None)
    }
}

#[derive(Debug, Default)]
struct FakeState {
    menu: Vec<MenuItem>,
    orders: Vec<OrderRecord>,
    user_orders: Vec<HistoryEntry>,
    users: Vec<UserRecord>,
    stats: DashboardStats,
    place: PlaceBehavior,
    placed: Vec<Order>,
    place_attempts: usize,
    list_orders_calls: usize,
    fail_order_listing: bool,
    phone_updates: Vec<(String, String)>,
    fail_phone_updates: bool,
    status_updates: Vec<(String, OrderStatus)>,
    menu_updates: Vec<String>,
}

/// In-process backend double. Records every call and answers from scripted state.
#[derive(Debug, Default)]
pub struct FakeCafeApi {
    state: Mutex<FakeState>,
}

impl FakeCafeApi {
    /// A backend that accepts every order and has no data.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the answer to `place_order`.
    pub fn set_place_behavior(&self, behavior: PlaceBehavior) {
        self.state.lock().unwrap().place = behavior;
    }

    /// Replaces the menu.
    pub fn set_menu(&self, menu: Vec<MenuItem>) {
        self.state.lock().unwrap().menu = menu;
    }

    /// Replaces the order list.
    pub fn set_orders(&self, orders: Vec<OrderRecord>) {
        self.state.lock().unwrap().orders = orders;
    }

    /// Replaces the per-user history.
    pub fn set_user_orders(&self, orders: Vec<HistoryEntry>) {
        self.state.lock().unwrap().user_orders = orders;
    }

    /// Replaces the registered users.
    pub fn set_users(&self, users: Vec<UserRecord>) {
        self.state.lock().unwrap().users = users;
    }

    /// Replaces the dashboard stats.
    pub fn set_stats(&self, stats: DashboardStats) {
        self.state.lock().unwrap().stats = stats;
    }

    /// Makes every phone update fail.
    pub fn fail_phone_updates(&self) {
        self.state.lock().unwrap().fail_phone_updates = true;
    }

    /// Makes every order listing fail as if the backend were down.
    pub fn fail_order_listing(&self) {
        self.state.lock().unwrap().fail_order_listing = true;
    }

    /// Current menu.
    pub fn menu(&self) -> Vec<MenuItem> {
        self.state.lock().unwrap().menu.clone()
    }

    /// Orders the backend accepted.
    pub fn placed_orders(&self) -> Vec<Order> {
        self.state.lock().unwrap().placed.clone()
    }

    /// Number of `place_order` calls, accepted or not.
    pub fn place_attempts(&self) -> usize {
        self.state.lock().unwrap().place_attempts
    }

    /// Number of `list_orders` calls.
    pub fn list_orders_calls(&self) -> usize {
        self.state.lock().unwrap().list_orders_calls
    }

    /// `(email, phone)` pairs sent to the phone endpoint.
    pub fn phone_updates(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().phone_updates.clone()
    }

    /// `(id, status)` pairs sent to the status endpoint.
    pub fn status_updates(&self) -> Vec<(String, OrderStatus)> {
        self.state.lock().unwrap().status_updates.clone()
    }

    /// Ids of menu items that were updated.
    pub fn menu_updates(&self) -> Vec<String> {
        self.state.lock().unwrap().menu_updates.clone()
    }
}

fn not_found(what: &str) -> Error {
    Error::Api {
        message: Some(format!("{what} not found")),
    }
}

#[async_trait]
impl CafeApi for FakeCafeApi {
    async fn list_menu(&self) -> Result<Vec<MenuItem>> {
        Ok(self.menu())
    }

    async fn add_menu_item(&self, item: &ValidMenuItem) -> Result<Option<MenuItem>> {
        let mut state = self.state.lock().unwrap();
        let stored = MenuItem {
            id: format!("m{}", state.menu.len() + 1),
            name: item.name.clone(),
            description: item.description.clone(),
            price: PriceValue::Amount(item.price),
            category: item.category.clone(),
            img: item
                .image
                .as_ref()
                .map(|image| format!("https://cdn.example.com/{}", image.file_name))
                .unwrap_or_default(),
        };
        state.menu.push(stored.clone());
        Ok(Some(stored))
    }

    async fn update_menu_item(&self, id: &str, item: &ValidMenuItem) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.menu_updates.push(id.to_string());
        if let Some(existing) = state.menu.iter_mut().find(|m| m.id == id) {
            existing.name.clone_from(&item.name);
            existing.description.clone_from(&item.description);
            existing.price = PriceValue::Amount(item.price);
            existing.category.clone_from(&item.category);
        }
        Ok(())
    }

    async fn delete_menu_item(&self, id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let before = state.menu.len();
        state.menu.retain(|m| m.id != id);
        if state.menu.len() == before {
            return Err(not_found("Item"));
        }
        Ok(())
    }

    async fn place_order(&self, order: &Order) -> Result<Option<String>> {
        let mut state = self.state.lock().unwrap();
        state.place_attempts += 1;
        match state.place.clone() {
            PlaceBehavior::Accept(order_id) => {
                state.placed.push(order.clone());
                Ok(order_id)
            }
            PlaceBehavior::Reject(message) => Err(Error::Api { message }),
            PlaceBehavior::Transport => Err(Error::Status {
                status: 503,
                endpoint: "/api/orders/place".to_string(),
            }),
        }
    }

    async fn list_orders(&self) -> Result<Vec<OrderRecord>> {
        let mut state = self.state.lock().unwrap();
        state.list_orders_calls += 1;
        if state.fail_order_listing {
            return Err(Error::Status {
                status: 503,
                endpoint: "/api/orders".to_string(),
            });
        }
        Ok(state.orders.clone())
    }

    async fn update_order_status(&self, id: &str, status: OrderStatus) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let order = state
            .orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| not_found("Order"))?;
        order.status = status;
        state.status_updates.push((id.to_string(), status));
        Ok(())
    }

    async fn user_orders(&self, _email: &str) -> Result<Vec<HistoryEntry>> {
        Ok(self.state.lock().unwrap().user_orders.clone())
    }

    async fn list_users(&self) -> Result<Vec<UserRecord>> {
        Ok(self.state.lock().unwrap().users.clone())
    }

    async fn admin_stats(&self) -> Result<DashboardStats> {
        Ok(self.state.lock().unwrap().stats.clone())
    }

    async fn update_phone(&self, email: &str, phone: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_phone_updates {
            return Err(Error::Status {
                status: 500,
                endpoint: "/api/users/phone".to_string(),
            });
        }
        state
            .phone_updates
            .push((email.to_string(), phone.to_string()));
        Ok(())
    }
}

/// A [`MemoryStore`] that counts every access.
#[derive(Debug, Default)]
pub struct CountingStore {
    inner: MemoryStore,
    accesses: AtomicUsize,
}

impl CountingStore {
    /// An empty store with a zero count.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads, writes, and removals so far.
    pub fn accesses(&self) -> usize {
        self.accesses.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeyValueStore for CountingStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.accesses.fetch_add(1, Ordering::SeqCst);
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.accesses.fetch_add(1, Ordering::SeqCst);
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.accesses.fetch_add(1, Ordering::SeqCst);
        self.inner.remove(key).await
    }
}
