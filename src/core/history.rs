//! Order history - the remote per-user list and the local mirror kept after checkout.

use crate::{
    api::CafeApi,
    core::{
        order::{Order, Session},
        price::PriceValue,
    },
    errors::{Error, Result},
    storage::{self, KeyValueStore, keys},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use uuid::Uuid;

/// Prefix of locally generated order ids.
pub const LOCAL_ORDER_PREFIX: &str = "ORD";

const LOCAL_ORDER_SUFFIX_LEN: usize = 9;

/// One line of a past order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryLine {
    /// Item name
    pub name: String,
    /// Units ordered
    pub quantity: u32,
    /// Unit price, numeric or formatted
    pub price: PriceValue,
}

/// A past order as shown in the history view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Order number shown to the customer, empty when the backend sent none
    #[serde(default)]
    pub order_id: String,
    /// Backend document id
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub backend_id: Option<String>,
    /// Ordered lines
    #[serde(default)]
    pub items: Vec<HistoryLine>,
    /// Order total
    #[serde(default)]
    pub total: f64,
    /// When the order was placed, as sent by the backend
    #[serde(default)]
    pub order_time: String,
    /// Account that placed the order
    #[serde(default)]
    pub user_email: String,
    /// Contact number given at checkout
    #[serde(default)]
    pub phone_number: String,
    /// Backend status, absent for orders only known locally
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl HistoryEntry {
    /// Builds the local mirror entry for a placed order.
    #[must_use]
    pub fn from_order(order: &Order, order_id: String) -> Self {
        Self {
            order_id,
            backend_id: None,
            items: order
                .items
                .iter()
                .map(|line| HistoryLine {
                    name: line.name.clone(),
                    quantity: line.quantity,
                    price: PriceValue::Amount(line.price),
                })
                .collect(),
            total: order.total,
            order_time: order.order_time.to_rfc3339(),
            user_email: order.user_email.clone().unwrap_or_default(),
            phone_number: order.phone_number.clone(),
            status: None,
        }
    }

    /// Identifier to show: the order number, else the backend id.
    #[must_use]
    pub fn display_id(&self) -> &str {
        if self.order_id.is_empty() {
            self.backend_id.as_deref().unwrap_or_default()
        } else {
            &self.order_id
        }
    }

    /// Status with its first letter capitalized, `Pending` when unknown.
    #[must_use]
    pub fn status_label(&self) -> String {
        let status = self.status.as_deref().map(str::trim).unwrap_or_default();
        let mut chars = status.chars();
        chars.next().map_or_else(
            || "Pending".to_string(),
            |first| first.to_uppercase().chain(chars).collect(),
        )
    }
}

/// Generates an id like `ORD4F9A0C21B` for orders the backend did not number.
#[must_use]
pub fn generate_order_id() -> String {
    let random = Uuid::new_v4().simple().to_string().to_uppercase();
    format!(
        "{LOCAL_ORDER_PREFIX}{}",
        &random[..LOCAL_ORDER_SUFFIX_LEN]
    )
}

/// Orders recorded on this device, oldest first.
///
/// # Errors
/// Returns a storage or deserialization error.
pub async fn local_history<S: KeyValueStore + ?Sized>(store: &S) -> Result<Vec<HistoryEntry>> {
    Ok(storage::load_json(store, keys::ORDER_HISTORY)
        .await?
        .unwrap_or_default())
}

/// Appends an entry to the local mirror.
///
/// # Errors
/// Returns a storage or deserialization error.
#[instrument(skip(store, entry), fields(order_id = %entry.order_id))]
pub async fn append_local<S: KeyValueStore + ?Sized>(store: &S, entry: HistoryEntry) -> Result<()> {
    let mut history = local_history(store).await?;
    history.push(entry);
    storage::save_json(store, keys::ORDER_HISTORY, &history).await?;
    debug!("Local history now holds {} orders", history.len());
    Ok(())
}

/// Fetches the signed-in user's orders from the backend.
///
/// # Errors
/// Returns [`Error::SignInRequired`] without a session email, otherwise any API error.
#[instrument(skip(api, session))]
pub async fn fetch_user_history<A: CafeApi + ?Sized>(
    api: &A,
    session: &Session,
) -> Result<Vec<HistoryEntry>> {
    let email = session.email().ok_or(Error::SignInRequired)?;
    api.user_orders(email).await
}
