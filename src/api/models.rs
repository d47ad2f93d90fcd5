//! Wire shapes of backend responses and request bodies.
//!
//! Responses share an envelope: a `success` flag, an optional `message`, and the payload
//! under an endpoint-specific key. Some endpoints omit the flag entirely.

use crate::{
    core::{
        admin::{OrderRecord, OrderStatus, UserRecord},
        menu::MenuItem,
    },
    errors::{Error, Result},
};
use serde::{Deserialize, Serialize};

/// Common response envelope.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    /// Outcome flag, absent on some endpoints
    #[serde(default)]
    pub success: Option<bool>,
    /// Explanation on failure
    #[serde(default)]
    pub message: Option<String>,
    /// Endpoint-specific payload
    #[serde(flatten)]
    pub payload: T,
}

impl<T> Envelope<T> {
    /// Accepts the payload unless the backend explicitly answered `success: false`.
    ///
    /// # Errors
    /// Returns [`Error::Api`] with the backend message on rejection.
    pub fn accepted(self) -> Result<T> {
        match self.success {
            Some(false) => Err(Error::Api {
                message: self.message,
            }),
            _ => Ok(self.payload),
        }
    }

    /// Accepts the payload only when the backend answered `success: true`.
    ///
    /// # Errors
    /// Returns [`Error::Api`] with the backend message otherwise.
    pub fn confirmed(self) -> Result<T> {
        match self.success {
            Some(true) => Ok(self.payload),
            _ => Err(Error::Api {
                message: self.message,
            }),
        }
    }
}

/// Payload of endpoints that only acknowledge.
#[derive(Debug, Default, Deserialize)]
pub struct NoPayload {}

/// Payload of `GET /api/menu/all`.
#[derive(Debug, Default, Deserialize)]
pub struct MenuPayload {
    /// Menu items
    #[serde(default)]
    pub items: Vec<MenuItem>,
}

/// Payload of `POST /api/menu/add`.
#[derive(Debug, Default, Deserialize)]
pub struct MenuItemPayload {
    /// Stored item, when echoed
    #[serde(default)]
    pub item: Option<MenuItem>,
}

/// Payload of the order list endpoints.
#[derive(Debug, Deserialize)]
pub struct OrdersPayload<T = OrderRecord> {
    /// Orders
    #[serde(default = "Vec::new")]
    pub orders: Vec<T>,
}

/// Payload of `POST /api/orders/place`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedOrderPayload {
    /// Backend order id, when returned
    #[serde(default)]
    pub order_id: Option<String>,
}

/// Payload of `GET /api/admin/users`.
#[derive(Debug, Default, Deserialize)]
pub struct UsersPayload {
    /// Registered users
    #[serde(default)]
    pub users: Vec<UserRecord>,
}

/// Body of `PUT /api/orders/{id}/status`.
#[derive(Debug, Serialize)]
pub struct StatusUpdate {
    /// New status
    pub status: OrderStatus,
}

/// Body of `PUT /api/users/phone`.
#[derive(Debug, Serialize)]
pub struct PhoneUpdate<'a> {
    /// Account email
    pub email: &'a str,
    /// Phone number to keep on file
    pub phone: &'a str,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::history::HistoryEntry;

    #[test]
    fn test_menu_envelope_success() {
        let envelope: Envelope<MenuPayload> = serde_json::from_str(
            r#"{"success":true,"items":[{"name":"Latte","price":150,"category":"HOT COFFEE"}]}"#,
        )
        .unwrap();
        let payload = envelope.confirmed().unwrap();
        assert_eq!(payload.items.len(), 1);
    }

    #[test]
    fn test_rejection_carries_message() {
        let envelope: Envelope<NoPayload> =
            serde_json::from_str(r#"{"success":false,"message":"Item exists"}"#).unwrap();
        match envelope.accepted() {
            Err(Error::Api { message }) => assert_eq!(message.as_deref(), Some("Item exists")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_missing_flag() {
        let envelope: Envelope<OrdersPayload> = serde_json::from_str(r#"{"orders":[]}"#).unwrap();
        assert!(envelope.accepted().is_ok());

        let envelope: Envelope<OrdersPayload<HistoryEntry>> =
            serde_json::from_str(r#"{"success":true}"#).unwrap();
        assert!(envelope.confirmed().unwrap().orders.is_empty());

        let envelope: Envelope<PlacedOrderPayload> = serde_json::from_str("{}").unwrap();
        assert!(matches!(
            envelope.confirmed(),
            Err(Error::Api { message: None })
        ));
    }
}
