//! Unified error type for the café client.
//!
//! Every fallible operation in the crate returns [`Result`]. The variants line up with the
//! three kinds of failure a user can see: validation errors reported next to a field,
//! transport errors (network or unexpected HTTP status), and business rejections where the
//! backend answered `success: false`.

use std::fmt;
use thiserror::Error;

/// Generic message shown when a request never produced a usable answer.
pub const TRANSPORT_FALLBACK_MESSAGE: &str = "Server error. Please try again later.";

/// Form fields that can carry an inline validation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// Customer phone number
    Phone,
    /// Customer name
    Name,
    /// Menu item name
    ItemName,
    /// Menu item price
    Price,
    /// Menu item category
    Category,
    /// Menu item image upload
    Image,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Phone => "phone",
            Self::Name => "name",
            Self::ItemName => "item name",
            Self::Price => "price",
            Self::Category => "category",
            Self::Image => "image",
        };
        f.write_str(label)
    }
}

/// All errors produced by the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration file or environment could not be used
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Local database failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Stored or received JSON could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Network or protocol failure talking to the backend
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success HTTP status
    #[error("Unexpected HTTP status {status} from {endpoint}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Path that was requested
        endpoint: String,
    },

    /// Backend answered `success: false`
    #[error("Request rejected: {}", message.as_deref().unwrap_or("no message"))]
    Api {
        /// Message provided by the backend, if any
        message: Option<String>,
    },

    /// Quantity below one where a positive quantity is required
    #[error("Invalid quantity: {quantity}")]
    InvalidQuantity {
        /// Rejected quantity
        quantity: i64,
    },

    /// Price that cannot be normalized to a non-negative number
    #[error("Invalid price: {raw}")]
    InvalidPrice {
        /// The raw price as received
        raw: String,
    },

    /// Table identifier outside the allow-list
    #[error("Invalid table number: {table}")]
    InvalidTable {
        /// Rejected identifier
        table: String,
    },

    /// Cart position that does not exist
    #[error("No cart item at position {}", .index.saturating_add(1))]
    ItemNotFound {
        /// Zero-based index that was requested, displayed 1-based
        index: usize,
    },

    /// Field-level validation failure
    #[error("{message}")]
    Validation {
        /// Offending field
        field: Field,
        /// Message to show next to the field
        message: String,
    },

    /// Status change requested for an order that is no longer pending
    #[error("Order {id} is no longer pending")]
    OrderNotPending {
        /// Backend order identifier
        id: String,
    },

    /// Order id that the backend does not list
    #[error("Order {id} not found")]
    OrderNotFound {
        /// Backend order identifier
        id: String,
    },

    /// Checkout of the global cart requires a signed-in user
    #[error("Please sign in to continue")]
    SignInRequired,

    /// Checkout attempted with nothing in the cart
    #[error("Your cart is empty")]
    EmptyCart,

    /// I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Environment variable could not be read
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),
}

impl Error {
    /// Shorthand for a [`Error::Validation`] error.
    pub fn validation(field: Field, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Returns true for failures where the request never got a business answer.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Status { .. })
    }

    /// Text suitable for a user-facing notification.
    ///
    /// Rejections use the backend message when it sent one, otherwise `fallback`.
    /// Transport failures always get the generic server error text.
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Api {
                message: Some(message),
            } if !message.trim().is_empty() => message.clone(),
            Self::Api { .. } => fallback.to_string(),
            e if e.is_transport() => TRANSPORT_FALLBACK_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
