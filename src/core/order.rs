//! Order submission - turns the current cart into an order and sends it once.
//!
//! [`OrderSubmission`] walks `Idle → ValidatingContact → Submitting → Confirmed | Failed`.
//! A validation failure drops back to `Idle` with a field-level error. Once the backend
//! accepts the order, the scoped cart is cleared and a snapshot of the order is kept for
//! the confirmation screen. Any failure after that point is logged and never turns a placed
//! order into a failed one. A failed submission leaves the cart exactly as it was; retrying
//! is up to the user.

use crate::{
    api::CafeApi,
    core::{
        cart::{Cart, CartController},
        contact::{self, ContactDetails},
        history::{self, HistoryEntry},
        table::{CartScope, Route, redirect_for},
    },
    errors::{Error, Result},
    storage::{self, KeyValueStore, keys},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

/// Fallback notification for a rejection without a backend message.
pub const REJECTION_FALLBACK_MESSAGE: &str = "Failed to place order";

/// Identity from the sign-in provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    email: Option<String>,
    name: Option<String>,
}

impl Session {
    /// No one is signed in.
    #[must_use]
    pub const fn anonymous() -> Self {
        Self {
            email: None,
            name: None,
        }
    }

    /// Signed in with `email`.
    #[must_use]
    pub fn signed_in(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            name: None,
        }
    }

    /// Builds a session from an optional email, treating a blank one as signed out.
    #[must_use]
    pub fn from_email(email: Option<&str>) -> Self {
        email
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map_or_else(Self::anonymous, Self::signed_in)
    }

    /// Adds the display name the provider knows.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Signed-in email, if any.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Display name, if known.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// Contact details as entered at checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckoutRequest {
    /// Phone number
    pub phone: String,
    /// Customer name, collected for table orders
    pub name: Option<String>,
}

/// One ordered item in the submitted payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    /// Item name
    pub name: String,
    /// Normalized unit price
    pub price: f64,
    /// Units ordered
    pub quantity: u32,
}

/// The payload sent to `POST /api/orders/place`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Table the order was placed from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_id: Option<String>,
    /// Name the order is for
    pub customer_name: String,
    /// Contact number
    pub phone_number: String,
    /// Account that placed the order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
    /// Ordered items with normalized prices
    pub items: Vec<OrderLine>,
    /// Sum of price times quantity
    pub total: f64,
    /// Submission time
    pub order_time: DateTime<Utc>,
}

impl Order {
    /// Builds the payload from the cart and validated contact details.
    ///
    /// Table orders are named by the customer. Global orders fall back to the session name,
    /// then the session email.
    ///
    /// # Errors
    /// Returns [`Error::InvalidPrice`] if a cart price cannot be normalized.
    pub fn from_cart(
        cart: &Cart,
        scope: &CartScope,
        contact: ContactDetails,
        session: &Session,
        order_time: DateTime<Utc>,
    ) -> Result<Self> {
        let items = cart
            .items()
            .iter()
            .map(|item| {
                Ok(OrderLine {
                    name: item.name.clone(),
                    price: item.price.amount()?,
                    quantity: item.quantity,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let customer_name = contact
            .name
            .or_else(|| session.name().map(str::to_string))
            .or_else(|| session.email().map(str::to_string))
            .unwrap_or_default();

        Ok(Self {
            table_id: scope.table().map(|t| t.as_str().to_string()),
            customer_name,
            phone_number: contact.phone,
            user_email: session.email().map(str::to_string),
            items,
            total: cart.total()?,
            order_time,
        })
    }
}

/// What the confirmation screen shows about the last order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastOrderSnapshot {
    /// Name the order is for
    pub customer_name: String,
    /// Contact number
    pub phone_number: String,
    /// Table the order came from
    #[serde(default)]
    pub table_id: Option<String>,
    /// Submission time
    pub order_time: DateTime<Utc>,
    /// Backend or locally generated order id
    #[serde(default)]
    pub order_id: Option<String>,
    /// Ordered items
    #[serde(default)]
    pub items: Vec<OrderLine>,
    /// Order total
    #[serde(default)]
    pub total: f64,
}

impl LastOrderSnapshot {
    fn new(order: &Order, order_id: Option<String>) -> Self {
        Self {
            customer_name: order.customer_name.clone(),
            phone_number: order.phone_number.clone(),
            table_id: order.table_id.clone(),
            order_time: order.order_time,
            order_id,
            items: order.items.clone(),
            total: order.total,
        }
    }
}

/// Reads the snapshot of the last order placed from `scope`.
///
/// # Errors
/// Returns a storage or deserialization error.
pub async fn load_last_order<S: KeyValueStore + ?Sized>(
    store: &S,
    scope: &CartScope,
) -> Result<Option<LastOrderSnapshot>> {
    storage::load_json(store, &scope.last_order_key()).await
}

/// Phone number remembered from the last global checkout.
///
/// # Errors
/// Returns a storage error.
pub async fn remembered_phone<S: KeyValueStore + ?Sized>(store: &S) -> Result<Option<String>> {
    store.get(keys::USER_PHONE).await
}

/// Where the submission flow stands.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SubmissionState {
    /// Waiting for the user
    #[default]
    Idle,
    /// Checking phone and name
    ValidatingContact,
    /// Request in flight
    Submitting,
    /// Backend accepted the order
    Confirmed {
        /// Screen to show next
        route: Route,
    },
    /// Submission failed; the cart is untouched
    Failed {
        /// Notification shown to the user
        message: String,
    },
}

/// Result of an accepted order.
#[derive(Debug, Clone, PartialEq)]
pub struct Confirmation {
    /// The payload that was sent
    pub order: Order,
    /// Backend order id, or a generated one for global orders
    pub order_id: Option<String>,
    /// Screen to show next
    pub route: Route,
}

/// Route to send the user to after a failed submission, if any.
#[must_use]
pub fn failure_route(error: &Error, scope: &CartScope) -> Option<Route> {
    match error {
        Error::EmptyCart => Some(scope.menu_route()),
        other => redirect_for(other),
    }
}

/// Drives one checkout at a time.
#[derive(Debug, Default)]
pub struct OrderSubmission {
    state: SubmissionState,
}

impl OrderSubmission {
    /// A flow in the `Idle` state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &SubmissionState {
        &self.state
    }

    /// Validates contact details and submits the cart as an order.
    ///
    /// Nothing is sent when the global cart is checked out without a session, when the
    /// cart is empty, or when validation fails; those leave the flow `Idle`. Transport
    /// failures and rejections leave it `Failed` with the message to show.
    ///
    /// # Errors
    /// Returns [`Error::SignInRequired`], [`Error::EmptyCart`], a validation error, or the
    /// API error that made the submission fail. See [`failure_route`] for redirects.
    #[instrument(skip_all, fields(scope = ?cart.scope()))]
    pub async fn submit<A, S>(
        &mut self,
        api: &A,
        cart: &mut CartController<'_, S>,
        request: &CheckoutRequest,
        session: &Session,
    ) -> Result<Confirmation>
    where
        A: CafeApi + ?Sized,
        S: KeyValueStore + ?Sized,
    {
        self.state = SubmissionState::Idle;
        let scope = cart.scope().clone();

        if matches!(scope, CartScope::Global) && session.email().is_none() {
            return Err(Error::SignInRequired);
        }
        if cart.cart().is_empty() {
            return Err(Error::EmptyCart);
        }

        self.state = SubmissionState::ValidatingContact;
        let name_required = scope.table().is_some();
        let order =
            contact::validate_contact(&request.phone, request.name.as_deref(), name_required)
                .and_then(|contact| {
                    Order::from_cart(cart.cart(), &scope, contact, session, Utc::now())
                });
        let order = match order {
            Ok(order) => order,
            Err(e) => {
                self.state = SubmissionState::Idle;
                return Err(e);
            }
        };

        self.state = SubmissionState::Submitting;
        let order_id = match api.place_order(&order).await {
            Ok(order_id) => order_id,
            Err(e) => {
                let message = e.user_message(REJECTION_FALLBACK_MESSAGE);
                if e.is_transport() {
                    error!("Order placement failed: {}", e);
                } else {
                    warn!("Order rejected: {}", e);
                }
                self.state = SubmissionState::Failed { message };
                return Err(e);
            }
        };

        let route = scope.confirmation_route();
        self.state = SubmissionState::Confirmed {
            route: route.clone(),
        };
        info!(
            "Order placed: {} items, total {}",
            order.items.len(),
            order.total
        );

        let order_id = match scope {
            CartScope::Global => Some(order_id.unwrap_or_else(history::generate_order_id)),
            CartScope::Table(_) => order_id,
        };
        Self::record(api, cart, &order, order_id.as_deref()).await;

        Ok(Confirmation {
            order,
            order_id,
            route,
        })
    }

    async fn record<A, S>(
        api: &A,
        cart: &mut CartController<'_, S>,
        order: &Order,
        order_id: Option<&str>,
    ) where
        A: CafeApi + ?Sized,
        S: KeyValueStore + ?Sized,
    {
        let scope = cart.scope().clone();
        if let Err(e) = cart.clear().await {
            warn!("Failed to clear cart after order: {}", e);
        }

        let store = cart.store();
        let snapshot = LastOrderSnapshot::new(order, order_id.map(str::to_string));
        if let Err(e) = storage::save_json(store, &scope.last_order_key(), &snapshot).await {
            warn!("Failed to save last order: {}", e);
        }

        if !matches!(scope, CartScope::Global) {
            return;
        }

        if let Some(order_id) = order_id {
            let entry = HistoryEntry::from_order(order, order_id.to_string());
            if let Err(e) = history::append_local(store, entry).await {
                warn!("Failed to record order history: {}", e);
            }
        }
        if let Err(e) = store.set(keys::USER_PHONE, &order.phone_number).await {
            warn!("Failed to remember phone number: {}", e);
        }
        if let Some(email) = &order.user_email {
            if let Err(e) = api.update_phone(email, &order.phone_number).await {
                warn!("Failed to update phone on file: {}", e);
            }
        }
    }
}
