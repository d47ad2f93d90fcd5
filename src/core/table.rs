//! Ordering context - which cart is in use and where the user goes next.
//!
//! In-venue ordering is keyed by a table code printed on a QR sticker. Only codes from the
//! configured allow-list are accepted; anything else sends the user back home before a
//! single cart key is read or written.

use crate::errors::{Error, Result};
use crate::storage::keys;
use std::fmt;

/// A validated table identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableId(String);

impl TableId {
    /// Validates `raw` against `allowed`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidTable`] when `raw` is not in the allow-list.
    pub fn parse<S: AsRef<str>>(raw: &str, allowed: &[S]) -> Result<Self> {
        let trimmed = raw.trim();
        if allowed.iter().any(|table| table.as_ref() == trimmed) {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(Error::InvalidTable {
                table: raw.to_string(),
            })
        }
    }

    /// The identifier as text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which cart an operation works on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CartScope {
    /// Delivery and pickup ordering
    Global,
    /// In-venue ordering at one table
    Table(TableId),
}

impl CartScope {
    /// Resolves an optional raw table code into a scope.
    ///
    /// # Errors
    /// Returns [`Error::InvalidTable`] for codes outside the allow-list.
    pub fn resolve<S: AsRef<str>>(raw_table: Option<&str>, allowed: &[S]) -> Result<Self> {
        raw_table.map_or(Ok(Self::Global), |raw| {
            TableId::parse(raw, allowed).map(Self::Table)
        })
    }

    /// Storage key of this scope's cart.
    #[must_use]
    pub fn cart_key(&self) -> String {
        match self {
            Self::Global => keys::GLOBAL_CART.to_string(),
            Self::Table(table) => keys::table_cart(table.as_str()),
        }
    }

    /// Storage key of this scope's last order snapshot.
    #[must_use]
    pub fn last_order_key(&self) -> String {
        match self {
            Self::Global => keys::GLOBAL_LAST_ORDER.to_string(),
            Self::Table(table) => keys::table_last_order(table.as_str()),
        }
    }

    /// The table, if this is a table scope.
    #[must_use]
    pub const fn table(&self) -> Option<&TableId> {
        match self {
            Self::Global => None,
            Self::Table(table) => Some(table),
        }
    }

    /// Where to browse the menu from this scope.
    #[must_use]
    pub fn menu_route(&self) -> Route {
        match self {
            Self::Global => Route::Menu,
            Self::Table(table) => Route::TableMenu(table.clone()),
        }
    }

    /// Where this scope's cart is shown.
    #[must_use]
    pub fn cart_route(&self) -> Route {
        match self {
            Self::Global => Route::Cart,
            Self::Table(table) => Route::TableCart(table.clone()),
        }
    }

    /// Where to go after an order from this scope succeeds.
    #[must_use]
    pub fn confirmation_route(&self) -> Route {
        match self {
            Self::Global => Route::OrderConfirmation,
            Self::Table(table) => Route::TableOrderSuccess(table.clone()),
        }
    }
}

/// Screens the front end can be sent to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Landing page
    Home,
    /// Global menu
    Menu,
    /// Global cart
    Cart,
    /// Menu for one table
    TableMenu(TableId),
    /// Cart for one table
    TableCart(TableId),
    /// Confirmation after a global order
    OrderConfirmation,
    /// Confirmation after a table order
    TableOrderSuccess(TableId),
    /// Sign-in page of the auth provider
    SignIn,
    /// The signed-in user's past orders
    OrderHistory,
}

impl Route {
    /// URL path of the screen.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Home => "/".to_string(),
            Self::Menu => "/menu-page".to_string(),
            Self::Cart => "/cart".to_string(),
            Self::TableMenu(table) => format!("/table/{table}"),
            Self::TableCart(table) => format!("/table/{table}/cart"),
            Self::OrderConfirmation => "/order-confirmation".to_string(),
            Self::TableOrderSuccess(table) => format!("/table/{table}/order-success"),
            Self::SignIn => "/api/auth/signin".to_string(),
            Self::OrderHistory => "/order-history".to_string(),
        }
    }
}

/// Route an error redirects to, if any.
#[must_use]
pub const fn redirect_for(error: &Error) -> Option<Route> {
    match error {
        Error::InvalidTable { .. } => Some(Route::Home),
        Error::SignInRequired => Some(Route::SignIn),
        _ => None,
    }
}
