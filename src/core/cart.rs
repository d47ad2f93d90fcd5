//! Cart business logic - add, change, and remove entries and keep the store in sync.
//!
//! A cart is an ordered list of entries, unique by item name. Every mutation made through
//! [`CartController`] is written back to the [`KeyValueStore`] under the key of the
//! controller's [`CartScope`], so a cart survives restarts and table carts never see each
//! other's entries.

use crate::{
    core::{menu::MenuItem, price::PriceValue, table::CartScope},
    errors::{Error, Result},
    storage::{self, KeyValueStore},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// One line of the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    /// Item name, also the identity of the entry
    pub name: String,
    /// Unit price, numeric or currency-formatted
    pub price: PriceValue,
    /// Number of units, at least 1
    pub quantity: u32,
    /// Image reference
    #[serde(default)]
    pub img: String,
    /// Item description
    #[serde(default)]
    pub description: String,
}

impl CartItem {
    /// Unit price times quantity.
    pub fn line_total(&self) -> Result<f64> {
        Ok(self.price.amount()? * f64::from(self.quantity))
    }
}

impl From<&MenuItem> for CartItem {
    fn from(item: &MenuItem) -> Self {
        Self {
            name: item.name.clone(),
            price: item.price.clone(),
            quantity: 1,
            img: item.img.clone(),
            description: item.description.clone(),
        }
    }
}

/// The entries of one cart, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// Builds a cart from entries as stored.
    #[must_use]
    pub const fn from_items(items: Vec<CartItem>) -> Self {
        Self { items }
    }

    /// Entries in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Returns true when the cart has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of price times quantity over all entries.
    ///
    /// # Errors
    /// Returns [`Error::InvalidPrice`] if any entry's price cannot be normalized.
    pub fn total(&self) -> Result<f64> {
        self.items
            .iter()
            .try_fold(0.0, |sum, item| -> Result<f64> {
                Ok(sum + item.line_total()?)
            })
    }

    /// Total number of units across entries.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }
}

fn positive_quantity(quantity: i64) -> Result<u32> {
    match u32::try_from(quantity) {
        Ok(q) if q >= 1 => Ok(q),
        _ => Err(Error::InvalidQuantity { quantity }),
    }
}

/// In-memory cart bound to a store and a scope.
pub struct CartController<'a, S: KeyValueStore + ?Sized> {
    store: &'a S,
    scope: CartScope,
    cart: Cart,
}

impl<'a, S: KeyValueStore + ?Sized> CartController<'a, S> {
    /// Loads the cart for `scope`. A missing key is an empty cart.
    ///
    /// # Errors
    /// Returns an error if the store fails or holds a value that is not a cart.
    #[instrument(skip(store))]
    pub async fn load(store: &'a S, scope: CartScope) -> Result<Self> {
        let cart: Cart = storage::load_json(store, &scope.cart_key())
            .await?
            .unwrap_or_default();
        debug!("Loaded cart with {} entries", cart.items.len());
        Ok(Self { store, scope, cart })
    }

    /// Resolves a raw table code and loads the matching cart.
    ///
    /// The code is checked against `allowed` before the store is touched, so a rejected
    /// table never reads or writes a cart key.
    ///
    /// # Errors
    /// Returns [`Error::InvalidTable`] for codes outside the allow-list, or a load error.
    pub async fn open<T: AsRef<str>>(
        store: &'a S,
        raw_table: Option<&str>,
        allowed: &[T],
    ) -> Result<Self> {
        let scope = CartScope::resolve(raw_table, allowed)?;
        Self::load(store, scope).await
    }

    /// Store this controller writes to.
    #[must_use]
    pub const fn store(&self) -> &'a S {
        self.store
    }

    /// Scope this controller writes to.
    #[must_use]
    pub const fn scope(&self) -> &CartScope {
        &self.scope
    }

    /// Current cart contents.
    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Current entries in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        self.cart.items()
    }

    /// See [`Cart::total`].
    ///
    /// # Errors
    /// Returns [`Error::InvalidPrice`] if any entry's price cannot be normalized.
    pub fn total(&self) -> Result<f64> {
        self.cart.total()
    }

    /// See [`Cart::item_count`].
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.cart.item_count()
    }

    /// Adds `quantity` units of `item`.
    ///
    /// An entry with the same name has its quantity increased; otherwise a new entry is
    /// appended with the given quantity. The quantity carried by `item` itself is ignored.
    ///
    /// # Errors
    /// Returns [`Error::InvalidQuantity`] for quantities below 1, [`Error::InvalidPrice`]
    /// when a new entry's price cannot be normalized, or a storage error.
    #[instrument(skip(self, item), fields(item = %item.name))]
    pub async fn add_item(&mut self, item: CartItem, quantity: i64) -> Result<()> {
        let quantity = positive_quantity(quantity)?;

        if let Some(existing) = self.cart.items.iter_mut().find(|e| e.name == item.name) {
            existing.quantity = existing
                .quantity
                .checked_add(quantity)
                .ok_or_else(|| Error::InvalidQuantity {
                    quantity: i64::from(quantity),
                })?;
        } else {
            item.price.amount()?;
            self.cart.items.push(CartItem { quantity, ..item });
        }

        self.persist().await?;
        info!("Added {} to cart ({} units total)", quantity, self.item_count());
        Ok(())
    }

    /// Sets the quantity of the entry at `index`.
    ///
    /// Quantities below 1 are ignored and leave the cart untouched; use
    /// [`CartController::remove_item`] to drop an entry. Returns whether the cart changed.
    ///
    /// # Errors
    /// Returns [`Error::ItemNotFound`] for an index past the end, or a storage error.
    #[instrument(skip(self))]
    pub async fn update_quantity(&mut self, index: usize, new_quantity: i64) -> Result<bool> {
        let Ok(quantity) = positive_quantity(new_quantity) else {
            debug!("Ignoring quantity {} below 1", new_quantity);
            return Ok(false);
        };

        let entry = self
            .cart
            .items
            .get_mut(index)
            .ok_or(Error::ItemNotFound { index })?;
        entry.quantity = quantity;

        self.persist().await?;
        Ok(true)
    }

    /// Removes and returns the entry at `index`.
    ///
    /// # Errors
    /// Returns [`Error::ItemNotFound`] for an index past the end, or a storage error.
    #[instrument(skip(self))]
    pub async fn remove_item(&mut self, index: usize) -> Result<CartItem> {
        if index >= self.cart.items.len() {
            return Err(Error::ItemNotFound { index });
        }
        let removed = self.cart.items.remove(index);

        self.persist().await?;
        info!("Removed {} from cart", removed.name);
        Ok(removed)
    }

    /// Empties the cart and deletes its storage key.
    ///
    /// # Errors
    /// Returns a storage error.
    #[instrument(skip(self))]
    pub async fn clear(&mut self) -> Result<()> {
        self.cart.items.clear();
        self.store.remove(&self.scope.cart_key()).await
    }

    async fn persist(&self) -> Result<()> {
        storage::save_json(self.store, &self.scope.cart_key(), &self.cart).await
    }
}
