//! Shopping cart.
//!
//! A cart line is one (product, size, color) combination. Its unit price is a
//! snapshot taken when the line is created and is never re-derived from the
//! product, so a later price edit does not change what the shopper saw.
//!
//! [`Cart`] is the plain data and its arithmetic. [`CartManager`] owns a
//! cart plus the [`StateStore`] it is persisted to and writes the full
//! snapshot after every mutation.

use serde::{Deserialize, Serialize};
use tienda_core::{Price, Product, ProductId};

use crate::storage::{CART_KEY, ClientStorage, StateStore};

/// One line of the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CartLine {
    /// `"{product_id}-{size}-{color}"`.
    pub key: String,
    pub product_id: ProductId,
    pub title: String,
    /// Unit price at the moment the line was added.
    pub price: Price,
    pub image: Option<String>,
    pub size: String,
    pub color: String,
    pub quantity: u32,
}

impl Default for CartLine {
    fn default() -> Self {
        Self {
            key: String::new(),
            product_id: ProductId::default(),
            title: String::new(),
            price: Price::ZERO,
            image: None,
            size: String::new(),
            color: String::new(),
            quantity: 1,
        }
    }
}

impl CartLine {
    /// Build the composite line key.
    #[must_use]
    pub fn key_for(product_id: &ProductId, size: &str, color: &str) -> String {
        format!("{product_id}-{size}-{color}")
    }

    /// A quantity-one line for `product` in the chosen size and color,
    /// priced at the product's current effective price.
    #[must_use]
    pub fn from_product(product: &Product, size: &str, color: &str) -> Self {
        Self {
            key: Self::key_for(&product.id, size, color),
            product_id: product.id.clone(),
            title: product.title.clone(),
            price: product.effective_price(),
            image: product.image_url.clone(),
            size: size.to_owned(),
            color: color.to_owned(),
            quantity: 1,
        }
    }

    /// Unit price times quantity.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.price.times(self.quantity)
    }
}

/// The cart contents, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Add a line. If a line with the same key exists its quantity goes up by
    /// one and the incoming quantity is ignored; otherwise the line is
    /// appended with its own quantity (at least one).
    pub fn add(&mut self, item: CartLine) {
        if let Some(line) = self.lines.iter_mut().find(|l| l.key == item.key) {
            line.quantity = line.quantity.saturating_add(1);
        } else {
            let quantity = item.quantity.max(1);
            self.lines.push(CartLine { quantity, ..item });
        }
    }

    /// Remove the line with `key`. Returns whether a line was removed.
    pub fn remove(&mut self, key: &str) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| l.key != key);
        self.lines.len() != before
    }

    /// Set the quantity of the line with `key`; zero removes it.
    /// Returns whether a line with that key existed.
    pub fn set_quantity(&mut self, key: &str, quantity: u32) -> bool {
        if quantity == 0 {
            return self.remove(key);
        }
        match self.lines.iter_mut().find(|l| l.key == key) {
            Some(line) => {
                line.quantity = quantity;
                true
            }
            None => false,
        }
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Sum of quantities.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Sum of unit price times quantity.
    #[must_use]
    pub fn total(&self) -> Price {
        self.lines.iter().map(CartLine::subtotal).sum()
    }

    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.key == key)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Drop lines a stored snapshot should never have held.
    fn sanitize(mut self) -> Self {
        self.lines.retain(|l| l.quantity > 0 && !l.key.is_empty());
        self
    }
}

/// Owns the shopper's cart and keeps its stored snapshot current.
#[derive(Debug)]
pub struct CartManager<S> {
    cart: Cart,
    store: StateStore<S>,
}

impl<S: ClientStorage> CartManager<S> {
    /// Load the cart from `store`; a missing or unreadable snapshot gives an
    /// empty cart.
    pub fn load(store: StateStore<S>) -> Self {
        let cart = store.load::<Cart>(CART_KEY).sanitize();
        Self { cart, store }
    }

    /// See [`Cart::add`].
    pub fn add(&mut self, item: CartLine) {
        tracing::debug!(key = %item.key, "Adding to cart");
        self.cart.add(item);
        self.persist();
    }

    /// Remove a line; absent keys are a no-op.
    pub fn remove(&mut self, key: &str) {
        if self.cart.remove(key) {
            self.persist();
        }
    }

    /// See [`Cart::set_quantity`].
    pub fn set_quantity(&mut self, key: &str, quantity: u32) -> bool {
        let found = self.cart.set_quantity(key, quantity);
        if found {
            self.persist();
        }
        found
    }

    /// Empty the cart unconditionally.
    pub fn clear(&mut self) {
        self.cart.clear();
        self.persist();
    }

    #[must_use]
    pub fn count(&self) -> u32 {
        self.cart.count()
    }

    #[must_use]
    pub fn total(&self) -> Price {
        self.cart.total()
    }

    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Give back the store, e.g. to flush a session-backed storage.
    pub fn into_store(self) -> StateStore<S> {
        self.store
    }

    fn persist(&mut self) {
        if let Err(e) = self.store.save(CART_KEY, &self.cart) {
            tracing::error!(error = %e, "Failed to persist cart");
        }
    }
}
