//! Shopper's in-progress selection.
//!
//! The cart is plain in-memory data: no operation can fail, and the total is
//! recomputed from the lines after every mutation so it can never drift.
//! Persisting the cart is the caller's job (see the storefront's cart store).

use serde::{Deserialize, Serialize};

use crate::models::{OrderItem, Product};
use crate::types::{Price, ProductId};

/// A product with a positive quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product: Product,
    pub quantity: u32,
}

impl CartLine {
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.product.price.times(self.quantity)
    }
}

/// Ordered cart lines plus their derived total.
///
/// Invariants:
/// - at most one line per product id
/// - every line has a quantity of at least 1
/// - `total` equals the sum of `price × quantity` over the lines
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "CartSnapshot")]
pub struct Cart {
    lines: Vec<CartLine>,
    total: Price,
}

/// Wire form of a persisted cart. Loading re-establishes the invariants, so a
/// stale or hand-edited snapshot cannot smuggle in a wrong total.
#[derive(Deserialize)]
struct CartSnapshot {
    #[serde(default)]
    lines: Vec<CartLine>,
}

impl From<CartSnapshot> for Cart {
    fn from(snapshot: CartSnapshot) -> Self {
        let mut cart = Self::new();
        for line in snapshot.lines.into_iter().filter(|l| l.quantity > 0) {
            match cart.position(&line.product.id) {
                Some(i) => {
                    if let Some(existing) = cart.lines.get_mut(i) {
                        existing.quantity = existing.quantity.saturating_add(line.quantity);
                    }
                }
                None => cart.lines.push(line),
            }
        }
        cart.recompute();
        cart
    }
}

impl Cart {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            lines: Vec::new(),
            total: Price::ZERO,
        }
    }

    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub const fn total(&self) -> Price {
        self.total
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of units across all lines (navbar badge).
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines
            .iter()
            .fold(0u32, |acc, line| acc.saturating_add(line.quantity))
    }

    /// Quantity of `product_id`, or zero when absent.
    #[must_use]
    pub fn quantity_of(&self, product_id: &ProductId) -> u32 {
        self.position(product_id)
            .and_then(|i| self.lines.get(i))
            .map_or(0, |line| line.quantity)
    }

    /// Add one unit of `product`.
    ///
    /// Increments the existing line or appends a new one with quantity 1.
    /// Stock is not checked; the storefront only shows a hint.
    pub fn add_item(&mut self, product: Product) {
        match self.position(&product.id).and_then(|i| self.lines.get_mut(i)) {
            Some(line) => line.quantity = line.quantity.saturating_add(1),
            None => self.lines.push(CartLine {
                product,
                quantity: 1,
            }),
        }
        self.recompute();
    }

    /// Remove the line for `product_id`. Unknown ids are a no-op.
    pub fn remove_item(&mut self, product_id: &ProductId) {
        self.lines.retain(|line| &line.product.id != product_id);
        self.recompute();
    }

    /// Set the quantity of `product_id`.
    ///
    /// Zero or negative quantities remove the line. There is no upper bound
    /// beyond `u32::MAX`. Unknown ids are a no-op.
    pub fn update_quantity(&mut self, product_id: &ProductId, quantity: i64) {
        if quantity <= 0 {
            self.remove_item(product_id);
            return;
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        if let Some(line) = self.position(product_id).and_then(|i| self.lines.get_mut(i)) {
            line.quantity = quantity;
        }
        self.recompute();
    }

    /// Empty the cart. The total becomes exactly zero.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.total = Price::ZERO;
    }

    /// Snapshot the lines for an order. Later product edits do not affect it.
    #[must_use]
    pub fn to_order_items(&self) -> Vec<OrderItem> {
        self.lines
            .iter()
            .map(|line| OrderItem {
                product_id: line.product.id.clone(),
                name: line.product.name.clone(),
                price: line.product.price,
                quantity: line.quantity,
                image_url: Some(line.product.image_url.clone()).filter(|url| !url.is_empty()),
            })
            .collect()
    }

    fn position(&self, product_id: &ProductId) -> Option<usize> {
        self.lines
            .iter()
            .position(|line| &line.product.id == product_id)
    }

    fn recompute(&mut self) {
        self.total = self.lines.iter().map(CartLine::line_total).sum();
    }
}
