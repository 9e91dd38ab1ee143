//! Turning the shopper's cart into an order.

use chrono::Utc;
use oussaili_core::{NewOrder, Order, OrderStatus, PaymentMethod};
use tracing::instrument;

use crate::db::{OrderRepository, RepositoryError};
use crate::documents::DocumentStore;
use crate::services::cart::{CartStorage, CartStore};
use crate::services::viewer::Viewer;

/// Result of a checkout attempt that did not fail.
#[derive(Debug)]
pub enum CheckoutOutcome {
    /// Order written; the cart has been cleared.
    Placed(Order),
    /// Nothing to order.
    EmptyCart,
}

/// Snapshot the cart into a pending order and clear the cart on success.
///
/// The cart is left untouched when the write fails.
///
/// # Errors
///
/// Returns `RepositoryError` if the order fails validation or cannot be
/// written.
#[instrument(skip(store, viewer, cart), fields(user_id = %viewer.uid))]
pub async fn place_order<S: CartStorage>(
    store: &dyn DocumentStore,
    viewer: &Viewer,
    cart: &mut CartStore<S>,
    payment_method: PaymentMethod,
) -> Result<CheckoutOutcome, RepositoryError> {
    if cart.cart().is_empty() {
        return Ok(CheckoutOutcome::EmptyCart);
    }

    let order = NewOrder {
        user_id: viewer.uid.clone(),
        user_email: viewer.email.clone(),
        items: cart.to_order_items(),
        total: cart.cart().total(),
        status: OrderStatus::Pending,
        payment_method,
        created_at: Utc::now(),
    };

    let placed = OrderRepository::new(store).create(order).await?;
    cart.clear().await;
    Ok(CheckoutOutcome::Placed(placed))
}
