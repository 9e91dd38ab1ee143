//! Persisted shopper cart.
//!
//! [`CartStore`] wraps the pure [`Cart`] and writes a snapshot to its
//! [`CartStorage`] after every mutation. Storage failures never surface to
//! the shopper: loading falls back to an empty cart and saving only logs.

use axum::extract::FromRequestParts;
use axum::http::StatusCode;
use axum::http::request::Parts;
use oussaili_core::{Cart, OrderItem, Product, ProductId};
use tokio::sync::Mutex;
use tower_sessions::Session;

use crate::models::session::keys;

/// Errors from a cart storage backend.
#[derive(Debug, thiserror::Error)]
pub enum CartStorageError {
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
    #[error("cart storage unavailable")]
    Unavailable,
}

/// Where a cart snapshot lives between requests.
#[async_trait::async_trait]
pub trait CartStorage: Send + Sync {
    async fn load(&self) -> Result<Option<Cart>, CartStorageError>;
    async fn save(&self, cart: &Cart) -> Result<(), CartStorageError>;
}

/// Cart snapshot in the cookie session under the `oussaili-cart` key.
#[derive(Clone)]
pub struct SessionCartStorage {
    session: Session,
}

impl SessionCartStorage {
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }
}

#[async_trait::async_trait]
impl CartStorage for SessionCartStorage {
    async fn load(&self) -> Result<Option<Cart>, CartStorageError> {
        Ok(self.session.get::<Cart>(keys::CART).await?)
    }

    async fn save(&self, cart: &Cart) -> Result<(), CartStorageError> {
        Ok(self.session.insert(keys::CART, cart).await?)
    }
}

/// Cart snapshot held in memory, optionally failing every call.
#[derive(Debug, Default)]
pub struct MemoryCartStorage {
    slot: Mutex<Option<Cart>>,
    failing: bool,
}

impl MemoryCartStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage whose every load and save fails.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            slot: Mutex::new(None),
            failing: true,
        }
    }

    /// Storage pre-filled with a snapshot.
    #[must_use]
    pub fn with_cart(cart: Cart) -> Self {
        Self {
            slot: Mutex::new(Some(cart)),
            failing: false,
        }
    }

    /// The last saved snapshot.
    pub async fn snapshot(&self) -> Option<Cart> {
        self.slot.lock().await.clone()
    }
}

#[async_trait::async_trait]
impl CartStorage for MemoryCartStorage {
    async fn load(&self) -> Result<Option<Cart>, CartStorageError> {
        if self.failing {
            return Err(CartStorageError::Unavailable);
        }
        Ok(self.slot.lock().await.clone())
    }

    async fn save(&self, cart: &Cart) -> Result<(), CartStorageError> {
        if self.failing {
            return Err(CartStorageError::Unavailable);
        }
        *self.slot.lock().await = Some(cart.clone());
        Ok(())
    }
}

/// A cart bound to its storage.
pub struct CartStore<S> {
    storage: S,
    cart: Cart,
}

impl<S: CartStorage> CartStore<S> {
    /// Load the persisted cart, or start empty if none can be read.
    pub async fn load(storage: S) -> Self {
        let cart = match storage.load().await {
            Ok(cart) => cart.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load cart, starting empty");
                Cart::new()
            }
        };
        Self { storage, cart }
    }

    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    pub async fn add_item(&mut self, product: Product) {
        self.cart.add_item(product);
        self.persist().await;
    }

    pub async fn remove_item(&mut self, product_id: &ProductId) {
        self.cart.remove_item(product_id);
        self.persist().await;
    }

    pub async fn update_quantity(&mut self, product_id: &ProductId, quantity: i64) {
        self.cart.update_quantity(product_id, quantity);
        self.persist().await;
    }

    pub async fn clear(&mut self) {
        self.cart.clear();
        self.persist().await;
    }

    #[must_use]
    pub fn to_order_items(&self) -> Vec<OrderItem> {
        self.cart.to_order_items()
    }

    async fn persist(&self) {
        if let Err(e) = self.storage.save(&self.cart).await {
            tracing::warn!(error = %e, "Failed to persist cart");
        }
    }
}

/// Extractor for the session-backed cart.
pub type SessionCart = CartStore<SessionCartStorage>;

impl<St> FromRequestParts<St> for SessionCart
where
    St: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, state: &St) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state).await?;
        Ok(Self::load(SessionCartStorage::new(session)).await)
    }
}
