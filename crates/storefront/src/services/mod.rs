//! Business logic services for storefront.
//!
//! # Services
//!
//! - `auth` - Identity provider clients (hosted and in-memory)
//! - `cart` - Session-persisted cart store
//! - `viewer` - Per-request resolution of the signed-in account
//! - `checkout` - Turning a cart into an order

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod viewer;
