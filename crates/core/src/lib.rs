//! Oussaili Core - Shared domain library.
//!
//! This crate provides the domain types and the two pieces of self-contained
//! logic used by the Oussaili components:
//! - `storefront` - Public storefront and admin back-office (web binary)
//! - `cli` - Operator tools (role management, catalogue seeding)
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no HTTP
//! clients, no async runtime. Everything here can be unit-tested in isolation.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for document ids, prices, emails, statuses and roles
//! - [`models`] - Product, order and user profile documents
//! - [`validation`] - Schema checks run before every product/order write
//! - [`cart`] - Cart line aggregation and total computation
//! - [`access`] - Authentication resolution and role-gated access decisions

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod access;
pub mod cart;
pub mod models;
pub mod types;
pub mod validation;

pub use access::{AccessGuard, AuthGate, AuthState, GuardDecision, Principal};
pub use cart::{Cart, CartLine};
pub use models::*;
pub use types::*;
pub use validation::{ProductDraft, Validate, ValidationError, ValidationErrors};

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::{Price, ProductDraft};

    #[test]
    fn test_product_draft_reexported() {
        let draft = ProductDraft {
            name: "Argan oil".into(),
            description: "Cold pressed".into(),
            price: "0".into(),
            category: "beauty".into(),
            image_url: "https://cdn.example.com/argan.png".into(),
            stock: "3".into(),
            is_featured: false,
        };
        let product = draft.parse().unwrap();
        assert_eq!(product.price, Price::ZERO);
        assert_eq!(product.stock, 3);
    }
}
