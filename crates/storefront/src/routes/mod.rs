//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Catalogue (?category=, ?q=)
//! GET  /about                  - About page
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (document store reachable)
//!
//! # Products
//! GET  /product/{id}           - Product detail
//!
//! # Cart (HTMX fragments)
//! GET  /cart                   - Cart page with checkout form
//! POST /cart/add               - Add to cart (returns count badge, triggers cart-updated)
//! POST /cart/update            - Update quantity (returns cart_items fragment)
//! POST /cart/remove            - Remove item (returns cart_items fragment)
//! GET  /cart/count             - Cart count badge (fragment)
//!
//! # Checkout (requires auth)
//! POST /checkout               - Place a pending order from the cart
//!
//! # Auth
//! GET  /auth                   - Sign-in and registration forms
//! POST /auth/login             - Login action
//! POST /auth/register          - Register action
//! POST /auth/logout            - Logout action
//!
//! # Profile (requires auth)
//! GET  /profile                - Profile card and order history
//! POST /profile/name           - Change display name
//!
//! # Admin (requires administrator)
//! GET  /admin                  - Stats and products/orders/users tabs (?tab=)
//! POST /admin/products         - Create product
//! POST /admin/products/{id}    - Update product
//! POST /admin/products/{id}/delete - Delete product
//! POST /admin/orders/{id}/status   - Set order status
//! POST /admin/users/{id}/role      - Set user role
//!
//! # JSON API (401/403 instead of redirects)
//! GET  /api/products           - Every product
//! GET  /api/cart               - The visitor's cart
//! GET  /api/orders             - Orders visible to the viewer
//! GET  /api/admin/stats        - Dashboard figures
//! POST /api/admin/products     - Create product
//! ```

pub mod admin;
pub mod api;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod health;
pub mod home;
pub mod pages;
pub mod products;
pub mod profile;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(auth::page))
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .route("/logout", post(auth::logout))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/count", get(cart::count))
}

/// Create the profile routes router.
pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(profile::show))
        .route("/name", post(profile::update_name))
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(admin::index))
        .route("/products", post(admin::create_product))
        .route("/products/{id}", post(admin::update_product))
        .route("/products/{id}/delete", post(admin::delete_product))
        .route("/orders/{id}/status", post(admin::update_order_status))
        .route("/users/{id}/role", post(admin::update_user_role))
}

/// Create the JSON API routes router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(api::products))
        .route("/cart", get(api::cart))
        .route("/orders", get(api::orders))
        .route("/admin/stats", get(api::stats))
        .route("/admin/products", post(api::create_product))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Catalogue
        .route("/", get(home::home))
        .route("/product/{id}", get(products::show))
        .route("/about", get(pages::about))
        // Health
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        // Cart & checkout
        .nest("/cart", cart_routes())
        .route("/checkout", post(checkout::checkout))
        // Account
        .nest("/auth", auth_routes())
        .nest("/profile", profile_routes())
        // Back-office
        .nest("/admin", admin_routes())
        .nest("/api", api_routes())
        .fallback(pages::not_found)
}
