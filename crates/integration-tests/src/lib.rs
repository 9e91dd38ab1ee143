//! Integration tests for Oussaili.
//!
//! Every test spawns the full storefront router on an ephemeral port, backed
//! by the in-memory document store and identity provider, and talks to it
//! over HTTP with a cookie-carrying client.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p oussaili-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `access` - Guard redirects and API status codes
//! - `cart` - Cart mutations and HTMX responses
//! - `checkout` - Order placement
//! - `admin` - Back-office product, order, and role management
//! - `health` - Liveness and readiness

#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use std::sync::Arc;

use oussaili_core::{Email, NewProduct, Price, Product, Role};
use oussaili_storefront::config::StorefrontConfig;
use oussaili_storefront::db::{ProductRepository, ProfileRepository};
use oussaili_storefront::documents::MemoryDocumentStore;
use oussaili_storefront::services::auth::MemoryAuthProvider;
use oussaili_storefront::state::AppState;
use reqwest::{Client, Response, redirect};
use serde_json::Value;

/// Password used for every test account.
pub const PASSWORD: &str = "correct-horse";

/// A running storefront plus handles on its backends.
pub struct TestApp {
    pub base_url: String,
    pub store: Arc<MemoryDocumentStore>,
    pub auth: Arc<MemoryAuthProvider>,
}

impl TestApp {
    /// Start the storefront on a random local port.
    pub async fn spawn() -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let store = Arc::new(MemoryDocumentStore::new());
        let auth = Arc::new(MemoryAuthProvider::new());
        let state = AppState::with_backends(
            StorefrontConfig::for_memory_backend(base_url.clone()),
            store.clone(),
            auth.clone(),
        );
        let app = oussaili_storefront::app(state);

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            store,
            auth,
        }
    }

    /// A fresh visitor: own cookie jar, redirects left unfollowed.
    #[must_use]
    pub fn visitor(&self) -> Visitor {
        let client = Client::builder()
            .cookie_store(true)
            .redirect(redirect::Policy::none())
            .build()
            .unwrap();
        Visitor {
            client,
            base_url: self.base_url.clone(),
        }
    }

    /// A visitor with a fresh customer account, already signed in.
    pub async fn customer(&self, email: &str) -> Visitor {
        let visitor = self.visitor();
        let response = visitor.register(email).await;
        assert_eq!(location(&response), Some("/"), "registration failed");
        visitor
    }

    /// A visitor signed in as an administrator.
    pub async fn admin(&self, email: &str) -> Visitor {
        let visitor = self.customer(email).await;
        self.set_role(email, Role::Admin).await;
        visitor
    }

    /// Change a profile's role directly in the store.
    pub async fn set_role(&self, email: &str, role: Role) {
        let repo = ProfileRepository::new(self.store.as_ref());
        let profile = repo
            .find_by_email(&Email::parse(email).unwrap())
            .await
            .unwrap()
            .expect("profile exists");
        repo.set_role(&profile.id, role).await.unwrap();
    }

    /// Insert a product directly in the store.
    pub async fn seed_product(&self, name: &str, category: &str, cents: u32) -> Product {
        ProductRepository::new(self.store.as_ref())
            .create(NewProduct {
                name: name.to_string(),
                description: format!("{name} for testing"),
                price: Price::from_cents(cents),
                category: category.to_string(),
                image_url: format!("https://img.example.com/{}.jpg", name.to_lowercase()),
                stock: 10,
                is_featured: None,
            })
            .await
            .unwrap()
    }
}

/// One browser: a client with its own session cookie.
pub struct Visitor {
    pub client: Client,
    base_url: String,
}

impl Visitor {
    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub async fn get(&self, path: &str) -> Response {
        self.client.get(self.url(path)).send().await.unwrap()
    }

    pub async fn get_json(&self, path: &str) -> Value {
        let response = self.get(path).await;
        assert!(response.status().is_success(), "GET {path}: {}", response.status());
        response.json().await.unwrap()
    }

    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> Response {
        self.client.post(self.url(path)).form(form).send().await.unwrap()
    }

    /// Post a form the way an `hx-post` element does.
    pub async fn htmx_post(&self, path: &str, form: &[(&str, &str)]) -> Response {
        self.client
            .post(self.url(path))
            .header("HX-Request", "true")
            .form(form)
            .send()
            .await
            .unwrap()
    }

    pub async fn register(&self, email: &str) -> Response {
        self.post_form(
            "/auth/register",
            &[
                ("email", email),
                ("password", PASSWORD),
                ("password_confirm", PASSWORD),
                ("display_name", "Test Shopper"),
            ],
        )
        .await
    }

    pub async fn login(&self, email: &str, password: &str) -> Response {
        self.post_form("/auth/login", &[("email", email), ("password", password)])
            .await
    }

    pub async fn logout(&self) -> Response {
        self.post_form("/auth/logout", &[]).await
    }

    pub async fn add_to_cart(&self, product: &Product) -> Response {
        self.post_form("/cart/add", &[("product_id", product.id.as_str())])
            .await
    }

    /// The cart as the JSON API reports it.
    pub async fn cart(&self) -> Value {
        self.get_json("/api/cart").await
    }
}

/// The `Location` header of a redirect, if any.
#[must_use]
pub fn location(response: &Response) -> Option<&str> {
    response
        .headers()
        .get("location")
        .and_then(|value| value.to_str().ok())
}

/// Total quantity across the cart's lines.
#[must_use]
pub fn cart_quantity(cart: &Value) -> u64 {
    cart["lines"]
        .as_array()
        .map_or(0, |lines| {
            lines
                .iter()
                .filter_map(|line| line["quantity"].as_u64())
                .sum()
        })
}
