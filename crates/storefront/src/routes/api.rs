//! JSON API route handlers.
//!
//! Same data and access rules as the HTML pages, but a missing sign-in is
//! answered with `401` and a missing role with `403` instead of a redirect.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use oussaili_core::{Cart, Order, Product, ProductDraft};
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use crate::db::{OrderRepository, ProductRepository};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::{RequireAdmin, RequireViewer};
use crate::routes::admin::{StoreStats, load_dashboard};
use crate::services::cart::SessionCart;
use crate::state::AppState;

/// Every product.
#[instrument(skip(state))]
pub async fn products(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    Ok(Json(ProductRepository::new(state.store()).list().await?))
}

/// The visitor's cart.
pub async fn cart(cart: SessionCart) -> Json<Cart> {
    Json(cart.cart().clone())
}

/// Orders visible to the viewer (all orders for administrators).
#[instrument(skip(state, viewer), fields(user_id = %viewer.uid))]
pub async fn orders(
    State(state): State<AppState>,
    RequireViewer(viewer): RequireViewer,
) -> Result<Json<Vec<Order>>> {
    let orders = OrderRepository::new(state.store())
        .list_visible(&viewer.uid, viewer.is_admin())
        .await?;
    Ok(Json(orders))
}

/// Dashboard figures.
#[instrument(skip(state, admin), fields(admin_id = %admin.uid))]
pub async fn stats(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<Json<StoreStats>> {
    let (products, orders, users) = load_dashboard(&state, &admin.uid).await?;
    Ok(Json(StoreStats::compute(&products, &orders, &users)))
}

/// Product creation payload.
///
/// Every field is optional at the serde level so that missing or out of
/// range values reach [`ProductDraft::parse`] and come back as field
/// messages instead of a deserializer error.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductPayload {
    pub name: String,
    pub description: String,
    pub price: Value,
    pub category: String,
    pub image_url: String,
    pub stock: Value,
    pub is_featured: Option<bool>,
}

fn scalar_text(value: Value) -> String {
    match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s,
        _ => String::new(),
    }
}

impl From<ProductPayload> for ProductDraft {
    fn from(payload: ProductPayload) -> Self {
        Self {
            name: payload.name,
            description: payload.description,
            price: scalar_text(payload.price),
            category: payload.category,
            image_url: payload.image_url,
            stock: scalar_text(payload.stock),
            is_featured: payload.is_featured.unwrap_or(false),
        }
    }
}

/// Create a product from a JSON payload. Invalid payloads get `400`.
#[instrument(skip(state, admin, payload), fields(admin_id = %admin.uid))]
pub async fn create_product(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    payload: std::result::Result<Json<ProductPayload>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(payload) = payload.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    let product = ProductDraft::from(payload).parse()?;
    let created = ProductRepository::new(state.store()).create(product).await?;
    add_breadcrumb("admin", "Product created", &[("product_id", created.id.as_str())]);
    Ok((StatusCode::CREATED, Json(created)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn payload(value: Value) -> ProductDraft {
        ProductDraft::from(serde_json::from_value::<ProductPayload>(value).unwrap())
    }

    #[test]
    fn test_payload_keeps_numbers_as_text() {
        let draft = payload(json!({
            "name": "Kettle",
            "price": 19.99,
            "stock": -3,
            "isFeatured": true
        }));
        assert_eq!(draft.price, "19.99");
        assert_eq!(draft.stock, "-3");
        assert!(draft.is_featured);
        assert!(draft.description.is_empty());
    }

    #[test]
    fn test_payload_negative_values_are_field_errors() {
        let errors = payload(json!({
            "name": "Kettle",
            "description": "Steel",
            "category": "kitchen",
            "imageUrl": "https://cdn.example.com/k.png",
            "price": -1,
            "stock": "-2"
        }))
        .parse()
        .unwrap_err();
        assert!(errors.has_field("price"));
        assert!(errors.has_field("stock"));
        assert!(!errors.has_field("name"));
    }

    #[test]
    fn test_payload_non_scalar_price_is_not_a_number() {
        let draft = payload(json!({ "price": [1], "stock": null }));
        assert!(draft.price.is_empty());
        assert!(draft.stock.is_empty());
    }
}
