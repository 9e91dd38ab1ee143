//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use oussaili_core::{Product, ProductId, StockHint};
use tracing::instrument;

use crate::db::ProductRepository;
use crate::error::Result;
use crate::middleware::PageContext;
use crate::routes::pages::NotFoundTemplate;
use crate::services::cart::SessionCart;
use crate::state::AppState;

// =============================================================================
// View Types
// =============================================================================

/// Product display data for templates.
#[derive(Clone)]
pub struct ProductView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: String,
    pub category: String,
    pub image_url: String,
    pub featured: bool,
    /// "Only 3 left" or "Out of stock"; `None` when comfortably in stock.
    pub stock_hint: Option<String>,
    pub out_of_stock: bool,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        let hint = product.stock_hint();
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price.display(),
            category: product.category.clone(),
            image_url: product.image_url.clone(),
            featured: product.featured(),
            stock_hint: stock_hint_label(hint),
            out_of_stock: hint == StockHint::OutOfStock,
        }
    }
}

fn stock_hint_label(hint: StockHint) -> Option<String> {
    match hint {
        StockHint::InStock => None,
        StockHint::Low(n) => Some(format!("Only {n} left")),
        StockHint::OutOfStock => Some("Out of stock".to_string()),
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub page: PageContext,
    pub product: ProductView,
    /// Units of this product already in the cart.
    pub in_cart: u32,
}

// =============================================================================
// Route Handlers
// =============================================================================

/// Display product detail page.
#[instrument(skip(state, page, cart))]
pub async fn show(
    State(state): State<AppState>,
    page: PageContext,
    cart: SessionCart,
    Path(id): Path<String>,
) -> Result<Response> {
    let id = ProductId::new(id);
    let Some(product) = ProductRepository::new(state.store()).get(&id).await? else {
        return Ok((
            StatusCode::NOT_FOUND,
            NotFoundTemplate {
                page,
                message: "Product not found".to_string(),
            },
        )
            .into_response());
    };

    Ok(ProductShowTemplate {
        in_cart: cart.cart().quantity_of(&product.id),
        product: ProductView::from(&product),
        page,
    }
    .into_response())
}

#[cfg(test)]
mod tests {
    use oussaili_core::Price;

    use super::*;

    fn product(stock: u32) -> Product {
        Product {
            id: ProductId::new("p1"),
            name: "Kettle".to_string(),
            description: "Boils water".to_string(),
            price: Price::from_cents(1999),
            category: "Home".to_string(),
            image_url: "https://img.example.com/kettle.png".to_string(),
            stock,
            is_featured: None,
        }
    }

    #[test]
    fn test_view_formats_price() {
        let view = ProductView::from(&product(10));
        assert_eq!(view.price, "$19.99");
        assert_eq!(view.stock_hint, None);
        assert!(!view.out_of_stock);
        assert!(!view.featured);
    }

    #[test]
    fn test_stock_hints() {
        assert_eq!(
            ProductView::from(&product(3)).stock_hint.as_deref(),
            Some("Only 3 left")
        );
        let empty = ProductView::from(&product(0));
        assert_eq!(empty.stock_hint.as_deref(), Some("Out of stock"));
        assert!(empty.out_of_stock);
    }
}
