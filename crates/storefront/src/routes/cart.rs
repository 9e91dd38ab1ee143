//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! The cart itself lives in the visitor's session under `oussaili-cart`;
//! every mutation goes through [`SessionCart`] so the snapshot is persisted
//! before the response is written. Plain form posts (no HTMX) get a redirect
//! back to the cart page instead of a fragment.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::HeaderMap,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use oussaili_core::{Cart, PaymentMethod, ProductId};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::db::ProductRepository;
use crate::error::add_breadcrumb;
use crate::middleware::{PageContext, flash, hx_trigger, is_htmx};
use crate::models::Toast;
use crate::services::cart::SessionCart;
use crate::state::AppState;

// =============================================================================
// View Types
// =============================================================================

/// Cart line display data for templates.
#[derive(Clone)]
pub struct CartLineView {
    pub product_id: String,
    pub name: String,
    pub image_url: String,
    pub quantity: u32,
    pub price: String,
    pub line_total: String,
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub total: String,
    pub item_count: u32,
}

impl CartView {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            lines: cart
                .lines()
                .iter()
                .map(|line| CartLineView {
                    product_id: line.product.id.to_string(),
                    name: line.product.name.clone(),
                    image_url: line.product.image_url.clone(),
                    quantity: line.quantity,
                    price: line.product.price.display(),
                    line_total: line.line_total().display(),
                })
                .collect(),
            total: cart.total().display(),
            item_count: cart.item_count(),
        }
    }
}

/// Payment method radio option.
#[derive(Clone)]
pub struct PaymentOptionView {
    pub value: String,
    pub label: String,
    pub instructions: Option<String>,
    pub checked: bool,
}

fn payment_options() -> Vec<PaymentOptionView> {
    PaymentMethod::ALL
        .into_iter()
        .map(|method| PaymentOptionView {
            value: method.as_str().to_string(),
            label: method.label().to_string(),
            instructions: method.instructions().map(ToString::to_string),
            checked: method == PaymentMethod::default(),
        })
        .collect()
}

// =============================================================================
// Form Types
// =============================================================================

/// Form data for adding an item to cart.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: String,
}

/// Form data for updating cart quantity.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: String,
    /// Zero or negative removes the line.
    pub quantity: i64,
}

/// Form data for removing an item.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub page: PageContext,
    pub cart: CartView,
    pub payment_methods: Vec<PaymentOptionView>,
}

/// Cart items fragment for HTMX updates.
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
}

/// Cart count badge fragment.
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

// =============================================================================
// Route Handlers
// =============================================================================

/// Display cart page.
#[instrument(skip(page, cart))]
pub async fn show(page: PageContext, cart: SessionCart) -> CartShowTemplate {
    CartShowTemplate {
        page,
        cart: CartView::from(cart.cart()),
        payment_methods: payment_options(),
    }
}

/// Add an item to the cart.
///
/// HTMX callers get the refreshed count badge plus `cart-updated` and toast
/// events; plain form posts are redirected to the cart page.
#[instrument(skip(state, session, headers, cart))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    mut cart: SessionCart,
    Form(form): Form<AddToCartForm>,
) -> Response {
    let id = ProductId::new(form.product_id);

    let toast = match ProductRepository::new(state.store()).get(&id).await {
        Ok(Some(product)) => {
            add_breadcrumb("cart", "Added to cart", &[("product_id", id.as_str())]);
            let toast = Toast::success(format!("Added {} to cart", product.name));
            cart.add_item(product).await;
            toast
        }
        Ok(None) => Toast::error("That product is no longer available"),
        Err(e) => {
            tracing::error!(product_id = %id, "Failed to load product for cart: {e}");
            Toast::error("Failed to add to cart")
        }
    };

    if is_htmx(&headers) {
        let count = cart.cart().item_count();
        return (
            AppendHeaders([("HX-Trigger", hx_trigger(true, Some(&toast)))]),
            CartCountTemplate { count },
        )
            .into_response();
    }

    flash(&session, toast).await;
    Redirect::to("/cart").into_response()
}

/// Update a line's quantity (zero or less removes it).
#[instrument(skip(headers, cart))]
pub async fn update(
    headers: HeaderMap,
    mut cart: SessionCart,
    Form(form): Form<UpdateCartForm>,
) -> Response {
    let id = ProductId::new(form.product_id);
    cart.update_quantity(&id, form.quantity).await;
    items_response(&headers, &cart)
}

/// Remove a line from the cart.
#[instrument(skip(headers, cart))]
pub async fn remove(
    headers: HeaderMap,
    mut cart: SessionCart,
    Form(form): Form<RemoveFromCartForm>,
) -> Response {
    let id = ProductId::new(form.product_id);
    add_breadcrumb("cart", "Removed from cart", &[("product_id", id.as_str())]);
    cart.remove_item(&id).await;
    items_response(&headers, &cart)
}

/// Cart count badge (fragment).
pub async fn count(cart: SessionCart) -> CartCountTemplate {
    CartCountTemplate {
        count: cart.cart().item_count(),
    }
}

fn items_response(headers: &HeaderMap, cart: &SessionCart) -> Response {
    if !is_htmx(headers) {
        return Redirect::to("/cart").into_response();
    }
    (
        AppendHeaders([("HX-Trigger", hx_trigger(true, None))]),
        CartItemsTemplate {
            cart: CartView::from(cart.cart()),
        },
    )
        .into_response()
}
