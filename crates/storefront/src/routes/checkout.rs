//! Checkout route handler.
//!
//! No payment gateway is involved: the order is written as `pending` with the
//! chosen payment method and an administrator confirms payment later.

use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use oussaili_core::PaymentMethod;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, add_breadcrumb};
use crate::middleware::{RequireViewer, flash};
use crate::models::Toast;
use crate::services::cart::SessionCart;
use crate::services::checkout::{CheckoutOutcome, place_order};
use crate::state::AppState;

/// Checkout form data.
#[derive(Debug, Deserialize)]
pub struct CheckoutForm {
    #[serde(default)]
    pub payment_method: PaymentMethod,
}

/// Place an order from the cart.
///
/// Success clears the cart and lands on the order history; failure keeps the
/// cart and returns to it.
#[instrument(skip(state, viewer, session, cart), fields(user_id = %viewer.uid))]
pub async fn checkout(
    State(state): State<AppState>,
    RequireViewer(viewer): RequireViewer,
    session: Session,
    mut cart: SessionCart,
    Form(form): Form<CheckoutForm>,
) -> Response {
    match place_order(state.store(), &viewer, &mut cart, form.payment_method).await {
        Ok(CheckoutOutcome::Placed(order)) => {
            add_breadcrumb(
                "checkout",
                "Order placed",
                &[
                    ("order_id", order.id.as_str()),
                    ("payment_method", order.payment_method.as_str()),
                ],
            );
            tracing::info!(order_id = %order.id, total = %order.total, "Order placed");
            flash(&session, Toast::success("Order placed!")).await;
            Redirect::to("/profile").into_response()
        }
        Ok(CheckoutOutcome::EmptyCart) => Redirect::to("/cart").into_response(),
        Err(e) => {
            AppError::from(e).report();
            flash(&session, Toast::error("Failed to place order")).await;
            Redirect::to("/cart").into_response()
        }
    }
}
