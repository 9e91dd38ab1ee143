//! Profile route handlers (requires auth).

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use oussaili_core::{Order, OrderStatus};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::db::{OrderRepository, ProfileRepository};
use crate::error::{AppError, Result};
use crate::middleware::{PageContext, RequireViewer, current_session_user, flash};
use crate::models::Toast;
use crate::services::viewer::Viewer;
use crate::state::AppState;

/// Longest display name accepted from the profile form.
const MAX_DISPLAY_NAME_LENGTH: usize = 80;

// =============================================================================
// View Types
// =============================================================================

/// Order line display data.
#[derive(Clone)]
pub struct OrderItemView {
    pub name: String,
    pub quantity: u32,
    pub line_total: String,
}

/// Order display data, shared with the admin order table.
#[derive(Clone)]
pub struct OrderView {
    pub id: String,
    pub short_id: String,
    pub user_email: String,
    pub total: String,
    pub status: String,
    pub status_label: String,
    pub status_class: String,
    pub payment_method: String,
    pub created_on: String,
    pub items: Vec<OrderItemView>,
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.to_string(),
            short_id: order.id.short().to_string(),
            user_email: order.user_email.to_string(),
            total: order.total.display(),
            status: order.status.as_str().to_string(),
            status_label: order.status.label().to_string(),
            status_class: status_class(order.status).to_string(),
            payment_method: order.payment_method.label().to_string(),
            created_on: order.created_at.format("%b %-d, %Y").to_string(),
            items: order
                .items
                .iter()
                .map(|item| OrderItemView {
                    name: item.name.clone(),
                    quantity: item.quantity,
                    line_total: item.line_total().display(),
                })
                .collect(),
        }
    }
}

/// Badge colour for an order status.
#[must_use]
pub const fn status_class(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Pending => "status-pending",
        OrderStatus::Processing => "status-processing",
        OrderStatus::Shipped => "status-shipped",
        OrderStatus::Delivered => "status-delivered",
    }
}

/// Profile card display data.
#[derive(Clone)]
pub struct ProfileView {
    pub display_name: String,
    pub email: String,
    pub initial: String,
    pub photo_url: Option<String>,
    pub is_admin: bool,
}

impl From<&Viewer> for ProfileView {
    fn from(viewer: &Viewer) -> Self {
        Self {
            display_name: viewer.display_name.clone(),
            email: viewer.email.to_string(),
            initial: viewer.initial(),
            photo_url: viewer.photo_url.clone(),
            is_admin: viewer.is_admin(),
        }
    }
}

// =============================================================================
// Form Types
// =============================================================================

/// Display name form data.
#[derive(Debug, Deserialize)]
pub struct DisplayNameForm {
    pub display_name: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Profile page template.
#[derive(Template, WebTemplate)]
#[template(path = "profile.html")]
pub struct ProfileTemplate {
    pub page: PageContext,
    pub profile: ProfileView,
    pub orders: Vec<OrderView>,
}

// =============================================================================
// Route Handlers
// =============================================================================

/// Display the profile card and order history.
///
/// Administrators see every order here too.
#[instrument(skip(state, viewer, page), fields(user_id = %viewer.uid))]
pub async fn show(
    State(state): State<AppState>,
    RequireViewer(viewer): RequireViewer,
    page: PageContext,
) -> Result<ProfileTemplate> {
    let orders = OrderRepository::new(state.store())
        .list_visible(&viewer.uid, viewer.is_admin())
        .await?;

    Ok(ProfileTemplate {
        page,
        profile: ProfileView::from(&viewer),
        orders: orders.iter().map(OrderView::from).collect(),
    })
}

/// Change the display name in both the identity provider and the profile.
#[instrument(skip(state, viewer, session, form), fields(user_id = %viewer.uid))]
pub async fn update_name(
    State(state): State<AppState>,
    RequireViewer(viewer): RequireViewer,
    session: Session,
    Form(form): Form<DisplayNameForm>,
) -> Response {
    let name = form.display_name.trim();
    if name.is_empty() || name.chars().count() > MAX_DISPLAY_NAME_LENGTH {
        flash(
            &session,
            Toast::error(format!(
                "Display name must be 1 to {MAX_DISPLAY_NAME_LENGTH} characters"
            )),
        )
        .await;
        return Redirect::to("/profile").into_response();
    }

    let toast = match rename(&state, &viewer, &session, name).await {
        Ok(()) => Toast::success("Profile updated"),
        Err(e) => {
            e.report();
            Toast::error("Failed to update profile")
        }
    };
    flash(&session, toast).await;
    Redirect::to("/profile").into_response()
}

async fn rename(
    state: &AppState,
    viewer: &Viewer,
    session: &Session,
    name: &str,
) -> Result<()> {
    let tokens = current_session_user(session)
        .await
        .ok_or_else(|| AppError::Unauthorized("session tokens missing".to_string()))?;

    state
        .auth()
        .update_display_name(&tokens.id_token, name)
        .await?;
    ProfileRepository::new(state.store())
        .set_display_name(&viewer.uid, name)
        .await?;
    Ok(())
}
