//! Admin back-office route handlers (administrators only).
//!
//! One page with three tabs (products, orders, users) plus the form posts
//! that change them. Every post ends in a toast and a redirect back to the
//! tab it came from.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use oussaili_core::{
    Order, OrderId, OrderStatus, Price, Product, ProductDraft, ProductId, ProductPatch, Role,
    UserId, UserProfile,
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::db::{OrderRepository, ProductRepository, ProfileRepository};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::{PageContext, RequireAdmin, flash};
use crate::models::Toast;
use crate::routes::products::ProductView;
use crate::routes::profile::OrderView;
use crate::state::AppState;

// =============================================================================
// Tabs & Stats
// =============================================================================

/// Back-office tab.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdminTab {
    #[default]
    Products,
    Orders,
    Users,
}

impl AdminTab {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::Orders => "orders",
            Self::Users => "users",
        }
    }

    fn url(self) -> String {
        format!("/admin?tab={}", self.as_str())
    }
}

/// Dashboard figures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    pub total_revenue: Price,
    pub order_count: usize,
    pub product_count: usize,
    pub user_count: usize,
}

impl StoreStats {
    /// Revenue counts every order regardless of status.
    #[must_use]
    pub fn compute(products: &[Product], orders: &[Order], users: &[UserProfile]) -> Self {
        Self {
            total_revenue: orders.iter().map(|o| o.total).sum(),
            order_count: orders.len(),
            product_count: products.len(),
            user_count: users.len(),
        }
    }
}

/// Load everything the dashboard shows.
pub(crate) async fn load_dashboard(
    state: &AppState,
    admin_id: &UserId,
) -> Result<(Vec<Product>, Vec<Order>, Vec<UserProfile>)> {
    let products = ProductRepository::new(state.store()).list().await?;
    let orders = OrderRepository::new(state.store())
        .list_visible(admin_id, true)
        .await?;
    let users = ProfileRepository::new(state.store()).list().await?;
    Ok((products, orders, users))
}

// =============================================================================
// View Types
// =============================================================================

/// Raw product fields for the edit form.
#[derive(Clone)]
pub struct ProductRowView {
    pub product: ProductView,
    pub price_input: String,
    pub stock: u32,
}

/// User row display data.
#[derive(Clone)]
pub struct UserRowView {
    pub id: String,
    pub display_name: String,
    pub email: String,
    pub role: String,
    pub is_admin: bool,
    pub is_self: bool,
}

/// Status select option.
#[derive(Clone)]
pub struct StatusOptionView {
    pub value: String,
    pub label: String,
}

// =============================================================================
// Form Types
// =============================================================================

/// Query parameters for the dashboard.
#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    #[serde(default)]
    pub tab: AdminTab,
}

/// Product create/edit form data, every field as typed.
#[derive(Debug, Deserialize)]
pub struct ProductForm {
    pub name: String,
    pub description: String,
    pub price: String,
    pub category: String,
    pub image_url: String,
    pub stock: String,
    /// Checkbox: present (any value) when ticked.
    pub is_featured: Option<String>,
}

impl From<ProductForm> for ProductDraft {
    fn from(form: ProductForm) -> Self {
        Self {
            name: form.name,
            description: form.description,
            price: form.price,
            category: form.category,
            image_url: form.image_url,
            stock: form.stock,
            is_featured: form.is_featured.is_some(),
        }
    }
}

/// Order status form data.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: OrderStatus,
}

/// Role form data.
#[derive(Debug, Deserialize)]
pub struct RoleForm {
    pub role: Role,
}

// =============================================================================
// Templates
// =============================================================================

/// Dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/index.html")]
pub struct AdminTemplate {
    pub page: PageContext,
    pub tab: String,
    pub total_revenue: String,
    pub order_count: usize,
    pub product_count: usize,
    pub user_count: usize,
    pub products: Vec<ProductRowView>,
    pub orders: Vec<OrderView>,
    pub users: Vec<UserRowView>,
    pub statuses: Vec<StatusOptionView>,
}

// =============================================================================
// Route Handlers
// =============================================================================

/// Display the dashboard.
#[instrument(skip(state, admin, page), fields(admin_id = %admin.uid))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    page: PageContext,
    Query(query): Query<DashboardQuery>,
) -> Result<AdminTemplate> {
    let (products, orders, users) = load_dashboard(&state, &admin.uid).await?;
    let stats = StoreStats::compute(&products, &orders, &users);

    Ok(AdminTemplate {
        page,
        tab: query.tab.as_str().to_string(),
        total_revenue: stats.total_revenue.display(),
        order_count: stats.order_count,
        product_count: stats.product_count,
        user_count: stats.user_count,
        products: products
            .iter()
            .map(|p| ProductRowView {
                product: ProductView::from(p),
                price_input: p.price.to_string(),
                stock: p.stock,
            })
            .collect(),
        orders: orders.iter().map(OrderView::from).collect(),
        users: users
            .iter()
            .map(|u| UserRowView {
                id: u.id.to_string(),
                display_name: u.display_name().to_string(),
                email: u.email.to_string(),
                role: u.role.as_str().to_string(),
                is_admin: u.is_admin(),
                is_self: u.id == admin.uid,
            })
            .collect(),
        statuses: OrderStatus::ALL
            .into_iter()
            .map(|s| StatusOptionView {
                value: s.as_str().to_string(),
                label: s.label().to_string(),
            })
            .collect(),
    })
}

/// Create a product.
#[instrument(skip(state, admin, session, form), fields(admin_id = %admin.uid))]
pub async fn create_product(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    session: Session,
    Form(form): Form<ProductForm>,
) -> Response {
    let result = async {
        let product = ProductDraft::from(form).parse()?;
        let created = ProductRepository::new(state.store()).create(product).await?;
        add_breadcrumb("admin", "Product created", &[("product_id", created.id.as_str())]);
        Ok::<_, AppError>(Toast::success(format!("Created {}", created.name)))
    }
    .await;

    finish(&session, AdminTab::Products, result).await
}

/// Replace a product's fields.
#[instrument(skip(state, admin, session, form), fields(admin_id = %admin.uid))]
pub async fn update_product(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<ProductForm>,
) -> Response {
    let id = ProductId::new(id);
    let result = async {
        let product = ProductDraft::from(form).parse()?;
        let name = product.name.clone();
        ProductRepository::new(state.store())
            .update(&id, ProductPatch::from(product))
            .await?;
        add_breadcrumb("admin", "Product updated", &[("product_id", id.as_str())]);
        Ok::<_, AppError>(Toast::success(format!("Saved {name}")))
    }
    .await;

    finish(&session, AdminTab::Products, result).await
}

/// Delete a product. Existing orders keep their snapshot.
#[instrument(skip(state, admin, session), fields(admin_id = %admin.uid))]
pub async fn delete_product(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    session: Session,
    Path(id): Path<String>,
) -> Response {
    let id = ProductId::new(id);
    let result = async {
        ProductRepository::new(state.store()).delete(&id).await?;
        add_breadcrumb("admin", "Product deleted", &[("product_id", id.as_str())]);
        Ok::<_, AppError>(Toast::success("Product deleted"))
    }
    .await;

    finish(&session, AdminTab::Products, result).await
}

/// Move an order to a new status.
#[instrument(skip(state, admin, session), fields(admin_id = %admin.uid))]
pub async fn update_order_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<StatusForm>,
) -> Response {
    let id = OrderId::new(id);
    let result = async {
        OrderRepository::new(state.store())
            .update_status(&id, form.status)
            .await?;
        Ok::<_, AppError>(Toast::success(format!(
            "Order #{} is now {}",
            id.short(),
            form.status.label()
        )))
    }
    .await;

    finish(&session, AdminTab::Orders, result).await
}

/// Change a user's role.
///
/// Administrators cannot demote themselves, so the store always keeps at least
/// the administrator making the change.
#[instrument(skip(state, admin, session), fields(admin_id = %admin.uid))]
pub async fn update_user_role(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<RoleForm>,
) -> Response {
    let id = UserId::new(id);
    let result = async {
        check_role_change(&admin.uid, &id, form.role)?;
        ProfileRepository::new(state.store())
            .set_role(&id, form.role)
            .await?;
        add_breadcrumb(
            "admin",
            "Role changed",
            &[("user_id", id.as_str()), ("role", form.role.as_str())],
        );
        Ok::<_, AppError>(Toast::success(format!("Role set to {}", form.role)))
    }
    .await;

    finish(&session, AdminTab::Users, result).await
}

/// Refuse an administrator's attempt to remove their own access.
///
/// # Errors
///
/// Returns `AppError::BadRequest` for a self-demotion.
pub fn check_role_change(admin_id: &UserId, target: &UserId, role: Role) -> Result<()> {
    if admin_id == target && role != Role::Admin {
        return Err(AppError::BadRequest(
            "You cannot remove your own administrator role".to_string(),
        ));
    }
    Ok(())
}

async fn finish(
    session: &Session,
    tab: AdminTab,
    result: std::result::Result<Toast, AppError>,
) -> Response {
    let toast = result.unwrap_or_else(|e| {
        e.report();
        Toast::error(e.user_message())
    });
    flash(session, toast).await;
    Redirect::to(&tab.url()).into_response()
}
