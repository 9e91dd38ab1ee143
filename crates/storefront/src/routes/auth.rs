//! Authentication route handlers.
//!
//! Email/password sign-in and registration against the identity provider.
//! Only the provider's tokens go into the session; the profile and role are
//! re-resolved on every request.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use oussaili_core::Email;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::db::ProfileRepository;
use crate::error::{AppError, add_breadcrumb, clear_sentry_user};
use crate::middleware::{
    PageContext, clear_current_user, current_session_user, flash, set_current_user,
};
use crate::models::{SessionUser, Toast};
use crate::services::auth::{AuthError, AuthUser, validate_sign_up};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    pub display_name: Option<String>,
}

/// Which form to show first.
#[derive(Debug, Default, Deserialize)]
pub struct AuthPageQuery {
    pub mode: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Sign-in / registration page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth.html")]
pub struct AuthTemplate {
    pub page: PageContext,
    pub register: bool,
}

// =============================================================================
// Route Handlers
// =============================================================================

/// Display the sign-in and registration forms.
///
/// Signed-in viewers have nothing to do here and go home.
pub async fn page(page: PageContext, Query(query): Query<AuthPageQuery>) -> Response {
    if page.viewer.is_some() {
        return Redirect::to("/").into_response();
    }
    AuthTemplate {
        page,
        register: query.mode.as_deref() == Some("register"),
    }
    .into_response()
}

/// Handle login form submission.
#[instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let result = match Email::parse(&form.email) {
        Ok(email) => state.auth().sign_in(&email, &form.password).await,
        Err(e) => Err(AuthError::from(e)),
    };

    match result {
        Ok(user) => {
            if let Err(e) = start_session(&session, &user).await {
                tracing::error!("Failed to set session: {e}");
                flash(&session, Toast::error("Could not sign you in, please try again")).await;
                return Redirect::to("/auth").into_response();
            }
            add_breadcrumb("auth", "Signed in", &[("user_id", user.uid.as_str())]);
            tracing::info!(user_id = %user.uid, "Signed in");
            flash(&session, Toast::success("Welcome back!")).await;
            Redirect::to("/").into_response()
        }
        Err(e) => {
            let message = e.user_message();
            AppError::from(e).report();
            flash(&session, Toast::error(message)).await;
            Redirect::to("/auth").into_response()
        }
    }
}

/// Handle registration form submission.
///
/// Creates the account, signs it in, and writes the customer profile up front
/// so the chosen display name is stored immediately.
#[instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Response {
    const RETRY: &str = "/auth?mode=register";

    if form.password != form.password_confirm {
        flash(&session, Toast::error("Passwords do not match")).await;
        return Redirect::to(RETRY).into_response();
    }

    let display_name = form
        .display_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty());

    let result = match validate_sign_up(&form.email, &form.password) {
        Ok(email) => state.auth().sign_up(&email, &form.password, display_name).await,
        Err(e) => Err(e),
    };

    let user = match result {
        Ok(user) => user,
        Err(e) => {
            flash(&session, Toast::error(e.user_message())).await;
            AppError::from(e).report();
            return Redirect::to(RETRY).into_response();
        }
    };

    if let Err(e) = ProfileRepository::new(state.store())
        .ensure(
            &user.uid,
            &user.email,
            user.display_name.clone(),
            user.photo_url.clone(),
        )
        .await
    {
        // The resolver retries on the next request.
        tracing::warn!(user_id = %user.uid, "Failed to create profile at registration: {e}");
    }

    if let Err(e) = start_session(&session, &user).await {
        tracing::error!("Failed to set session after registration: {e}");
        flash(&session, Toast::error("Account created, please sign in")).await;
        return Redirect::to("/auth").into_response();
    }

    add_breadcrumb("auth", "Registered", &[("user_id", user.uid.as_str())]);
    tracing::info!(user_id = %user.uid, "Account created");
    flash(&session, Toast::success("Account created")).await;
    Redirect::to("/").into_response()
}

/// Handle logout.
///
/// The cart belongs to the visitor rather than the account, so it survives
/// sign-out.
#[instrument(skip(state, session))]
pub async fn logout(State(state): State<AppState>, session: Session) -> Response {
    if let Some(user) = current_session_user(&session).await {
        state.auth().sign_out(&user.id_token).await;
    }

    if let Err(e) = clear_current_user(&session).await {
        tracing::error!("Failed to clear session: {e}");
    }
    if let Err(e) = session.cycle_id().await {
        tracing::warn!("Failed to rotate session id: {e}");
    }
    clear_sentry_user();

    Redirect::to("/auth").into_response()
}

/// Store the account's tokens and rotate the session id.
async fn start_session(
    session: &Session,
    user: &AuthUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    set_current_user(
        session,
        &SessionUser {
            uid: user.uid.clone(),
            id_token: user.id_token.clone(),
            refresh_token: user.refresh_token.clone(),
        },
    )
    .await
}
