//! Authentication extractors and session helpers.
//!
//! The viewer is resolved at most once per request: the first extractor to
//! ask stores the [`Resolution`] in the request extensions and later ones
//! reuse it. Resolution side effects on the session happen here too:
//! refreshed tokens replace the stored ones, rejected tokens are removed, and
//! a timeout leaves the session alone so the next request can try again.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use oussaili_core::{AccessGuard, GuardDecision};
use tower_sessions::Session;

use crate::error::set_sentry_user;
use crate::models::SessionUser;
use crate::models::session::keys;
use crate::services::viewer::{Resolution, ResolveOutcome, Viewer};
use crate::state::AppState;

/// Resolve (or reuse) the viewer for this request.
pub async fn resolve_viewer(parts: &mut Parts, state: &AppState) -> Arc<Resolution> {
    if let Some(resolution) = parts.extensions.get::<Arc<Resolution>>() {
        return resolution.clone();
    }

    let session = parts.extensions.get::<Session>().cloned();
    let session_user = match &session {
        Some(session) => current_session_user(session).await,
        None => None,
    };

    let resolution = state.resolver().resolve(session_user.as_ref()).await;

    if let Some(session) = &session {
        apply_outcome(session, &resolution.outcome).await;
    }
    if let Some(viewer) = resolution.viewer() {
        set_sentry_user(viewer);
    }

    let resolution = Arc::new(resolution);
    parts.extensions.insert(resolution.clone());
    resolution
}

async fn apply_outcome(session: &Session, outcome: &ResolveOutcome) {
    let result = match outcome {
        ResolveOutcome::Refreshed(session_user) => set_current_user(session, session_user).await,
        ResolveOutcome::Rejected => clear_current_user(session).await,
        ResolveOutcome::NoSession
        | ResolveOutcome::Confirmed
        | ResolveOutcome::Unavailable
        | ResolveOutcome::TimedOut => Ok(()),
    };
    if let Err(e) = result {
        tracing::error!("Failed to update session after auth resolution: {e}");
    }
}

/// Extractor for the viewer, if any. Never rejects.
pub struct OptionalViewer(pub Option<Viewer>);

impl FromRequestParts<AppState> for OptionalViewer {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let resolution = resolve_viewer(parts, state).await;
        Ok(Self(resolution.viewer().cloned()))
    }
}

/// Extractor that requires a signed-in viewer.
///
/// # Example
///
/// ```rust,ignore
/// async fn profile(RequireViewer(viewer): RequireViewer) -> impl IntoResponse {
///     format!("Hello, {}!", viewer.display_name)
/// }
/// ```
pub struct RequireViewer(pub Viewer);

/// Extractor that requires an administrator.
pub struct RequireAdmin(pub Viewer);

/// Error returned when the access guard turns a request away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessRejection {
    /// Send to the sign-in page (HTML requests).
    RedirectToLogin,
    /// Send home (HTML requests from under-privileged viewers).
    RedirectToHome,
    /// Not signed in (API requests).
    Unauthorized,
    /// Signed in without the required role (API requests).
    Forbidden,
}

impl AccessRejection {
    fn from_decision(decision: GuardDecision, parts: &Parts) -> Option<Self> {
        let is_api = request_path(parts).starts_with("/api/");
        match decision {
            GuardDecision::Allow => None,
            GuardDecision::RedirectToHome if is_api => Some(Self::Forbidden),
            GuardDecision::RedirectToHome => Some(Self::RedirectToHome),
            // A resolved request is never pending; treat it as signed out.
            GuardDecision::RedirectToLogin | GuardDecision::Pending if is_api => {
                Some(Self::Unauthorized)
            }
            GuardDecision::RedirectToLogin | GuardDecision::Pending => Some(Self::RedirectToLogin),
        }
    }
}

impl IntoResponse for AccessRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to(GuardDecision::LOGIN_PATH).into_response(),
            Self::RedirectToHome => Redirect::to(GuardDecision::HOME_PATH).into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
            Self::Forbidden => StatusCode::FORBIDDEN.into_response(),
        }
    }
}

/// Path as the client sent it; nested routers strip their prefix from `uri`.
fn request_path(parts: &Parts) -> &str {
    parts
        .extensions
        .get::<OriginalUri>()
        .map_or_else(|| parts.uri.path(), |original| original.0.path())
}

async fn guarded(
    guard: AccessGuard,
    parts: &mut Parts,
    state: &AppState,
) -> Result<Viewer, AccessRejection> {
    let resolution = resolve_viewer(parts, state).await;
    let decision = guard.evaluate(&resolution.state);
    if let Some(rejection) = AccessRejection::from_decision(decision, parts) {
        tracing::debug!(path = %request_path(parts), ?decision, "Access guard rejected request");
        return Err(rejection);
    }
    resolution
        .viewer()
        .cloned()
        .ok_or(AccessRejection::RedirectToLogin)
}

impl FromRequestParts<AppState> for RequireViewer {
    type Rejection = AccessRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        guarded(AccessGuard::authenticated(), parts, state).await.map(Self)
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AccessRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        guarded(AccessGuard::admin(), parts, state).await.map(Self)
    }
}

/// Helper to store the signed-in account's tokens in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &SessionUser,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(keys::CURRENT_USER, user).await
}

/// Helper to clear the signed-in account from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.remove::<SessionUser>(keys::CURRENT_USER).await?;
    Ok(())
}

/// Read the signed-in account's tokens without resolving them.
pub async fn current_session_user(session: &Session) -> Option<SessionUser> {
    session
        .get::<SessionUser>(keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn parts(path: &str) -> Parts {
        Request::builder().uri(path).body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_html_rejections_redirect() {
        let parts = parts("/profile");
        assert_eq!(
            AccessRejection::from_decision(GuardDecision::RedirectToLogin, &parts),
            Some(AccessRejection::RedirectToLogin)
        );
        assert_eq!(
            AccessRejection::from_decision(GuardDecision::RedirectToHome, &parts),
            Some(AccessRejection::RedirectToHome)
        );
        assert_eq!(AccessRejection::from_decision(GuardDecision::Allow, &parts), None);
    }

    #[test]
    fn test_api_rejections_use_status_codes() {
        let parts = parts("/api/orders");
        assert_eq!(
            AccessRejection::from_decision(GuardDecision::RedirectToLogin, &parts),
            Some(AccessRejection::Unauthorized)
        );
        assert_eq!(
            AccessRejection::from_decision(GuardDecision::RedirectToHome, &parts),
            Some(AccessRejection::Forbidden)
        );
    }

    #[test]
    fn test_nested_api_path_uses_original_uri() {
        let mut parts = parts("/orders");
        parts
            .extensions
            .insert(OriginalUri("/api/orders".parse().unwrap()));
        assert_eq!(
            AccessRejection::from_decision(GuardDecision::RedirectToLogin, &parts),
            Some(AccessRejection::Unauthorized)
        );
    }

    #[test]
    fn test_redirect_targets() {
        let response = AccessRejection::RedirectToLogin.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], "/auth");
        assert_eq!(
            AccessRejection::Forbidden.into_response().status(),
            StatusCode::FORBIDDEN
        );
    }
}
