//! Data every full page needs for its layout.

use axum::{extract::FromRequestParts, http::request::Parts};
use oussaili_core::Cart;
use tower_sessions::Session;

use super::auth::resolve_viewer;
use super::toast::take_toasts;
use crate::models::Toast;
use crate::models::session::keys;
use crate::services::viewer::Viewer;
use crate::state::AppState;

/// Layout context: navbar viewer, cart badge, and pending toasts.
///
/// Taking the toasts consumes them, so only extract this in handlers that
/// render a full page.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub viewer: Option<Viewer>,
    pub cart_count: u32,
    pub toasts: Vec<Toast>,
}

impl PageContext {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.viewer.as_ref().is_some_and(Viewer::is_admin)
    }
}

impl FromRequestParts<AppState> for PageContext {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let viewer = resolve_viewer(parts, state).await.viewer().cloned();

        let Some(session) = parts.extensions.get::<Session>().cloned() else {
            return Ok(Self {
                viewer,
                ..Self::default()
            });
        };

        let cart_count = session
            .get::<Cart>(keys::CART)
            .await
            .ok()
            .flatten()
            .map_or(0, |cart| cart.item_count());

        Ok(Self {
            viewer,
            cart_count,
            toasts: take_toasts(&session).await,
        })
    }
}
