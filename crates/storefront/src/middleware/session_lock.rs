//! Per-session request serialization.
//!
//! The session layer loads the record lazily and writes the whole record back
//! after the handler returns, so two requests carrying the same cookie would
//! each start from the same cart and the last write would win. This layer sits
//! outside the session layer and lets one request per session cookie through
//! at a time, covering both the load and the final save.
//!
//! Requests without a session cookie are not serialized: each one gets a
//! fresh session of its own.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header::COOKIE},
    middleware::Next,
    response::Response,
};
use moka::future::Cache;
use tokio::sync::Mutex;

use super::session::SESSION_COOKIE_NAME;
use crate::state::AppState;

/// Locks idle for this long are dropped.
const LOCK_IDLE_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// One mutex per live session cookie.
pub type SessionLocks = Cache<String, Arc<Mutex<()>>>;

/// Build the lock table. Entries expire when idle and never by size, so a
/// lock stays in the table while a request holds it.
#[must_use]
pub fn session_locks() -> SessionLocks {
    Cache::builder().time_to_idle(LOCK_IDLE_TIMEOUT).build()
}

/// Value of the session cookie, if the request carries one.
#[must_use]
pub fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE_NAME)
        .map(|(_, value)| value.trim_matches('"').to_string())
        .filter(|value| !value.is_empty())
}

/// Run requests that share a session cookie one after another.
pub async fn serialize_session_requests(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let Some(cookie) = session_cookie(request.headers()) else {
        return next.run(request).await;
    };

    let lock = state
        .session_locks()
        .get_with(cookie, async { Arc::new(Mutex::new(())) })
        .await;
    let _guard = lock.lock().await;

    next.run(request).await
}
