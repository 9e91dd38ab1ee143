//! One-shot notifications.
//!
//! Two delivery paths:
//! - full-page flows store the toast in the session and redirect; the next
//!   rendered page takes and shows it
//! - HTMX fragment responses carry it in the `HX-Trigger` header, which the
//!   page script turns into a toast element

use axum::http::{HeaderMap, HeaderValue};
use serde_json::{Map, Value};
use tower_sessions::Session;

use crate::models::Toast;
use crate::models::session::keys;

/// Event fired whenever the cart changes, so the badge can refresh.
pub const CART_UPDATED_EVENT: &str = "cart-updated";

/// Queue a toast for the next rendered page. Failures are only logged.
pub async fn flash(session: &Session, toast: Toast) {
    let mut pending = session
        .get::<Vec<Toast>>(keys::TOASTS)
        .await
        .ok()
        .flatten()
        .unwrap_or_default();
    pending.push(toast);
    if let Err(e) = session.insert(keys::TOASTS, pending).await {
        tracing::warn!("Failed to queue toast: {e}");
    }
}

/// Take every queued toast, leaving none behind.
pub async fn take_toasts(session: &Session) -> Vec<Toast> {
    session
        .remove::<Vec<Toast>>(keys::TOASTS)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

/// Whether the request was issued by HTMX.
#[must_use]
pub fn is_htmx(headers: &HeaderMap) -> bool {
    headers
        .get("HX-Request")
        .is_some_and(|v| v.as_bytes() == b"true")
}

/// Build an `HX-Trigger` header value.
///
/// ```text
/// {"cart-updated": null, "toast": {"kind": "success", "message": "Added to cart"}}
/// ```
#[must_use]
pub fn hx_trigger(cart_updated: bool, toast: Option<&Toast>) -> HeaderValue {
    let mut events = Map::new();
    if cart_updated {
        events.insert(CART_UPDATED_EVENT.to_string(), Value::Null);
    }
    if let Some(toast) = toast {
        events.insert(
            "toast".to_string(),
            serde_json::to_value(toast).unwrap_or(Value::Null),
        );
    }
    HeaderValue::from_str(&ascii_json(&Value::Object(events)))
        .unwrap_or_else(|_| HeaderValue::from_static(CART_UPDATED_EVENT))
}

/// JSON text with every non-ASCII character written as a `\u` escape, since
/// header values must be visible ASCII.
fn ascii_json(value: &Value) -> String {
    let mut out = String::new();
    for c in value.to_string().chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                out.push_str(&format!("\\u{unit:04x}"));
            }
        }
    }
    out
}
