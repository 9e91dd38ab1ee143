//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. Session serialization (one request per session cookie at a time)
//! 4. Session layer (tower-sessions with in-memory store)
//!
//! Authentication is not a layer: handlers opt in through the
//! [`RequireViewer`], [`RequireAdmin`] and [`OptionalViewer`] extractors.

pub mod auth;
pub mod page;
pub mod session;
pub mod session_lock;
pub mod toast;

pub use auth::{
    AccessRejection, OptionalViewer, RequireAdmin, RequireViewer, clear_current_user,
    current_session_user, resolve_viewer, set_current_user,
};
pub use page::PageContext;
pub use session::create_session_layer;
pub use session_lock::{SessionLocks, serialize_session_requests};
pub use toast::{flash, hx_trigger, is_htmx};
