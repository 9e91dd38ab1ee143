//! Storefront-only models.
//!
//! Catalogue, order and profile models live in `oussaili-core`; this module
//! holds what only the web layer needs.

pub mod session;

pub use session::{SessionUser, Toast, ToastKind};
