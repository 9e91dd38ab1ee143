//! Session-related types.
//!
//! Types stored in the cookie session.

use serde::{Deserialize, Serialize};

use oussaili_core::UserId;

/// Identity provider tokens for the signed-in account.
///
/// The profile itself is never cached here; it is resolved from the tokens on
/// every request so role changes take effect immediately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    /// Provider uid (also the profile document id).
    pub uid: UserId,
    /// Short-lived session token.
    pub id_token: String,
    /// Token used to mint a new `id_token` once it expires.
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// A one-shot notification shown on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    Success,
    Error,
}

impl Toast {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Success,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Error,
            message: message.into(),
        }
    }

    /// CSS modifier for the toast element.
    #[must_use]
    pub const fn css_class(&self) -> &'static str {
        match self.kind {
            ToastKind::Success => "toast-success",
            ToastKind::Error => "toast-error",
        }
    }
}

/// Session keys.
pub mod keys {
    /// Key for the signed-in account's provider tokens.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the persisted cart snapshot.
    pub const CART: &str = "oussaili-cart";

    /// Key for pending toasts.
    pub const TOASTS: &str = "toasts";
}
