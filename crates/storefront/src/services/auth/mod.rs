//! Authentication service.
//!
//! Password accounts live with a hosted identity provider. The storefront
//! keeps only the provider's session token in the cookie session and asks
//! the provider who it belongs to.
//!
//! # Providers
//!
//! - [`IdentityToolkitClient`] - hosted Identity Toolkit REST API
//! - [`MemoryAuthProvider`] - in-process accounts for tests and local demos

mod error;
mod memory;
mod toolkit;

pub use error::AuthError;
pub use memory::MemoryAuthProvider;
pub use toolkit::IdentityToolkitClient;

use async_trait::async_trait;
use oussaili_core::{Email, UserId};

/// Minimum password length accepted by the identity provider.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// A signed-in account as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub uid: UserId,
    pub email: Email,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    /// Short-lived session token to hand back on later lookups.
    pub id_token: String,
    /// Long-lived token that mints a new `id_token` once it expires.
    pub refresh_token: Option<String>,
}

/// Email/password identity provider.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Create an account and sign it in.
    async fn sign_up(
        &self,
        email: &Email,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<AuthUser, AuthError>;

    /// Sign in with email and password.
    async fn sign_in(&self, email: &Email, password: &str) -> Result<AuthUser, AuthError>;

    /// Resolve a session token to its account.
    ///
    /// Fails with [`AuthError::InvalidToken`] when the token is unknown,
    /// expired, or revoked.
    async fn lookup(&self, id_token: &str) -> Result<AuthUser, AuthError>;

    /// Exchange a refresh token for a fresh session token.
    async fn refresh(&self, refresh_token: &str) -> Result<AuthUser, AuthError>;

    /// Forget any state held for the token.
    async fn sign_out(&self, id_token: &str);

    /// Change the account's display name.
    async fn update_display_name(&self, id_token: &str, display_name: &str)
    -> Result<(), AuthError>;
}

/// Check a new account's credentials before calling the provider.
///
/// # Errors
///
/// Returns `AuthError::InvalidEmail` if the email is malformed and
/// `AuthError::WeakPassword` if the password is too short.
pub fn validate_sign_up(email: &str, password: &str) -> Result<Email, AuthError> {
    let email = Email::parse(email)?;

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password should be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(email)
}
