//! Authentication error types.

use thiserror::Error;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] oussaili_core::EmailError),

    /// Invalid credentials (wrong password or unknown email).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// An account already exists for the email.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Session token expired, revoked, or unknown.
    #[error("invalid or expired session token")]
    InvalidToken,

    /// Account disabled by an operator.
    #[error("account disabled")]
    Disabled,

    /// Too many attempts; the provider is throttling.
    #[error("too many attempts, try again later")]
    TooManyAttempts,

    /// HTTP request to the identity provider failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Identity provider returned an unexpected error.
    #[error("identity provider error: {0}")]
    Provider(String),
}

impl AuthError {
    /// Map an Identity Toolkit error code (e.g. `EMAIL_EXISTS`).
    ///
    /// Codes may carry a detail suffix after ` : `.
    #[must_use]
    pub fn from_provider_code(message: &str) -> Self {
        let (code, detail) = message
            .split_once(" : ")
            .map_or((message, None), |(code, detail)| (code, Some(detail)));

        match code.trim() {
            "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => {
                Self::InvalidCredentials
            }
            "EMAIL_EXISTS" => Self::UserAlreadyExists,
            "WEAK_PASSWORD" => Self::WeakPassword(
                detail
                    .unwrap_or("Password should be at least 6 characters")
                    .to_string(),
            ),
            "INVALID_EMAIL" => Self::InvalidEmail(oussaili_core::EmailError::Malformed),
            "INVALID_ID_TOKEN" | "TOKEN_EXPIRED" | "USER_NOT_FOUND" | "CREDENTIAL_TOO_OLD_LOGIN_AGAIN" => {
                Self::InvalidToken
            }
            "USER_DISABLED" => Self::Disabled,
            "TOO_MANY_ATTEMPTS_TRY_LATER" => Self::TooManyAttempts,
            _ => Self::Provider(message.to_string()),
        }
    }

    /// Message safe to show next to the sign-in form.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidEmail(_) => "Invalid email address".to_string(),
            Self::InvalidCredentials => "Invalid email or password".to_string(),
            Self::UserAlreadyExists => "An account with this email already exists".to_string(),
            Self::WeakPassword(msg) => msg.clone(),
            Self::InvalidToken => "Session expired, please sign in again".to_string(),
            Self::Disabled => "This account has been disabled".to_string(),
            Self::TooManyAttempts => "Too many attempts, please try again later".to_string(),
            Self::Http(_) | Self::Provider(_) => "Authentication service unavailable".to_string(),
        }
    }

    /// Whether the failure is the provider's fault rather than the user's.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Provider(_))
    }
}
