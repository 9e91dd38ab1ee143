//! User role management commands.
//!
//! This is the trusted path for role changes: the web UI never lets a user
//! promote themselves, so the first administrator is created here.

use oussaili_core::{Email, EmailError, Role, UserProfile};
use oussaili_storefront::db::{ProfileRepository, RepositoryError};
use oussaili_storefront::documents::DocumentStore;
use thiserror::Error;

/// Errors that can occur during user operations.
#[derive(Debug, Error)]
pub enum UsersError {
    /// Email failed validation.
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// No profile exists yet for this email.
    #[error("No profile for {0}; the user must sign in once first")]
    UnknownUser(String),

    /// Document store call failed.
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Log every profile with its role.
///
/// # Errors
///
/// Returns `UsersError::Repository` if the profiles cannot be read.
pub async fn list(store: &dyn DocumentStore) -> Result<Vec<UserProfile>, UsersError> {
    let profiles = ProfileRepository::new(store).list().await?;
    for profile in &profiles {
        tracing::info!(
            id = %profile.id,
            email = %profile.email,
            role = %profile.role,
            "{}",
            profile.display_name()
        );
    }
    tracing::info!(count = profiles.len(), "Listed profiles");
    Ok(profiles)
}

/// Give the profile with `email` the administrator role.
///
/// # Errors
///
/// Returns `UsersError::UnknownUser` if no profile has this email.
pub async fn grant_admin(store: &dyn DocumentStore, email: &str) -> Result<(), UsersError> {
    set_role(store, email, Role::Admin).await
}

/// Return the profile with `email` to the customer role.
///
/// # Errors
///
/// Returns `UsersError::UnknownUser` if no profile has this email.
pub async fn revoke_admin(store: &dyn DocumentStore, email: &str) -> Result<(), UsersError> {
    set_role(store, email, Role::Customer).await
}

async fn set_role(store: &dyn DocumentStore, email: &str, role: Role) -> Result<(), UsersError> {
    let email = Email::parse(email)?;
    let repo = ProfileRepository::new(store);

    let profile = repo
        .find_by_email(&email)
        .await?
        .ok_or_else(|| UsersError::UnknownUser(email.to_string()))?;

    if profile.role == role {
        tracing::info!(email = %email, role = %role, "Role unchanged");
        return Ok(());
    }

    repo.set_role(&profile.id, role).await?;
    tracing::info!(email = %email, role = %role, "Role updated");
    Ok(())
}
