//! In-process identity provider.
//!
//! Accounts and tokens live in memory and vanish on restart. Intended for
//! tests and local demos only: passwords are compared in plain text.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use oussaili_core::{Email, UserId};
use tokio::sync::RwLock;

use super::{AuthError, AuthProvider, AuthUser, validate_sign_up};

#[derive(Debug, Clone)]
struct Account {
    uid: UserId,
    email: Email,
    password: String,
    display_name: Option<String>,
    disabled: bool,
}

#[derive(Debug, Default)]
struct State {
    /// Keyed by lowercased email.
    accounts: HashMap<String, Account>,
    /// Session token to account key.
    sessions: HashMap<String, String>,
    /// Refresh token to account key.
    refresh_tokens: HashMap<String, String>,
    lookup_delay: Option<Duration>,
}

/// Identity provider backed by a map.
#[derive(Debug, Default)]
pub struct MemoryAuthProvider {
    state: RwLock<State>,
}

impl MemoryAuthProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every lookup, to simulate a slow provider.
    pub async fn set_lookup_delay(&self, delay: Option<Duration>) {
        self.state.write().await.lookup_delay = delay;
    }

    /// Invalidate a session token, as if it had expired.
    pub async fn expire_token(&self, id_token: &str) {
        self.state.write().await.sessions.remove(id_token);
    }

    /// Disable an account. Its sessions stop resolving.
    pub async fn disable(&self, email: &Email) {
        if let Some(account) = self.state.write().await.accounts.get_mut(&key(email)) {
            account.disabled = true;
        }
    }

    fn issue(state: &mut State, account_key: &str, account: &Account) -> AuthUser {
        let id_token = uuid::Uuid::new_v4().simple().to_string();
        let refresh_token = uuid::Uuid::new_v4().simple().to_string();
        state.sessions.insert(id_token.clone(), account_key.to_string());
        state
            .refresh_tokens
            .insert(refresh_token.clone(), account_key.to_string());
        AuthUser {
            uid: account.uid.clone(),
            email: account.email.clone(),
            display_name: account.display_name.clone(),
            photo_url: None,
            id_token,
            refresh_token: Some(refresh_token),
        }
    }
}

fn key(email: &Email) -> String {
    email.as_str().to_lowercase()
}

#[async_trait]
impl AuthProvider for MemoryAuthProvider {
    async fn sign_up(
        &self,
        email: &Email,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<AuthUser, AuthError> {
        validate_sign_up(email.as_str(), password)?;

        let mut state = self.state.write().await;
        let account_key = key(email);
        if state.accounts.contains_key(&account_key) {
            return Err(AuthError::UserAlreadyExists);
        }

        let account = Account {
            uid: UserId::new(uuid::Uuid::new_v4().simple().to_string()),
            email: email.clone(),
            password: password.to_string(),
            display_name: display_name
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(String::from),
            disabled: false,
        };
        let user = Self::issue(&mut state, &account_key, &account);
        state.accounts.insert(account_key, account);
        Ok(user)
    }

    async fn sign_in(&self, email: &Email, password: &str) -> Result<AuthUser, AuthError> {
        let mut state = self.state.write().await;
        let account_key = key(email);
        let account = state
            .accounts
            .get(&account_key)
            .filter(|a| a.password == password)
            .cloned()
            .ok_or(AuthError::InvalidCredentials)?;
        if account.disabled {
            return Err(AuthError::Disabled);
        }
        Ok(Self::issue(&mut state, &account_key, &account))
    }

    async fn lookup(&self, id_token: &str) -> Result<AuthUser, AuthError> {
        let delay = self.state.read().await.lookup_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let state = self.state.read().await;
        let account = state
            .sessions
            .get(id_token)
            .and_then(|k| state.accounts.get(k))
            .ok_or(AuthError::InvalidToken)?;
        if account.disabled {
            return Err(AuthError::Disabled);
        }
        Ok(AuthUser {
            uid: account.uid.clone(),
            email: account.email.clone(),
            display_name: account.display_name.clone(),
            photo_url: None,
            id_token: id_token.to_string(),
            refresh_token: None,
        })
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AuthUser, AuthError> {
        let mut state = self.state.write().await;
        let account_key = state
            .refresh_tokens
            .remove(refresh_token)
            .ok_or(AuthError::InvalidToken)?;
        let account = state
            .accounts
            .get(&account_key)
            .cloned()
            .ok_or(AuthError::InvalidToken)?;
        if account.disabled {
            return Err(AuthError::Disabled);
        }
        Ok(Self::issue(&mut state, &account_key, &account))
    }

    async fn sign_out(&self, id_token: &str) {
        self.state.write().await.sessions.remove(id_token);
    }

    async fn update_display_name(
        &self,
        id_token: &str,
        display_name: &str,
    ) -> Result<(), AuthError> {
        let mut state = self.state.write().await;
        let account_key = state
            .sessions
            .get(id_token)
            .cloned()
            .ok_or(AuthError::InvalidToken)?;
        if let Some(account) = state.accounts.get_mut(&account_key) {
            account.display_name = Some(display_name.trim().to_string()).filter(|n| !n.is_empty());
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn email(s: &str) -> Email {
        Email::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_sign_up_then_lookup() {
        let provider = MemoryAuthProvider::new();
        let user = provider
            .sign_up(&email("a@b.co"), "secret1", Some("Awa"))
            .await
            .unwrap();
        let looked_up = provider.lookup(&user.id_token).await.unwrap();
        assert_eq!(looked_up.uid, user.uid);
        assert_eq!(looked_up.display_name.as_deref(), Some("Awa"));
    }

    #[tokio::test]
    async fn test_duplicate_and_bad_password() {
        let provider = MemoryAuthProvider::new();
        provider.sign_up(&email("a@b.co"), "secret1", None).await.unwrap();
        assert!(matches!(
            provider.sign_up(&email("A@b.co"), "secret1", None).await,
            Err(AuthError::UserAlreadyExists)
        ));
        assert!(matches!(
            provider.sign_in(&email("a@b.co"), "wrong-pw").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_expired_token_refreshes() {
        let provider = MemoryAuthProvider::new();
        let user = provider.sign_up(&email("a@b.co"), "secret1", None).await.unwrap();
        provider.expire_token(&user.id_token).await;
        assert!(matches!(
            provider.lookup(&user.id_token).await,
            Err(AuthError::InvalidToken)
        ));

        let refreshed = provider
            .refresh(user.refresh_token.as_deref().unwrap())
            .await
            .unwrap();
        assert_ne!(refreshed.id_token, user.id_token);
        assert!(provider.lookup(&refreshed.id_token).await.is_ok());
        // Refresh tokens are single use.
        assert!(provider.refresh(user.refresh_token.as_deref().unwrap()).await.is_err());
    }

    #[tokio::test]
    async fn test_sign_out_and_disable() {
        let provider = MemoryAuthProvider::new();
        let user = provider.sign_up(&email("a@b.co"), "secret1", None).await.unwrap();
        provider.sign_out(&user.id_token).await;
        assert!(provider.lookup(&user.id_token).await.is_err());

        provider.disable(&email("a@b.co")).await;
        assert!(matches!(
            provider.sign_in(&email("a@b.co"), "secret1").await,
            Err(AuthError::Disabled)
        ));
    }
}
