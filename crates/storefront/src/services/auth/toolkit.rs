//! Identity Toolkit REST client.
//!
//! # Endpoints
//!
//! - `POST /v1/accounts:signUp` - create an email/password account
//! - `POST /v1/accounts:signInWithPassword` - sign in
//! - `POST /v1/accounts:lookup` - resolve a session token to its account
//! - `POST /v1/accounts:update` - change profile fields
//! - `POST {secure_token}/v1/token` - exchange a refresh token
//!
//! Lookups are cached for one minute per token so a page that resolves the
//! viewer several times costs a single round trip.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use oussaili_core::{Email, UserId};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, instrument};
use url::Url;

use super::{AuthError, AuthProvider, AuthUser};
use crate::config::FirebaseConfig;

const LOOKUP_CACHE_TTL: Duration = Duration::from_secs(60);

/// Client for the hosted identity provider.
#[derive(Clone)]
pub struct IdentityToolkitClient {
    inner: Arc<IdentityToolkitInner>,
}

struct IdentityToolkitInner {
    client: reqwest::Client,
    accounts_url: String,
    token_url: String,
    api_key: String,
    lookups: Cache<String, AuthUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    email: String,
    #[serde(default)]
    display_name: Option<String>,
    id_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<AccountInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountInfo {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    photo_url: Option<String>,
    #[serde(default)]
    disabled: bool,
}

/// Secure Token responses use `snake_case` unlike the accounts API.
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
}

impl IdentityToolkitClient {
    /// Create a new client for the configured project.
    #[must_use]
    pub fn new(config: &FirebaseConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    /// Create a client reusing an existing HTTP connection pool.
    #[must_use]
    pub fn with_client(client: reqwest::Client, config: &FirebaseConfig) -> Self {
        let lookups = Cache::builder()
            .max_capacity(10_000)
            .time_to_live(LOOKUP_CACHE_TTL)
            .build();

        Self {
            inner: Arc::new(IdentityToolkitInner {
                client,
                accounts_url: format!(
                    "{}/v1/accounts",
                    config.identity_endpoint.trim_end_matches('/')
                ),
                token_url: format!(
                    "{}/v1/token",
                    config.secure_token_endpoint.trim_end_matches('/')
                ),
                api_key: config.api_key.clone(),
                lookups,
            }),
        }
    }

    fn keyed_url(&self, base: &str) -> Result<Url, AuthError> {
        let mut url = Url::parse(base)
            .map_err(|e| AuthError::Provider(format!("invalid identity endpoint: {e}")))?;
        url.query_pairs_mut().append_pair("key", &self.inner.api_key);
        Ok(url)
    }

    /// Call `accounts:{method}` with a JSON body.
    async fn call<T: DeserializeOwned>(&self, method: &str, body: &Value) -> Result<T, AuthError> {
        let url = self.keyed_url(&format!("{}:{method}", self.inner.accounts_url))?;
        let response = self.inner.client.post(url).json(body).send().await?;
        Self::read(response).await
    }

    async fn read<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, AuthError> {
        let status = response.status();
        let response_text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&response_text)
                .ok()
                .and_then(|v| v.pointer("/error/message").and_then(Value::as_str).map(String::from))
                .unwrap_or_else(|| format!("HTTP {status}"));
            let error = AuthError::from_provider_code(&message);
            if error.is_server_error() {
                tracing::error!(
                    status = %status,
                    body = %response_text.chars().take(500).collect::<String>(),
                    "Identity provider returned non-success status"
                );
            } else {
                debug!(code = %message, "Identity provider rejected request");
            }
            return Err(error);
        }

        serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %response_text.chars().take(500).collect::<String>(),
                "Failed to parse identity provider response"
            );
            AuthError::Provider(format!("unexpected response: {e}"))
        })
    }

    fn signed_in(response: SignInResponse) -> Result<AuthUser, AuthError> {
        Ok(AuthUser {
            uid: UserId::new(response.local_id),
            email: Email::parse(&response.email)?,
            display_name: response.display_name.filter(|n| !n.is_empty()),
            photo_url: None,
            id_token: response.id_token,
            refresh_token: response.refresh_token,
        })
    }
}

#[async_trait]
impl AuthProvider for IdentityToolkitClient {
    #[instrument(skip(self, password), fields(email = %email))]
    async fn sign_up(
        &self,
        email: &Email,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<AuthUser, AuthError> {
        let body = json!({
            "email": email.as_str(),
            "password": password,
            "returnSecureToken": true,
        });
        let mut user = Self::signed_in(self.call("signUp", &body).await?)?;

        if let Some(name) = display_name.map(str::trim).filter(|n| !n.is_empty()) {
            self.update_display_name(&user.id_token, name).await?;
            user.display_name = Some(name.to_string());
        }

        Ok(user)
    }

    #[instrument(skip(self, password), fields(email = %email))]
    async fn sign_in(&self, email: &Email, password: &str) -> Result<AuthUser, AuthError> {
        let body = json!({
            "email": email.as_str(),
            "password": password,
            "returnSecureToken": true,
        });
        Self::signed_in(self.call("signInWithPassword", &body).await?)
    }

    #[instrument(skip(self, id_token))]
    async fn lookup(&self, id_token: &str) -> Result<AuthUser, AuthError> {
        if let Some(user) = self.inner.lookups.get(id_token).await {
            debug!("Cache hit for session lookup");
            return Ok(user);
        }

        let response: LookupResponse = self.call("lookup", &json!({ "idToken": id_token })).await?;
        let account = response
            .users
            .into_iter()
            .next()
            .ok_or(AuthError::InvalidToken)?;

        if account.disabled {
            return Err(AuthError::Disabled);
        }

        let email = account
            .email
            .as_deref()
            .ok_or_else(|| AuthError::Provider("account has no email".to_string()))
            .and_then(|e| Email::parse(e).map_err(AuthError::from))?;

        let user = AuthUser {
            uid: UserId::new(account.local_id),
            email,
            display_name: account.display_name.filter(|n| !n.is_empty()),
            photo_url: account.photo_url.filter(|u| !u.is_empty()),
            id_token: id_token.to_string(),
            refresh_token: None,
        };

        self.inner
            .lookups
            .insert(id_token.to_string(), user.clone())
            .await;

        Ok(user)
    }

    #[instrument(skip(self, refresh_token))]
    async fn refresh(&self, refresh_token: &str) -> Result<AuthUser, AuthError> {
        let url = self.keyed_url(&self.inner.token_url)?;
        let form = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("grant_type", "refresh_token")
            .append_pair("refresh_token", refresh_token)
            .finish();

        let response = self
            .inner
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(form)
            .send()
            .await?;
        let refreshed: RefreshResponse = Self::read(response).await?;

        let mut user = self.lookup(&refreshed.id_token).await?;
        user.refresh_token = Some(refreshed.refresh_token);
        Ok(user)
    }

    async fn sign_out(&self, id_token: &str) {
        self.inner.lookups.invalidate(id_token).await;
    }

    #[instrument(skip(self, id_token))]
    async fn update_display_name(
        &self,
        id_token: &str,
        display_name: &str,
    ) -> Result<(), AuthError> {
        let body = json!({
            "idToken": id_token,
            "displayName": display_name,
            "returnSecureToken": false,
        });
        let _: Value = self.call("update", &body).await?;
        self.inner.lookups.invalidate(id_token).await;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config() -> FirebaseConfig {
        FirebaseConfig {
            project_id: "oussaili-test".to_string(),
            api_key: "web-key".to_string(),
            database: "(default)".to_string(),
            firestore_endpoint: "http://localhost:8080".to_string(),
            identity_endpoint: "http://localhost:9099/identitytoolkit.googleapis.com/".to_string(),
            secure_token_endpoint: "http://localhost:9099/securetoken.googleapis.com".to_string(),
            access_token: None,
        }
    }

    #[test]
    fn test_account_urls() {
        let client = IdentityToolkitClient::new(&config());
        let url = client
            .keyed_url(&format!("{}:lookup", client.inner.accounts_url))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:9099/identitytoolkit.googleapis.com/v1/accounts:lookup?key=web-key"
        );
        let token = client.keyed_url(&client.inner.token_url).unwrap();
        assert_eq!(token.path(), "/securetoken.googleapis.com/v1/token");
    }

    #[test]
    fn test_sign_in_response_parses() {
        let body = json!({
            "localId": "uid-1",
            "email": "Shopper@Example.com",
            "displayName": "",
            "idToken": "tok",
            "refreshToken": "ref",
            "registered": true,
        });
        let response: SignInResponse = serde_json::from_value(body).unwrap();
        let user = IdentityToolkitClient::signed_in(response).unwrap();
        assert_eq!(user.uid.as_str(), "uid-1");
        assert_eq!(user.display_name, None);
        assert_eq!(user.refresh_token.as_deref(), Some("ref"));
    }

    #[test]
    fn test_lookup_response_tolerates_sparse_accounts() {
        let body = json!({ "users": [{ "localId": "uid-1" }] });
        let response: LookupResponse = serde_json::from_value(body).unwrap();
        assert_eq!(response.users.len(), 1);
        assert!(response.users[0].email.is_none());
        assert!(!response.users[0].disabled);
    }
}
