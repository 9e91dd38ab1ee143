//! Resolves who is making a request.
//!
//! The session holds provider tokens only. Each request asks the identity
//! provider who the token belongs to and loads (or lazily creates) the
//! profile. The whole lookup races a fallback timer: if the provider has not
//! answered when the timer fires, the request proceeds as signed out and the
//! late answer is discarded.

use std::sync::Arc;
use std::time::Duration;

use oussaili_core::{AuthGate, AuthState, Email, Principal, Role, UserId, UserProfile};
use tracing::instrument;

use crate::db::ProfileRepository;
use crate::documents::DocumentStore;
use crate::models::SessionUser;
use crate::services::auth::{AuthError, AuthProvider, AuthUser};

/// The signed-in account as seen by views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    pub uid: UserId,
    pub email: Email,
    pub display_name: String,
    pub photo_url: Option<String>,
    /// `None` when the profile could not be loaded.
    pub role: Option<Role>,
}

impl Viewer {
    fn from_parts(user: &AuthUser, profile: Option<&UserProfile>) -> Self {
        let display_name = profile
            .and_then(|p| p.display_name.clone())
            .or_else(|| user.display_name.clone())
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| UserProfile::DEFAULT_DISPLAY_NAME.to_string());

        Self {
            uid: user.uid.clone(),
            email: user.email.clone(),
            display_name,
            photo_url: profile
                .and_then(|p| p.photo_url.clone())
                .or_else(|| user.photo_url.clone()),
            role: profile.map(|p| p.role),
        }
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Some(Role::Admin)
    }

    /// First letter of the display name, for the avatar badge.
    #[must_use]
    pub fn initial(&self) -> String {
        self.display_name
            .chars()
            .next()
            .map_or_else(|| "U".to_string(), |c| c.to_uppercase().collect())
    }
}

impl Principal for Viewer {
    fn role(&self) -> Option<Role> {
        self.role
    }
}

/// How a resolution was reached. Decides what happens to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveOutcome {
    /// No tokens in the session.
    NoSession,
    /// Provider confirmed the session token.
    Confirmed,
    /// Session token had expired; new tokens must replace the stored ones.
    Refreshed(SessionUser),
    /// Provider rejected the tokens; the session should be cleared.
    Rejected,
    /// Provider errored. Treated as signed out, session kept for next time.
    Unavailable,
    /// Fallback timer fired first. Session kept for next time.
    TimedOut,
}

/// Resolved authentication state plus how it was reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub state: AuthState<Viewer>,
    pub outcome: ResolveOutcome,
}

impl Resolution {
    #[must_use]
    pub const fn signed_out(outcome: ResolveOutcome) -> Self {
        Self {
            state: AuthState::SignedOut,
            outcome,
        }
    }

    #[must_use]
    pub const fn viewer(&self) -> Option<&Viewer> {
        self.state.user()
    }
}

/// Per-request viewer resolution with a bounded wait.
#[derive(Clone)]
pub struct ViewerResolver {
    auth: Arc<dyn AuthProvider>,
    store: Arc<dyn DocumentStore>,
    timeout: Duration,
}

impl ViewerResolver {
    #[must_use]
    pub fn new(
        auth: Arc<dyn AuthProvider>,
        store: Arc<dyn DocumentStore>,
        timeout: Duration,
    ) -> Self {
        Self {
            auth,
            store,
            timeout,
        }
    }

    /// Resolve the viewer for the tokens in the session, if any.
    #[instrument(skip_all)]
    pub async fn resolve(&self, session: Option<&SessionUser>) -> Resolution {
        let Some(session) = session else {
            return Resolution::signed_out(ResolveOutcome::NoSession);
        };

        let mut gate = AuthGate::new();
        let outcome = tokio::select! {
            (viewer, outcome) = self.lookup(session) => {
                gate.on_auth_event(viewer);
                outcome
            }
            () = tokio::time::sleep(self.timeout) => {
                gate.on_timeout();
                tracing::warn!(
                    timeout_ms = self.timeout.as_millis(),
                    "Auth resolution timed out, continuing signed out"
                );
                ResolveOutcome::TimedOut
            }
        };

        Resolution {
            state: gate.into_state(),
            outcome,
        }
    }

    async fn lookup(&self, session: &SessionUser) -> (Option<Viewer>, ResolveOutcome) {
        let (user, outcome) = match self.auth.lookup(&session.id_token).await {
            Ok(user) => (user, ResolveOutcome::Confirmed),
            Err(AuthError::InvalidToken) => match self.refresh(session).await {
                Ok(user) => {
                    let refreshed = SessionUser {
                        uid: user.uid.clone(),
                        id_token: user.id_token.clone(),
                        refresh_token: user.refresh_token.clone(),
                    };
                    (user, ResolveOutcome::Refreshed(refreshed))
                }
                Err(err) => return (None, failure_outcome(&err)),
            },
            Err(err) => return (None, failure_outcome(&err)),
        };

        if user.uid != session.uid {
            tracing::warn!("Session token belongs to a different account");
            return (None, ResolveOutcome::Rejected);
        }

        let profiles = ProfileRepository::new(self.store.as_ref());
        let profile = match profiles
            .ensure(
                &user.uid,
                &user.email,
                user.display_name.clone(),
                user.photo_url.clone(),
            )
            .await
        {
            Ok(profile) => Some(profile),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load profile, continuing without a role");
                None
            }
        };

        (Some(Viewer::from_parts(&user, profile.as_ref())), outcome)
    }

    async fn refresh(&self, session: &SessionUser) -> Result<AuthUser, AuthError> {
        match &session.refresh_token {
            Some(token) => self.auth.refresh(token).await,
            None => Err(AuthError::InvalidToken),
        }
    }
}

fn failure_outcome(err: &AuthError) -> ResolveOutcome {
    if err.is_server_error() {
        tracing::error!(error = %err, "Identity provider unavailable");
        ResolveOutcome::Unavailable
    } else {
        tracing::debug!(error = %err, "Session rejected by identity provider");
        ResolveOutcome::Rejected
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::ProfileRepository;
    use crate::documents::MemoryDocumentStore;
    use crate::services::auth::MemoryAuthProvider;

    struct Fixture {
        auth: Arc<MemoryAuthProvider>,
        store: Arc<MemoryDocumentStore>,
        resolver: ViewerResolver,
    }

    fn fixture() -> Fixture {
        let auth = Arc::new(MemoryAuthProvider::new());
        let store = Arc::new(MemoryDocumentStore::new());
        let resolver = ViewerResolver::new(auth.clone(), store.clone(), Duration::from_millis(4000));
        Fixture {
            auth,
            store,
            resolver,
        }
    }

    async fn sign_up(fx: &Fixture, name: Option<&str>) -> SessionUser {
        let user = fx
            .auth
            .sign_up(&Email::parse("awa@example.com").unwrap(), "secret1", name)
            .await
            .unwrap();
        SessionUser {
            uid: user.uid,
            id_token: user.id_token,
            refresh_token: user.refresh_token,
        }
    }

    #[tokio::test]
    async fn test_no_session_is_signed_out() {
        let fx = fixture();
        let resolution = fx.resolver.resolve(None).await;
        assert_eq!(resolution.state, AuthState::SignedOut);
        assert_eq!(resolution.outcome, ResolveOutcome::NoSession);
    }

    #[tokio::test]
    async fn test_first_sign_in_creates_customer_profile() {
        let fx = fixture();
        let session = sign_up(&fx, None).await;
        let resolution = fx.resolver.resolve(Some(&session)).await;

        let viewer = resolution.viewer().unwrap();
        assert_eq!(viewer.role, Some(Role::Customer));
        assert_eq!(viewer.display_name, "User");
        assert_eq!(resolution.outcome, ResolveOutcome::Confirmed);

        let stored = ProfileRepository::new(fx.store.as_ref())
            .get(&session.uid)
            .await
            .unwrap();
        assert!(stored.is_some());
    }

    #[tokio::test]
    async fn test_profile_failure_leaves_role_unknown() {
        let fx = fixture();
        let session = sign_up(&fx, Some("Awa")).await;
        fx.store.set_unavailable(true);

        let resolution = fx.resolver.resolve(Some(&session)).await;
        let viewer = resolution.viewer().unwrap();
        assert_eq!(viewer.role, None);
        assert_eq!(viewer.display_name, "Awa");
        assert!(!viewer.is_admin());
    }

    #[tokio::test]
    async fn test_expired_token_is_refreshed() {
        let fx = fixture();
        let session = sign_up(&fx, None).await;
        fx.auth.expire_token(&session.id_token).await;

        let resolution = fx.resolver.resolve(Some(&session)).await;
        assert!(resolution.viewer().is_some());
        match resolution.outcome {
            ResolveOutcome::Refreshed(new_session) => {
                assert_eq!(new_session.uid, session.uid);
                assert_ne!(new_session.id_token, session.id_token);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_revoked_session_is_rejected() {
        let fx = fixture();
        let mut session = sign_up(&fx, None).await;
        fx.auth.expire_token(&session.id_token).await;
        session.refresh_token = None;

        let resolution = fx.resolver.resolve(Some(&session)).await;
        assert_eq!(resolution.state, AuthState::SignedOut);
        assert_eq!(resolution.outcome, ResolveOutcome::Rejected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_provider_times_out_signed_out() {
        let fx = fixture();
        let session = sign_up(&fx, None).await;
        fx.auth.set_lookup_delay(Some(Duration::from_secs(10))).await;

        let resolution = fx.resolver.resolve(Some(&session)).await;
        assert_eq!(resolution.state, AuthState::SignedOut);
        assert_eq!(resolution.outcome, ResolveOutcome::TimedOut);
    }

    #[tokio::test(start_paused = true)]
    async fn test_provider_answering_before_timeout_wins() {
        let fx = fixture();
        let session = sign_up(&fx, None).await;
        fx.auth.set_lookup_delay(Some(Duration::from_millis(3999))).await;

        let resolution = fx.resolver.resolve(Some(&session)).await;
        assert!(resolution.viewer().is_some());
    }

    #[test]
    fn test_viewer_initial() {
        let viewer = Viewer {
            uid: UserId::new("u"),
            email: Email::parse("a@b.co").unwrap(),
            display_name: "émile".to_string(),
            photo_url: None,
            role: Some(Role::Customer),
        };
        assert_eq!(viewer.initial(), "É");
    }
}
