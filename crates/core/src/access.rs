//! Authentication resolution and role-gated access decisions.
//!
//! # State machine
//!
//! ```text
//! Resolving ──(provider answers)──► SignedIn(user) | SignedOut
//!     │
//!     └────────(timer fires)──────► SignedOut
//! ```
//!
//! [`AuthGate`] owns the transition out of `Resolving`: whichever of the
//! provider answer or the timeout arrives first wins, and the loser is
//! ignored. [`AccessGuard`] then maps the state to a decision for one view.

use crate::types::{Permission, Role};

/// Anything that can carry a resolved role.
///
/// The role is optional: a signed-in user whose profile could not be loaded
/// has no role and is treated as lacking every elevated permission.
pub trait Principal {
    fn role(&self) -> Option<Role>;
}

impl Principal for Role {
    fn role(&self) -> Option<Role> {
        Some(*self)
    }
}

impl Principal for Option<Role> {
    fn role(&self) -> Option<Role> {
        *self
    }
}

/// Authentication state as seen by a view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState<U> {
    /// The provider has not answered yet.
    Resolving,
    /// Resolved with no user.
    SignedOut,
    /// Resolved with a user.
    SignedIn(U),
}

impl<U> AuthState<U> {
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        !matches!(self, Self::Resolving)
    }

    #[must_use]
    pub const fn user(&self) -> Option<&U> {
        match self {
            Self::SignedIn(user) => Some(user),
            Self::Resolving | Self::SignedOut => None,
        }
    }

    #[must_use]
    pub fn into_user(self) -> Option<U> {
        match self {
            Self::SignedIn(user) => Some(user),
            Self::Resolving | Self::SignedOut => None,
        }
    }
}

/// Outcome of evaluating the guard for one view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Still resolving: do nothing yet.
    Pending,
    /// Resolved without a user: send to the sign-in view.
    RedirectToLogin,
    /// Signed in but missing the required permission: send home.
    RedirectToHome,
    /// Render the view.
    Allow,
}

impl GuardDecision {
    /// Sign-in view path.
    pub const LOGIN_PATH: &'static str = "/auth";
    /// Home view path.
    pub const HOME_PATH: &'static str = "/";

    /// Where to redirect, if anywhere.
    #[must_use]
    pub const fn redirect_target(self) -> Option<&'static str> {
        match self {
            Self::RedirectToLogin => Some(Self::LOGIN_PATH),
            Self::RedirectToHome => Some(Self::HOME_PATH),
            Self::Pending | Self::Allow => None,
        }
    }
}

/// Access requirement of a protected view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessGuard {
    requirement: Permission,
}

impl AccessGuard {
    #[must_use]
    pub const fn new(requirement: Permission) -> Self {
        Self { requirement }
    }

    /// Guard for views any signed-in user may see.
    #[must_use]
    pub const fn authenticated() -> Self {
        Self::new(Permission::Authenticated)
    }

    /// Guard for back-office views.
    #[must_use]
    pub const fn admin() -> Self {
        Self::new(Permission::ManageStore)
    }

    #[must_use]
    pub const fn requirement(&self) -> Permission {
        self.requirement
    }

    /// Decide what the view should do for `state`.
    ///
    /// Called again whenever the state changes, e.g. when the user signs out
    /// while a protected view is open.
    #[must_use]
    pub fn evaluate<U: Principal>(&self, state: &AuthState<U>) -> GuardDecision {
        match state {
            AuthState::Resolving => GuardDecision::Pending,
            AuthState::SignedOut => GuardDecision::RedirectToLogin,
            AuthState::SignedIn(user) => {
                let granted = user
                    .role()
                    .is_some_and(|role| role.grants(self.requirement));
                if granted || self.requirement == Permission::Authenticated {
                    GuardDecision::Allow
                } else {
                    GuardDecision::RedirectToHome
                }
            }
        }
    }
}

/// Single-assignment latch for the pending authentication state.
///
/// Both the provider callback and the fallback timer report here; only the
/// first report changes the state, so a late provider answer can never
/// overwrite the timeout outcome (or vice versa).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthGate<U> {
    state: AuthState<U>,
}

impl<U> Default for AuthGate<U> {
    fn default() -> Self {
        Self::new()
    }
}

impl<U> AuthGate<U> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: AuthState::Resolving,
        }
    }

    /// Provider answered. Returns `true` if this resolved the gate.
    pub fn on_auth_event(&mut self, user: Option<U>) -> bool {
        if self.state.is_resolved() {
            return false;
        }
        self.state = user.map_or(AuthState::SignedOut, AuthState::SignedIn);
        true
    }

    /// Fallback timer fired. Returns `true` if this resolved the gate.
    pub fn on_timeout(&mut self) -> bool {
        if self.state.is_resolved() {
            return false;
        }
        self.state = AuthState::SignedOut;
        true
    }

    #[must_use]
    pub const fn state(&self) -> &AuthState<U> {
        &self.state
    }

    #[must_use]
    pub fn into_state(self) -> AuthState<U> {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GUARDS: [AccessGuard; 2] = [AccessGuard::authenticated(), AccessGuard::admin()];

    #[test]
    fn test_resolving_never_redirects() {
        for guard in GUARDS {
            assert_eq!(guard.evaluate(&AuthState::<Role>::Resolving), GuardDecision::Pending);
            assert_eq!(
                guard.evaluate(&AuthState::<Option<Role>>::Resolving),
                GuardDecision::Pending
            );
        }
    }

    #[test]
    fn test_signed_out_goes_to_login() {
        for guard in GUARDS {
            let decision = guard.evaluate(&AuthState::<Role>::SignedOut);
            assert_eq!(decision, GuardDecision::RedirectToLogin);
            assert_eq!(decision.redirect_target(), Some("/auth"));
        }
    }

    #[test]
    fn test_customer_on_admin_view_goes_home() {
        let decision = AccessGuard::admin().evaluate(&AuthState::SignedIn(Role::Customer));
        assert_eq!(decision, GuardDecision::RedirectToHome);
        assert_eq!(decision.redirect_target(), Some("/"));
    }

    #[test]
    fn test_admin_on_admin_view_is_allowed() {
        let decision = AccessGuard::admin().evaluate(&AuthState::SignedIn(Role::Admin));
        assert_eq!(decision, GuardDecision::Allow);
        assert_eq!(decision.redirect_target(), None);
    }

    #[test]
    fn test_unknown_role_only_passes_authenticated_views() {
        let state = AuthState::SignedIn(None::<Role>);
        assert_eq!(AccessGuard::authenticated().evaluate(&state), GuardDecision::Allow);
        assert_eq!(AccessGuard::admin().evaluate(&state), GuardDecision::RedirectToHome);
    }

    #[test]
    fn test_gate_event_then_timeout_keeps_event() {
        let mut gate = AuthGate::new();
        assert!(gate.on_auth_event(Some(Role::Admin)));
        assert!(!gate.on_timeout());
        assert_eq!(gate.state(), &AuthState::SignedIn(Role::Admin));
    }

    #[test]
    fn test_gate_timeout_then_event_keeps_timeout() {
        let mut gate = AuthGate::new();
        assert!(gate.on_timeout());
        assert!(!gate.on_auth_event(Some(Role::Admin)));
        assert_eq!(gate.into_state(), AuthState::SignedOut);
    }

    #[test]
    fn test_gate_event_without_user_signs_out() {
        let mut gate = AuthGate::<Role>::new();
        assert!(gate.on_auth_event(None));
        assert_eq!(gate.state(), &AuthState::SignedOut);
    }

    #[test]
    fn test_sign_out_while_viewing_reevaluates() {
        let guard = AccessGuard::authenticated();
        assert_eq!(guard.evaluate(&AuthState::SignedIn(Role::Customer)), GuardDecision::Allow);
        assert_eq!(guard.evaluate(&AuthState::<Role>::SignedOut), GuardDecision::RedirectToLogin);
    }
}
