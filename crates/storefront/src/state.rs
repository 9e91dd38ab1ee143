//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::{BackendConfig, StorefrontConfig};
use crate::documents::{DocumentStore, FirestoreClient, MemoryDocumentStore};
use crate::middleware::session_lock::{self, SessionLocks};
use crate::services::auth::{AuthProvider, IdentityToolkitClient, MemoryAuthProvider};
use crate::services::viewer::ViewerResolver;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// document store, the identity provider, and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    store: Arc<dyn DocumentStore>,
    auth: Arc<dyn AuthProvider>,
    resolver: ViewerResolver,
    session_locks: SessionLocks,
}

impl AppState {
    /// Create application state with the backends named in `config`.
    #[must_use]
    pub fn new(config: StorefrontConfig) -> Self {
        let (store, auth): (Arc<dyn DocumentStore>, Arc<dyn AuthProvider>) = match &config.backend
        {
            BackendConfig::Firebase(firebase) => {
                // One connection pool for both hosted services.
                let client = reqwest::Client::new();
                (
                    Arc::new(FirestoreClient::with_client(client.clone(), firebase)),
                    Arc::new(IdentityToolkitClient::with_client(client, firebase)),
                )
            }
            BackendConfig::Memory => {
                tracing::warn!("Using in-memory backends; data is lost on restart");
                (
                    Arc::new(MemoryDocumentStore::new()),
                    Arc::new(MemoryAuthProvider::new()),
                )
            }
        };

        Self::with_backends(config, store, auth)
    }

    /// Create application state around explicit backends.
    #[must_use]
    pub fn with_backends(
        config: StorefrontConfig,
        store: Arc<dyn DocumentStore>,
        auth: Arc<dyn AuthProvider>,
    ) -> Self {
        let resolver = ViewerResolver::new(auth.clone(), store.clone(), config.auth_resolve_timeout);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                auth,
                resolver,
                session_locks: session_lock::session_locks(),
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the document store.
    #[must_use]
    pub fn store(&self) -> &dyn DocumentStore {
        self.inner.store.as_ref()
    }

    /// Get a reference to the identity provider.
    #[must_use]
    pub fn auth(&self) -> &dyn AuthProvider {
        self.inner.auth.as_ref()
    }

    /// Get a reference to the per-request viewer resolver.
    #[must_use]
    pub fn resolver(&self) -> &ViewerResolver {
        &self.inner.resolver
    }

    /// Get the per-session request locks.
    #[must_use]
    pub fn session_locks(&self) -> &SessionLocks {
        &self.inner.session_locks
    }
}
