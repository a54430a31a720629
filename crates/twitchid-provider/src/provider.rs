//! Host-facing provider façade.
//!
//! Composes the session store, identity client, and login orchestrator
//! behind the [`AuthenticationProvider`] contract. All collaborators are
//! owned by an explicitly constructed [`AuthContext`]; there are no
//! process-wide globals.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use twitchid_core::{
    branding, AuthResult, AuthSession, AuthenticationProvider, EventBus, EventReceiver,
    IdentityVerifier, LoginHandler, SecretStore,
};
use twitchid_storage::KeychainSecretStore;

use crate::identity::IdentityClient;
use crate::login::LoginOrchestrator;
use crate::sessions::SessionStore;

/// Everything the provider composes over, constructed explicitly and passed
/// by value into [`TwitchAuthProvider::new`].
pub struct AuthContext {
    pub secrets: Arc<dyn SecretStore>,
    pub identity: Arc<dyn IdentityVerifier>,
    pub login: Arc<dyn LoginHandler>,
    pub events: EventBus,
}

impl AuthContext {
    /// Production wiring: OS keychain storage, the real identity client,
    /// and the browser-driven login orchestrator.
    pub fn new() -> Self {
        Self::with_secret_store(Arc::new(KeychainSecretStore::new()))
    }

    /// Production identity/login wiring over a custom secret store.
    pub fn with_secret_store(secrets: Arc<dyn SecretStore>) -> Self {
        Self {
            secrets,
            identity: Arc::new(IdentityClient::new()),
            login: Arc::new(LoginOrchestrator::new()),
            events: EventBus::new(),
        }
    }
}

impl Default for AuthContext {
    fn default() -> Self {
        Self::new()
    }
}

/// The Twitch authentication provider exposed to the host.
pub struct TwitchAuthProvider {
    store: SessionStore,
    events: EventBus,
}

impl TwitchAuthProvider {
    /// Build the provider and load persisted sessions.
    pub async fn new(context: AuthContext) -> AuthResult<Self> {
        let store = SessionStore::new(
            context.secrets,
            context.identity,
            context.login,
            context.events.sender(),
        )
        .await?;
        Ok(Self {
            store,
            events: context.events,
        })
    }

    /// Notification hook for external secret-store changes (another window
    /// editing the same store). Reconciles and emits the delta; a failed
    /// reload keeps the previous snapshot.
    pub async fn secrets_changed(&self) {
        if let Err(e) = self.store.check_for_updates().await {
            warn!("[Provider] Reconciling external store change failed: {e}");
        }
    }
}

#[async_trait]
impl AuthenticationProvider for TwitchAuthProvider {
    fn friendly_name(&self) -> &str {
        branding::DISPLAY_NAME
    }

    fn supports_multiple_accounts(&self) -> bool {
        false
    }

    fn subscribe(&self) -> EventReceiver {
        self.events.subscribe()
    }

    async fn get_sessions(&self, scopes: Option<&[String]>) -> AuthResult<Vec<AuthSession>> {
        Ok(self.store.get_sessions(scopes).await)
    }

    async fn create_session(
        &self,
        scopes: &[String],
        cancel: CancellationToken,
    ) -> AuthResult<AuthSession> {
        self.store.create_session(scopes, cancel).await
    }

    async fn remove_session(&self, id: &str) -> AuthResult<()> {
        self.store.remove_session(id).await
    }
}
