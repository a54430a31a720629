//! Host-facing authentication-provider contract.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::domain::AuthSession;
use crate::error::AuthResult;
use crate::event_bus::EventReceiver;

/// The capability contract a host consumes: session listing, creation,
/// removal, and a stream of session deltas.
#[async_trait]
pub trait AuthenticationProvider: Send + Sync {
    /// Human-friendly provider name.
    fn friendly_name(&self) -> &str;

    /// This provider supports a single account per scope-set only.
    fn supports_multiple_accounts(&self) -> bool {
        false
    }

    /// Subscribe to session change deltas.
    fn subscribe(&self) -> EventReceiver;

    /// List sessions; with `scopes` given, only the session whose sorted
    /// scope-set matches exactly.
    async fn get_sessions(&self, scopes: Option<&[String]>) -> AuthResult<Vec<AuthSession>>;

    /// Run an interactive login and persist the resulting session.
    ///
    /// `cancel` is wired to the host's cancel affordance.
    async fn create_session(
        &self,
        scopes: &[String],
        cancel: CancellationToken,
    ) -> AuthResult<AuthSession>;

    /// Sign out of the session with the given id.
    async fn remove_session(&self, id: &str) -> AuthResult<()>;
}
