//! Contract traits for external collaborators.
//!
//! These traits define the seams the session store composes over without
//! specifying the implementation (OS keychain, in-memory, HTTP client,
//! stubbed login flow).

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::AuthResult;

/// Result type for repository operations.
pub type RepoResult<T> = anyhow::Result<T>;

/// Opaque async storage for one serialized secret blob.
///
/// The service identifier keying the blob is fixed at construction; all
/// sessions persist as a single JSON array under that one key. Values may be
/// mutated by other processes sharing the store.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Read the blob, `None` when nothing is stored.
    async fn get(&self) -> RepoResult<Option<String>>;

    /// Write the blob, replacing any previous value.
    async fn set(&self, value: &str) -> RepoResult<()>;

    /// Delete the blob; absent entries are not an error.
    async fn delete(&self) -> RepoResult<()>;
}

/// Account info returned by the identity provider's userinfo endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInfo {
    /// Provider-side user id (the `sub` claim).
    pub id: String,
    /// Display name (the `preferred_username` claim).
    pub account_name: String,
}

/// Outcome of a token validation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenValidation {
    pub valid: bool,
    pub login: String,
}

/// Identity-provider REST surface used for session verification.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Look up the account behind an access token.
    ///
    /// Fails with `Network` on transport failure, `Unauthorized` when the
    /// provider rejects the token, and `Provider` for any other non-2xx.
    async fn user_info(&self, token: &str) -> AuthResult<UserInfo>;

    /// Validate a token. Any non-2xx response is `valid: false`, not an
    /// error; only transport failures fail.
    async fn validate_token(&self, token: &str) -> AuthResult<TokenValidation>;
}

/// Drives one end-to-end interactive login and yields a plain access token.
#[async_trait]
pub trait LoginHandler: Send + Sync {
    /// Run the login flow for a space-joined scope string.
    ///
    /// `cancel` is the host's cancellation signal; triggering it settles the
    /// flow with `Cancelled`.
    async fn login(
        &self,
        scopes: &str,
        client_id: &str,
        cancel: CancellationToken,
    ) -> AuthResult<String>;
}
