//! Error taxonomy for the authentication flow.
//!
//! Cancellation is deliberately its own variant: extensions calling into the
//! provider match on it to suppress user-facing error dialogs.

use thiserror::Error;

/// Result type for authentication operations.
pub type AuthResult<T> = Result<T, AuthError>;

/// Errors produced by the login flow, identity client, and session store.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The user declined to continue or cancelled an in-flight login.
    /// Propagates silently; never shown as an error.
    #[error("Cancelled")]
    Cancelled,

    /// The login race expired before the browser round trip completed.
    #[error("Timed out")]
    TimedOut,

    /// Transport-level failure talking to the identity provider.
    #[error("network error: {0}")]
    Network(String),

    /// The identity provider rejected the access token.
    /// Triggers session pruning rather than a visible error.
    #[error("Unauthorized")]
    Unauthorized,

    /// The persisted session blob could not be parsed. The corrupted blob
    /// is destroyed before this propagates.
    #[error("stored session data is malformed: {0}")]
    MalformedStoredData(String),

    /// Non-2xx response from the identity provider, carrying the message
    /// from the response body (or the HTTP status text).
    #[error("{0}")]
    Provider(String),

    /// The secret store failed to read or write the session blob.
    #[error("secret store error: {0}")]
    Store(String),

    /// The loopback server could not be started or operated.
    #[error("loopback server error: {0}")]
    Server(String),
}

impl AuthError {
    /// Whether this error represents user cancellation and must stay silent.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, AuthError::Cancelled)
    }
}
