//! Stub implementations of the login and identity contracts
//!
//! In-memory stand-ins for the interactive login flow and the identity
//! provider, for fast, isolated tests.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;

use twitchid_core::{
    AuthError, AuthResult, IdentityVerifier, LoginHandler, TokenValidation, UserInfo,
};

// ============================================================================
// StubLogin
// ============================================================================

/// Scripted [`LoginHandler`]: yields queued tokens and records every call.
pub struct StubLogin {
    tokens: Mutex<VecDeque<String>>,
    calls: Mutex<Vec<(String, String)>>,
    wait_for_cancel: bool,
}

impl StubLogin {
    /// Always-succeeding login yielding the given token.
    pub fn returning(token: &str) -> Self {
        Self::sequence(&[token])
    }

    /// Yield the given tokens in order; the last one repeats.
    pub fn sequence(tokens: &[&str]) -> Self {
        Self {
            tokens: Mutex::new(tokens.iter().map(|t| t.to_string()).collect()),
            calls: Mutex::new(Vec::new()),
            wait_for_cancel: false,
        }
    }

    /// Login that never completes on its own; it settles only when the
    /// cancellation signal fires.
    pub fn hanging() -> Self {
        Self {
            tokens: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            wait_for_cancel: true,
        }
    }

    /// The `(scopes, client_id)` pairs this stub was called with.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LoginHandler for StubLogin {
    async fn login(
        &self,
        scopes: &str,
        client_id: &str,
        cancel: CancellationToken,
    ) -> AuthResult<String> {
        self.calls
            .lock()
            .unwrap()
            .push((scopes.to_string(), client_id.to_string()));

        if self.wait_for_cancel {
            cancel.cancelled().await;
            return Err(AuthError::Cancelled);
        }

        let mut tokens = self.tokens.lock().unwrap();
        let token = if tokens.len() > 1 {
            tokens.pop_front()
        } else {
            tokens.front().cloned()
        };
        token.ok_or_else(|| AuthError::Provider("no scripted token".to_string()))
    }
}

// ============================================================================
// StubIdentity
// ============================================================================

/// Scripted [`IdentityVerifier`].
///
/// Unknown tokens resolve to account `42`/`clarkio`; tokens can be marked
/// as rejected (`Unauthorized`) or failing (`Network`).
#[derive(Default)]
pub struct StubIdentity {
    accounts: Mutex<HashMap<String, UserInfo>>,
    rejected: Mutex<HashSet<String>>,
    failing: Mutex<HashSet<String>>,
}

impl StubIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map a token to a specific account.
    pub fn with_account(self, token: &str, id: &str, account_name: &str) -> Self {
        self.accounts.lock().unwrap().insert(
            token.to_string(),
            UserInfo {
                id: id.to_string(),
                account_name: account_name.to_string(),
            },
        );
        self
    }

    /// Mark a token as rejected by the provider.
    pub fn with_rejected(self, token: &str) -> Self {
        self.rejected.lock().unwrap().insert(token.to_string());
        self
    }

    /// Mark a token as failing with a transport error.
    pub fn with_failing(self, token: &str) -> Self {
        self.failing.lock().unwrap().insert(token.to_string());
        self
    }
}

#[async_trait]
impl IdentityVerifier for StubIdentity {
    async fn user_info(&self, token: &str) -> AuthResult<UserInfo> {
        if self.rejected.lock().unwrap().contains(token) {
            return Err(AuthError::Unauthorized);
        }
        if self.failing.lock().unwrap().contains(token) {
            return Err(AuthError::Network("connection refused".to_string()));
        }
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .get(token)
            .cloned()
            .unwrap_or_else(|| UserInfo {
                id: "42".to_string(),
                account_name: "clarkio".to_string(),
            }))
    }

    async fn validate_token(&self, token: &str) -> AuthResult<TokenValidation> {
        if self.failing.lock().unwrap().contains(token) {
            return Err(AuthError::Network("connection refused".to_string()));
        }
        if self.rejected.lock().unwrap().contains(token) {
            return Ok(TokenValidation {
                valid: false,
                login: String::new(),
            });
        }
        let login = self
            .accounts
            .lock()
            .unwrap()
            .get(token)
            .map(|info| info.account_name.clone())
            .unwrap_or_else(|| "clarkio".to_string());
        Ok(TokenValidation { valid: true, login })
    }
}
