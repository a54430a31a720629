//! Session entity and scope-set helpers.
//!
//! A session's identity is its random `id`, but logical uniqueness is per
//! sorted scope-set: two sessions whose scope lists are permutations of each
//! other are the same logical session, and the newer one wins.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Placeholder used when a stored record carries no resolvable account name.
pub const UNKNOWN_ACCOUNT: &str = "<unknown>";

/// The account a session was granted for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthAccount {
    /// Provider-side user id (the `sub` claim).
    pub id: String,
    /// Display name (the `preferred_username` claim).
    pub label: String,
}

/// A verified, surfaceable authentication session.
///
/// `scopes` preserves the caller's requested order; all equality and
/// matching go through a sorted copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub id: String,
    pub account: AuthAccount,
    pub scopes: Vec<String>,
    pub access_token: String,
}

impl AuthSession {
    /// Sorted copy of this session's scopes, for order-insensitive matching.
    pub fn sorted_scopes(&self) -> Vec<String> {
        sorted_scopes(&self.scopes)
    }
}

/// Serialized form of a session inside the secret-store blob.
///
/// The account is optional here: records written before verification (or by
/// older writers) lack it, and must be verified against the identity
/// provider before being surfaced as an [`AuthSession`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSession {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<StoredAccount>,
    pub scopes: Vec<String>,
    pub access_token: String,
}

/// Serialized account record; `label` and `display_name` are historical
/// aliases and either may be absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredAccount {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl StoredAccount {
    /// Resolve the display label, preferring `label` over `display_name`.
    pub fn resolve_label(&self) -> String {
        self.label
            .clone()
            .or_else(|| self.display_name.clone())
            .unwrap_or_else(|| UNKNOWN_ACCOUNT.to_string())
    }
}

impl From<&AuthSession> for StoredSession {
    fn from(session: &AuthSession) -> Self {
        Self {
            id: session.id.clone(),
            account: Some(StoredAccount {
                id: session.account.id.clone(),
                label: Some(session.account.label.clone()),
                display_name: None,
            }),
            scopes: session.scopes.clone(),
            access_token: session.access_token.clone(),
        }
    }
}

/// Sorted copy of a scope list.
pub fn sorted_scopes(scopes: &[String]) -> Vec<String> {
    let mut sorted = scopes.to_vec();
    sorted.sort();
    sorted
}

/// Order-insensitive scope-set equality.
pub fn scope_sets_equal(a: &[String], b: &[String]) -> bool {
    sorted_scopes(a) == sorted_scopes(b)
}

/// Canonical key for a scope-set: sorted scopes joined by a space.
pub fn scope_key(scopes: &[String]) -> String {
    sorted_scopes(scopes).join(" ")
}

/// Generate an opaque identifier: two random 32-bit words concatenated as
/// lowercase hex. Identifier shape is load-bearing only in that nothing may
/// parse it; treat the result as opaque.
pub fn random_hex_id() -> String {
    let mut rng = rand::thread_rng();
    (0..2).map(|_| format!("{:x}", rng.gen::<u32>())).collect()
}
