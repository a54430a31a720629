//! TwitchId Core
//!
//! Domain types, contracts, and the event bus for the Twitch
//! authentication provider:
//! - Session entity with order-insensitive scope-set semantics
//! - Error taxonomy for the login and reconciliation paths
//! - Traits for the secret store, identity verification, and login flow
//! - Broadcast event bus carrying session deltas

pub mod branding;
pub mod domain;
mod error;
mod event_bus;
mod provider;
mod repository;

pub use domain::{
    random_hex_id, scope_key, scope_sets_equal, sorted_scopes, AuthAccount, AuthSession,
    SessionsChanged, StoredAccount, StoredSession, UNKNOWN_ACCOUNT,
};
pub use error::{AuthError, AuthResult};
pub use event_bus::{EventBus, EventReceiver, EventSender};
pub use provider::AuthenticationProvider;
pub use repository::{
    IdentityVerifier, LoginHandler, RepoResult, SecretStore, TokenValidation, UserInfo,
};
