//! Domain types for the authentication provider.

mod event;
mod session;

pub use event::SessionsChanged;
pub use session::{
    random_hex_id, scope_key, scope_sets_equal, sorted_scopes, AuthAccount, AuthSession,
    StoredAccount, StoredSession, UNKNOWN_ACCOUNT,
};
