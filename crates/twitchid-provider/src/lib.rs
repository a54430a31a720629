//! TwitchId Provider
//!
//! The active authentication components:
//! - Loopback OAuth redirect capture server (implicit grant)
//! - Identity client for userinfo lookup and token validation
//! - Login orchestrator racing token delivery, timeout, and cancellation
//! - Session store reconciling the shared secret-store blob
//! - The host-facing provider façade

pub mod identity;
pub mod login;
pub mod loopback;
pub mod provider;
pub mod sessions;

pub use identity::IdentityClient;
pub use login::LoginOrchestrator;
pub use loopback::{LoopbackAuthServer, OAuthResponse};
pub use provider::{AuthContext, TwitchAuthProvider};
pub use sessions::SessionStore;
