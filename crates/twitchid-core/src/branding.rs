//! Centralized provider constants
//!
//! All naming and endpoint configuration for the Twitch identity provider
//! comes from this module.

use std::time::Duration;

/// Human-friendly provider name shown by the host.
pub const DISPLAY_NAME: &str = "Twitch";

/// Stable provider identifier used for host registration.
pub const PROVIDER_ID: &str = "twitch";

/// Service identifier keying the single secret-store blob.
pub const SECRET_SERVICE_ID: &str = "twitch.auth";

/// Base URL of the Twitch identity service.
pub const AUTH_BASE_URL: &str = "https://id.twitch.tv";

/// Built-in OAuth client id, used when the caller does not select one via
/// [`CLIENT_ID_SCOPE_PREFIX`].
pub const DEFAULT_CLIENT_ID: &str = "5thawqf7lsbw8alj87gbcaial7mi3e";

/// Pseudo-scope prefix carrying the OAuth client id.
///
/// Callers smuggle their client id through the scopes parameter as
/// `TWITCH_CLIENT_ID:<value>`; it is stripped before the provider scope
/// string is built.
pub const CLIENT_ID_SCOPE_PREFIX: &str = "TWITCH_CLIENT_ID:";

/// Prefix marking provider-internal pseudo-scopes that must never reach
/// the identity service.
pub const INTERNAL_SCOPE_PREFIX: &str = "TWITCH_";

/// How long a login flow may wait for the browser round trip.
pub const LOGIN_TIMEOUT: Duration = Duration::from_secs(300);

/// Grace period between a settled login race and loopback server shutdown,
/// letting the browser's redirect page finish its final acknowledgment.
pub const SERVER_STOP_GRACE: Duration = Duration::from_secs(5);

/// Authorize endpoint for a given identity-service base URL.
pub fn authorize_endpoint(base_url: &str) -> String {
    format!("{}/oauth2/authorize", base_url.trim_end_matches('/'))
}

/// Userinfo endpoint for a given identity-service base URL.
pub fn userinfo_endpoint(base_url: &str) -> String {
    format!("{}/oauth2/userinfo", base_url.trim_end_matches('/'))
}

/// Token-validation endpoint for a given identity-service base URL.
pub fn validate_endpoint(base_url: &str) -> String {
    format!("{}/oauth2/validate", base_url.trim_end_matches('/'))
}
