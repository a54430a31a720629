//! Identity-provider REST client.
//!
//! Thin reqwest wrapper over the Twitch identity endpoints. One attempt per
//! call, no retries; failures propagate to the caller.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{error, info};

use twitchid_core::{branding, AuthError, AuthResult, IdentityVerifier, TokenValidation, UserInfo};

/// HTTP client for the identity provider's userinfo and validate endpoints.
pub struct IdentityClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct UserInfoBody {
    /// The user's id on Twitch (ex: 12345678).
    sub: String,
    /// The user's display name on Twitch (ex: clarkio).
    preferred_username: String,
}

#[derive(Debug, Deserialize)]
struct ValidateBody {
    #[serde(default)]
    login: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl IdentityClient {
    /// Client against the production identity service.
    pub fn new() -> Self {
        Self::with_base_url(branding::AUTH_BASE_URL)
    }

    /// Client against a custom base URL (for tests).
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.to_string(),
        }
    }

    /// Error message for a non-2xx response: prefer the JSON body's
    /// `message` field, fall back to the HTTP status text.
    fn error_message(status: StatusCode, body: &str) -> String {
        serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.message)
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            })
    }
}

impl Default for IdentityClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityVerifier for IdentityClient {
    async fn user_info(&self, token: &str) -> AuthResult<UserInfo> {
        info!("[Identity] Getting user info...");
        let response = self
            .http
            .get(branding::userinfo_endpoint(&self.base_url))
            .header("Content-Type", "application/json")
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| {
                error!("[Identity] Userinfo request failed: {e}");
                AuthError::Network(e.to_string())
            })?;

        let status = response.status();
        if status.is_success() {
            let body: UserInfoBody = response.json().await.map_err(|e| {
                error!("[Identity] Unexpected response from provider: {e}");
                AuthError::Provider(format!("unexpected response from provider: {e}"))
            })?;
            info!("[Identity] Got account info!");
            return Ok(UserInfo {
                id: body.sub,
                account_name: body.preferred_username,
            });
        }

        if status == StatusCode::UNAUTHORIZED {
            error!("[Identity] Getting account info failed: token rejected");
            return Err(AuthError::Unauthorized);
        }

        let body = response.text().await.unwrap_or_default();
        let message = Self::error_message(status, &body);
        error!("[Identity] Getting account info failed: {message}");
        Err(AuthError::Provider(message))
    }

    async fn validate_token(&self, token: &str) -> AuthResult<TokenValidation> {
        let response = self
            .http
            .get(branding::validate_endpoint(&self.base_url))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| {
                error!("[Identity] Validate request failed: {e}");
                AuthError::Network(e.to_string())
            })?;

        if !response.status().is_success() {
            return Ok(TokenValidation {
                valid: false,
                login: String::new(),
            });
        }

        let body: ValidateBody = response.json().await.map_err(|e| {
            error!("[Identity] Unexpected response from provider: {e}");
            AuthError::Provider(format!("unexpected response from provider: {e}"))
        })?;
        Ok(TokenValidation {
            valid: true,
            login: body.login,
        })
    }
}
