//! End-to-end login orchestration.
//!
//! Builds the authorize URL, launches the external browser, and races the
//! loopback server's delivered token against a timeout and the host's
//! cancellation signal. Whichever settles first decides the outcome; the
//! loser branches still shut the server down after a short grace period.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use url::Url;

use twitchid_core::{branding, AuthError, AuthResult, LoginHandler};

use crate::loopback::LoopbackAuthServer;

/// Launches a URL in the user's browser.
type BrowserLauncher = dyn Fn(&str) -> anyhow::Result<()> + Send + Sync;

/// Drives one interactive login at a time.
///
/// Concurrent `login` calls on one instance are not a supported use case; a
/// second caller would race the first's server instance.
pub struct LoginOrchestrator {
    auth_base_url: String,
    timeout: Duration,
    stop_grace: Duration,
    launcher: Box<BrowserLauncher>,
}

impl LoginOrchestrator {
    pub fn new() -> Self {
        Self {
            auth_base_url: branding::AUTH_BASE_URL.to_string(),
            timeout: branding::LOGIN_TIMEOUT,
            stop_grace: branding::SERVER_STOP_GRACE,
            launcher: Box::new(|url| open::that(url).map_err(anyhow::Error::from)),
        }
    }

    /// Point at a different identity-service base URL (for tests).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.auth_base_url = base_url.to_string();
        self
    }

    /// Override the 300 s login timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the grace period before the loopback server is stopped.
    pub fn with_stop_grace(mut self, grace: Duration) -> Self {
        self.stop_grace = grace;
        self
    }

    /// Replace the system-browser launcher (for tests).
    pub fn with_browser_launcher(
        mut self,
        launcher: impl Fn(&str) -> anyhow::Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.launcher = Box::new(launcher);
        self
    }

    /// Authorize URL for the implicit grant. The loopback server appends
    /// `redirect_uri` and `state` once its port is known.
    fn authorize_url(&self, scopes: &str, client_id: &str) -> AuthResult<Url> {
        let mut url = Url::parse(&branding::authorize_endpoint(&self.auth_base_url))
            .map_err(|e| AuthError::Server(format!("invalid authorize endpoint: {e}")))?;
        url.query_pairs_mut()
            .append_pair("client_id", client_id)
            .append_pair("response_type", "token")
            .append_pair("scope", scopes)
            .append_pair("force_verify", "true")
            .append_pair("claims", r#"{"userinfo":{"preferred_username":null}}"#);
        Ok(url)
    }

    async fn drive(
        &self,
        server: &LoopbackAuthServer,
        port: u16,
        cancel: CancellationToken,
    ) -> AuthResult<String> {
        let signin_url = format!(
            "http://127.0.0.1:{port}/signin?nonce={}",
            urlencoding::encode(server.nonce())
        );
        (self.launcher)(&signin_url)
            .map_err(|e| AuthError::Server(format!("failed to open browser: {e}")))?;

        tokio::select! {
            response = server.wait_for_response() => response.map(|r| r.access_token),
            _ = tokio::time::sleep(self.timeout) => Err(AuthError::TimedOut),
            _ = cancel.cancelled() => Err(AuthError::Cancelled),
        }
    }
}

impl Default for LoginOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LoginHandler for LoginOrchestrator {
    async fn login(
        &self,
        scopes: &str,
        client_id: &str,
        cancel: CancellationToken,
    ) -> AuthResult<String> {
        info!("[Login] Logging in for the following scopes: {scopes}");

        let login_url = self.authorize_url(scopes, client_id)?;
        let server = Arc::new(LoopbackAuthServer::new(login_url));
        let port = server.start().await?;

        let outcome = self.drive(&server, port, cancel).await;

        // The browser's redirect page may still be posting its final
        // acknowledgment; give it a moment before closing the socket.
        let grace = self.stop_grace;
        let server_to_stop = Arc::clone(&server);
        tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            server_to_stop.stop();
            debug!("[Login] Loopback server stopped");
        });

        outcome
    }
}
