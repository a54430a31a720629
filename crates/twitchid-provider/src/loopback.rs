//! Loopback OAuth redirect capture server.
//!
//! A short-lived HTTP listener on `127.0.0.1` that turns a browser-based
//! implicit-grant login into a delivered access token:
//!
//! 1. `GET /signin?nonce=<n>` forwards the browser to the identity
//!    provider's authorize endpoint, appending this server's redirect URI
//!    and the nonce as `state`.
//! 2. The provider redirects back to `/` with the token in the URL
//!    *fragment*. Fragments never reach a server, so the page served there
//!    carries a script that reads `location.hash` and POSTs the token to
//!    `/token`. This is a protocol constraint of the implicit grant, not a
//!    shortcut.
//! 3. `POST /token` checks the nonce and resolves the pending wait exactly
//!    once.

use std::sync::{Arc, Mutex, OnceLock};

use axum::{
    extract::{Form, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, watch};
use tracing::{debug, error, info, warn};
use url::Url;

use twitchid_core::{random_hex_id, AuthError, AuthResult};

/// Token data delivered by the provider redirect.
#[derive(Debug, Clone)]
pub struct OAuthResponse {
    pub access_token: String,
}

/// Shared state for the request handlers.
struct HandlerState {
    nonce: String,
    login_url: Url,
    port: u16,
    response_tx: Mutex<Option<oneshot::Sender<OAuthResponse>>>,
}

/// Per-login loopback server instance.
///
/// One instance serves exactly one login attempt: the nonce binds the
/// browser navigation to this instance, and the pending wait resolves at
/// most once.
pub struct LoopbackAuthServer {
    nonce: String,
    login_url: Url,
    port: OnceLock<u16>,
    response_tx: Mutex<Option<oneshot::Sender<OAuthResponse>>>,
    response_rx: Mutex<Option<oneshot::Receiver<OAuthResponse>>>,
    shutdown_tx: watch::Sender<bool>,
}

impl LoopbackAuthServer {
    /// Create a server that will forward `/signin` to the given authorize
    /// URL. The redirect URI and state are appended once the port is known.
    pub fn new(login_url: Url) -> Self {
        let (response_tx, response_rx) = oneshot::channel();
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            nonce: random_hex_id(),
            login_url,
            port: OnceLock::new(),
            response_tx: Mutex::new(Some(response_tx)),
            response_rx: Mutex::new(Some(response_rx)),
            shutdown_tx,
        }
    }

    /// The nonce correlating browser navigation with this instance.
    pub fn nonce(&self) -> &str {
        &self.nonce
    }

    /// The port the server is listening on, once started.
    pub fn port(&self) -> Option<u16> {
        self.port.get().copied()
    }

    /// Bind an OS-assigned port on loopback and start serving.
    ///
    /// Fails fast on bind failure; no retry.
    pub async fn start(&self) -> AuthResult<u16> {
        let response_tx = self
            .response_tx
            .lock()
            .expect("loopback state lock poisoned")
            .take()
            .ok_or_else(|| AuthError::Server("server already started".to_string()))?;

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| AuthError::Server(format!("failed to bind loopback listener: {e}")))?;
        let port = listener
            .local_addr()
            .map_err(|e| AuthError::Server(format!("failed to read local address: {e}")))?
            .port();
        self.port
            .set(port)
            .map_err(|_| AuthError::Server("server already started".to_string()))?;

        info!("[Loopback] Listening on 127.0.0.1:{port}");

        let state = Arc::new(HandlerState {
            nonce: self.nonce.clone(),
            login_url: self.login_url.clone(),
            port,
            response_tx: Mutex::new(Some(response_tx)),
        });

        let app = Router::new()
            .route("/signin", get(handle_signin))
            .route("/", get(handle_callback))
            .route("/token", post(handle_token))
            .with_state(state);

        let mut shutdown_rx = self.shutdown_tx.subscribe();
        tokio::spawn(async move {
            let server = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.changed().await;
                debug!("[Loopback] Server shutting down");
            });
            if let Err(e) = server.await {
                error!("[Loopback] Server error: {e}");
            }
        });

        Ok(port)
    }

    /// Suspend until the provider redirect delivers a token.
    ///
    /// Does not time out on its own; the owning orchestrator races this
    /// against its timeout and cancellation signals.
    pub async fn wait_for_response(&self) -> AuthResult<OAuthResponse> {
        let rx = self
            .response_rx
            .lock()
            .expect("loopback state lock poisoned")
            .take()
            .ok_or_else(|| AuthError::Server("response already consumed".to_string()))?;
        rx.await
            .map_err(|_| AuthError::Server("server closed before a token was delivered".to_string()))
    }

    /// Stop the server, closing the listening socket. Idempotent; safe to
    /// call whether or not a token was ever delivered. In-flight requests
    /// are allowed to finish. Dropping the server has the same effect: the
    /// shutdown channel closing also ends the serve task.
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}

#[derive(Debug, Deserialize)]
struct SigninQuery {
    nonce: Option<String>,
}

async fn handle_signin(
    State(state): State<Arc<HandlerState>>,
    Query(query): Query<SigninQuery>,
) -> Response {
    if query.nonce.as_deref() != Some(state.nonce.as_str()) {
        warn!("[Loopback] Rejecting /signin with wrong nonce");
        return (StatusCode::FORBIDDEN, "Nonce does not match.").into_response();
    }

    let mut target = state.login_url.clone();
    target
        .query_pairs_mut()
        .append_pair("redirect_uri", &format!("http://127.0.0.1:{}/", state.port))
        .append_pair("state", &state.nonce);

    debug!("[Loopback] Forwarding browser to authorize endpoint");
    Redirect::temporary(target.as_str()).into_response()
}

async fn handle_callback() -> Html<&'static str> {
    Html(RELAY_PAGE)
}

#[derive(Debug, Deserialize)]
struct TokenRelay {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    state: Option<String>,
}

async fn handle_token(
    State(state): State<Arc<HandlerState>>,
    Form(relay): Form<TokenRelay>,
) -> Response {
    if relay.state.as_deref() != Some(state.nonce.as_str()) {
        warn!("[Loopback] Rejecting /token with wrong state nonce");
        return (StatusCode::FORBIDDEN, "State does not match.").into_response();
    }

    let access_token = match relay.access_token {
        Some(token) if !token.is_empty() => token,
        _ => {
            // Leave the pending wait untouched; the orchestrator's timeout
            // or cancellation decides the outcome.
            warn!("[Loopback] Callback relayed no access token");
            return (StatusCode::BAD_REQUEST, "No access token received.").into_response();
        }
    };

    let sender = state
        .response_tx
        .lock()
        .expect("loopback state lock poisoned")
        .take();
    match sender {
        Some(tx) => {
            info!("[Loopback] Access token received");
            let _ = tx.send(OAuthResponse { access_token });
        }
        None => debug!("[Loopback] Token already delivered, ignoring repeat callback"),
    }

    Html(COMPLETE_PAGE).into_response()
}

/// Served at the redirect target. The implicit-grant token lives in
/// `location.hash`, readable only by in-page script, so this page relays it
/// to `/token`.
const RELAY_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Twitch - Signing in...</title>
</head>
<body style="font-family: system-ui; text-align: center; padding: 50px;">
    <p id="status">Completing sign in...</p>
    <script>
        var fragment = new URLSearchParams(window.location.hash.substring(1));
        var body = 'access_token=' + encodeURIComponent(fragment.get('access_token') || '')
            + '&state=' + encodeURIComponent(fragment.get('state') || '');
        fetch('/token', {
            method: 'POST',
            headers: { 'Content-Type': 'application/x-www-form-urlencoded' },
            body: body
        }).then(function (res) {
            document.getElementById('status').textContent = res.ok
                ? 'You are signed in and can close this window.'
                : 'Sign in failed. You can close this window and try again.';
        });
    </script>
</body>
</html>"#;

const COMPLETE_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Twitch - Authentication Successful</title>
</head>
<body style="font-family: system-ui; text-align: center; padding: 50px;">
    <h1>Authentication Successful</h1>
    <p>You can close this window and return to the editor.</p>
    <script>setTimeout(function () { window.close(); }, 2000);</script>
</body>
</html>"#;
