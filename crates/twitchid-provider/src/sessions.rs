//! Session store and reconciler.
//!
//! Owns the mapping from session identity to session record and the
//! translation between the in-memory list and the serialized secret-store
//! blob; nothing else reads or writes that blob. All mutation is
//! serialized through one snapshot mutex: lock, mutate or reload, persist,
//! emit. The store blob is shared with other processes, so external edits
//! are reconciled through [`SessionStore::check_for_updates`] rather than
//! assumed away.

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use twitchid_core::{
    branding, random_hex_id, scope_key, sorted_scopes, AuthAccount, AuthError, AuthResult,
    AuthSession, EventSender, IdentityVerifier, LoginHandler, SecretStore, SessionsChanged,
    StoredSession,
};

/// Persistent, reconciled session collection.
pub struct SessionStore {
    secrets: Arc<dyn SecretStore>,
    identity: Arc<dyn IdentityVerifier>,
    login: Arc<dyn LoginHandler>,
    events: EventSender,
    /// The current known sessions. Every read and write goes through this
    /// lock, so overlapping callers observe a consistent ordering.
    sessions: Mutex<Vec<AuthSession>>,
}

impl SessionStore {
    /// Build the store and load the persisted sessions.
    ///
    /// Fails with `MalformedStoredData` when the persisted blob cannot be
    /// parsed; the corrupted blob is destroyed first.
    pub async fn new(
        secrets: Arc<dyn SecretStore>,
        identity: Arc<dyn IdentityVerifier>,
        login: Arc<dyn LoginHandler>,
        events: EventSender,
    ) -> AuthResult<Self> {
        let initial = read_sessions(secrets.as_ref(), identity.as_ref()).await?;
        Ok(Self {
            secrets,
            identity,
            login,
            events,
            sessions: Mutex::new(initial),
        })
    }

    /// List sessions. With `scopes` given (and non-empty), only the session
    /// whose sorted scope-set matches exactly.
    pub async fn get_sessions(&self, scopes: Option<&[String]>) -> Vec<AuthSession> {
        let sorted = scopes.map(sorted_scopes).unwrap_or_default();
        info!(
            "[Sessions] Getting sessions for {}...",
            if sorted.is_empty() {
                "all scopes".to_string()
            } else {
                sorted.join(",")
            }
        );

        let sessions = self.sessions.lock().await;
        let matching: Vec<AuthSession> = if sorted.is_empty() {
            sessions.clone()
        } else {
            sessions
                .iter()
                .filter(|s| s.sorted_scopes() == sorted)
                .cloned()
                .collect()
        };

        info!(
            "[Sessions] Got {} sessions for {}",
            matching.len(),
            if sorted.is_empty() {
                "all scopes".to_string()
            } else {
                sorted.join(",")
            }
        );
        matching
    }

    /// Run the login flow and persist the resulting session.
    ///
    /// An existing session with the same id or the same sorted scope-set is
    /// replaced in place; otherwise the new session is appended. Emits an
    /// added-session delta on success. Cancellation re-throws silently; any
    /// other failure logs the user-facing message and re-throws.
    pub async fn create_session(
        &self,
        scopes: &[String],
        cancel: CancellationToken,
    ) -> AuthResult<AuthSession> {
        match self.create_session_inner(scopes, cancel).await {
            Ok(session) => {
                info!("[Sessions] Login success!");
                Ok(session)
            }
            Err(e) if e.is_cancellation() => {
                debug!("[Sessions] Login cancelled");
                Err(e)
            }
            Err(e) => {
                error!("[Sessions] Sign in failed: {e}");
                Err(e)
            }
        }
    }

    async fn create_session_inner(
        &self,
        scopes: &[String],
        cancel: CancellationToken,
    ) -> AuthResult<AuthSession> {
        // Callers select their own OAuth client id through the pseudo-scope;
        // without it the built-in client id is used.
        let client_id = scopes
            .iter()
            .find_map(|s| s.strip_prefix(branding::CLIENT_ID_SCOPE_PREFIX))
            .filter(|v| !v.is_empty())
            .unwrap_or(branding::DEFAULT_CLIENT_ID);

        // Provider-internal pseudo-scopes never reach the login flow.
        let scope_string = scopes
            .iter()
            .filter(|s| !s.starts_with(branding::INTERNAL_SCOPE_PREFIX))
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ");

        let token = self.login.login(&scope_string, client_id, cancel).await?;
        let session = self.token_to_session(&token, scopes).await?;

        let mut sessions = self.sessions.lock().await;
        let sorted = sorted_scopes(scopes);
        let existing = sessions
            .iter()
            .position(|s| s.id == session.id || s.sorted_scopes() == sorted);
        match existing {
            Some(index) => sessions[index] = session.clone(),
            None => sessions.push(session.clone()),
        }
        self.persist(&sessions).await?;
        drop(sessions);

        self.events.emit(SessionsChanged::added(session.clone()));
        Ok(session)
    }

    /// Remove a session by exact id.
    ///
    /// An unknown id is a logged error and a no-op, not a failure.
    pub async fn remove_session(&self, id: &str) -> AuthResult<()> {
        info!("[Sessions] Logging out of {id}");
        match self.remove_session_inner(id).await {
            Ok(()) => Ok(()),
            Err(e) => {
                error!("[Sessions] Sign out failed: {e}");
                Err(e)
            }
        }
    }

    async fn remove_session_inner(&self, id: &str) -> AuthResult<()> {
        let mut sessions = self.sessions.lock().await;
        let Some(index) = sessions.iter().position(|s| s.id == id) else {
            error!("[Sessions] Session not found: {id}");
            return Ok(());
        };

        let removed = sessions.remove(index);
        self.persist(&sessions).await?;
        drop(sessions);

        self.events.emit(SessionsChanged::removed(removed));
        Ok(())
    }

    /// Reconcile with an externally mutated store.
    ///
    /// Called on store-change notifications from the host (another window
    /// editing the same store). Reloads the persisted list, emits exactly
    /// the added/removed delta by id, and replaces the snapshot. Unchanged
    /// sessions are never re-emitted.
    pub async fn check_for_updates(&self) -> AuthResult<()> {
        let mut sessions = self.sessions.lock().await;
        let stored = read_sessions(self.secrets.as_ref(), self.identity.as_ref()).await?;

        let added: Vec<AuthSession> = stored
            .iter()
            .filter(|s| !sessions.iter().any(|p| p.id == s.id))
            .cloned()
            .collect();
        let removed: Vec<AuthSession> = sessions
            .iter()
            .filter(|p| !stored.iter().any(|s| s.id == p.id))
            .cloned()
            .collect();

        *sessions = stored;
        drop(sessions);

        if !added.is_empty() {
            info!("[Sessions] Adding {} session(s) found in storage", added.len());
        }
        if !removed.is_empty() {
            info!(
                "[Sessions] Removing {} session(s) no longer found in storage",
                removed.len()
            );
        }
        if !added.is_empty() || !removed.is_empty() {
            self.events.emit(SessionsChanged::delta(added, removed));
        }
        Ok(())
    }

    async fn token_to_session(&self, token: &str, scopes: &[String]) -> AuthResult<AuthSession> {
        let info = self.identity.user_info(token).await?;
        Ok(AuthSession {
            id: random_hex_id(),
            account: AuthAccount {
                id: info.id,
                label: info.account_name,
            },
            // the caller's requested scope order is preserved for return
            scopes: scopes.to_vec(),
            access_token: token.to_string(),
        })
    }

    async fn persist(&self, sessions: &[AuthSession]) -> AuthResult<()> {
        info!("[Sessions] Storing {} sessions...", sessions.len());
        persist_sessions(self.secrets.as_ref(), sessions).await
    }
}

async fn persist_sessions(secrets: &dyn SecretStore, sessions: &[AuthSession]) -> AuthResult<()> {
    let stored: Vec<StoredSession> = sessions.iter().map(StoredSession::from).collect();
    let blob =
        serde_json::to_string(&stored).map_err(|e| AuthError::Store(e.to_string()))?;
    secrets
        .set(&blob)
        .await
        .map_err(|e| AuthError::Store(e.to_string()))
}

/// Load, deduplicate, and verify the persisted session list.
///
/// - A missing blob is an empty list.
/// - A blob that fails to parse is unrecoverable: it is deleted and the
///   parse error propagates.
/// - Duplicates by sorted scope-set keep the first occurrence.
/// - Records lacking account info are verified concurrently against the
///   identity provider; an unauthorized token drops the record silently,
///   and any other per-record failure drops that record without aborting
///   the batch.
/// - When verification pruned anything, the pruned list is persisted back
///   immediately.
async fn read_sessions(
    secrets: &dyn SecretStore,
    identity: &dyn IdentityVerifier,
) -> AuthResult<Vec<AuthSession>> {
    info!("[Sessions] Reading sessions from secret storage...");
    let blob = secrets.get().await.map_err(|e| {
        error!("[Sessions] Reading stored sessions failed: {e}");
        AuthError::Store(e.to_string())
    })?;
    let Some(blob) = blob else {
        return Ok(Vec::new());
    };

    let stored: Vec<StoredSession> = match serde_json::from_str(&blob) {
        Ok(stored) => stored,
        Err(e) => {
            // Stored data is unrecoverable; destroy it rather than attempt
            // partial repair.
            error!("[Sessions] Stored session data is malformed: {e}");
            if let Err(delete_err) = secrets.delete().await {
                warn!("[Sessions] Could not delete malformed blob: {delete_err}");
            }
            return Err(AuthError::MalformedStoredData(e.to_string()));
        }
    };
    let stored_count = stored.len();

    let mut scopes_seen = HashSet::new();
    let mut unique = Vec::new();
    for record in stored {
        if scopes_seen.insert(scope_key(&record.scopes)) {
            unique.push(record);
        } else {
            debug!(
                "[Sessions] Dropping duplicate session for scope-set: {}",
                scope_key(&record.scopes)
            );
        }
    }

    let verified: Vec<AuthSession> =
        join_all(unique.into_iter().map(|record| verify_record(identity, record)))
            .await
            .into_iter()
            .flatten()
            .collect();

    info!("[Sessions] Got {} verified sessions", verified.len());
    if verified.len() != stored_count {
        persist_sessions(secrets, &verified).await?;
    }
    Ok(verified)
}

/// Turn one stored record into a surfaceable session.
///
/// Records with embedded account info are trusted as-is; the rest are
/// verified against the identity provider.
async fn verify_record(
    identity: &dyn IdentityVerifier,
    record: StoredSession,
) -> Option<AuthSession> {
    let account = match record.account {
        Some(account) => AuthAccount {
            label: account.resolve_label(),
            id: account.id,
        },
        None => match identity.user_info(&record.access_token).await {
            Ok(info) => {
                info!(
                    "[Sessions] Verified session with the following scopes: {}",
                    scope_key(&record.scopes)
                );
                AuthAccount {
                    id: info.id,
                    label: info.account_name,
                }
            }
            Err(AuthError::Unauthorized) => {
                // Stale or revoked token; drop without surfacing an error.
                info!("[Sessions] Dropping session with rejected token");
                return None;
            }
            Err(e) => {
                warn!("[Sessions] Could not verify session: {e}");
                return None;
            }
        },
    };

    Some(AuthSession {
        id: record.id,
        account,
        // keep the original order of the scopes requested by the caller
        scopes: record.scopes,
        access_token: record.access_token,
    })
}
