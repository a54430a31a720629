//! Session change events.
//!
//! Every mutation of the session set is published as one delta event so the
//! host and other consumers see exactly what changed, never a full re-emit
//! of unchanged sessions.

use super::AuthSession;

/// Delta emitted whenever the session set changes.
#[derive(Debug, Clone, Default)]
pub struct SessionsChanged {
    pub added: Vec<AuthSession>,
    pub removed: Vec<AuthSession>,
    pub changed: Vec<AuthSession>,
}

impl SessionsChanged {
    /// Event for a single newly created (or replaced) session.
    pub fn added(session: AuthSession) -> Self {
        Self {
            added: vec![session],
            ..Self::default()
        }
    }

    /// Event for a single removed session.
    pub fn removed(session: AuthSession) -> Self {
        Self {
            removed: vec![session],
            ..Self::default()
        }
    }

    /// Event for a reconciliation delta (external writers).
    pub fn delta(added: Vec<AuthSession>, removed: Vec<AuthSession>) -> Self {
        Self {
            added,
            removed,
            changed: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }

    /// Short description for logging.
    pub fn summary(&self) -> String {
        format!(
            "added={} removed={} changed={}",
            self.added.len(),
            self.removed.len(),
            self.changed.len()
        )
    }
}
