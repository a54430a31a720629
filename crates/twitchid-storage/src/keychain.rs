//! OS keychain-backed secret store.
//!
//! Uses the platform-native secure storage:
//! - Windows: Credential Manager
//! - macOS: Keychain
//! - Linux: Secret Service (GNOME Keyring, KWallet)

use anyhow::Context;
use async_trait::async_trait;
use keyring::Entry;
use tracing::{debug, error};
use zeroize::Zeroizing;

use twitchid_core::{branding, RepoResult, SecretStore};

/// Entry name for the serialized session blob.
const SESSIONS_ENTRY: &str = "sessions";

/// Keychain-backed [`SecretStore`] holding the one session blob under a
/// fixed service identifier.
pub struct KeychainSecretStore {
    service: String,
    entry_name: String,
}

impl KeychainSecretStore {
    /// Create a store under the default service identifier.
    pub fn new() -> Self {
        Self::with_service(branding::SECRET_SERVICE_ID)
    }

    /// Create a store under a custom service identifier (for testing).
    pub fn with_service(service: &str) -> Self {
        Self {
            service: service.to_string(),
            entry_name: SESSIONS_ENTRY.to_string(),
        }
    }

    fn entry(service: &str, entry_name: &str) -> RepoResult<Entry> {
        Entry::new(service, entry_name).context("Failed to create keychain entry")
    }
}

impl Default for KeychainSecretStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SecretStore for KeychainSecretStore {
    async fn get(&self) -> RepoResult<Option<String>> {
        let service = self.service.clone();
        let entry_name = self.entry_name.clone();
        tokio::task::spawn_blocking(move || {
            let entry = Self::entry(&service, &entry_name)?;
            match entry.get_password() {
                Ok(blob) => {
                    debug!("[Keychain] Token acquired from secret storage");
                    Ok(Some(blob))
                }
                Err(keyring::Error::NoEntry) => Ok(None),
                Err(e) => {
                    error!("[Keychain] Getting token failed: {e}");
                    Err(anyhow::anyhow!("Failed to read secret: {e}"))
                }
            }
        })
        .await
        .context("keychain read task failed")?
    }

    async fn set(&self, value: &str) -> RepoResult<()> {
        let service = self.service.clone();
        let entry_name = self.entry_name.clone();
        let value = Zeroizing::new(value.to_string());
        tokio::task::spawn_blocking(move || {
            let entry = Self::entry(&service, &entry_name)?;
            entry.set_password(&value).map_err(|e| {
                error!("[Keychain] Setting token failed: {e}");
                anyhow::anyhow!("Failed to store secret: {e}")
            })
        })
        .await
        .context("keychain write task failed")?
    }

    async fn delete(&self) -> RepoResult<()> {
        let service = self.service.clone();
        let entry_name = self.entry_name.clone();
        tokio::task::spawn_blocking(move || {
            let entry = Self::entry(&service, &entry_name)?;
            match entry.delete_credential() {
                Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
                Err(e) => {
                    error!("[Keychain] Deleting token failed: {e}");
                    Err(anyhow::anyhow!("Failed to delete secret: {e}"))
                }
            }
        })
        .await
        .context("keychain delete task failed")?
    }
}

/// In-memory [`SecretStore`] for tests and ephemeral profiles.
#[derive(Default)]
pub struct MemorySecretStore {
    value: std::sync::Mutex<Option<Zeroizing<String>>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seeded store.
    pub fn with_value(value: &str) -> Self {
        Self {
            value: std::sync::Mutex::new(Some(Zeroizing::new(value.to_string()))),
        }
    }
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    async fn get(&self) -> RepoResult<Option<String>> {
        Ok(self
            .value
            .lock()
            .expect("secret store lock poisoned")
            .as_ref()
            .map(|v| v.to_string()))
    }

    async fn set(&self, value: &str) -> RepoResult<()> {
        *self.value.lock().expect("secret store lock poisoned") =
            Some(Zeroizing::new(value.to_string()));
        Ok(())
    }

    async fn delete(&self) -> RepoResult<()> {
        *self.value.lock().expect("secret store lock poisoned") = None;
        Ok(())
    }
}
