//! TwitchId Storage
//!
//! [`SecretStore`](twitchid_core::SecretStore) backends: the OS keychain
//! for production and an in-memory store for tests.

mod keychain;

pub use keychain::{KeychainSecretStore, MemorySecretStore};
