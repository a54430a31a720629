//! Session store behavior: listing, creation, replacement

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use tests::events::{assert_no_event, next_event};
use tests::{blob_of, stored_record, StubIdentity, StubLogin};
use tokio_util::sync::CancellationToken;
use twitchid_core::{AuthError, EventBus, SecretStore};
use twitchid_provider::SessionStore;
use twitchid_storage::MemorySecretStore;

fn scopes(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

async fn store_with(
    blob: Option<String>,
    identity: StubIdentity,
    login: StubLogin,
) -> (SessionStore, EventBus, Arc<MemorySecretStore>) {
    let secrets = Arc::new(match blob {
        Some(blob) => MemorySecretStore::with_value(&blob),
        None => MemorySecretStore::new(),
    });
    let events = EventBus::new();
    let store = SessionStore::new(
        secrets.clone(),
        Arc::new(identity),
        Arc::new(login),
        events.sender(),
    )
    .await
    .unwrap();
    (store, events, secrets)
}

#[tokio::test]
async fn test_get_sessions_is_scope_order_insensitive() {
    let blob = blob_of(&[
        stored_record("s1", &["user:read:email", "chat:read"], "t1"),
        stored_record("s2", &["bits:read"], "t2"),
    ]);
    let (store, _events, _secrets) =
        store_with(Some(blob), StubIdentity::new(), StubLogin::returning("t")).await;

    let forward = store
        .get_sessions(Some(&scopes(&["chat:read", "user:read:email"])))
        .await;
    let backward = store
        .get_sessions(Some(&scopes(&["user:read:email", "chat:read"])))
        .await;

    assert_eq!(forward.len(), 1);
    assert_eq!(forward[0].id, "s1");
    assert_eq!(forward, backward);
}

#[tokio::test]
async fn test_get_sessions_without_filter_returns_all() {
    let blob = blob_of(&[
        stored_record("s1", &["a"], "t1"),
        stored_record("s2", &["b"], "t2"),
    ]);
    let (store, _events, _secrets) =
        store_with(Some(blob), StubIdentity::new(), StubLogin::returning("t")).await;

    assert_eq!(store.get_sessions(None).await.len(), 2);
    assert_eq!(store.get_sessions(Some(&[])).await.len(), 2);
}

#[tokio::test]
async fn test_load_after_store_is_idempotent_modulo_dedup() {
    // two records with permuted scope-sets: first occurrence wins
    let blob = blob_of(&[
        stored_record("first", &["a", "b"], "t1"),
        stored_record("dup", &["b", "a"], "t2"),
        stored_record("other", &["c"], "t3"),
    ]);
    let (store, _events, secrets) =
        store_with(Some(blob), StubIdentity::new(), StubLogin::returning("t")).await;

    let loaded = store.get_sessions(None).await;
    let ids: Vec<&str> = loaded.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["first", "other"]);

    // reloading the pruned blob yields the same list
    let (reloaded_store, _events2, _secrets2) = store_with(
        secrets.get().await.unwrap(),
        StubIdentity::new(),
        StubLogin::returning("t"),
    )
    .await;
    let reloaded = reloaded_store.get_sessions(None).await;
    assert_eq!(reloaded, loaded);
}

#[tokio::test]
async fn test_create_session_appends_and_emits() {
    let (store, events, secrets) =
        store_with(None, StubIdentity::new(), StubLogin::returning("abc123")).await;
    let mut rx = events.subscribe();

    let session = store
        .create_session(&scopes(&["user:read:email"]), CancellationToken::new())
        .await
        .unwrap();

    assert!(!session.id.is_empty());
    assert_eq!(session.scopes, scopes(&["user:read:email"]));
    assert_eq!(session.account.id, "42");
    assert_eq!(session.account.label, "clarkio");
    assert_eq!(session.access_token, "abc123");

    let event = next_event(&mut rx, Duration::from_secs(1)).await;
    assert_eq!(event.added.len(), 1);
    assert_eq!(event.added[0], session);
    assert!(event.removed.is_empty());

    let blob = secrets.get().await.unwrap().unwrap();
    assert!(blob.contains("abc123"));
}

#[tokio::test]
async fn test_create_session_strips_pseudo_scopes_and_selects_client_id() {
    let login = Arc::new(StubLogin::returning("abc123"));
    let events = EventBus::new();
    let store = SessionStore::new(
        Arc::new(MemorySecretStore::new()),
        Arc::new(StubIdentity::new()),
        login.clone(),
        events.sender(),
    )
    .await
    .unwrap();

    let requested = scopes(&["user:read:email", "TWITCH_CLIENT_ID:my-client"]);
    let session = store
        .create_session(&requested, CancellationToken::new())
        .await
        .unwrap();

    let calls = login.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "user:read:email");
    assert_eq!(calls[0].1, "my-client");
    // the session keeps the caller's full scope list, pseudo-scope included
    assert_eq!(session.scopes, requested);
}

#[tokio::test]
async fn test_create_session_uses_default_client_id_without_pseudo_scope() {
    let login = Arc::new(StubLogin::returning("abc123"));
    let events = EventBus::new();
    let store = SessionStore::new(
        Arc::new(MemorySecretStore::new()),
        Arc::new(StubIdentity::new()),
        login.clone(),
        events.sender(),
    )
    .await
    .unwrap();

    store
        .create_session(&scopes(&["user:read:email"]), CancellationToken::new())
        .await
        .unwrap();

    let calls = login.calls();
    assert_eq!(calls[0].0, "user:read:email");
    assert!(!calls[0].1.is_empty());
}

#[tokio::test]
async fn test_create_session_replaces_scope_set_equal_session_in_place() {
    let blob = blob_of(&[
        stored_record("existing", &["a", "b"], "old-token"),
        stored_record("other", &["c"], "t3"),
    ]);
    let (store, events, _secrets) = store_with(
        Some(blob),
        StubIdentity::new(),
        StubLogin::returning("new-token"),
    )
    .await;
    let mut rx = events.subscribe();

    let session = store
        .create_session(&scopes(&["b", "a"]), CancellationToken::new())
        .await
        .unwrap();

    let all = store.get_sessions(None).await;
    // count unchanged, replacement kept its array position
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].id, session.id);
    assert_eq!(all[0].access_token, "new-token");
    assert_eq!(all[1].id, "other");

    let event = next_event(&mut rx, Duration::from_secs(1)).await;
    assert_eq!(event.added.len(), 1);
}

#[tokio::test]
async fn test_cancelled_login_rethrows_without_event() {
    let (store, events, secrets) =
        store_with(None, StubIdentity::new(), StubLogin::hanging()).await;
    let mut rx = events.subscribe();

    let cancel = CancellationToken::new();
    let requested_scopes = scopes(&["user:read:email"]);
    let create = store.create_session(&requested_scopes, cancel.clone());
    let trigger = async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();
    };
    let (result, ()) = tokio::join!(create, trigger);

    assert!(matches!(result, Err(AuthError::Cancelled)));
    assert_no_event(&mut rx, Duration::from_millis(200)).await;
    assert_eq!(secrets.get().await.unwrap(), None);
}
