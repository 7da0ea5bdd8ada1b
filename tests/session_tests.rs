use chrono::Duration;
use homestay::{
    SessionStore,
    models::{Identity, Role},
    session::MemorySessionStore,
};
use uuid::Uuid;

fn identity(role: Role) -> Identity {
    Identity {
        id: Uuid::new_v4(),
        username: "ada_l".to_string(),
        email: "ada@example.com".to_string(),
        role,
    }
}

#[tokio::test]
async fn create_then_get_returns_snapshot() {
    let store = MemorySessionStore::new();
    let snapshot = identity(Role::User);
    let token = store.create(snapshot.clone()).await.unwrap();

    let resolved = store.get(&token).await.unwrap();
    assert_eq!(resolved, snapshot);
}

#[tokio::test]
async fn tokens_are_opaque_and_distinct() {
    let store = MemorySessionStore::new();
    let a = store.create(identity(Role::User)).await.unwrap();
    let b = store.create(identity(Role::User)).await.unwrap();
    assert_ne!(a, b);
    // 32 random bytes, hex encoded.
    assert_eq!(a.len(), 64);
    assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
}

#[tokio::test]
async fn unknown_token_resolves_to_none() {
    let store = MemorySessionStore::new();
    assert!(store.get("deadbeef").await.is_none());
}

#[tokio::test]
async fn destroy_invalidates_token() {
    let store = MemorySessionStore::new();
    let token = store.create(identity(Role::Admin)).await.unwrap();
    store.destroy(&token).await;
    assert!(store.get(&token).await.is_none());
    assert_eq!(store.active_sessions(), 0);
}

#[tokio::test]
async fn destroying_unknown_token_is_a_noop() {
    let store = MemorySessionStore::new();
    let token = store.create(identity(Role::User)).await.unwrap();
    store.destroy("deadbeef").await;
    assert!(store.get(&token).await.is_some());
}

#[tokio::test]
async fn expired_session_is_gone() {
    // Zero TTL: the session is already past its window at lookup time.
    let store = MemorySessionStore::with_ttl(Duration::zero());
    let token = store.create(identity(Role::User)).await.unwrap();
    assert!(store.get(&token).await.is_none());
    // The expired row is reaped, not just hidden.
    assert_eq!(store.active_sessions(), 0);
}

#[tokio::test]
async fn lookup_slides_the_expiry_window() {
    let store = MemorySessionStore::with_ttl(Duration::milliseconds(80));
    let token = store.create(identity(Role::User)).await.unwrap();

    // Touch the session twice inside the window; each hit extends it, so
    // the total elapsed time exceeds the original TTL.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert!(store.get(&token).await.is_some());
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert!(store.get(&token).await.is_some());
}
