//! Ephemeral caches running against the in-memory store.

use std::sync::Arc;
use std::time::Duration;

use learnshare_core::CacheError;
use learnshare_core::domain::{User, UserProfile};
use learnshare_core::ephemeral::{EphemeralConfig, EphemeralStores};
use learnshare_core::ports::TtlStore;

use super::InMemoryStore;

fn stores() -> (Arc<InMemoryStore>, EphemeralStores) {
    let store = Arc::new(InMemoryStore::new());
    let stores = EphemeralStores::new(store.clone(), &EphemeralConfig::default());
    (store, stores)
}

#[tokio::test]
async fn test_code_issue_lookup_invalidate() {
    let (_, stores) = stores();

    stores
        .codes
        .issue("user@example.com", "482913")
        .await
        .unwrap();
    assert_eq!(
        stores.codes.lookup("user@example.com").await.unwrap(),
        "482913"
    );

    stores.codes.invalidate("user@example.com").await.unwrap();
    let err = stores.codes.lookup("user@example.com").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_last_issued_code_wins() {
    let (_, stores) = stores();

    stores.codes.issue("user@example.com", "111111").await.unwrap();
    stores.codes.issue("user@example.com", "222222").await.unwrap();

    assert_eq!(
        stores.codes.lookup("user@example.com").await.unwrap(),
        "222222"
    );
    let err = stores
        .codes
        .verify("user@example.com", "111111")
        .await
        .unwrap_err();
    assert!(matches!(err, CacheError::Mismatch));
}

#[tokio::test]
async fn test_lookup_entry_keeps_issue_time() {
    let (_, stores) = stores();
    let before = chrono::Utc::now().timestamp();

    stores.codes.issue("user@example.com", "482913").await.unwrap();
    let entry = stores.codes.lookup_entry("user@example.com").await.unwrap();

    assert_eq!(entry.code, "482913");
    assert!(entry.issued_at.timestamp() >= before);
}

#[tokio::test(start_paused = true)]
async fn test_code_expires_after_ten_minutes() {
    let (_, stores) = stores();

    stores.codes.issue("user@example.com", "482913").await.unwrap();

    tokio::time::advance(Duration::from_secs(599)).await;
    assert!(stores.codes.lookup("user@example.com").await.is_ok());

    tokio::time::advance(Duration::from_secs(1)).await;
    let err = stores.codes.lookup("user@example.com").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_foreign_values_fail_closed() {
    let (store, stores) = stores();

    for raw in ["482913", "48_29_13", ""] {
        store
            .set("verify_code:user@example.com", raw, None)
            .await
            .unwrap();
        let err = stores
            .codes
            .verify("user@example.com", "482913")
            .await
            .unwrap_err();
        assert!(
            matches!(err, CacheError::Format { .. }),
            "{raw:?} gave {err:?}"
        );
    }
}

#[tokio::test]
async fn test_revocation_membership() {
    let (_, stores) = stores();

    assert!(!stores.revocations.is_revoked("tok_abc").await.unwrap());
    stores.revocations.revoke("tok_abc").await.unwrap();

    assert!(stores.revocations.is_revoked("tok_abc").await.unwrap());
    assert!(!stores.revocations.is_revoked("tok_never_seen").await.unwrap());
}

#[tokio::test]
async fn test_revoke_is_idempotent() {
    let (store, stores) = stores();

    stores.revocations.revoke("tok_abc").await.unwrap();
    stores.revocations.revoke("tok_abc").await.unwrap();

    assert!(stores.revocations.is_revoked("tok_abc").await.unwrap());
    assert_eq!(store.len().await, 1);
}

#[tokio::test(start_paused = true)]
async fn test_revocation_mark_expires_after_72_hours() {
    let (_, stores) = stores();

    stores.revocations.revoke("tok_abc").await.unwrap();

    tokio::time::advance(Duration::from_secs(72 * 3600 - 1)).await;
    assert!(stores.revocations.is_revoked("tok_abc").await.unwrap());

    tokio::time::advance(Duration::from_secs(1)).await;
    assert!(!stores.revocations.is_revoked("tok_abc").await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_fixed_window() {
    let (_, stores) = stores();
    let limiter = &stores.rate_limiter;

    assert!(!limiter.is_limited("203.0.113.5").await.unwrap());
    limiter.mark("203.0.113.5").await.unwrap();

    assert!(limiter.is_limited("203.0.113.5").await.unwrap());
    assert!(!limiter.is_limited("203.0.113.9").await.unwrap());

    tokio::time::advance(Duration::from_secs(59)).await;
    assert!(limiter.is_limited("203.0.113.5").await.unwrap());

    tokio::time::advance(Duration::from_secs(1)).await;
    assert!(!limiter.is_limited("203.0.113.5").await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_try_acquire_admits_once_per_window() {
    let (_, stores) = stores();
    let limiter = &stores.rate_limiter;

    assert!(limiter.try_acquire("203.0.113.5").await.unwrap());
    assert!(!limiter.try_acquire("203.0.113.5").await.unwrap());
    assert!(limiter.try_acquire("203.0.113.9").await.unwrap());

    tokio::time::advance(Duration::from_secs(60)).await;
    assert!(limiter.try_acquire("203.0.113.5").await.unwrap());
}

#[tokio::test]
async fn test_try_acquire_under_concurrency() {
    let (_, stores) = stores();

    let attempts = (0..16).map(|_| {
        let limiter = stores.rate_limiter.clone();
        tokio::spawn(async move { limiter.try_acquire("203.0.113.5").await.unwrap() })
    });

    let mut admitted = 0;
    for handle in attempts {
        if handle.await.unwrap() {
            admitted += 1;
        }
    }
    assert_eq!(admitted, 1);
}

#[tokio::test]
async fn test_profile_round_trip() {
    let (store, stores) = stores();
    let user = User::new("alice".into(), "alice@example.com".into(), "secret-hash".into());
    let profile = UserProfile::from(&user);

    stores
        .profiles
        .put(user.id, &profile, Duration::from_secs(300))
        .await
        .unwrap();

    assert_eq!(stores.profiles.get(user.id).await.unwrap(), Some(profile));
    let raw = store.get(&format!("user:{}", user.id)).await.unwrap().unwrap();
    assert!(!raw.contains("secret-hash"));
    assert_eq!(stores.profiles.get(uuid::Uuid::new_v4()).await.unwrap(), None);
}

#[tokio::test(start_paused = true)]
async fn test_profile_expires_with_caller_ttl() {
    let (_, stores) = stores();
    let user = UserProfile::from(&User::new(
        "alice".into(),
        "alice@example.com".into(),
        "hash".into(),
    ));

    stores
        .profiles
        .put(user.id, &user, Duration::from_secs(5))
        .await
        .unwrap();

    tokio::time::advance(Duration::from_secs(5)).await;
    assert_eq!(stores.profiles.get(user.id).await.unwrap(), None);
}

#[tokio::test]
async fn test_components_do_not_share_keys() {
    let (store, stores) = stores();
    let id = "203.0.113.5";

    stores.codes.issue(id, "482913").await.unwrap();
    stores.revocations.revoke(id).await.unwrap();
    stores.rate_limiter.mark(id).await.unwrap();

    assert_eq!(store.len().await, 3);
    assert_eq!(stores.codes.lookup(id).await.unwrap(), "482913");
    assert!(stores.revocations.is_revoked(id).await.unwrap());
}
