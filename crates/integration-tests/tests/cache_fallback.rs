//! End-to-end tests for the offline cache-fallback behavior.

#![allow(clippy::unwrap_used)]

use orchard_client::storage::Storage;
use orchard_integration_tests::{MockBackend, client_for, client_over};

#[tokio::test]
async fn fallback_serves_last_known_good_payload() {
    let backend = MockBackend::start().await;
    let (state, _) = client_for(&backend);

    let fresh = state.api().get("products", &[("limit", "6")]).await.unwrap();
    assert_eq!(fresh["products"].as_array().unwrap().len(), 3);

    backend.set_failing(true);

    // Same request fails over the wire but resolves from cache
    let cached = state.api().get("products", &[("limit", "6")]).await.unwrap();
    assert_eq!(cached, fresh);
}

#[tokio::test]
async fn fallback_is_keyed_by_request_not_path() {
    let backend = MockBackend::start().await;
    let (state, _) = client_for(&backend);

    state
        .api()
        .get("products", &[("category", "fruit"), ("limit", "10")])
        .await
        .unwrap();

    backend.set_failing(true);

    // Same logical request, different parameter order: still a hit
    let hit = state
        .api()
        .get("products", &[("limit", "10"), ("category", "fruit")])
        .await;
    assert!(hit.is_ok());

    // A request never made before has nothing to fall back to
    let miss = state
        .api()
        .get("products", &[("category", "household")])
        .await;
    assert!(miss.is_err());
}

#[tokio::test]
async fn explicit_refresh_rejects_instead_of_masking_failure() {
    let backend = MockBackend::start().await;
    let (state, _) = client_for(&backend);

    state.api().get("products", &[("limit", "6")]).await.unwrap();
    backend.set_failing(true);

    // The cached entry exists, but a user-initiated refresh must see the
    // real failure
    let result = state.api().get_fresh("products", &[("limit", "6")]).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn cache_survives_a_client_restart() {
    let backend = MockBackend::start().await;
    let (state, storage) = client_for(&backend);

    let fresh = state.api().get("products", &[]).await.unwrap();
    // The persistent write is detached; wait for it to land
    let mut persisted = false;
    for _ in 0..50 {
        if storage.get("cache:products").unwrap().is_some() {
            persisted = true;
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert!(persisted, "cache entry never reached storage");

    backend.set_failing(true);

    // New client instance over the same device storage: memory front is
    // cold, persistent entry answers
    let reopened = client_over(&backend, storage);
    let cached = reopened.api().get("products", &[]).await.unwrap();
    assert_eq!(cached, fresh);
}

#[tokio::test]
async fn unauthorized_is_never_served_from_cache() {
    let backend = MockBackend::start().await;
    let (state, _) = client_for(&backend);

    state.session().set_token("good-token").unwrap();
    backend.require_token("good-token");

    // Prime the cache while the credential is valid
    state.api().get("products", &[]).await.unwrap();

    // Invalidate the credential server-side
    backend.require_token("rotated-token");

    let result = state.api().get("products", &[]).await;
    assert!(matches!(
        result,
        Err(orchard_client::ApiError::Unauthorized)
    ));

    // The credential was torn down
    assert!(!state.session().is_authenticated());
}
