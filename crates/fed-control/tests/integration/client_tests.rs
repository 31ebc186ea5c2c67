//! OAuth2 client management against the in-memory credential store.

use fed_control::errors::ControlError;
use fed_control::services::ClientCredentialManager;
use fed_test_utils::*;
use secrecy::SecretString;
use std::collections::HashSet;
use std::sync::Arc;

fn redirects() -> Vec<String> {
    vec![TEST_REDIRECT_A.to_string(), TEST_REDIRECT_B.to_string()]
}

#[tokio::test]
async fn test_add_client_persists_joined_redirects() -> Result<(), anyhow::Error> {
    let store = Arc::new(MemoryCredentialStore::new());
    let manager = ClientCredentialManager::new(store.clone());

    let id = manager
        .add_client(SecretString::from(TEST_CLIENT_SECRET), &redirects())
        .await?;

    assert!(!id.is_empty());
    let stored = store.client(&id).expect("client persisted");
    assert_eq!(stored.redirect_uri, "https://a,https://b");
    assert_eq!(stored.secret, TEST_CLIENT_SECRET);
    Ok(())
}

#[tokio::test]
async fn test_add_client_ids_never_repeat() -> Result<(), anyhow::Error> {
    let store = Arc::new(MemoryCredentialStore::new());
    let manager = ClientCredentialManager::new(store.clone());

    let mut seen = HashSet::new();
    for _ in 0..20 {
        let id = manager
            .add_client(SecretString::from(TEST_CLIENT_SECRET), &redirects())
            .await?;
        assert!(seen.insert(id), "client id was generated twice");
    }
    assert_eq!(store.client_count(), 20);
    Ok(())
}

#[tokio::test]
async fn test_update_then_delete_client() -> Result<(), anyhow::Error> {
    let store = Arc::new(MemoryCredentialStore::new());
    let manager = ClientCredentialManager::new(store.clone());

    let id = manager
        .add_client(SecretString::from("first"), &redirects())
        .await?;
    manager
        .update_client(
            &id,
            SecretString::from("second"),
            &[TEST_REDIRECT_B.to_string()],
        )
        .await?;

    let stored = store.client(&id).expect("client persisted");
    assert_eq!(stored.secret, "second");
    assert_eq!(stored.redirect_uri, TEST_REDIRECT_B);

    manager.delete_client(&id).await?;
    assert!(store.client(&id).is_none());
    Ok(())
}

#[tokio::test]
async fn test_store_without_client_management() {
    let store = Arc::new(MemoryCredentialStore::new().without_client_manager());
    let manager = ClientCredentialManager::new(store.clone());

    let err = manager
        .add_client(SecretString::from(TEST_CLIENT_SECRET), &redirects())
        .await
        .expect_err("capability missing");
    assert!(matches!(err.root(), ControlError::CapabilityUnsupported(_)));
    let id = err.client_id().expect("generated id is returned on failure");
    assert!(!id.is_empty());
    assert!(store.client(id).is_none());

    let err = manager
        .delete_client("any")
        .await
        .expect_err("capability missing");
    assert!(matches!(err, ControlError::CapabilityUnsupported(_)));

    assert_eq!(store.client_count(), 0);
}

#[tokio::test]
async fn test_rejected_client_still_reports_generated_id() {
    let store = Arc::new(MemoryCredentialStore::new().rejecting_clients());
    let manager = ClientCredentialManager::new(store.clone());

    let first = manager
        .add_client(SecretString::from(TEST_CLIENT_SECRET), &redirects())
        .await
        .expect_err("store rejects clients");
    let second = manager
        .add_client(SecretString::from(TEST_CLIENT_SECRET), &redirects())
        .await
        .expect_err("store rejects clients");

    assert!(matches!(first.root(), ControlError::Upstream(_)));
    let first_id = first.client_id().expect("id on failure");
    let second_id = second.client_id().expect("id on failure");
    assert!(!first_id.is_empty());
    assert_ne!(first_id, second_id, "each attempt generates a fresh id");
    assert_eq!(store.client_count(), 0);
}

#[tokio::test]
async fn test_delete_unknown_client_surfaces_store_error() {
    let manager = ClientCredentialManager::new(Arc::new(MemoryCredentialStore::new()));

    let err = manager
        .delete_client("missing")
        .await
        .expect_err("unknown client");
    assert!(matches!(err, ControlError::Upstream(_)));
}
