//! The command-layer facade composed over in-memory stores.

use fed_control::control::Control;
use fed_control::errors::ControlError;
use fed_control::models::ActorType;
use fed_control::storage::{BackendConfig, StorageBackends, StorageKind};
use fed_test_utils::*;
use secrecy::{SecretSlice, SecretString};
use std::sync::Arc;

fn storage(path: &std::path::Path) -> BackendConfig {
    BackendConfig {
        kind: StorageKind::Fs,
        path: path.to_path_buf(),
        cache_enable: false,
        base_url: TEST_BASE_URL.to_string(),
    }
}

struct Fixture {
    repository: Arc<MemoryRepository>,
    credentials: Arc<MemoryCredentialStore>,
    control: Control,
    _dir: tempfile::TempDir,
}

fn fixture(repository: MemoryRepository, credentials: MemoryCredentialStore) -> Fixture {
    let dir = tempfile::tempdir().expect("tempdir");
    let repository = Arc::new(repository);
    let credentials = Arc::new(credentials);
    let control = Control::new(storage(dir.path()), repository.clone(), credentials.clone());
    Fixture {
        repository,
        credentials,
        control,
        _dir: dir,
    }
}

#[tokio::test]
async fn test_actor_lifecycle_through_control() -> Result<(), anyhow::Error> {
    let f = fixture(MemoryRepository::new(), MemoryCredentialStore::new());

    let actor = f
        .control
        .add_actor(
            TEST_USERNAME_ALICE,
            ActorType::Person,
            Some(SecretSlice::from(b"pw".to_vec())),
        )
        .await?;
    actor
        .assert_has_id()
        .assert_addresses_derived()
        .assert_oauth_rooted_at(TEST_BASE_URL);

    let id = actor.id.expect("id generated");
    assert_eq!(f.repository.password_for(&id), Some(b"pw".to_vec()));

    f.control.delete_actor(id.as_str()).await?;
    assert_eq!(f.repository.count_matching(&id), 0);

    let err = f
        .control
        .delete_actor(id.as_str())
        .await
        .expect_err("already deleted");
    assert!(matches!(err, ControlError::NotFound(_)));
    Ok(())
}

#[tokio::test]
async fn test_client_lifecycle_through_control() -> Result<(), anyhow::Error> {
    let f = fixture(MemoryRepository::new(), MemoryCredentialStore::new());
    let redirects = vec![TEST_REDIRECT_A.to_string(), TEST_REDIRECT_B.to_string()];

    let id = f
        .control
        .add_client(SecretString::from("first"), &redirects)
        .await?;
    let stored = f.credentials.client(&id).expect("client persisted");
    assert_eq!(stored.redirect_uri, "https://a,https://b");

    f.control
        .update_client(&id, SecretString::from("second"), &[TEST_REDIRECT_A.to_string()])
        .await?;
    let stored = f.credentials.client(&id).expect("client persisted");
    assert_eq!(stored.secret, "second");
    assert_eq!(stored.redirect_uri, TEST_REDIRECT_A);

    f.control.delete_client(&id).await?;
    assert!(f.credentials.client(&id).is_none());
    Ok(())
}

#[tokio::test]
async fn test_control_surfaces_missing_client_capability() {
    let f = fixture(
        MemoryRepository::new(),
        MemoryCredentialStore::new().without_client_manager(),
    );

    let err = f
        .control
        .add_client(SecretString::from(TEST_CLIENT_SECRET), &[])
        .await
        .expect_err("capability missing");
    assert!(matches!(err.root(), ControlError::CapabilityUnsupported(_)));
    assert!(err.client_id().is_some());

    let err = f
        .control
        .update_client("any", SecretString::from(TEST_CLIENT_SECRET), &[])
        .await
        .expect_err("capability missing");
    assert!(matches!(err, ControlError::CapabilityUnsupported(_)));
}

#[tokio::test]
async fn test_storage_operations_use_configured_backend() -> Result<(), anyhow::Error> {
    let f = fixture(MemoryRepository::new(), MemoryCredentialStore::new());
    assert_eq!(f.control.storage().kind, StorageKind::Fs);

    f.control.bootstrap_storage().await?;
    f.control.clean_storage().await?;

    let dir = tempfile::tempdir()?;
    let control = Control::with_backends(
        storage(dir.path()),
        f.repository.clone(),
        f.credentials.clone(),
        StorageBackends::empty(),
    );
    let err = control
        .bootstrap_storage()
        .await
        .expect_err("no engine linked");
    assert!(matches!(err, ControlError::NotImplemented(_)));
    Ok(())
}
