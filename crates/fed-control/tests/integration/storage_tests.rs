//! Storage lifecycle through the control facade, one fresh directory per case.

use fed_control::control::Control;
use fed_control::errors::ControlError;
use fed_control::storage::{BackendConfig, StorageBackends, StorageKind};
use fed_test_utils::*;
use std::path::Path;
use std::sync::Arc;

fn backend_config(kind: StorageKind, path: &Path) -> BackendConfig {
    BackendConfig {
        kind,
        path: path.to_path_buf(),
        cache_enable: false,
        base_url: TEST_BASE_URL.to_string(),
    }
}

fn control(conf: BackendConfig) -> Control {
    Control::new(
        conf,
        Arc::new(MemoryRepository::new()),
        Arc::new(MemoryCredentialStore::new()),
    )
}

fn is_empty_dir(path: &Path) -> bool {
    std::fs::read_dir(path)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(true)
}

#[tokio::test]
async fn test_bootstrap_then_clean_every_linked_kind() -> Result<(), anyhow::Error> {
    let kinds = StorageBackends::linked().kinds();
    assert!(!kinds.is_empty(), "default features link at least one engine");

    for kind in kinds {
        let dir = tempfile::tempdir()?;
        let root = dir.path().join("storage");
        let control = control(backend_config(kind, &root));

        control.bootstrap_storage().await?;
        assert!(root.exists(), "{} bootstrap creates its root", kind);
        assert!(!is_empty_dir(&root), "{} bootstrap writes its layout", kind);

        control.clean_storage().await?;
        assert!(is_empty_dir(&root), "{} clean leaves nothing behind", kind);
    }
    Ok(())
}

#[tokio::test]
async fn test_clean_fresh_target_succeeds() -> Result<(), anyhow::Error> {
    for kind in StorageBackends::linked().kinds() {
        let dir = tempfile::tempdir()?;
        let control = control(backend_config(kind, &dir.path().join("never-created")));

        control.clean_storage().await?;
    }
    Ok(())
}

#[tokio::test]
async fn test_postgres_is_not_implemented() {
    let dir = tempfile::tempdir().expect("tempdir");
    let control = control(backend_config(StorageKind::Postgres, dir.path()));

    let err = control
        .bootstrap_storage()
        .await
        .expect_err("postgres has no lifecycle");
    assert!(
        matches!(&err, ControlError::NotImplemented(msg) if msg.contains("postgres")),
        "unexpected error: {:?}",
        err
    );

    let err = control
        .clean_storage()
        .await
        .expect_err("postgres has no lifecycle");
    assert!(matches!(err, ControlError::NotImplemented(_)));
}

#[tokio::test]
async fn test_kind_missing_from_table_is_not_implemented() {
    let dir = tempfile::tempdir().expect("tempdir");
    let control = Control::with_backends(
        backend_config(StorageKind::Fs, dir.path()),
        Arc::new(MemoryRepository::new()),
        Arc::new(MemoryCredentialStore::new()),
        StorageBackends::empty(),
    );

    let err = control
        .bootstrap_storage()
        .await
        .expect_err("empty table");
    assert!(matches!(&err, ControlError::NotImplemented(msg) if msg.contains("fs")));
}

#[tokio::test]
async fn test_kv_clean_removes_auxiliary_oauth_store() -> Result<(), anyhow::Error> {
    if !StorageBackends::linked().supports(StorageKind::Kv) {
        return Ok(());
    }

    let dir = tempfile::tempdir()?;
    let control = control(backend_config(StorageKind::Kv, dir.path()));

    control.bootstrap_storage().await?;
    assert!(dir.path().join("oauth2").is_dir());
    assert!(dir.path().join("kv").join("service.json").is_file());

    control.clean_storage().await?;
    assert!(!dir.path().join("oauth2").exists());
    assert!(!dir.path().join("kv").exists());
    Ok(())
}
