//! Storage backend lifecycle selection.
//!
//! Each storage engine compiled into the binary contributes an
//! `initialize`/`destroy` pair to a fixed table keyed by [`StorageKind`]. The
//! table is built once by [`StorageBackends::linked`]; a kind missing from it
//! (for example `postgres`, or an engine whose cargo feature is disabled) is
//! reported as not implemented.
//!
//! Engines are selected with the `storage-fs`, `storage-sqlite` and
//! `storage-kv` features, all enabled by default.

#[cfg(feature = "storage-fs")]
pub mod fs;
#[cfg(feature = "storage-kv")]
pub mod kv;
#[cfg(feature = "storage-sqlite")]
pub mod sqlite;

use crate::errors::{ControlError, StoreError};
use crate::observability::{metrics, Outcome};
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Instant;
use tracing::instrument;

/// Name of the service actor document written by file-backed layouts.
pub const SERVICE_DOCUMENT: &str = "service.json";

/// Closed set of storage engine kinds understood by the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKind {
    Fs,
    Sqlite,
    Kv,
    Bolt,
    Postgres,
}

impl StorageKind {
    pub const ALL: [StorageKind; 5] = [
        StorageKind::Fs,
        StorageKind::Sqlite,
        StorageKind::Kv,
        StorageKind::Bolt,
        StorageKind::Postgres,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKind::Fs => "fs",
            StorageKind::Sqlite => "sqlite",
            StorageKind::Kv => "kv",
            StorageKind::Bolt => "boltdb",
            StorageKind::Postgres => "postgres",
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fs" => Ok(StorageKind::Fs),
            "sqlite" => Ok(StorageKind::Sqlite),
            "kv" => Ok(StorageKind::Kv),
            "bolt" | "boltdb" => Ok(StorageKind::Bolt),
            "postgres" => Ok(StorageKind::Postgres),
            _ => Err(format!("Invalid storage type: {}", s)),
        }
    }
}

/// Backend settings handed to the lifecycle routines. Never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    pub kind: StorageKind,
    pub path: PathBuf,
    pub cache_enable: bool,
    pub base_url: String,
}

pub type LifecycleFn = fn(&BackendConfig) -> BoxFuture<'static, Result<(), StoreError>>;

/// The `initialize`/`destroy` pair of one storage engine.
#[derive(Clone, Copy)]
pub struct Lifecycle {
    pub initialize: LifecycleFn,
    pub destroy: LifecycleFn,
}

/// Static strategy table from storage kind to lifecycle routines.
#[derive(Clone, Default)]
pub struct StorageBackends {
    table: HashMap<StorageKind, Lifecycle>,
}

impl StorageBackends {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Table of every engine compiled into this build.
    #[allow(unused_mut)]
    pub fn linked() -> Self {
        let mut backends = Self::empty();

        #[cfg(feature = "storage-fs")]
        {
            backends = backends.with(
                StorageKind::Fs,
                Lifecycle {
                    initialize: fs::initialize,
                    destroy: fs::destroy,
                },
            );
        }

        #[cfg(feature = "storage-sqlite")]
        {
            backends = backends.with(
                StorageKind::Sqlite,
                Lifecycle {
                    initialize: sqlite::initialize,
                    destroy: sqlite::destroy,
                },
            );
        }

        #[cfg(feature = "storage-kv")]
        {
            backends = backends.with(
                StorageKind::Kv,
                Lifecycle {
                    initialize: kv::initialize,
                    destroy: kv::destroy,
                },
            );
        }

        backends
    }

    pub fn with(mut self, kind: StorageKind, lifecycle: Lifecycle) -> Self {
        self.table.insert(kind, lifecycle);
        self
    }

    pub fn supports(&self, kind: StorageKind) -> bool {
        self.table.contains_key(&kind)
    }

    /// Kinds with linked lifecycle routines, in declaration order.
    pub fn kinds(&self) -> Vec<StorageKind> {
        StorageKind::ALL
            .into_iter()
            .filter(|kind| self.supports(*kind))
            .collect()
    }

    fn lookup(&self, kind: StorageKind) -> Result<Lifecycle, ControlError> {
        self.table
            .get(&kind)
            .copied()
            .ok_or_else(|| ControlError::NotImplemented(format!("Invalid storage type {}", kind)))
    }

    /// Initialize the storage described by `conf`.
    ///
    /// # Errors
    ///
    /// - `ControlError::NotImplemented` naming the kind when no engine is linked for it
    /// - `ControlError::Upstream` when the engine fails
    #[instrument(skip_all, fields(kind = %conf.kind))]
    pub async fn bootstrap(&self, conf: &BackendConfig) -> Result<(), ControlError> {
        let lifecycle = self.lookup(conf.kind)?;
        run("bootstrap", lifecycle.initialize, conf).await
    }

    /// Destroy the storage described by `conf`.
    #[instrument(skip_all, fields(kind = %conf.kind))]
    pub async fn clean(&self, conf: &BackendConfig) -> Result<(), ControlError> {
        let lifecycle = self.lookup(conf.kind)?;
        run("clean", lifecycle.destroy, conf).await
    }
}

async fn run(
    operation: &'static str,
    routine: LifecycleFn,
    conf: &BackendConfig,
) -> Result<(), ControlError> {
    let start = Instant::now();
    let result = routine(conf).await;
    metrics::record_storage_lifecycle(
        conf.kind.as_str(),
        operation,
        Outcome::of(&result),
        start.elapsed(),
    );

    match &result {
        Ok(()) => tracing::info!(
            target: "fed.storage",
            kind = %conf.kind,
            path = %conf.path.display(),
            operation,
            "Storage lifecycle completed"
        ),
        Err(e) => tracing::error!(
            target: "fed.storage",
            kind = %conf.kind,
            path = %conf.path.display(),
            operation,
            error = %e,
            "Storage lifecycle failed"
        ),
    }

    result.map_err(ControlError::from)
}

/// Remove a directory tree; an absent tree is already clean.
#[cfg(any(feature = "storage-fs", feature = "storage-kv"))]
pub(crate) async fn remove_dir_if_exists(path: &Path) -> Result<(), StoreError> {
    match tokio::fs::remove_dir_all(path).await {
        Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
        _ => Ok(()),
    }
}

/// Remove a file; an absent file is already clean.
#[cfg(feature = "storage-sqlite")]
pub(crate) async fn remove_file_if_exists(path: &Path) -> Result<(), StoreError> {
    match tokio::fs::remove_file(path).await {
        Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
        _ => Ok(()),
    }
}

/// Write the service actor for `base_url` as `<dir>/service.json`.
#[cfg(any(feature = "storage-fs", feature = "storage-kv"))]
pub(crate) async fn write_service_document(dir: &Path, base_url: &str) -> Result<(), StoreError> {
    let service = crate::services::id_derivation::service_actor(base_url);
    let document = serde_json::to_vec_pretty(&service)?;
    tokio::fs::write(dir.join(SERVICE_DOCUMENT), document).await?;
    Ok(())
}
