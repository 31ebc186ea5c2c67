//! Directory layout of the filesystem storage engine.

use super::{remove_dir_if_exists, write_service_document, BackendConfig};
use crate::errors::StoreError;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::path::PathBuf;

/// Top-level collections created at bootstrap.
pub const COLLECTIONS: [&str; 3] = ["actors", "activities", "objects"];

#[derive(Debug, Clone)]
pub struct Config {
    pub path: PathBuf,
    pub cache_enable: bool,
}

impl From<&BackendConfig> for Config {
    fn from(conf: &BackendConfig) -> Self {
        Self {
            path: conf.path.clone(),
            cache_enable: conf.cache_enable,
        }
    }
}

/// Create the storage root, its collections and the service actor document.
pub async fn bootstrap(config: &Config, base_url: &str) -> Result<(), StoreError> {
    tracing::debug!(
        target: "fed.storage",
        path = %config.path.display(),
        cache_enable = config.cache_enable,
        "Bootstrapping filesystem storage"
    );

    tokio::fs::create_dir_all(&config.path).await?;
    for collection in COLLECTIONS {
        tokio::fs::create_dir_all(config.path.join(collection)).await?;
    }
    write_service_document(&config.path, base_url).await
}

pub async fn clean(config: &Config) -> Result<(), StoreError> {
    remove_dir_if_exists(&config.path).await
}

pub(super) fn initialize(conf: &BackendConfig) -> BoxFuture<'static, Result<(), StoreError>> {
    let config = Config::from(conf);
    let base_url = conf.base_url.clone();
    async move { bootstrap(&config, &base_url).await }.boxed()
}

pub(super) fn destroy(conf: &BackendConfig) -> BoxFuture<'static, Result<(), StoreError>> {
    let config = Config::from(conf);
    async move { clean(&config).await }.boxed()
}
