//! Layout of the key-value storage engine.
//!
//! The engine keeps its records under `<path>/kv` and owns an auxiliary OAuth2
//! credential store at `<path>/oauth2`. Destroying the engine removes the
//! auxiliary store first.

use super::{remove_dir_if_exists, write_service_document, BackendConfig};
use crate::errors::StoreError;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::path::{Path, PathBuf};

pub const DATA_DIR: &str = "kv";
pub const OAUTH_DIR: &str = "oauth2";

#[derive(Debug, Clone)]
pub struct Config {
    pub path: PathBuf,
    pub cache_enable: bool,
}

impl Config {
    pub fn data_path(&self) -> PathBuf {
        self.path.join(DATA_DIR)
    }
}

impl From<&BackendConfig> for Config {
    fn from(conf: &BackendConfig) -> Self {
        Self {
            path: conf.path.clone(),
            cache_enable: conf.cache_enable,
        }
    }
}

/// Location of the auxiliary OAuth2 store for a storage root.
pub fn oauth_store_path(path: &Path) -> PathBuf {
    path.join(OAUTH_DIR)
}

pub async fn bootstrap(config: &Config, base_url: &str) -> Result<(), StoreError> {
    tracing::debug!(
        target: "fed.storage",
        path = %config.path.display(),
        cache_enable = config.cache_enable,
        "Bootstrapping key-value storage"
    );

    let data = config.data_path();
    tokio::fs::create_dir_all(&data).await?;
    write_service_document(&data, base_url).await?;
    tokio::fs::create_dir_all(oauth_store_path(&config.path)).await?;
    Ok(())
}

/// Remove the record store. The auxiliary OAuth2 store is left alone.
pub async fn clean(config: &Config) -> Result<(), StoreError> {
    remove_dir_if_exists(&config.data_path()).await
}

pub(super) fn initialize(conf: &BackendConfig) -> BoxFuture<'static, Result<(), StoreError>> {
    let config = Config::from(conf);
    let base_url = conf.base_url.clone();
    async move { bootstrap(&config, &base_url).await }.boxed()
}

pub(super) fn destroy(conf: &BackendConfig) -> BoxFuture<'static, Result<(), StoreError>> {
    let config = Config::from(conf);
    async move {
        let oauth = oauth_store_path(&config.path);
        if let Err(e) = remove_dir_if_exists(&oauth).await {
            tracing::warn!(
                target: "fed.storage",
                path = %oauth.display(),
                error = %e,
                "Failed to remove OAuth2 store"
            );
        }
        clean(&config).await
    }
    .boxed()
}
