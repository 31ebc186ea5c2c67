//! Database file of the sqlite storage engine.
//!
//! Records and the OAuth2 tables share a single `storage.sqlite` file, so
//! removing that file removes both.

use super::{remove_file_if_exists, BackendConfig};
use crate::errors::StoreError;
use crate::services::id_derivation;
use futures::future::BoxFuture;
use futures::FutureExt;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::path::PathBuf;

pub const STORAGE_FILE: &str = "storage.sqlite";

const JOURNAL_SUFFIXES: [&str; 3] = ["-wal", "-shm", "-journal"];

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS objects (
    iri TEXT PRIMARY KEY,
    type TEXT,
    published TEXT,
    raw BLOB NOT NULL
);
CREATE TABLE IF NOT EXISTS actors (
    iri TEXT PRIMARY KEY,
    type TEXT,
    published TEXT,
    raw BLOB NOT NULL
);
CREATE TABLE IF NOT EXISTS activities (
    iri TEXT PRIMARY KEY,
    type TEXT,
    published TEXT,
    raw BLOB NOT NULL
);
CREATE TABLE IF NOT EXISTS collections (
    iri TEXT PRIMARY KEY,
    type TEXT,
    count INTEGER NOT NULL DEFAULT 0,
    elements TEXT
);
CREATE TABLE IF NOT EXISTS oauth_clients (
    code TEXT PRIMARY KEY,
    secret TEXT NOT NULL,
    redirect_uri TEXT NOT NULL,
    extra BLOB
);
CREATE TABLE IF NOT EXISTS oauth_authorize (
    code TEXT PRIMARY KEY,
    client TEXT NOT NULL REFERENCES oauth_clients(code),
    expires_in INTEGER,
    scope BLOB,
    redirect_uri TEXT NOT NULL,
    state BLOB,
    created_at TEXT NOT NULL,
    extra BLOB
);
CREATE TABLE IF NOT EXISTS oauth_access (
    token TEXT PRIMARY KEY,
    client TEXT NOT NULL REFERENCES oauth_clients(code),
    authorize TEXT,
    previous TEXT,
    refresh_token TEXT,
    expires_in INTEGER,
    scope BLOB,
    redirect_uri TEXT,
    created_at TEXT NOT NULL,
    extra BLOB
);
CREATE TABLE IF NOT EXISTS oauth_refresh (
    token TEXT PRIMARY KEY,
    access TEXT NOT NULL REFERENCES oauth_access(token)
);
"#;

#[derive(Debug, Clone)]
pub struct Config {
    pub path: PathBuf,
    pub cache_enable: bool,
}

impl Config {
    pub fn file(&self) -> PathBuf {
        self.path.join(STORAGE_FILE)
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

fn db_error(context: &str, e: sqlx::Error) -> StoreError {
    StoreError::Backend(format!("{}: {}", context, e))
}

/// Create the database file, its tables and the service actor row.
pub async fn bootstrap(config: &Config, base_url: &str) -> Result<(), StoreError> {
    tokio::fs::create_dir_all(&config.path).await?;

    let mut options = SqliteConnectOptions::new()
        .filename(config.file())
        .create_if_missing(true);
    if !config.cache_enable {
        options = options.statement_cache_capacity(0);
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .map_err(|e| db_error("Failed to open sqlite storage", e))?;

    sqlx::raw_sql(SCHEMA)
        .execute(&pool)
        .await
        .map_err(|e| db_error("Failed to create sqlite schema", e))?;

    let service = id_derivation::service_actor(base_url);
    let iri = service
        .id
        .as_ref()
        .map(|iri| iri.as_str().to_string())
        .unwrap_or_default();
    let raw = serde_json::to_vec(&service)?;

    sqlx::query("INSERT OR REPLACE INTO actors (iri, type, raw) VALUES (?1, ?2, ?3)")
        .bind(iri)
        .bind(service.kind.as_str())
        .bind(raw)
        .execute(&pool)
        .await
        .map_err(|e| db_error("Failed to save service actor", e))?;

    pool.close().await;
    Ok(())
}

/// Remove the database file and any journal sqlite left next to it.
pub async fn clean(config: &Config) -> Result<(), StoreError> {
    for suffix in JOURNAL_SUFFIXES {
        let mut journal = config.file().into_os_string();
        journal.push(suffix);
        remove_file_if_exists(&PathBuf::from(journal)).await?;
    }
    remove_file_if_exists(&config.file()).await
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
