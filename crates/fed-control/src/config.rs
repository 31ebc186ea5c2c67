use crate::storage::{BackendConfig, StorageKind};
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_STORAGE_PATH: &str = "./data";

#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub storage: StorageKind,
    pub storage_path: PathBuf,
    pub cache_enable: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("{0}")]
    InvalidStorage(String),

    #[error("Invalid value for {name}: {value}")]
    InvalidFlag { name: String, value: String },
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing)
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let base_url = vars
            .get("BASE_URL")
            .ok_or_else(|| ConfigError::MissingEnvVar("BASE_URL".to_string()))?;

        let parsed =
            url::Url::parse(base_url).map_err(|e| ConfigError::InvalidBaseUrl(e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidBaseUrl(format!(
                "expected http or https, got {}",
                parsed.scheme()
            )));
        }

        let storage = match vars.get("STORAGE") {
            Some(kind) => kind.parse().map_err(ConfigError::InvalidStorage)?,
            None => StorageKind::Fs,
        };

        let storage_path = vars
            .get("STORAGE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE_PATH));

        let cache_enable = match vars.get("CACHE_ENABLE") {
            Some(value) => parse_flag("CACHE_ENABLE", value)?,
            None => true,
        };

        Ok(Config {
            base_url: base_url.trim_end_matches('/').to_string(),
            storage,
            storage_path,
            cache_enable,
        })
    }

    /// Settings for the storage lifecycle routines.
    pub fn backend_config(&self) -> BackendConfig {
        BackendConfig {
            kind: self.storage,
            path: self.storage_path.clone(),
            cache_enable: self.cache_enable,
            base_url: self.base_url.clone(),
        }
    }
}

fn parse_flag(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(ConfigError::InvalidFlag {
            name: name.to_string(),
            value: value.to_string(),
        }),
    }
}
