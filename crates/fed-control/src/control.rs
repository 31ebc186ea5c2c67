//! Operations exposed to the command layer.
//!
//! [`Control`] composes the provisioning services with the storage backend
//! table for a single configured deployment. Flag parsing and exit codes
//! belong to the caller.

use crate::errors::ControlError;
use crate::models::{Actor, ActorType};
use crate::repositories::{ActorRepository, CredentialStore};
use crate::services::{ActorProvisioner, ClientCredentialManager};
use crate::storage::{BackendConfig, StorageBackends};
use secrecy::{SecretSlice, SecretString};
use std::sync::Arc;

pub struct Control {
    actors: ActorProvisioner,
    clients: ClientCredentialManager,
    backends: StorageBackends,
    storage: BackendConfig,
}

impl Control {
    /// Compose against the given stores, using every linked storage engine.
    pub fn new(
        storage: BackendConfig,
        repository: Arc<dyn ActorRepository>,
        credentials: Arc<dyn CredentialStore>,
    ) -> Self {
        Self::with_backends(storage, repository, credentials, StorageBackends::linked())
    }

    pub fn with_backends(
        storage: BackendConfig,
        repository: Arc<dyn ActorRepository>,
        credentials: Arc<dyn CredentialStore>,
        backends: StorageBackends,
    ) -> Self {
        Self {
            actors: ActorProvisioner::new(&storage.base_url, repository),
            clients: ClientCredentialManager::new(credentials),
            backends,
            storage,
        }
    }

    pub fn storage(&self) -> &BackendConfig {
        &self.storage
    }

    pub async fn add_actor(
        &self,
        preferred_username: &str,
        kind: ActorType,
        secret: Option<SecretSlice<u8>>,
    ) -> Result<Actor, ControlError> {
        self.actors.add_actor(preferred_username, kind, secret).await
    }

    pub async fn delete_actor(&self, id: &str) -> Result<(), ControlError> {
        self.actors.delete_actor(id).await
    }

    pub async fn add_client(
        &self,
        secret: SecretString,
        redirect_uris: &[String],
    ) -> Result<String, ControlError> {
        self.clients.add_client(secret, redirect_uris).await
    }

    pub async fn update_client(
        &self,
        id: &str,
        secret: SecretString,
        redirect_uris: &[String],
    ) -> Result<(), ControlError> {
        self.clients.update_client(id, secret, redirect_uris).await
    }

    pub async fn delete_client(&self, id: &str) -> Result<(), ControlError> {
        self.clients.delete_client(id).await
    }

    pub async fn bootstrap_storage(&self) -> Result<(), ControlError> {
        self.backends.bootstrap(&self.storage).await
    }

    pub async fn clean_storage(&self) -> Result<(), ControlError> {
        self.backends.clean(&self.storage).await
    }
}
