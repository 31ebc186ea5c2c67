//! Capabilities injected by the configured storage engine.
//!
//! The control plane never talks to a storage engine directly. It consumes
//! these narrow traits, and the optional extension points (id generation,
//! password management, client management) are discovered once when a
//! service is composed: the `*_manager`/`id_generator` methods hand back a
//! typed handle, or `None` when the engine does not implement the extension.

use crate::errors::{ControlError, StoreError};
use crate::models::{AccessGrant, Actor, ClientCredential, Iri};
use async_trait::async_trait;
use axum::http::request::Parts;
use std::sync::Arc;

/// Actor persistence offered by every storage engine.
#[async_trait]
pub trait ActorRepository: Send + Sync {
    /// All actors matching `iri`.
    async fn load_actors(&self, iri: &Iri) -> Result<Vec<Actor>, StoreError>;

    /// Persist `actor`, returning the stored representation.
    async fn save_actor(&self, actor: Actor) -> Result<Actor, StoreError>;

    async fn delete_actor(&self, actor: &Actor) -> Result<(), StoreError>;

    fn id_generator(self: Arc<Self>) -> Option<Arc<dyn IdGenerator>> {
        None
    }

    fn password_manager(self: Arc<Self>) -> Option<Arc<dyn PasswordManager>> {
        None
    }
}

/// Optional: assign identifiers to new objects.
///
/// Implementations must never hand out the same identifier twice.
#[async_trait]
pub trait IdGenerator: Send + Sync {
    async fn generate_id(&self, draft: &Actor, parent: &Actor) -> Result<Iri, StoreError>;
}

/// Optional: attach a credential secret to an actor.
#[async_trait]
pub trait PasswordManager: Send + Sync {
    async fn password_set(&self, actor: &Iri, secret: &[u8]) -> Result<(), StoreError>;
}

/// OAuth2 token storage.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up the grant behind an access token.
    async fn load_access(&self, token: &str) -> Result<Option<AccessGrant>, StoreError>;

    fn client_manager(self: Arc<Self>) -> Option<Arc<dyn ClientManager>> {
        None
    }
}

/// Optional: machine-client management on a credential store.
#[async_trait]
pub trait ClientManager: Send + Sync {
    async fn create_client(&self, client: &ClientCredential) -> Result<(), StoreError>;

    /// Replace the stored values of the client identified by `client.id`.
    async fn update_client(&self, client: &ClientCredential) -> Result<(), StoreError>;

    async fn remove_client(&self, id: &str) -> Result<(), StoreError>;
}

/// Single-actor lookup used while authenticating a request.
#[async_trait]
pub trait ActorLoader: Send + Sync {
    async fn load_actor(&self, iri: &Iri) -> Result<Option<Actor>, StoreError>;
}

#[async_trait]
impl<R> ActorLoader for R
where
    R: ActorRepository + ?Sized,
{
    async fn load_actor(&self, iri: &Iri) -> Result<Option<Actor>, StoreError> {
        Ok(self.load_actors(iri).await?.into_iter().next())
    }
}

/// Verifies an HTTP signature made with `key_id`, owned by `actor`.
///
/// Cryptographic verification lives outside the control plane.
#[async_trait]
pub trait SignatureVerifier: Send + Sync {
    async fn verify(&self, actor: &Actor, key_id: &Iri, request: &Parts)
        -> Result<(), ControlError>;
}

/// Validation engine for inbound activities.
#[async_trait]
pub trait ActivityValidator: Send + Sync {
    async fn validate(&self, activity: &serde_json::Value) -> Result<(), ControlError>;
}
