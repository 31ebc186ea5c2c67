use crate::errors::ControlError;
use crate::models::ClientCredential;
use crate::observability::{hash_for_correlation, metrics, Outcome};
use crate::repositories::{ClientManager, CredentialStore};
use secrecy::SecretString;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

const UNSUPPORTED: &str = "invalid OAuth2 client saver";

/// Creates, updates and removes OAuth2 machine clients.
///
/// Whether the credential store supports client management is decided once,
/// when the manager is built.
pub struct ClientCredentialManager {
    clients: Option<Arc<dyn ClientManager>>,
}

impl ClientCredentialManager {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self {
            clients: store.client_manager(),
        }
    }

    fn clients(&self) -> Result<&Arc<dyn ClientManager>, ControlError> {
        self.clients
            .as_ref()
            .ok_or_else(|| ControlError::CapabilityUnsupported(UNSUPPORTED.to_string()))
    }

    /// Register a new client and return its generated id.
    ///
    /// The id is generated before anything is stored, so it is available on
    /// both paths: in `Ok`, or through [`ControlError::client_id`].
    ///
    /// # Errors
    ///
    /// - `ControlError::ClientNotCreated` wrapping `CapabilityUnsupported` when
    ///   the store cannot manage clients, or `Upstream` when it rejects the client
    #[instrument(skip_all)]
    pub async fn add_client(
        &self,
        secret: SecretString,
        redirect_uris: &[String],
    ) -> Result<String, ControlError> {
        let id = Uuid::new_v4().to_string();
        let client = ClientCredential::new(id.clone(), secret, redirect_uris);

        let result = match self.clients() {
            Ok(clients) => clients.create_client(&client).await.map_err(ControlError::from),
            Err(e) => Err(e),
        };
        metrics::record_client_operation("add", Outcome::of(&result));

        match result {
            Ok(()) => {
                tracing::info!(
                    target: "fed.clients",
                    client = %hash_for_correlation(&id),
                    redirect_uris = redirect_uris.len(),
                    "OAuth2 client created"
                );
                Ok(id)
            }
            Err(e) => {
                tracing::warn!(
                    target: "fed.clients",
                    client = %hash_for_correlation(&id),
                    error = %e,
                    "OAuth2 client was not created"
                );
                Err(ControlError::ClientNotCreated {
                    id,
                    source: Box::new(e),
                })
            }
        }
    }

    /// Replace the secret and redirect URIs of an existing client.
    #[instrument(skip_all)]
    pub async fn update_client(
        &self,
        id: &str,
        secret: SecretString,
        redirect_uris: &[String],
    ) -> Result<(), ControlError> {
        let client = ClientCredential::new(id.to_string(), secret, redirect_uris);
        let result = match self.clients() {
            Ok(clients) => clients.update_client(&client).await.map_err(ControlError::from),
            Err(e) => Err(e),
        };
        metrics::record_client_operation("update", Outcome::of(&result));
        result
    }

    #[instrument(skip_all)]
    pub async fn delete_client(&self, id: &str) -> Result<(), ControlError> {
        let result = match self.clients() {
            Ok(clients) => clients.remove_client(id).await.map_err(ControlError::from),
            Err(e) => Err(e),
        };
        metrics::record_client_operation("delete", Outcome::of(&result));

        if result.is_ok() {
            tracing::info!(
                target: "fed.clients",
                client = %hash_for_correlation(id),
                "OAuth2 client removed"
            );
        }
        result
    }
}
