use crate::errors::{ControlError, StoreError};
use crate::models::{Actor, ActorType, Iri, LangValue, PUBLIC_COLLECTION};
use crate::observability::{metrics, Outcome};
use crate::repositories::{ActorRepository, IdGenerator, PasswordManager};
use crate::services::id_derivation;
use chrono::Utc;
use secrecy::{ExposeSecret, SecretSlice};
use std::sync::Arc;
use tracing::instrument;

const GENERATED_SUMMARY: &str = "Generated actor";

/// Creates and deletes local actors.
///
/// The optional repository capabilities are resolved once, in [`new`](Self::new).
pub struct ActorProvisioner {
    service: Actor,
    repository: Arc<dyn ActorRepository>,
    id_generator: Option<Arc<dyn IdGenerator>>,
    password_manager: Option<Arc<dyn PasswordManager>>,
}

impl ActorProvisioner {
    pub fn new(base_url: &str, repository: Arc<dyn ActorRepository>) -> Self {
        let id_generator = Arc::clone(&repository).id_generator();
        let password_manager = Arc::clone(&repository).password_manager();

        if id_generator.is_none() {
            tracing::warn!(
                target: "fed.provisioning",
                "Repository does not generate ids, new actors will have no derived addresses"
            );
        }

        Self {
            service: id_derivation::service_actor(base_url),
            repository,
            id_generator,
            password_manager,
        }
    }

    /// The hosting service's own actor.
    pub fn service(&self) -> &Actor {
        &self.service
    }

    /// Create a local actor.
    ///
    /// # Errors
    ///
    /// - `ControlError::Upstream` if id generation or saving fails
    /// - `ControlError::CredentialNotSet` if the actor was saved but `secret`
    ///   could not be attached; the saved actor is inside the error and is
    ///   not rolled back
    #[instrument(skip_all, fields(kind = kind.as_str()))]
    pub async fn add_actor(
        &self,
        preferred_username: &str,
        kind: ActorType,
        secret: Option<SecretSlice<u8>>,
    ) -> Result<Actor, ControlError> {
        let result = self.create(preferred_username, kind, secret).await;
        metrics::record_actor_operation("add", Outcome::of(&result));
        result
    }

    async fn create(
        &self,
        preferred_username: &str,
        kind: ActorType,
        secret: Option<SecretSlice<u8>>,
    ) -> Result<Actor, ControlError> {
        let now = Utc::now();
        let mut draft = Actor::new(kind);
        draft.attributed_to = self.service.id.clone();
        draft.generator = self.service.id.clone();
        draft.audience = vec![Iri::new(PUBLIC_COLLECTION)];
        draft.published = Some(now);
        draft.updated = Some(now);
        draft.summary = vec![LangValue::untagged(GENERATED_SUMMARY)];
        draft.preferred_username = vec![LangValue::untagged(preferred_username)];

        if let Some(generator) = &self.id_generator {
            let id = generator.generate_id(&draft, &self.service).await?;
            draft.id = Some(id);
            id_derivation::derive_addresses(&mut draft, &self.service);
        }

        let saved = self.repository.save_actor(draft).await?;

        tracing::info!(
            target: "fed.provisioning",
            actor = saved.id.as_ref().map(Iri::as_str).unwrap_or_default(),
            "Actor saved"
        );

        let Some(secret) = secret else {
            return Ok(saved);
        };

        let Some(passwords) = &self.password_manager else {
            tracing::warn!(
                target: "fed.provisioning",
                "Repository cannot store credentials, secret was not set"
            );
            return Ok(saved);
        };

        let Some(id) = saved.id.clone() else {
            return Err(ControlError::CredentialNotSet {
                actor: Box::new(saved),
                source: StoreError::Backend("saved actor has no id".to_string()),
            });
        };

        if let Err(source) = passwords.password_set(&id, secret.expose_secret()).await {
            tracing::warn!(
                target: "fed.provisioning",
                actor = %id,
                error = %source,
                "Actor saved but setting its credential failed"
            );
            return Err(ControlError::CredentialNotSet {
                actor: Box::new(saved),
                source,
            });
        }

        Ok(saved)
    }

    /// Delete an actor given either its full IRI or its bare local id.
    ///
    /// # Errors
    ///
    /// - `ControlError::NotFound` naming the resolved IRI when nothing matches
    /// - `ControlError::Upstream` for lookup or delete failures
    #[instrument(skip_all, fields(id = %id))]
    pub async fn delete_actor(&self, id: &str) -> Result<(), ControlError> {
        let result = self.remove(id).await;
        metrics::record_actor_operation("delete", Outcome::of(&result));
        result
    }

    async fn remove(&self, id: &str) -> Result<(), ControlError> {
        let iri = self.resolve_iri(id);

        let found = self.repository.load_actors(&iri).await?;
        let Some(actor) = found.first() else {
            return Err(ControlError::NotFound(format!("actor {} not found", iri)));
        };

        self.repository.delete_actor(actor).await?;

        tracing::info!(target: "fed.provisioning", actor = %iri, "Actor deleted");
        Ok(())
    }

    /// Full IRIs are used as given; anything else is a local id under the
    /// service's actors collection.
    pub fn resolve_iri(&self, id: &str) -> Iri {
        Iri::parse_absolute(id)
            .unwrap_or_else(|| id_derivation::local_actor_iri(&self.service, id))
    }
}
