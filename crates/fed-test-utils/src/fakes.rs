//! In-memory implementations of the injected capabilities.
//!
//! Every optional capability can be switched off so tests can exercise the
//! degraded paths of the provisioning services.

use async_trait::async_trait;
use axum::http::request::Parts;
use chrono::{DateTime, Utc};
use fed_control::errors::{ControlError, StoreError};
use fed_control::middleware::{AuthServiceFactory, ResolveActor};
use fed_control::models::{AccessGrant, Actor, ClientCredential, Iri};
use fed_control::repositories::{
    ActivityValidator, ActorRepository, ClientManager, CredentialStore, IdGenerator,
    PasswordManager, SignatureVerifier,
};
use secrecy::ExposeSecret;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Actor repository backed by a `Vec`.
///
/// Ids are generated as `<parent>/actors/<n>` with a monotonically increasing
/// counter, so two calls never return the same id.
pub struct MemoryRepository {
    actors: Mutex<Vec<Actor>>,
    passwords: Mutex<HashMap<Iri, Vec<u8>>>,
    next_id: AtomicUsize,
    deletes: AtomicUsize,
    password_sets: AtomicUsize,
    generates_ids: bool,
    manages_passwords: bool,
    fail_id_generation: bool,
    fail_save: bool,
    fail_delete: bool,
    fail_password_set: bool,
}

impl Default for MemoryRepository {
    fn default() -> Self {
        Self {
            actors: Mutex::new(Vec::new()),
            passwords: Mutex::new(HashMap::new()),
            next_id: AtomicUsize::new(1),
            deletes: AtomicUsize::new(0),
            password_sets: AtomicUsize::new(0),
            generates_ids: true,
            manages_passwords: true,
            fail_id_generation: false,
            fail_save: false,
            fail_delete: false,
            fail_password_set: false,
        }
    }
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository without the id generation capability.
    pub fn without_id_generator(mut self) -> Self {
        self.generates_ids = false;
        self
    }

    /// Repository without the password capability.
    pub fn without_password_manager(mut self) -> Self {
        self.manages_passwords = false;
        self
    }

    /// Password capability present, but every `password_set` fails.
    pub fn failing_password_set(mut self) -> Self {
        self.fail_password_set = true;
        self
    }

    /// Id generation capability present, but every `generate_id` fails.
    pub fn failing_id_generator(mut self) -> Self {
        self.fail_id_generation = true;
        self
    }

    /// Every `save_actor` fails without storing anything.
    pub fn failing_save(mut self) -> Self {
        self.fail_save = true;
        self
    }

    /// Every `delete_actor` is counted, then fails without removing anything.
    pub fn failing_delete(mut self) -> Self {
        self.fail_delete = true;
        self
    }

    pub fn with_actor(self, actor: Actor) -> Self {
        self.actors.lock().unwrap().push(actor);
        self
    }

    pub fn actors(&self) -> Vec<Actor> {
        self.actors.lock().unwrap().clone()
    }

    pub fn count_matching(&self, iri: &Iri) -> usize {
        self.actors
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.id.as_ref() == Some(iri))
            .count()
    }

    pub fn password_for(&self, iri: &Iri) -> Option<Vec<u8>> {
        self.passwords.lock().unwrap().get(iri).cloned()
    }

    /// Number of `delete_actor` calls received.
    pub fn delete_calls(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    /// Number of `password_set` calls received, failed ones included.
    pub fn password_set_calls(&self) -> usize {
        self.password_sets.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ActorRepository for MemoryRepository {
    async fn load_actors(&self, iri: &Iri) -> Result<Vec<Actor>, StoreError> {
        Ok(self
            .actors
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.id.as_ref() == Some(iri))
            .cloned()
            .collect())
    }

    async fn save_actor(&self, actor: Actor) -> Result<Actor, StoreError> {
        if self.fail_save {
            return Err(StoreError::Backend("disk full".to_string()));
        }
        self.actors.lock().unwrap().push(actor.clone());
        Ok(actor)
    }

    async fn delete_actor(&self, actor: &Actor) -> Result<(), StoreError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        if self.fail_delete {
            return Err(StoreError::Backend("actor is locked".to_string()));
        }
        self.actors.lock().unwrap().retain(|a| a.id != actor.id);
        Ok(())
    }

    fn id_generator(self: Arc<Self>) -> Option<Arc<dyn IdGenerator>> {
        if self.generates_ids {
            Some(self)
        } else {
            None
        }
    }

    fn password_manager(self: Arc<Self>) -> Option<Arc<dyn PasswordManager>> {
        if self.manages_passwords {
            Some(self)
        } else {
            None
        }
    }
}

#[async_trait]
impl IdGenerator for MemoryRepository {
    async fn generate_id(&self, _draft: &Actor, parent: &Actor) -> Result<Iri, StoreError> {
        if self.fail_id_generation {
            return Err(StoreError::Backend("id sequence exhausted".to_string()));
        }
        let parent = parent
            .id
            .clone()
            .ok_or_else(|| StoreError::Backend("parent has no id".to_string()))?;
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        Ok(parent.join("actors").join(&n.to_string()))
    }
}

#[async_trait]
impl PasswordManager for MemoryRepository {
    async fn password_set(&self, actor: &Iri, secret: &[u8]) -> Result<(), StoreError> {
        self.password_sets.fetch_add(1, Ordering::SeqCst);
        if self.fail_password_set {
            return Err(StoreError::Backend("password store unavailable".to_string()));
        }
        self.passwords
            .lock()
            .unwrap()
            .insert(actor.clone(), secret.to_vec());
        Ok(())
    }
}

/// Stored client as seen by tests; the secret is exposed on purpose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredClient {
    pub secret: String,
    pub redirect_uri: String,
}

/// Credential store with access tokens and, unless disabled, client management.
pub struct MemoryCredentialStore {
    tokens: Mutex<HashMap<String, AccessGrant>>,
    clients: Mutex<HashMap<String, StoredClient>>,
    manages_clients: bool,
    reject_clients: bool,
}

impl Default for MemoryCredentialStore {
    fn default() -> Self {
        Self {
            tokens: Mutex::new(HashMap::new()),
            clients: Mutex::new(HashMap::new()),
            manages_clients: true,
            reject_clients: false,
        }
    }
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn without_client_manager(mut self) -> Self {
        self.manages_clients = false;
        self
    }

    /// Client management present, but every `create_client` fails.
    pub fn rejecting_clients(mut self) -> Self {
        self.reject_clients = true;
        self
    }

    /// Issue `token` to `actor`, optionally expiring at `expires_at`.
    pub fn with_token(self, token: &str, actor: &Iri, expires_at: Option<DateTime<Utc>>) -> Self {
        self.tokens.lock().unwrap().insert(
            token.to_string(),
            AccessGrant {
                actor: actor.clone(),
                expires_at,
            },
        );
        self
    }

    pub fn client(&self, id: &str) -> Option<StoredClient> {
        self.clients.lock().unwrap().get(id).cloned()
    }

    pub fn client_count(&self) -> usize {
        self.clients.lock().unwrap().len()
    }

    fn store(&self, client: &ClientCredential) {
        self.clients.lock().unwrap().insert(
            client.id.clone(),
            StoredClient {
                secret: client.secret.expose_secret().to_string(),
                redirect_uri: client.redirect_uri.clone(),
            },
        );
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn load_access(&self, token: &str) -> Result<Option<AccessGrant>, StoreError> {
        Ok(self.tokens.lock().unwrap().get(token).cloned())
    }

    fn client_manager(self: Arc<Self>) -> Option<Arc<dyn ClientManager>> {
        if self.manages_clients {
            Some(self)
        } else {
            None
        }
    }
}

#[async_trait]
impl ClientManager for MemoryCredentialStore {
    async fn create_client(&self, client: &ClientCredential) -> Result<(), StoreError> {
        if self.reject_clients {
            return Err(StoreError::Backend("client table is read-only".to_string()));
        }
        if self.clients.lock().unwrap().contains_key(&client.id) {
            return Err(StoreError::Backend(format!(
                "client {} already exists",
                client.id
            )));
        }
        self.store(client);
        Ok(())
    }

    async fn update_client(&self, client: &ClientCredential) -> Result<(), StoreError> {
        if !self.clients.lock().unwrap().contains_key(&client.id) {
            return Err(StoreError::Backend(format!("client {} not found", client.id)));
        }
        self.store(client);
        Ok(())
    }

    async fn remove_client(&self, id: &str) -> Result<(), StoreError> {
        self.clients
            .lock()
            .unwrap()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::Backend(format!("client {} not found", id)))
    }
}

/// Signature verifier with a fixed verdict.
pub struct StubVerifier {
    accept: bool,
}

impl StubVerifier {
    pub fn accepting() -> Self {
        Self { accept: true }
    }

    pub fn rejecting() -> Self {
        Self { accept: false }
    }
}

#[async_trait]
impl SignatureVerifier for StubVerifier {
    async fn verify(
        &self,
        _actor: &Actor,
        key_id: &Iri,
        _request: &Parts,
    ) -> Result<(), ControlError> {
        if self.accept {
            Ok(())
        } else {
            Err(ControlError::unauthorized(
                format!("signature by {} rejected", key_id),
                None,
            ))
        }
    }
}

/// Validator that accepts every activity.
pub struct AcceptAllValidator;

#[async_trait]
impl ActivityValidator for AcceptAllValidator {
    async fn validate(&self, _activity: &serde_json::Value) -> Result<(), ControlError> {
        Ok(())
    }
}

/// Auth factory whose resolver always returns the same outcome.
///
/// Also records every request URL it was asked to scope a resolver to.
pub struct StubAuthFactory {
    outcome: StubOutcome,
    urls: Mutex<Vec<String>>,
}

#[derive(Clone)]
enum StubOutcome {
    Anonymous,
    Actor(Actor),
    Unauthorized(Option<String>),
    Upstream,
}

impl StubAuthFactory {
    fn new(outcome: StubOutcome) -> Self {
        Self {
            outcome,
            urls: Mutex::new(Vec::new()),
        }
    }

    pub fn anonymous() -> Self {
        Self::new(StubOutcome::Anonymous)
    }

    pub fn resolving(actor: Actor) -> Self {
        Self::new(StubOutcome::Actor(actor))
    }

    /// Fails with an authorization error carrying `challenge`.
    pub fn unauthorized(challenge: Option<&str>) -> Self {
        Self::new(StubOutcome::Unauthorized(challenge.map(str::to_string)))
    }

    /// Fails with a storage error, which never produces a challenge.
    pub fn upstream_failure() -> Self {
        Self::new(StubOutcome::Upstream)
    }

    pub fn requested_urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

impl AuthServiceFactory for StubAuthFactory {
    fn for_request(&self, request_url: &str) -> Box<dyn ResolveActor> {
        self.urls.lock().unwrap().push(request_url.to_string());
        Box::new(StubResolver(self.outcome.clone()))
    }
}

struct StubResolver(StubOutcome);

#[async_trait]
impl ResolveActor for StubResolver {
    async fn load_actor_from_auth_header(
        &self,
        _request: &Parts,
    ) -> Result<Option<Actor>, ControlError> {
        match &self.0 {
            StubOutcome::Anonymous => Ok(None),
            StubOutcome::Actor(actor) => Ok(Some(actor.clone())),
            StubOutcome::Unauthorized(challenge) => Err(ControlError::unauthorized(
                "stub authorization failure",
                challenge.clone(),
            )),
            StubOutcome::Upstream => Err(ControlError::Upstream(StoreError::Backend(
                "token store unavailable".to_string(),
            ))),
        }
    }
}
