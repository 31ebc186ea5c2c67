//! Identity resolution middleware.
//!
//! Determines which actor is making a request from its `Authorization`
//! header and binds it as [`ResolvedActor`]. Resolution never rejects a
//! request: failures are logged, an authorization failure with a challenge
//! adds a `WWW-Authenticate` header to the response, and the request is
//! always forwarded. Handlers that need an identity enforce that themselves.
//!
//! Supported schemes, tried by the default [`AuthService`]:
//! 1. `Bearer <token>`: the token is looked up in the credential store and
//!    the grant's actor is loaded.
//! 2. `Signature keyId="...",...`: the key owner (the key id without its
//!    fragment) is loaded and the signature is checked by the injected
//!    [`SignatureVerifier`].

use super::context::ResolvedActor;
use crate::errors::ControlError;
use crate::models::{Actor, Iri};
use crate::observability::metrics;
use crate::repositories::{ActorLoader, CredentialStore, SignatureVerifier};
use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    http::{
        header::{AUTHORIZATION, HOST, WWW_AUTHENTICATE},
        request::Parts,
        HeaderValue,
    },
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::instrument;

const FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Resolves the acting actor of a single request.
#[async_trait]
pub trait ResolveActor: Send + Sync {
    /// `Ok(None)` means the request is anonymous.
    async fn load_actor_from_auth_header(
        &self,
        request: &Parts,
    ) -> Result<Option<Actor>, ControlError>;
}

/// Builds a resolver scoped to the effective URL of the current request.
pub trait AuthServiceFactory: Send + Sync {
    fn for_request(&self, request_url: &str) -> Box<dyn ResolveActor>;
}

/// State for the identity resolution middleware.
pub struct AuthState {
    pub services: Arc<dyn AuthServiceFactory>,
}

impl AuthState {
    /// Default bearer-token and HTTP-signature resolution.
    pub fn new(
        tokens: Arc<dyn CredentialStore>,
        actors: Arc<dyn ActorLoader>,
        signatures: Arc<dyn SignatureVerifier>,
    ) -> Self {
        Self {
            services: Arc::new(AuthServices {
                tokens,
                actors,
                signatures,
            }),
        }
    }

    pub fn with_factory(services: Arc<dyn AuthServiceFactory>) -> Self {
        Self { services }
    }
}

struct AuthServices {
    tokens: Arc<dyn CredentialStore>,
    actors: Arc<dyn ActorLoader>,
    signatures: Arc<dyn SignatureVerifier>,
}

impl AuthServiceFactory for AuthServices {
    fn for_request(&self, request_url: &str) -> Box<dyn ResolveActor> {
        Box::new(AuthService {
            request_url: request_url.to_string(),
            tokens: Arc::clone(&self.tokens),
            actors: Arc::clone(&self.actors),
            signatures: Arc::clone(&self.signatures),
        })
    }
}

/// Per-request authentication service.
pub struct AuthService {
    request_url: String,
    tokens: Arc<dyn CredentialStore>,
    actors: Arc<dyn ActorLoader>,
    signatures: Arc<dyn SignatureVerifier>,
}

impl AuthService {
    fn bearer_challenge(&self) -> Option<String> {
        Some(format!(
            "Bearer realm=\"{}\", error=\"invalid_token\"",
            self.request_url
        ))
    }

    fn signature_challenge(&self) -> Option<String> {
        Some(format!("Signature realm=\"{}\"", self.request_url))
    }

    async fn load_from_bearer(&self, token: &str) -> Result<Option<Actor>, ControlError> {
        if token.is_empty() {
            return Err(ControlError::unauthorized(
                "missing bearer token",
                self.bearer_challenge(),
            ));
        }

        let grant = self.tokens.load_access(token).await?.ok_or_else(|| {
            ControlError::unauthorized("unknown access token", self.bearer_challenge())
        })?;

        if grant.is_expired(Utc::now()) {
            return Err(ControlError::unauthorized(
                "access token expired",
                self.bearer_challenge(),
            ));
        }

        let actor = self.actors.load_actor(&grant.actor).await?.ok_or_else(|| {
            ControlError::unauthorized(
                format!("token owner {} not found", grant.actor),
                self.bearer_challenge(),
            )
        })?;

        Ok(Some(actor))
    }

    async fn load_from_signature(
        &self,
        params: &str,
        request: &Parts,
    ) -> Result<Option<Actor>, ControlError> {
        let key_id = signature_param(params, "keyId").ok_or_else(|| {
            ControlError::unauthorized("signature has no keyId", self.signature_challenge())
        })?;
        let key_id = Iri::new(key_id);
        let owner = key_id.without_fragment();

        let actor = self.actors.load_actor(&owner).await?.ok_or_else(|| {
            ControlError::unauthorized(
                format!("signing key owner {} not found", owner),
                self.signature_challenge(),
            )
        })?;

        self.signatures
            .verify(&actor, &key_id, request)
            .await
            .map_err(|e| match e {
                ControlError::Unauthorized {
                    message,
                    challenge: None,
                } => ControlError::unauthorized(message, self.signature_challenge()),
                other => other,
            })?;

        Ok(Some(actor))
    }
}

#[async_trait]
impl ResolveActor for AuthService {
    async fn load_actor_from_auth_header(
        &self,
        request: &Parts,
    ) -> Result<Option<Actor>, ControlError> {
        let Some(header) = request.headers.get(AUTHORIZATION) else {
            return Ok(None);
        };
        let header = header
            .to_str()
            .map_err(|_| ControlError::unauthorized("malformed Authorization header", None))?
            .trim();
        if header.is_empty() {
            return Ok(None);
        }

        let (scheme, credentials) = header.split_once(' ').unwrap_or((header, ""));
        if scheme.eq_ignore_ascii_case("Bearer") {
            self.load_from_bearer(credentials.trim()).await
        } else if scheme.eq_ignore_ascii_case("Signature") {
            self.load_from_signature(credentials, request).await
        } else {
            Err(ControlError::unauthorized(
                format!("unsupported authorization scheme {}", scheme),
                None,
            ))
        }
    }
}

/// Value of `name` in a `k1="v1",k2="v2"` signature parameter list.
fn signature_param<'a>(params: &'a str, name: &str) -> Option<&'a str> {
    params.split(',').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key.trim() == name).then(|| value.trim().trim_matches('"'))
    })
}

/// Effective URL of the request as seen by the client.
pub fn request_url(request: &Parts) -> String {
    let scheme = request
        .headers
        .get(FORWARDED_PROTO)
        .and_then(|v| v.to_str().ok())
        .or_else(|| request.uri.scheme_str())
        .unwrap_or("http");
    let host = request
        .headers
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| request.uri.authority().map(|a| a.as_str()))
        .unwrap_or("localhost");

    format!("{}://{}{}", scheme, host, request.uri.path())
}

/// Identity resolution middleware.
///
/// # Response
///
/// - Never rejects; the request always reaches the next stage
/// - Binds `ResolvedActor` when an actor was resolved
/// - Appends `WWW-Authenticate` when resolution failed with an authorization
///   error carrying a challenge
#[instrument(skip_all, name = "fed.middleware.auth")]
pub async fn actor_from_auth_header(
    State(state): State<Arc<AuthState>>,
    req: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = req.into_parts();
    let service = state.services.for_request(&request_url(&parts));

    let mut challenge = None;
    match service.load_actor_from_auth_header(&parts).await {
        Ok(Some(actor)) => {
            metrics::record_auth_resolution("actor");
            tracing::debug!(
                target: "fed.middleware.auth",
                actor = actor.id.as_ref().map(Iri::as_str).unwrap_or_default(),
                "Resolved actor from Authorization header"
            );
            parts.extensions.insert(ResolvedActor(actor));
        }
        Ok(None) => metrics::record_auth_resolution("anonymous"),
        Err(e) => {
            metrics::record_auth_resolution("failed");
            challenge = e.challenge().map(str::to_string);
            tracing::warn!(
                target: "fed.middleware.auth",
                error = %e,
                "Unable to load actor from Authorization header"
            );
        }
    }

    let mut response = next.run(Request::from_parts(parts, body)).await;

    if let Some(challenge) = challenge {
        match HeaderValue::from_str(&challenge) {
            Ok(value) => {
                response.headers_mut().append(WWW_AUTHENTICATE, value);
            }
            Err(_) => tracing::warn!(
                target: "fed.middleware.auth",
                "Challenge is not a valid header value, dropped"
            ),
        }
    }

    response
}
