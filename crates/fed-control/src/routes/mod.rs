use crate::middleware::{
    actor_from_auth_header, attach_repository, attach_validator, AuthState, RepositoryHandle,
    ValidatorHandle,
};
use crate::repositories::{ActivityValidator, ActorRepository};
use axum::{middleware::from_fn_with_state, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Wrap `router` with the request-context stages.
///
/// Requests pass through the stages in this order: tracing, repository
/// binding, validator binding, identity resolution. Handlers therefore see
/// all three bindings, and identity resolution can already rely on the
/// repository handle.
pub fn with_request_context<S>(
    router: Router<S>,
    repository: Arc<dyn ActorRepository>,
    validator: Arc<dyn ActivityValidator>,
    auth: Arc<AuthState>,
) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    // Layers wrap what is already there, so the innermost stage goes first.
    router
        .layer(from_fn_with_state(auth, actor_from_auth_header))
        .layer(from_fn_with_state(
            ValidatorHandle(validator),
            attach_validator,
        ))
        .layer(from_fn_with_state(
            RepositoryHandle(repository),
            attach_repository,
        ))
        .layer(TraceLayer::new_for_http())
}
