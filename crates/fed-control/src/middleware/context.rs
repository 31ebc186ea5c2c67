//! Request-scoped bindings made available to downstream stages.
//!
//! Bindings live in the request's extensions, one typed newtype per binding:
//!
//! | binding              | type                | set by                    |
//! |----------------------|---------------------|---------------------------|
//! | repository handle    | [`RepositoryHandle`]| [`attach_repository`]     |
//! | activity validator   | [`ValidatorHandle`] | [`attach_validator`]      |
//! | resolved actor       | [`ResolvedActor`]   | `actor_from_auth_header`  |
//!
//! Each stage adds its binding to the request it was handed and forwards it;
//! nothing is shared across requests.

use crate::models::Actor;
use crate::repositories::{ActivityValidator, ActorRepository};
use axum::{
    extract::{Request, State},
    http::{request::Parts, Extensions},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Repository available to downstream handlers.
#[derive(Clone)]
pub struct RepositoryHandle(pub Arc<dyn ActorRepository>);

/// Activity validator available to downstream handlers.
#[derive(Clone)]
pub struct ValidatorHandle(pub Arc<dyn ActivityValidator>);

/// The actor the request was authenticated as.
#[derive(Debug, Clone)]
pub struct ResolvedActor(pub Actor);

/// Typed accessors for the request-scoped bindings.
///
/// Each accessor returns `None` when the stage that sets the binding did not
/// run for this request.
pub trait RequestContextExt {
    fn repository(&self) -> Option<&Arc<dyn ActorRepository>>;
    fn activity_validator(&self) -> Option<&Arc<dyn ActivityValidator>>;
    fn resolved_actor(&self) -> Option<&Actor>;
}

impl RequestContextExt for Extensions {
    fn repository(&self) -> Option<&Arc<dyn ActorRepository>> {
        self.get::<RepositoryHandle>().map(|handle| &handle.0)
    }

    fn activity_validator(&self) -> Option<&Arc<dyn ActivityValidator>> {
        self.get::<ValidatorHandle>().map(|handle| &handle.0)
    }

    fn resolved_actor(&self) -> Option<&Actor> {
        self.get::<ResolvedActor>().map(|resolved| &resolved.0)
    }
}

impl<B> RequestContextExt for axum::http::Request<B> {
    fn repository(&self) -> Option<&Arc<dyn ActorRepository>> {
        self.extensions().repository()
    }

    fn activity_validator(&self) -> Option<&Arc<dyn ActivityValidator>> {
        self.extensions().activity_validator()
    }

    fn resolved_actor(&self) -> Option<&Actor> {
        self.extensions().resolved_actor()
    }
}

impl RequestContextExt for Parts {
    fn repository(&self) -> Option<&Arc<dyn ActorRepository>> {
        self.extensions.repository()
    }

    fn activity_validator(&self) -> Option<&Arc<dyn ActivityValidator>> {
        self.extensions.activity_validator()
    }

    fn resolved_actor(&self) -> Option<&Actor> {
        self.extensions.resolved_actor()
    }
}

/// Bind the repository handle for downstream stages.
pub async fn attach_repository(
    State(handle): State<RepositoryHandle>,
    mut req: Request,
    next: Next,
) -> Response {
    req.extensions_mut().insert(handle);
    next.run(req).await
}

/// Bind the activity validator for downstream stages.
pub async fn attach_validator(
    State(handle): State<ValidatorHandle>,
    mut req: Request,
    next: Next,
) -> Response {
    req.extensions_mut().insert(handle);
    next.run(req).await
}
