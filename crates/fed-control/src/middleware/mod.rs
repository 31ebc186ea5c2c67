pub mod auth;
pub mod context;

pub use auth::{actor_from_auth_header, AuthService, AuthServiceFactory, AuthState, ResolveActor};
pub use context::{
    attach_repository, attach_validator, RepositoryHandle, RequestContextExt, ResolvedActor,
    ValidatorHandle,
};
