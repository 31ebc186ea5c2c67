//! Service layer for the control plane.
//!
//! # Components
//!
//! - `actor_service` - Local actor creation and deletion
//! - `client_service` - OAuth2 machine-client credentials
//! - `id_derivation` - Canonical actor and endpoint addresses

pub mod actor_service;
pub mod client_service;
pub mod id_derivation;

pub use actor_service::ActorProvisioner;
pub use client_service::ClientCredentialManager;
