//! Federated server control plane library
//!
//! Identity resolution and account provisioning for a federated social
//! server: resolving the actor behind an HTTP request, creating and deleting
//! local actors, managing OAuth2 machine clients, and bootstrapping or
//! cleaning the configured storage backend.
//!
//! # Modules
//!
//! - `config` - Control plane configuration
//! - `control` - Operations exposed to the command layer
//! - `errors` - Error types
//! - `middleware` - Identity resolution and request-context bindings
//! - `models` - Actor, IRI and credential types
//! - `repositories` - Capabilities injected by the storage engine
//! - `routes` - Router composition
//! - `services` - Provisioning logic
//! - `storage` - Storage backend lifecycle

pub mod config;
pub mod control;
pub mod errors;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod storage;
