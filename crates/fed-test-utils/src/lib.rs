//! # Fed Test Utilities
//!
//! Shared test utilities for the federated server control plane.
//!
//! This crate provides:
//! - In-memory fakes of every injected capability (repository, credential
//!   store, signature verifier, activity validator, auth service factory)
//! - A router harness that reports the request-context bindings
//! - Fixed test identifiers
//! - Custom assertions (ActorAssertions trait)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use fed_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() {
//!     let repository = Arc::new(MemoryRepository::new());
//!     let provisioner = ActorProvisioner::new(TEST_BASE_URL, repository.clone());
//!
//!     let actor = provisioner.add_actor("alice", ActorType::Person, None).await?;
//!
//!     actor.assert_has_id()
//!          .assert_addresses_derived()
//!          .assert_oauth_rooted_at(TEST_BASE_URL);
//! }
//! ```

pub mod assertions;
pub mod fakes;
pub mod harness;
pub mod test_ids;

// Re-export commonly used items
pub use assertions::*;
pub use fakes::*;
pub use harness::*;
pub use test_ids::*;
