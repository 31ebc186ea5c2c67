//! Observability helpers for the control plane.
//!
//! # Privacy
//!
//! Operations are instrumented with `#[instrument(skip_all)]` and explicit
//! field allow-listing:
//! - **SAFE**: kinds, outcomes, actor IRIs (they are public addresses)
//! - **HASHED**: OAuth client ids, via [`hash_for_correlation`]
//! - **NEVER**: client secrets, actor passwords, bearer tokens

pub mod metrics;

use sha2::{Digest, Sha256};

/// Hash a field value for correlation in logs (SHA-256, first 8 hex chars).
///
/// Not suitable for secrets: this only lets log lines about the same client
/// be correlated without printing the identifier itself.
pub fn hash_for_correlation(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    let result = hasher.finalize();
    hex::encode(result.get(..4).unwrap_or_default())
}

/// Outcome label shared by every metric (bounded cardinality).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Error,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Error => "error",
        }
    }

    pub fn of<T, E>(result: &Result<T, E>) -> Self {
        if result.is_ok() {
            Outcome::Success
        } else {
            Outcome::Error
        }
    }
}
