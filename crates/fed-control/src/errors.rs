use crate::models::Actor;
use axum::{
    http::{header::WWW_AUTHENTICATE, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Errors raised by the injected storage and credential capabilities, and by
/// the storage lifecycle routines.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum ControlError {
    /// Resolution of the acting identity failed. Only this kind produces a
    /// `WWW-Authenticate` header, and only when `challenge` is non-empty.
    #[error("Unauthorized: {message}")]
    Unauthorized {
        message: String,
        challenge: Option<String>,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Not implemented: {0}")]
    NotImplemented(String),

    /// An optional extension point is not provided by the configured store.
    #[error("Unsupported capability: {0}")]
    CapabilityUnsupported(String),

    /// The actor was saved but its credential secret could not be set.
    /// The saved actor is carried so callers can decide on remediation.
    #[error("Actor saved but credential was not set: {source}")]
    CredentialNotSet {
        actor: Box<Actor>,
        #[source]
        source: StoreError,
    },

    /// A client id was generated but the client was not stored. The id is
    /// carried so callers can report or retry with it.
    #[error("OAuth2 client {id} was not created: {source}")]
    ClientNotCreated {
        id: String,
        #[source]
        source: Box<ControlError>,
    },

    #[error(transparent)]
    Upstream(#[from] StoreError),
}

impl ControlError {
    pub fn unauthorized(message: impl Into<String>, challenge: Option<String>) -> Self {
        ControlError::Unauthorized {
            message: message.into(),
            challenge,
        }
    }

    /// The non-empty challenge of an authorization error, if any.
    pub fn challenge(&self) -> Option<&str> {
        match self {
            ControlError::Unauthorized {
                challenge: Some(challenge),
                ..
            } if !challenge.is_empty() => Some(challenge.as_str()),
            _ => None,
        }
    }

    /// The actor persisted before a partial failure.
    pub fn partial_actor(&self) -> Option<&Actor> {
        match self {
            ControlError::CredentialNotSet { actor, .. } => Some(actor.as_ref()),
            _ => None,
        }
    }

    /// The generated id of a client that failed to be stored.
    pub fn client_id(&self) -> Option<&str> {
        match self {
            ControlError::ClientNotCreated { id, .. } => Some(id.as_str()),
            _ => None,
        }
    }

    /// The error behind a failed client creation, or `self`.
    pub fn root(&self) -> &ControlError {
        match self {
            ControlError::ClientNotCreated { source, .. } => source.root(),
            other => other,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for ControlError {
    fn into_response(self) -> Response {
        if let ControlError::ClientNotCreated { source, .. } = self {
            return (*source).into_response();
        }

        let (status, code, message) = match &self {
            ControlError::Unauthorized { message, .. } => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message.clone())
            }
            ControlError::NotFound(what) => (StatusCode::NOT_FOUND, "NOT_FOUND", what.clone()),
            ControlError::NotImplemented(what) => {
                (StatusCode::NOT_IMPLEMENTED, "NOT_IMPLEMENTED", what.clone())
            }
            ControlError::CapabilityUnsupported(what) => (
                StatusCode::NOT_IMPLEMENTED,
                "CAPABILITY_UNSUPPORTED",
                what.clone(),
            ),
            ControlError::CredentialNotSet { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "CREDENTIAL_NOT_SET",
                "The actor was created without a usable credential".to_string(),
            ),
            ControlError::Upstream(_) | ControlError::ClientNotCreated { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORAGE_ERROR",
                "An internal storage error occurred".to_string(),
            ),
        };

        let challenge = self
            .challenge()
            .and_then(|c| HeaderValue::from_str(c).ok());

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        let mut response = (status, Json(body)).into_response();
        if let Some(challenge) = challenge {
            response.headers_mut().append(WWW_AUTHENTICATE, challenge);
        }
        response
    }
}
