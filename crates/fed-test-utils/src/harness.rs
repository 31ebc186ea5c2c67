//! Router harness for exercising the request-context stages in-process.

use axum::{
    body::Body,
    extract::Request,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use fed_control::middleware::{AuthState, RequestContextExt};
use fed_control::repositories::{ActivityValidator, ActorRepository};
use fed_control::routes::with_request_context;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

pub const PROBE_PATH: &str = "/probe";
pub const INBOX_PATH: &str = "/inbox";

/// A router whose handlers report what the context stages bound.
///
/// - `GET /probe` answers `{ "actor", "repository", "validator" }`
/// - `POST /inbox` runs the bound validator on the JSON body and answers 202,
///   or 401 when no actor was resolved
pub fn context_router(
    repository: Arc<dyn ActorRepository>,
    validator: Arc<dyn ActivityValidator>,
    auth: Arc<AuthState>,
) -> Router {
    let router = Router::new()
        .route(PROBE_PATH, get(probe))
        .route(INBOX_PATH, post(inbox));
    with_request_context(router, repository, validator, auth)
}

async fn probe(req: Request) -> Json<Value> {
    Json(json!({
        "actor": req.resolved_actor().and_then(|a| a.id.as_ref()).map(|id| id.as_str()),
        "repository": req.repository().is_some(),
        "validator": req.activity_validator().is_some(),
    }))
}

async fn inbox(req: Request) -> StatusCode {
    if req.resolved_actor().is_none() {
        return StatusCode::UNAUTHORIZED;
    }
    let Some(validator) = req.activity_validator().cloned() else {
        return StatusCode::INTERNAL_SERVER_ERROR;
    };

    let bytes = match req.into_body().collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(_) => return StatusCode::BAD_REQUEST,
    };
    let Ok(activity) = serde_json::from_slice::<Value>(&bytes) else {
        return StatusCode::BAD_REQUEST;
    };

    match validator.validate(&activity).await {
        Ok(()) => StatusCode::ACCEPTED,
        Err(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

/// Response of a single in-process request.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// Send `request` through `router` without binding a socket.
pub async fn send(router: Router, request: Request<Body>) -> anyhow::Result<TestResponse> {
    let response = router.oneshot(request).await?;
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await?.to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };

    Ok(TestResponse {
        status,
        headers,
        body,
    })
}
