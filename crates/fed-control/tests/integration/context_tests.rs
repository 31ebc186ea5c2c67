//! Request-context bindings seen by downstream handlers.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use fed_control::errors::ControlError;
use fed_control::middleware::AuthState;
use fed_control::models::{Actor, ActorType, Iri};
use fed_control::repositories::ActivityValidator;
use fed_test_utils::*;
use serde_json::json;
use std::sync::Arc;

struct RejectAll;

#[async_trait]
impl ActivityValidator for RejectAll {
    async fn validate(&self, _activity: &serde_json::Value) -> Result<(), ControlError> {
        Err(ControlError::NotImplemented("validation".to_string()))
    }
}

fn alice() -> Actor {
    let mut actor = Actor::new(ActorType::Person);
    actor.id = Some(Iri::from(TEST_ACTOR_ALICE));
    actor
}

fn router(validator: Arc<dyn ActivityValidator>, factory: StubAuthFactory) -> axum::Router {
    context_router(
        Arc::new(MemoryRepository::new()),
        validator,
        Arc::new(AuthState::with_factory(Arc::new(factory))),
    )
}

fn post_activity() -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(INBOX_PATH)
        .header(header::CONTENT_TYPE, "application/activity+json")
        .body(Body::from(
            json!({ "type": "Follow", "actor": TEST_ACTOR_ALICE }).to_string(),
        ))
        .expect("request")
}

#[tokio::test]
async fn test_every_binding_reaches_the_handler() -> Result<(), anyhow::Error> {
    let request = Request::builder()
        .uri(PROBE_PATH)
        .body(Body::empty())?;
    let response = send(
        router(Arc::new(AcceptAllValidator), StubAuthFactory::resolving(alice())),
        request,
    )
    .await?;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["repository"], true);
    assert_eq!(response.body["validator"], true);
    assert_eq!(response.body["actor"], TEST_ACTOR_ALICE);
    Ok(())
}

#[tokio::test]
async fn test_handler_uses_bound_validator() -> Result<(), anyhow::Error> {
    let accepted = send(
        router(Arc::new(AcceptAllValidator), StubAuthFactory::resolving(alice())),
        post_activity(),
    )
    .await?;
    assert_eq!(accepted.status, StatusCode::ACCEPTED);

    let rejected = send(
        router(Arc::new(RejectAll), StubAuthFactory::resolving(alice())),
        post_activity(),
    )
    .await?;
    assert_eq!(rejected.status, StatusCode::UNPROCESSABLE_ENTITY);
    Ok(())
}

#[tokio::test]
async fn test_handler_enforces_missing_identity_itself() -> Result<(), anyhow::Error> {
    let response = send(
        router(Arc::new(AcceptAllValidator), StubAuthFactory::anonymous()),
        post_activity(),
    )
    .await?;

    // The middleware forwarded the request; the handler decided on 401.
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(response.headers.get(header::WWW_AUTHENTICATE).is_none());
    Ok(())
}

#[tokio::test]
async fn test_bindings_do_not_leak_across_requests() -> Result<(), anyhow::Error> {
    let app = router(Arc::new(AcceptAllValidator), StubAuthFactory::anonymous());

    for _ in 0..2 {
        let request = Request::builder().uri(PROBE_PATH).body(Body::empty())?;
        let response = send(app.clone(), request).await?;
        assert_eq!(response.body["actor"], serde_json::Value::Null);
    }
    Ok(())
}
