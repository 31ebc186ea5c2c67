//! Identity resolution middleware, driven through an in-process router.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use chrono::{Duration, Utc};
use fed_control::middleware::AuthState;
use fed_control::models::{Actor, ActorType, Iri};
use fed_test_utils::*;
use serde_json::Value;
use std::sync::Arc;

fn alice() -> Actor {
    let mut actor = Actor::new(ActorType::Person);
    actor.id = Some(Iri::from(TEST_ACTOR_ALICE));
    actor
}

fn router_with(auth: AuthState) -> axum::Router {
    context_router(
        Arc::new(MemoryRepository::new().with_actor(alice())),
        Arc::new(AcceptAllValidator),
        Arc::new(auth),
    )
}

/// Default services over a repository holding alice and a store holding one
/// valid and one expired token for her.
fn default_router(verifier: StubVerifier) -> axum::Router {
    let repository = Arc::new(MemoryRepository::new().with_actor(alice()));
    let tokens = Arc::new(
        MemoryCredentialStore::new()
            .with_token(TEST_TOKEN_VALID, &Iri::from(TEST_ACTOR_ALICE), None)
            .with_token(
                TEST_TOKEN_EXPIRED,
                &Iri::from(TEST_ACTOR_ALICE),
                Some(Utc::now() - Duration::hours(1)),
            ),
    );
    let auth = AuthState::new(tokens, repository.clone(), Arc::new(verifier));
    context_router(repository, Arc::new(AcceptAllValidator), Arc::new(auth))
}

fn probe(authorization: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .uri(PROBE_PATH)
        .header(header::HOST, "fedbox.example")
        .header("x-forwarded-proto", "https");
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    builder.body(Body::empty()).expect("request")
}

// ============================================================================
// Injected factory
// ============================================================================

#[tokio::test]
async fn test_no_authorization_header_forwards_anonymously() -> Result<(), anyhow::Error> {
    let response = send(default_router(StubVerifier::accepting()), probe(None)).await?;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["actor"], Value::Null);
    assert!(response.headers.get(header::WWW_AUTHENTICATE).is_none());
    Ok(())
}

#[tokio::test]
async fn test_unauthorized_challenge_is_copied_and_request_forwarded(
) -> Result<(), anyhow::Error> {
    let factory = Arc::new(StubAuthFactory::unauthorized(Some("Bearer")));
    let response = send(
        router_with(AuthState::with_factory(factory.clone())),
        probe(Some("Bearer whatever")),
    )
    .await?;

    assert_eq!(response.status, StatusCode::OK, "request still forwarded");
    assert_eq!(response.body["actor"], Value::Null);
    assert_eq!(
        response
            .headers
            .get(header::WWW_AUTHENTICATE)
            .map(|v| v.to_str().unwrap_or_default()),
        Some("Bearer")
    );
    assert_eq!(factory.requested_urls(), vec!["https://fedbox.example/probe"]);
    Ok(())
}

#[tokio::test]
async fn test_empty_challenge_adds_no_header() -> Result<(), anyhow::Error> {
    for factory in [
        StubAuthFactory::unauthorized(Some("")),
        StubAuthFactory::unauthorized(None),
        StubAuthFactory::upstream_failure(),
    ] {
        let response = send(
            router_with(AuthState::with_factory(Arc::new(factory))),
            probe(Some("Bearer whatever")),
        )
        .await?;

        assert_eq!(response.status, StatusCode::OK);
        assert!(response.headers.get(header::WWW_AUTHENTICATE).is_none());
    }
    Ok(())
}

#[tokio::test]
async fn test_resolved_actor_is_bound() -> Result<(), anyhow::Error> {
    let factory = StubAuthFactory::resolving(alice());
    let response = send(
        router_with(AuthState::with_factory(Arc::new(factory))),
        probe(Some("Bearer whatever")),
    )
    .await?;

    assert_eq!(response.body["actor"], TEST_ACTOR_ALICE);
    Ok(())
}

// ============================================================================
// Default bearer and signature services
// ============================================================================

#[tokio::test]
async fn test_valid_bearer_token_resolves_owner() -> Result<(), anyhow::Error> {
    let authorization = format!("Bearer {}", TEST_TOKEN_VALID);
    let response = send(
        default_router(StubVerifier::accepting()),
        probe(Some(&authorization)),
    )
    .await?;

    assert_eq!(response.body["actor"], TEST_ACTOR_ALICE);
    assert!(response.headers.get(header::WWW_AUTHENTICATE).is_none());
    Ok(())
}

#[tokio::test]
async fn test_rejected_bearer_tokens_get_challenge() -> Result<(), anyhow::Error> {
    for token in [TEST_TOKEN_EXPIRED, "unknown-token"] {
        let authorization = format!("Bearer {}", token);
        let response = send(
            default_router(StubVerifier::accepting()),
            probe(Some(&authorization)),
        )
        .await?;

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["actor"], Value::Null);
        assert_eq!(
            response
                .headers
                .get(header::WWW_AUTHENTICATE)
                .map(|v| v.to_str().unwrap_or_default()),
            Some("Bearer realm=\"https://fedbox.example/probe\", error=\"invalid_token\"")
        );
    }
    Ok(())
}

#[tokio::test]
async fn test_signature_resolves_key_owner() -> Result<(), anyhow::Error> {
    let authorization = format!(
        "Signature keyId=\"{}\",algorithm=\"hs2019\",headers=\"(request-target) host date\",signature=\"c2ln\"",
        TEST_ACTOR_ALICE_KEY
    );

    let response = send(
        default_router(StubVerifier::accepting()),
        probe(Some(&authorization)),
    )
    .await?;
    assert_eq!(response.body["actor"], TEST_ACTOR_ALICE);

    let response = send(
        default_router(StubVerifier::rejecting()),
        probe(Some(&authorization)),
    )
    .await?;
    assert_eq!(response.body["actor"], Value::Null);
    assert_eq!(
        response
            .headers
            .get(header::WWW_AUTHENTICATE)
            .map(|v| v.to_str().unwrap_or_default()),
        Some("Signature realm=\"https://fedbox.example/probe\"")
    );
    Ok(())
}

#[tokio::test]
async fn test_unknown_scheme_is_ignored_without_challenge() -> Result<(), anyhow::Error> {
    let response = send(
        default_router(StubVerifier::accepting()),
        probe(Some("Basic YWxpY2U6cHc=")),
    )
    .await?;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["actor"], Value::Null);
    assert!(response.headers.get(header::WWW_AUTHENTICATE).is_none());
    Ok(())
}
