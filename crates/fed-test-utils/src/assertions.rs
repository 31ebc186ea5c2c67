//! Custom test assertions for expressive tests

use fed_control::models::{Actor, Iri};

/// Chainable assertions on provisioned actors.
///
/// # Example
/// ```rust,ignore
/// actor
///     .assert_has_id()
///     .assert_addresses_derived()
///     .assert_oauth_rooted_at("https://fedbox.example");
/// ```
pub trait ActorAssertions {
    /// Assert that the actor was given an id
    fn assert_has_id(&self) -> &Self;

    /// Assert that url, collections and shared inbox are derived from the id
    fn assert_addresses_derived(&self) -> &Self;

    /// Assert that no address was derived
    fn assert_no_derived_addresses(&self) -> &Self;

    /// Assert that both OAuth endpoints live under `base_url`
    fn assert_oauth_rooted_at(&self, base_url: &str) -> &Self;

    /// Assert the preferred username
    fn assert_username(&self, username: &str) -> &Self;
}

fn expect_iri<'a>(field: &str, iri: &'a Option<Iri>) -> &'a str {
    match iri {
        Some(iri) => iri.as_str(),
        None => panic!("expected {} to be set", field),
    }
}

impl ActorAssertions for Actor {
    fn assert_has_id(&self) -> &Self {
        let id = expect_iri("id", &self.id);
        assert!(!id.is_empty(), "actor id must not be empty");
        self
    }

    fn assert_addresses_derived(&self) -> &Self {
        let id = expect_iri("id", &self.id);

        assert_eq!(expect_iri("url", &self.url), id, "url must equal id");
        for (field, value, suffix) in [
            ("inbox", &self.inbox, "inbox"),
            ("outbox", &self.outbox, "outbox"),
            ("liked", &self.liked, "liked"),
            ("likes", &self.likes, "likes"),
        ] {
            assert_eq!(
                expect_iri(field, value),
                format!("{}/{}", id, suffix),
                "{} must be derived from the actor id",
                field
            );
        }

        let endpoints = self.endpoints.as_ref().expect("endpoints must be set");
        assert!(
            endpoints.shared_inbox.is_some(),
            "shared inbox must be set"
        );
        self
    }

    fn assert_no_derived_addresses(&self) -> &Self {
        assert!(self.url.is_none(), "url must not be set");
        assert!(self.inbox.is_none(), "inbox must not be set");
        assert!(self.outbox.is_none(), "outbox must not be set");
        assert!(self.liked.is_none(), "liked must not be set");
        assert!(self.likes.is_none(), "likes must not be set");
        assert!(self.endpoints.is_none(), "endpoints must not be set");
        self
    }

    fn assert_oauth_rooted_at(&self, base_url: &str) -> &Self {
        let endpoints = self.endpoints.as_ref().expect("endpoints must be set");
        assert_eq!(
            expect_iri("oauthAuthorizationEndpoint", &endpoints.oauth_authorization_endpoint),
            format!("{}/oauth/authorize", base_url)
        );
        assert_eq!(
            expect_iri("oauthTokenEndpoint", &endpoints.oauth_token_endpoint),
            format!("{}/oauth/token", base_url)
        );
        self
    }

    fn assert_username(&self, username: &str) -> &Self {
        assert_eq!(self.preferred_username(), Some(username));
        self
    }
}
