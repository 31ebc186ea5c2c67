//! Canonical address derivation for actors.
//!
//! These formats are part of the federation contract and must be reproduced
//! exactly: `<actor id>/inbox`, `<actor id>/outbox`, `<actor id>/liked`,
//! `<actor id>/likes`, `<service url>/oauth/authorize`,
//! `<service url>/oauth/token`, and the shared inbox is the service's inbox.

use crate::models::{Actor, ActorType, Endpoints, Iri};

pub const INBOX: &str = "inbox";
pub const OUTBOX: &str = "outbox";
pub const LIKED: &str = "liked";
pub const LIKES: &str = "likes";
pub const ACTORS: &str = "actors";

const OAUTH_AUTHORIZE: &str = "oauth/authorize";
const OAUTH_TOKEN: &str = "oauth/token";

/// The hosting service's own actor, rooted at `base_url`.
pub fn service_actor(base_url: &str) -> Actor {
    let id = Iri::new(base_url.trim().trim_end_matches('/'));

    let mut actor = Actor::new(ActorType::Service);
    actor.url = Some(id.clone());
    actor.inbox = Some(id.join(INBOX));
    actor.outbox = Some(id.join(OUTBOX));
    actor.id = Some(id);
    actor
}

/// Fill in the addresses that depend on `actor.id`.
///
/// Collections hang off the actor's own id; the shared inbox and the OAuth
/// endpoints hang off the service. Does nothing when the id is unset.
pub fn derive_addresses(actor: &mut Actor, service: &Actor) {
    let Some(id) = actor.id.clone() else {
        return;
    };

    actor.url = Some(id.clone());
    actor.inbox = Some(id.join(INBOX));
    actor.outbox = Some(id.join(OUTBOX));
    actor.liked = Some(id.join(LIKED));
    actor.likes = Some(id.join(LIKES));

    let service_url = service.url.as_ref().or(service.id.as_ref());
    actor.endpoints = Some(Endpoints {
        shared_inbox: service.inbox.clone(),
        oauth_authorization_endpoint: service_url.map(|url| url.join(OAUTH_AUTHORIZE)),
        oauth_token_endpoint: service_url.map(|url| url.join(OAUTH_TOKEN)),
    });
}

/// `<service id>/actors/<local_id>`
pub fn local_actor_iri(service: &Actor, local_id: &str) -> Iri {
    let base = service.id.clone().unwrap_or_else(|| Iri::new(""));
    base.join(ACTORS).join(local_id)
}
