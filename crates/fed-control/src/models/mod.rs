use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The public-collection sentinel used as the default audience.
pub const PUBLIC_COLLECTION: &str = "https://www.w3.org/ns/activitystreams#Public";

/// Internationalized resource identifier of an actor or sub-resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Iri(String);

impl Iri {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Parse `text` as an absolute reference.
    ///
    /// Returns `None` for relative references such as a bare local identifier.
    /// The caller's spelling is kept, so `https://example.com` does not gain a
    /// trailing slash.
    pub fn parse_absolute(text: &str) -> Option<Self> {
        let text = text.trim();
        url::Url::parse(text).ok().map(|_| Self(text.to_string()))
    }

    /// `<self>/<segment>`
    pub fn join(&self, segment: &str) -> Self {
        Self(format!("{}/{}", self.0, segment))
    }

    /// The IRI without its fragment, e.g. the owner of a `#main-key` key id.
    pub fn without_fragment(&self) -> Self {
        match self.0.split_once('#') {
            Some((base, _)) => Self(base.to_string()),
            None => self.clone(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Iri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Iri {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Vocabulary type tag of an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActorType {
    Application,
    Group,
    Organization,
    Person,
    Service,
}

impl ActorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActorType::Application => "Application",
            ActorType::Group => "Group",
            ActorType::Organization => "Organization",
            ActorType::Person => "Person",
            ActorType::Service => "Service",
        }
    }
}

impl FromStr for ActorType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Application" => Ok(ActorType::Application),
            "Group" => Ok(ActorType::Group),
            "Organization" => Ok(ActorType::Organization),
            "Person" => Ok(ActorType::Person),
            "Service" => Ok(ActorType::Service),
            _ => Err(format!("Invalid actor type: {}", s)),
        }
    }
}

/// Language-tagged text value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LangValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    pub value: String,
}

impl LangValue {
    /// A value without a language tag.
    pub fn untagged(value: impl Into<String>) -> Self {
        Self {
            lang: None,
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_inbox: Option<Iri>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oauth_authorization_endpoint: Option<Iri>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oauth_token_endpoint: Option<Iri>,
}

/// A local federated identity.
///
/// `id` is assigned once by the repository's id generator; the derived
/// addresses are computed from it at creation and never recomputed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Iri>,
    #[serde(rename = "type")]
    pub kind: ActorType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<Iri>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub preferred_username: Vec<LangValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub summary: Vec<LangValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributed_to: Option<Iri>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generator: Option<Iri>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub audience: Vec<Iri>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inbox: Option<Iri>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outbox: Option<Iri>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liked: Option<Iri>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub likes: Option<Iri>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoints: Option<Endpoints>,
}

impl Actor {
    /// A bare actor of `kind` with every optional field unset.
    pub fn new(kind: ActorType) -> Self {
        Self {
            id: None,
            kind,
            url: None,
            preferred_username: Vec::new(),
            summary: Vec::new(),
            attributed_to: None,
            generator: None,
            audience: Vec::new(),
            published: None,
            updated: None,
            inbox: None,
            outbox: None,
            liked: None,
            likes: None,
            endpoints: None,
        }
    }

    /// First untagged (or first of any language) preferred username.
    pub fn preferred_username(&self) -> Option<&str> {
        self.preferred_username
            .iter()
            .find(|v| v.lang.is_none())
            .or_else(|| self.preferred_username.first())
            .map(|v| v.value.as_str())
    }
}

/// Machine-client (OAuth2) credential record.
#[derive(Debug)]
pub struct ClientCredential {
    /// Generated by the client manager, never supplied by callers.
    pub id: String,
    pub secret: SecretString,
    /// Redirect URIs joined by commas.
    pub redirect_uri: String,
}

impl ClientCredential {
    pub fn new(id: String, secret: SecretString, redirect_uris: &[String]) -> Self {
        Self {
            id,
            secret,
            redirect_uri: redirect_uris.join(","),
        }
    }

    pub fn redirect_uris(&self) -> Vec<&str> {
        self.redirect_uri
            .split(',')
            .filter(|uri| !uri.is_empty())
            .collect()
    }
}

/// Result of a bearer-token lookup against the credential store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessGrant {
    /// Actor the token was issued to.
    pub actor: Iri,
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessGrant {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}
