//! ActivityPub object shapes exchanged with remote servers.
//!
//! Field names are the wire contract and are spelled exactly as remote
//! servers expect them. Every field decodes leniently (missing fields fall
//! back to their default) because real-world servers omit liberally.

use chrono::{DateTime, Utc};
use serde::de::{Deserializer, IgnoredAny};
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};

use crate::constants::LITEPUB_CONTEXT;

/// The `@context` member.
///
/// Incoming contexts are ignored; outgoing objects always carry
/// [`LITEPUB_CONTEXT`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LitePubContext;

impl Serialize for LitePubContext {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(LITEPUB_CONTEXT.len()))?;
        for entry in LITEPUB_CONTEXT {
            seq.serialize_element(entry)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for LitePubContext {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        IgnoredAny::deserialize(deserializer)?;
        Ok(Self)
    }
}

/// Members common to every object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Base {
    #[serde(rename = "@context", default)]
    pub context: LitePubContext,
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

impl Base {
    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            context: LitePubContext,
            id: id.into(),
            kind: kind.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActorImage {
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
}

/// Public key advertised by an actor for signature verification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PublicKey {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub owner: String,
    #[serde(rename = "publicKeyPem", default)]
    pub public_key_pem: String,
}

/// A federated identity record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    #[serde(flatten)]
    pub base: Base,

    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub preferred_username: String,
    #[serde(default)]
    pub manually_approves_followers: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ActorImage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<ActorImage>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub summary: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub inbox: String,
    #[serde(default)]
    pub outbox: String,
    #[serde(default)]
    pub followers: String,
    #[serde(default)]
    pub following: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<DateTime<Utc>>,

    #[serde(default)]
    pub public_key: PublicKey,
}

/// A short post.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    #[serde(flatten)]
    pub base: Base,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<DateTime<Utc>>,
    #[serde(default)]
    pub attributed_to: String,
    #[serde(rename = "InReplyToAtomUri", alias = "inReplyToAtomUri", default)]
    pub in_reply_to: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub to: Vec<String>,
    #[serde(default)]
    pub cc: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Follow {
    #[serde(flatten)]
    pub base: Base,

    #[serde(default)]
    pub actor: String,
    #[serde(default)]
    pub object: String,
}

impl Follow {
    pub fn new(id: impl Into<String>, actor: impl Into<String>, object: impl Into<String>) -> Self {
        Self {
            base: Base::new("Follow", id),
            actor: actor.into(),
            object: object.into(),
        }
    }
}

/// Acceptance of a previous activity, typically a [`Follow`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Accept<O> {
    #[serde(flatten)]
    pub base: Base,

    #[serde(default)]
    pub actor: String,
    pub object: O,
}

impl<O> Accept<O> {
    pub fn new(id: impl Into<String>, actor: impl Into<String>, object: O) -> Self {
        Self {
            base: Base::new("Accept", id),
            actor: actor.into(),
            object,
        }
    }
}

/// A `Create` activity wrapping a payload authored by `actor`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Create<O> {
    #[serde(flatten)]
    pub base: Base,

    #[serde(default)]
    pub actor: String,
    pub object: O,
}

impl<O> Create<O> {
    /// Consumes the activity and returns its payload.
    pub fn into_object(self) -> O {
        self.object
    }

    pub fn is_create(&self) -> bool {
        self.base.kind == "Create"
    }
}

/// Wraps a note in a `Create` activity attributed to the note's author.
#[must_use]
pub fn wrap_create(note: Note, create_id: impl Into<String>) -> Create<Note> {
    Create {
        base: Base::new("Create", create_id),
        actor: note.attributed_to.clone(),
        object: note,
    }
}

/// Root of a paginated collection.
///
/// `first` is kept raw because servers send either an inline page or a URL;
/// see [`crate::collection::FirstPage`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderedCollection {
    #[serde(flatten)]
    pub base: Base,

    #[serde(default)]
    pub total_items: usize,
    #[serde(default)]
    pub first: serde_json::Value,
}

/// One page of a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderedCollectionPage<I> {
    #[serde(flatten)]
    pub base: Base,

    #[serde(default)]
    pub total_items: usize,
    #[serde(default)]
    pub part_of: String,
    #[serde(default = "Vec::new", alias = "items")]
    pub ordered_items: Vec<I>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

impl<I> OrderedCollectionPage<I> {
    /// The continuation URL, if any. An empty string counts as none.
    pub fn next_page(&self) -> Option<&str> {
        self.next.as_deref().filter(|next| !next.is_empty())
    }
}

/// Webfinger discovery document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebfingerResponse {
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub links: Vec<WebfingerLink>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebfingerLink {
    #[serde(default)]
    pub rel: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub href: String,
}
