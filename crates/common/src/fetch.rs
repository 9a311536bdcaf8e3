//! Fetching and decoding remote ActivityPub objects.

use error_stack::{Report, ResultExt};
use http::header::ACCEPT;
use http::{Method, Request, Response};
use serde::de::DeserializeOwned;
use url::Url;

use crate::constants::{ACTIVITY_JSON, DECODE_SNIPPET_LEN};
use crate::error::LitePubError;
use crate::http_client::HttpClient;
use crate::models::{Actor, Note};
use crate::webfinger::{is_identifier, resolve_identifier};

/// Retrieves typed objects over an injected [`HttpClient`].
///
/// Every call issues a fresh request; nothing is cached between calls.
#[derive(Debug, Clone)]
pub struct ObjectFetcher<C> {
    client: C,
}

impl<C: HttpClient> ObjectFetcher<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// GET `url` with `Accept: application/activity+json` and decode the body.
    ///
    /// Any fragment is dropped from the URL first, so a key id such as
    /// `https://host/actor#main-key` fetches the actor document.
    ///
    /// # Errors
    ///
    /// Returns [`LitePubError::Http`] on transport failure or a non-success
    /// status, and [`LitePubError::Decode`] if the body does not decode as `T`.
    pub fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T, Report<LitePubError>> {
        let target = strip_fragment(url)?;
        log::debug!("GET {}", target);

        let request = Request::builder()
            .method(Method::GET)
            .uri(target.as_str())
            .header(ACCEPT, ACTIVITY_JSON)
            .body(Vec::new())
            .change_context(LitePubError::Http {
                message: format!("Invalid request URL: {}", target),
            })?;

        let response = self.client.send(request)?;
        let body = ensure_success(&target, response)?;

        decode_body(&body)
    }

    /// # Errors
    ///
    /// See [`ObjectFetcher::get`].
    pub fn fetch_actor(&self, url: &str) -> Result<Actor, Report<LitePubError>> {
        self.get(url)
    }

    /// # Errors
    ///
    /// See [`ObjectFetcher::get`].
    pub fn fetch_note(&self, url: &str) -> Result<Note, Report<LitePubError>> {
        self.get(url)
    }

    /// Resolve `name@domain` through webfinger, then fetch the actor.
    ///
    /// # Errors
    ///
    /// Returns [`LitePubError::IdentityResolution`] if `identifier` is not of
    /// the form `name@domain` or webfinger has no matching record, otherwise
    /// see [`ObjectFetcher::get`].
    pub fn fetch_actor_from_identifier(
        &self,
        identifier: &str,
    ) -> Result<Actor, Report<LitePubError>> {
        let url = resolve_identifier(&self.client, identifier)
            .attach(format!("webfinger fetch failed for '{}'", identifier))?;
        self.fetch_actor(&url)
    }

    /// Fetch an actor given either an identifier or its URL.
    ///
    /// # Errors
    ///
    /// See [`ObjectFetcher::fetch_actor_from_identifier`].
    pub fn fetch_actor_any(&self, target: &str) -> Result<Actor, Report<LitePubError>> {
        if is_identifier(target) {
            self.fetch_actor_from_identifier(target)
        } else {
            self.fetch_actor(target)
        }
    }
}

pub(crate) fn strip_fragment(url: &str) -> Result<Url, Report<LitePubError>> {
    let mut parsed = Url::parse(url).change_context(LitePubError::Http {
        message: format!("Invalid URL: {}", url),
    })?;
    parsed.set_fragment(None);
    Ok(parsed)
}

pub(crate) fn ensure_success(
    url: &Url,
    response: Response<Vec<u8>>,
) -> Result<Vec<u8>, Report<LitePubError>> {
    let status = response.status();
    if status.is_success() {
        Ok(response.into_body())
    } else {
        Err(Report::new(LitePubError::Http {
            message: format!("GET {} returned HTTP {}", url, status),
        }))
    }
}

/// Decode a JSON body, reporting the target type and a truncated copy of the
/// body on failure.
pub(crate) fn decode_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, Report<LitePubError>> {
    serde_json::from_slice(body).map_err(|e| {
        Report::new(e).change_context(LitePubError::Decode {
            type_name: short_type_name::<T>(),
            snippet: snippet(body),
        })
    })
}

/// `std::any::type_name` without module paths, including inside generics:
/// `litepub_common::models::OrderedCollectionPage<alloc::string::String>`
/// becomes `OrderedCollectionPage<String>`.
pub(crate) fn short_type_name<T: ?Sized>() -> String {
    let full = std::any::type_name::<T>();
    let mut out = String::with_capacity(full.len());
    let mut segment_start = 0;

    let mut chars = full.chars().peekable();
    while let Some(c) = chars.next() {
        if c == ':' && chars.peek() == Some(&':') {
            chars.next();
            out.truncate(segment_start);
        } else {
            out.push(c);
            if !(c.is_alphanumeric() || c == '_') {
                segment_start = out.len();
            }
        }
    }

    out
}

fn snippet(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(DECODE_SNIPPET_LEN).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::tests::{actor_json, test_keypair, MockHttpClient};
    use serde_json::json;

    #[test]
    fn test_get_sends_activity_accept_header() {
        let client = MockHttpClient::new().with_json(
            "https://a.example/notes/1",
            json!({"id": "https://a.example/notes/1", "type": "Note", "content": "hi"}),
        );
        let fetcher = ObjectFetcher::new(&client);

        let note = fetcher
            .fetch_note("https://a.example/notes/1")
            .expect("should fetch note");

        assert_eq!(note.content, "hi");
        let requests = client.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, Method::GET);
        assert_eq!(requests[0].accept.as_deref(), Some(ACTIVITY_JSON));
    }

    #[test]
    fn test_get_strips_fragment() {
        let client = MockHttpClient::new()
            .with_json("https://a.example/users/alice", actor_json(test_keypair()));
        let fetcher = ObjectFetcher::new(&client);

        let actor = fetcher
            .fetch_actor("https://a.example/users/alice#main-key")
            .expect("should fetch actor");

        assert_eq!(actor.preferred_username, "alice");
        assert_eq!(client.requested_urls(), vec!["https://a.example/users/alice"]);
    }

    #[test]
    fn test_decode_error_truncates_body() {
        let body = "x".repeat(250);
        let client = MockHttpClient::new().with_body("https://a.example/notes/1", 200, &body);
        let fetcher = ObjectFetcher::new(&client);

        let err = fetcher
            .fetch_note("https://a.example/notes/1")
            .expect_err("should fail to decode");

        match err.current_context() {
            LitePubError::Decode { type_name, snippet } => {
                assert_eq!(type_name, "Note");
                assert_eq!(snippet.len(), 103);
                assert!(snippet.ends_with("..."));
            }
            other => panic!("Expected Decode error, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_error_short_body_not_truncated() {
        let client = MockHttpClient::new().with_body("https://a.example/notes/1", 200, "<html>");
        let fetcher = ObjectFetcher::new(&client);

        let err = fetcher
            .fetch_note("https://a.example/notes/1")
            .expect_err("should fail to decode");

        assert!(matches!(
            err.current_context(),
            LitePubError::Decode { snippet, .. } if snippet == "<html>"
        ));
    }

    #[test]
    fn test_short_type_name_strips_paths() {
        assert_eq!(short_type_name::<Note>(), "Note");
        assert_eq!(
            short_type_name::<crate::models::OrderedCollectionPage<String>>(),
            "OrderedCollectionPage<String>"
        );
        assert_eq!(
            short_type_name::<(u32, Vec<Actor>)>(),
            "(u32, Vec<Actor>)"
        );
    }

    #[test]
    fn test_snippet_respects_char_boundaries() {
        let body = "é".repeat(150);
        let s = snippet(body.as_bytes());
        assert_eq!(s.chars().count(), 103);
    }

    #[test]
    fn test_transport_failure_propagates() {
        let client = MockHttpClient::new().with_failure("https://a.example/notes/1");
        let fetcher = ObjectFetcher::new(&client);

        let err = fetcher
            .fetch_note("https://a.example/notes/1")
            .expect_err("should fail");
        assert!(matches!(err.current_context(), LitePubError::Http { .. }));
        assert_eq!(client.requested_urls().len(), 1);
    }

    #[test]
    fn test_non_success_status_is_http_error() {
        let client =
            MockHttpClient::new().with_body("https://a.example/notes/1", 404, "not found");
        let fetcher = ObjectFetcher::new(&client);

        let err = fetcher
            .fetch_note("https://a.example/notes/1")
            .expect_err("should fail");
        assert!(matches!(err.current_context(), LitePubError::Http { .. }));
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        let client = MockHttpClient::new();
        let fetcher = ObjectFetcher::new(&client);

        assert!(fetcher.fetch_note("not a url").is_err());
        assert!(client.requested_urls().is_empty());
    }

    #[test]
    fn test_fetch_actor_from_identifier() {
        let client = MockHttpClient::new()
            .with_json(
                "https://a.example/.well-known/webfinger?resource=acct:alice@a.example",
                json!({
                    "subject": "acct:alice@a.example",
                    "links": [
                        {"rel": "http://webfinger.net/rel/profile-page", "type": "text/html", "href": "https://a.example/@alice"},
                        {"rel": "self", "type": "application/activity+json", "href": "https://a.example/users/alice"}
                    ]
                }),
            )
            .with_json("https://a.example/users/alice", actor_json(test_keypair()));
        let fetcher = ObjectFetcher::new(&client);

        let actor = fetcher
            .fetch_actor_any("alice@a.example")
            .expect("should resolve and fetch");

        assert_eq!(actor.base.id, "https://a.example/users/alice");
        assert_eq!(client.requested_urls().len(), 2);
    }

    #[test]
    fn test_fetch_actor_from_bad_identifier() {
        let client = MockHttpClient::new();
        let fetcher = ObjectFetcher::new(&client);

        let err = fetcher
            .fetch_actor_from_identifier("https://a.example/users/alice")
            .expect_err("should reject");
        assert!(matches!(
            err.current_context(),
            LitePubError::IdentityResolution { .. }
        ));
        assert!(client.requested_urls().is_empty());
    }
}
