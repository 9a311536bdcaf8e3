//! Webfinger discovery: `name@domain` to actor URL.

use error_stack::{Report, ResultExt};
use http::header::ACCEPT;
use http::{Method, Request};

use crate::constants::{ACTIVITY_JSON, JRD_JSON};
use crate::error::LitePubError;
use crate::fetch::{decode_body, ensure_success, strip_fragment};
use crate::http_client::HttpClient;
use crate::models::WebfingerResponse;

/// Split an identifier into `(name, domain)`.
///
/// Accepts an optional leading `acct:` or `@`.
fn split_identifier(identifier: &str) -> Option<(&str, &str)> {
    let trimmed = identifier.trim();
    let trimmed = trimmed.strip_prefix("acct:").unwrap_or(trimmed);
    let trimmed = trimmed.strip_prefix('@').unwrap_or(trimmed);

    let (name, domain) = trimmed.split_once('@')?;
    let valid = |part: &str| !part.is_empty() && !part.contains(['@', '/', ' ']);
    if valid(name) && valid(domain) {
        Some((name, domain))
    } else {
        None
    }
}

/// Whether `target` looks like `name@domain` rather than a URL.
#[must_use]
pub fn is_identifier(target: &str) -> bool {
    !target.contains("://") && split_identifier(target).is_some()
}

/// Resolve `name@domain` to the actor URL advertised by the domain's
/// webfinger endpoint.
///
/// # Errors
///
/// Returns [`LitePubError::IdentityResolution`] for a malformed identifier
/// or when no link has type `application/activity+json`,
/// [`LitePubError::Decode`] for an invalid discovery document, and
/// [`LitePubError::Http`] on transport failure.
pub fn resolve_identifier<C: HttpClient>(
    client: &C,
    identifier: &str,
) -> Result<String, Report<LitePubError>> {
    let (name, domain) = match split_identifier(identifier) {
        Some(parts) if !identifier.contains("://") => parts,
        _ => {
            return Err(Report::new(LitePubError::IdentityResolution {
                message: format!("'{}' is not an identifier like name@domain.com", identifier),
            }))
        }
    };

    let url = strip_fragment(&format!(
        "https://{}/.well-known/webfinger?resource=acct:{}@{}",
        domain, name, domain
    ))
    .change_context(LitePubError::IdentityResolution {
        message: format!("invalid domain in '{}'", identifier),
    })?;
    log::debug!("webfinger lookup {}", url);

    let request = Request::builder()
        .method(Method::GET)
        .uri(url.as_str())
        .header(ACCEPT, JRD_JSON)
        .body(Vec::new())
        .change_context(LitePubError::IdentityResolution {
            message: format!("invalid webfinger URL {}", url),
        })?;

    let response = client.send(request)?;
    let body = ensure_success(&url, response)?;
    let discovery: WebfingerResponse = decode_body(&body)?;

    discovery
        .links
        .into_iter()
        .find(|link| link.kind == ACTIVITY_JSON)
        .map(|link| link.href)
        .ok_or_else(|| {
            Report::new(LitePubError::IdentityResolution {
                message: format!(
                    "couldn't find any activitypub matching records for '{}'",
                    identifier
                ),
            })
        })
}

/// Extract the account name from a webfinger `resource` query parameter.
///
/// `acct:alice@social.example` yields `alice`. Used when answering webfinger
/// queries for local actors.
///
/// # Errors
///
/// Returns [`LitePubError::IdentityResolution`] if the resource is not an
/// `acct:` URI with a non-empty name and exactly one `@`.
pub fn parse_webfinger_resource(resource: &str) -> Result<&str, Report<LitePubError>> {
    let account = resource.strip_prefix("acct:").ok_or_else(|| {
        Report::new(LitePubError::IdentityResolution {
            message: format!("resource querystring param is wrong: {}", resource),
        })
    })?;

    match account.split('@').collect::<Vec<_>>().as_slice() {
        [name, _domain] if !name.is_empty() => Ok(*name),
        _ => Err(Report::new(LitePubError::IdentityResolution {
            message: format!("account not formatted correctly: {}", account),
        })),
    }
}
