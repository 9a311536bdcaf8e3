//! Signed delivery of activities to remote inboxes.

use chrono::Utc;
use error_stack::{Report, ResultExt};
use http::{Method, Request, Response};
use serde::Serialize;

use crate::error::LitePubError;
use crate::fetch::{short_type_name, ObjectFetcher};
use crate::http_client::HttpClient;
use crate::request_signing::{http_date, RequestSigner};
use crate::webfinger::is_identifier;

/// POST `activity` to `target`, signed by `signer`.
///
/// `target` is either an inbox URL or a `name@domain` identifier, in which
/// case the actor is resolved and its `inbox` is used. The response is
/// returned as-is; the caller decides what a status means.
///
/// # Errors
///
/// Returns resolution and fetch errors for identifier targets,
/// [`LitePubError::Encode`] if `activity` does not serialize,
/// [`LitePubError::Http`] for an invalid inbox URL or transport failure, and
/// [`LitePubError::Key`] if signing fails.
pub fn send_signed<C: HttpClient, S: Serialize>(
    fetcher: &ObjectFetcher<C>,
    signer: &RequestSigner,
    target: &str,
    activity: &S,
) -> Result<Response<Vec<u8>>, Report<LitePubError>> {
    let inbox = if is_identifier(target) {
        let actor = fetcher.fetch_actor_from_identifier(target)?;
        log::debug!("'{}' delivers to {}", target, actor.inbox);
        actor.inbox
    } else {
        target.to_string()
    };

    let body = serde_json::to_vec(activity).map_err(|e| {
        Report::new(LitePubError::Encode {
            type_name: short_type_name::<S>(),
            message: e.to_string(),
        })
    })?;

    deliver(fetcher.client(), signer, &inbox, body, &http_date(Utc::now()))
}

fn deliver<C: HttpClient>(
    client: &C,
    signer: &RequestSigner,
    inbox: &str,
    body: Vec<u8>,
    date: &str,
) -> Result<Response<Vec<u8>>, Report<LitePubError>> {
    let mut request = Request::builder()
        .method(Method::POST)
        .uri(inbox)
        .body(body)
        .change_context(LitePubError::Http {
            message: format!("Invalid inbox URL: {}", inbox),
        })?;
    signer.sign_request(&mut request, date)?;

    log::info!("delivering to {} as {}", inbox, signer.key_id);
    let response = client.send(request)?;
    log::debug!("{} answered HTTP {}", inbox, response.status());

    Ok(response)
}
