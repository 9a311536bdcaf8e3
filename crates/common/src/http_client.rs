//! Transport abstraction for outbound HTTP.
//!
//! Everything that talks to the network goes through [`HttpClient`], so the
//! fetch, pagination and signing code can be exercised against an in-memory
//! client in tests. [`UreqClient`] is the production implementation.

use std::time::Duration;

use error_stack::{Report, ResultExt};
use http::{Request, Response};

use crate::error::LitePubError;
use crate::settings::HttpSettings;

/// Blocking HTTP transport.
pub trait HttpClient {
    /// Send a request and return the full response.
    ///
    /// Non-success statuses are returned as responses, not errors; only
    /// transport-level failures (DNS, TLS, timeout, ...) produce an `Err`.
    ///
    /// # Errors
    ///
    /// Returns [`LitePubError::Http`] if the request could not be completed.
    fn send(&self, request: Request<Vec<u8>>) -> Result<Response<Vec<u8>>, Report<LitePubError>>;
}

impl<C: HttpClient + ?Sized> HttpClient for &C {
    fn send(&self, request: Request<Vec<u8>>) -> Result<Response<Vec<u8>>, Report<LitePubError>> {
        (**self).send(request)
    }
}

/// [`HttpClient`] backed by a pooled `ureq` agent.
#[derive(Debug, Clone)]
pub struct UreqClient {
    agent: ureq::Agent,
}

impl UreqClient {
    #[must_use]
    pub fn new(timeout: Duration, user_agent: &str) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .user_agent(user_agent)
            .build();

        Self {
            agent: config.into(),
        }
    }

    #[must_use]
    pub fn from_settings(settings: &HttpSettings) -> Self {
        Self::new(
            Duration::from_secs(settings.timeout_secs),
            &settings.user_agent,
        )
    }
}

impl HttpClient for UreqClient {
    fn send(&self, request: Request<Vec<u8>>) -> Result<Response<Vec<u8>>, Report<LitePubError>> {
        let method = request.method().clone();
        let uri = request.uri().clone();

        let response = self.agent.run(request).map_err(|e| {
            Report::new(LitePubError::Http {
                message: format!("{} {} failed: {}", method, uri, e),
            })
        })?;

        let (parts, mut body) = response.into_parts();
        let bytes = body
            .read_to_vec()
            .change_context(LitePubError::Http {
                message: format!("Failed to read response body from {}", uri),
            })?;

        Ok(Response::from_parts(parts, bytes))
    }
}

/// Returns the `Host` header value for a URI: the host, plus the port when
/// one is given explicitly.
#[must_use]
pub fn host_header(uri: &http::Uri) -> String {
    let host = uri.host().unwrap_or_default();
    match uri.port_u16() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}
