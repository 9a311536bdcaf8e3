//! HTTP Signatures (draft-cavage) signing and verification.
//!
//! Outbound requests are signed over `(request-target) host date` with
//! `rsa-sha256`. Inbound requests are verified by rebuilding the signing
//! string from the header list the sender declared, then checking it against
//! the public key published by the actor named in `keyId`.

use base64::{engine::general_purpose, Engine};
use chrono::{DateTime, Utc};
use error_stack::{Report, ResultExt};
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE, DATE, HOST};
use http::Request;
use rsa::{Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};

use crate::constants::{
    ACTIVITY_JSON, DIGEST_PREFIX, HEADER_DIGEST, HEADER_SIGNATURE, HTTP_DATE_FORMAT,
    REQUEST_TARGET, SIGNATURE_ALGORITHM, SIGNED_HEADERS,
};
use crate::error::LitePubError;
use crate::fetch::ObjectFetcher;
use crate::http_client::{host_header, HttpClient};

use super::keys::{decode_public_key_pem, KeyPair};

/// Format a timestamp for the `Date` header (RFC 1123, always GMT).
#[must_use]
pub fn http_date(now: DateTime<Utc>) -> String {
    now.format(HTTP_DATE_FORMAT).to_string()
}

/// Build the canonical string covered by outbound signatures.
#[must_use]
pub fn signing_string(method: &str, path: &str, host: &str, date: &str) -> String {
    format!(
        "{}: {} {}\nhost: {}\ndate: {}",
        REQUEST_TARGET,
        method.to_lowercase(),
        path,
        host,
        date
    )
}

/// Value of the `Digest` header for a request body.
#[must_use]
pub fn body_digest(body: &[u8]) -> String {
    format!("{}{}", DIGEST_PREFIX, hex::encode(Sha256::digest(body)))
}

/// The parsed contents of a `Signature` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedEnvelope {
    pub key_id: String,
    /// Lowercased header names, in signing order.
    pub headers: Vec<String>,
    pub signature: Vec<u8>,
    /// Empty when the sender omitted the `algorithm` parameter.
    pub algorithm: String,
}

impl SignedEnvelope {
    /// Render as a `Signature` header value.
    #[must_use]
    pub fn to_header_value(&self) -> String {
        format!(
            r#"keyId="{}",headers="{}",signature="{}",algorithm="{}""#,
            self.key_id,
            self.headers.join(" "),
            general_purpose::STANDARD.encode(&self.signature),
            self.algorithm
        )
    }

    /// Parse a `Signature` header value.
    ///
    /// Parameters may appear in any order; all of them are collected before
    /// anything is interpreted. Unknown parameters (`created`, `expires`) are
    /// ignored. A missing `headers` parameter defaults to `date`.
    ///
    /// # Errors
    ///
    /// Returns [`LitePubError::SignatureParse`] if the header is malformed,
    /// `keyId` or `signature` is missing, or the signature is not base64.
    pub fn parse(header: &str) -> Result<Self, Report<LitePubError>> {
        let mut key_id = None;
        let mut headers = None;
        let mut signature = None;
        let mut algorithm = None;

        for (name, value) in parse_parameters(header)? {
            match name.as_str() {
                "keyId" => key_id = Some(value),
                "headers" => headers = Some(value),
                "signature" => signature = Some(value),
                "algorithm" => algorithm = Some(value),
                _ => log::debug!("ignoring signature parameter '{}'", name),
            }
        }

        let key_id = key_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| parse_error("missing keyId"))?;
        let encoded = signature.ok_or_else(|| parse_error("missing signature"))?;
        let signature = general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| parse_error(format!("signature '{}' is invalid base64: {}", encoded, e)))?;
        let headers = headers
            .as_deref()
            .unwrap_or("date")
            .split_whitespace()
            .map(str::to_lowercase)
            .collect();

        Ok(Self {
            key_id,
            headers,
            signature,
            algorithm: algorithm.unwrap_or_default(),
        })
    }

    /// Reject anything but `rsa-sha256`. An absent algorithm is accepted.
    ///
    /// # Errors
    ///
    /// Returns [`LitePubError::UnsupportedAlgorithm`].
    pub fn check_algorithm(&self) -> Result<(), Report<LitePubError>> {
        if self.algorithm.is_empty() || self.algorithm == SIGNATURE_ALGORITHM {
            Ok(())
        } else {
            Err(Report::new(LitePubError::UnsupportedAlgorithm {
                algorithm: self.algorithm.clone(),
            }))
        }
    }
}

fn parse_error(message: impl Into<String>) -> Report<LitePubError> {
    Report::new(LitePubError::SignatureParse {
        message: message.into(),
    })
}

/// Split `k1="v1",k2="v2"` into pairs. Commas inside quoted values are kept.
fn parse_parameters(header: &str) -> Result<Vec<(String, String)>, Report<LitePubError>> {
    let mut params = Vec::new();
    let mut rest = header.trim();

    while !rest.is_empty() {
        let (name, after_name) = rest
            .split_once('=')
            .ok_or_else(|| parse_error(format!("expected key=value in '{}'", rest)))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(parse_error("empty parameter name"));
        }

        let after_name = after_name.trim_start();
        let (value, remainder) = match after_name.strip_prefix('"') {
            Some(quoted) => {
                let end = quoted
                    .find('"')
                    .ok_or_else(|| parse_error(format!("unterminated value for '{}'", name)))?;
                (&quoted[..end], &quoted[end + 1..])
            }
            None => match after_name.find(',') {
                Some(end) => (after_name[..end].trim_end(), &after_name[end..]),
                None => (after_name.trim_end(), ""),
            },
        };
        params.push((name.to_string(), value.to_string()));

        let remainder = remainder.trim_start();
        rest = match remainder.strip_prefix(',') {
            Some(next) => next.trim_start(),
            None if remainder.is_empty() => remainder,
            None => {
                return Err(parse_error(format!(
                    "unexpected '{}' after '{}'",
                    remainder, name
                )))
            }
        };
    }

    Ok(params)
}

/// Signs outbound requests as a local actor.
#[derive(Debug, Clone)]
pub struct RequestSigner {
    private_key: RsaPrivateKey,
    pub key_id: String,
}

impl RequestSigner {
    pub fn new(private_key: RsaPrivateKey, key_id: impl Into<String>) -> Self {
        Self {
            private_key,
            key_id: key_id.into(),
        }
    }

    pub fn from_keypair(keypair: &KeyPair, key_id: impl Into<String>) -> Self {
        Self::new(keypair.private_key.clone(), key_id)
    }

    /// Sign `(request-target) host date` for the given request line.
    ///
    /// `date` must already be an RFC 1123 GMT string (see [`http_date`]) and
    /// must be sent verbatim in the `Date` header.
    ///
    /// # Errors
    ///
    /// Returns [`LitePubError::Key`] if the RSA operation fails.
    pub fn sign(
        &self,
        method: &str,
        path: &str,
        host: &str,
        date: &str,
    ) -> Result<SignedEnvelope, Report<LitePubError>> {
        let payload = signing_string(method, path, host, date);
        let hashed = Sha256::digest(payload.as_bytes());

        let signature = self
            .private_key
            .sign(Pkcs1v15Sign::new::<Sha256>(), &hashed)
            .change_context(LitePubError::Key {
                message: "Failed to sign request".into(),
            })?;

        Ok(SignedEnvelope {
            key_id: self.key_id.clone(),
            headers: SIGNED_HEADERS.split(' ').map(str::to_string).collect(),
            signature,
            algorithm: SIGNATURE_ALGORITHM.to_string(),
        })
    }

    /// Sign an outbound request in place.
    ///
    /// Sets `Content-Type`, `Digest`, `Signature`, `Date` and `Host`.
    ///
    /// # Errors
    ///
    /// Returns [`LitePubError::SignatureParse`] if the URI has no host or a
    /// header value cannot be encoded, or [`LitePubError::Key`] on RSA failure.
    pub fn sign_request(
        &self,
        request: &mut Request<Vec<u8>>,
        date: &str,
    ) -> Result<(), Report<LitePubError>> {
        if request.uri().host().is_none() {
            return Err(parse_error(format!(
                "cannot sign request without host: {}",
                request.uri()
            )));
        }

        let host = host_header(request.uri());
        let digest = body_digest(request.body());
        let envelope = self.sign(
            request.method().as_str(),
            request.uri().path(),
            &host,
            date,
        )?;

        let headers = request.headers_mut();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(ACTIVITY_JSON));
        headers.insert(HeaderName::from_static(HEADER_DIGEST), header_value(&digest)?);
        headers.insert(
            HeaderName::from_static(HEADER_SIGNATURE),
            header_value(&envelope.to_header_value())?,
        );
        headers.insert(DATE, header_value(date)?);
        headers.insert(HOST, header_value(&host)?);

        Ok(())
    }
}

fn header_value(value: &str) -> Result<HeaderValue, Report<LitePubError>> {
    HeaderValue::from_str(value).change_context(LitePubError::SignatureParse {
        message: format!("invalid header value '{}'", value),
    })
}

/// Rebuild the string the sender must have signed, from the header names
/// it declared and the values present on `request`.
///
/// Absent headers render as `name: ` so that a mismatch fails verification
/// rather than being skipped.
#[must_use]
pub fn reconstruct_signing_string<B>(request: &Request<B>, headers: &[String]) -> String {
    headers
        .iter()
        .map(|name| {
            if name == REQUEST_TARGET {
                format!(
                    "{}: {} {}",
                    REQUEST_TARGET,
                    request.method().as_str().to_lowercase(),
                    request.uri().path()
                )
            } else {
                let value = request
                    .headers()
                    .get(name.as_str())
                    .and_then(|v| v.to_str().ok())
                    .map(str::trim)
                    .unwrap_or_default();
                format!("{}: {}", name, value)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn signature_envelope<B>(request: &Request<B>) -> Result<SignedEnvelope, Report<LitePubError>> {
    let header = request
        .headers()
        .get(HEADER_SIGNATURE)
        .ok_or_else(|| parse_error("missing Signature header"))?
        .to_str()
        .change_context(LitePubError::SignatureParse {
            message: "Signature header is not ASCII".into(),
        })?;

    let envelope = SignedEnvelope::parse(header)?;
    envelope.check_algorithm()?;
    Ok(envelope)
}

fn verify_envelope<B>(
    public_key: &RsaPublicKey,
    request: &Request<B>,
    envelope: &SignedEnvelope,
) -> Result<(), Report<LitePubError>> {
    let payload = reconstruct_signing_string(request, &envelope.headers);
    let hashed = Sha256::digest(payload.as_bytes());

    public_key
        .verify(Pkcs1v15Sign::new::<Sha256>(), &hashed, &envelope.signature)
        .change_context(LitePubError::SignatureVerification {
            message: format!("signature from '{}' does not match", envelope.key_id),
        })
}

/// Verify an inbound request against a known public key.
///
/// # Errors
///
/// Returns [`LitePubError::SignatureParse`], [`LitePubError::UnsupportedAlgorithm`]
/// or [`LitePubError::SignatureVerification`].
pub fn verify_with_key<B>(
    public_key: &RsaPublicKey,
    request: &Request<B>,
) -> Result<(), Report<LitePubError>> {
    let envelope = signature_envelope(request)?;
    verify_envelope(public_key, request, &envelope)
}

/// Verify an inbound request, fetching the signer's key from `keyId`.
///
/// The actor document is fetched on every call; nothing is cached, so a
/// rotated key takes effect immediately. Returns the verified key id.
///
/// # Errors
///
/// Returns [`LitePubError::SignatureParse`] or
/// [`LitePubError::UnsupportedAlgorithm`] before any network I/O, a fetch
/// error if the actor cannot be retrieved, [`LitePubError::Key`] if its PEM
/// is malformed, and [`LitePubError::SignatureVerification`] on mismatch.
pub fn verify_request<C: HttpClient, B>(
    fetcher: &ObjectFetcher<C>,
    request: &Request<B>,
) -> Result<String, Report<LitePubError>> {
    let envelope = signature_envelope(request)?;

    let actor = fetcher
        .fetch_actor(&envelope.key_id)
        .attach(format!("while fetching signer '{}'", envelope.key_id))?;
    if actor.public_key.id != envelope.key_id {
        log::warn!(
            "keyId '{}' resolved to actor advertising key '{}'",
            envelope.key_id,
            actor.public_key.id
        );
    }

    let public_key = decode_public_key_pem(&actor.public_key.public_key_pem)
        .attach(format!("publicKeyPem of '{}'", actor.base.id))?;

    verify_envelope(&public_key, request, &envelope)?;
    log::debug!("verified signature from '{}'", envelope.key_id);

    Ok(envelope.key_id)
}

#[cfg(test)]
mod tests {
    use http::Method;

    use super::*;
    use crate::test_support::tests::{
        actor_json, signed_test_request, test_keypair, test_other_keypair, MockHttpClient,
        TEST_DATE, TEST_KEY_ID,
    };

    #[test]
    fn test_signing_string_layout() {
        let s = signing_string(
            "POST",
            "/users/bob/inbox",
            "b.example",
            "Sun, 06 Nov 1994 08:49:37 GMT",
        );
        assert_eq!(
            s,
            "(request-target): post /users/bob/inbox\nhost: b.example\ndate: Sun, 06 Nov 1994 08:49:37 GMT"
        );
    }

    #[test]
    fn test_http_date_format() {
        let now = DateTime::parse_from_rfc3339("1994-11-06T08:49:37Z")
            .expect("should parse")
            .with_timezone(&Utc);
        assert_eq!(http_date(now), "Sun, 06 Nov 1994 08:49:37 GMT");
    }

    #[test]
    fn test_body_digest_is_hex_sha256() {
        assert_eq!(
            body_digest(b""),
            "SHA2-256=e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_sign_produces_expected_header() {
        let signer = RequestSigner::from_keypair(test_keypair(), TEST_KEY_ID);
        let envelope = signer
            .sign("POST", "/inbox", "b.example", TEST_DATE)
            .expect("should sign");

        let header = envelope.to_header_value();
        assert!(header.starts_with(&format!(r#"keyId="{}",headers="(request-target) host date",signature=""#, TEST_KEY_ID)));
        assert!(header.ends_with(r#"",algorithm="rsa-sha256""#));
        assert_eq!(envelope.signature.len(), 256);
    }

    #[test]
    fn test_sign_request_sets_headers() {
        let request = signed_test_request(test_keypair(), b"{\"type\":\"Follow\"}");
        let headers = request.headers();

        assert_eq!(headers[CONTENT_TYPE], ACTIVITY_JSON);
        assert_eq!(headers[HOST], "b.example");
        assert_eq!(headers[DATE], TEST_DATE);
        assert_eq!(
            headers[HEADER_DIGEST].to_str().expect("ascii"),
            body_digest(b"{\"type\":\"Follow\"}")
        );
        assert!(headers.contains_key(HEADER_SIGNATURE));
    }

    #[test]
    fn test_sign_request_requires_host() {
        let signer = RequestSigner::from_keypair(test_keypair(), TEST_KEY_ID);
        let mut request = Request::builder()
            .method(Method::POST)
            .uri("/inbox")
            .body(Vec::new())
            .expect("should build request");

        assert!(signer.sign_request(&mut request, TEST_DATE).is_err());
    }

    #[test]
    fn test_verify_round_trip_with_matching_key() {
        let request = signed_test_request(test_keypair(), b"{}");
        verify_with_key(&test_keypair().public_key, &request).expect("should verify");
    }

    #[test]
    fn test_verify_fails_with_other_key() {
        let request = signed_test_request(test_keypair(), b"{}");
        let err = verify_with_key(&test_other_keypair().public_key, &request)
            .expect_err("should reject");
        assert!(matches!(
            err.current_context(),
            LitePubError::SignatureVerification { .. }
        ));
    }

    #[test]
    fn test_verify_detects_tampered_headers() {
        let tampered_values = [
            (HOST, "c.example"),
            (DATE, "Sun, 06 Nov 1994 08:49:38 GMT"),
        ];

        for (name, value) in tampered_values {
            let mut request = signed_test_request(test_keypair(), b"{}");
            request
                .headers_mut()
                .insert(name.clone(), HeaderValue::from_static(value));

            let result = verify_with_key(&test_keypair().public_key, &request);
            assert!(result.is_err(), "tampering with {} should fail", name);
        }
    }

    #[test]
    fn test_verify_detects_tampered_request_target() {
        let request = signed_test_request(test_keypair(), b"{}");
        let (mut parts, body) = request.into_parts();
        parts.uri = "https://b.example/users/bob/inbox2"
            .parse()
            .expect("should parse uri");
        let request = Request::from_parts(parts, body);

        assert!(verify_with_key(&test_keypair().public_key, &request).is_err());

        let request = signed_test_request(test_keypair(), b"{}");
        let (mut parts, body) = request.into_parts();
        parts.method = Method::PUT;
        let request = Request::from_parts(parts, body);

        assert!(verify_with_key(&test_keypair().public_key, &request).is_err());
    }

    #[test]
    fn test_verify_trims_header_whitespace() {
        let mut request = signed_test_request(test_keypair(), b"{}");
        request.headers_mut().insert(
            HOST,
            HeaderValue::from_static("  b.example  "),
        );
        verify_with_key(&test_keypair().public_key, &request).expect("should verify");
    }

    #[test]
    fn test_verify_absent_header_renders_empty() {
        let mut request = signed_test_request(test_keypair(), b"{}");
        request.headers_mut().remove(DATE);

        let envelope = signature_envelope(&request).expect("should parse envelope");
        let payload = reconstruct_signing_string(&request, &envelope.headers);
        assert!(payload.ends_with("\ndate: "));
        assert!(verify_with_key(&test_keypair().public_key, &request).is_err());
    }

    #[test]
    fn test_parse_is_order_independent() {
        let signature = general_purpose::STANDARD.encode([1u8, 2, 3, 4, 5]);
        let header = format!(
            r#"signature="{}", algorithm="rsa-sha256",headers="(request-target) Host date",keyId="https://a.example/users/alice#main-key""#,
            signature
        );

        let envelope = SignedEnvelope::parse(&header).expect("should parse");
        assert_eq!(envelope.key_id, "https://a.example/users/alice#main-key");
        assert_eq!(envelope.headers, vec!["(request-target)", "host", "date"]);
        assert_eq!(envelope.signature, vec![1, 2, 3, 4, 5]);
        assert_eq!(envelope.algorithm, "rsa-sha256");
    }

    #[test]
    fn test_parse_keeps_base64_padding_and_commas() {
        // One byte encodes to "AQ==", whose padding must survive the split on '='.
        let header = r#"keyId="https://a.example/actor?tags=a,b",signature="AQ==""#;
        let envelope = SignedEnvelope::parse(header).expect("should parse");

        assert_eq!(envelope.key_id, "https://a.example/actor?tags=a,b");
        assert_eq!(envelope.signature, vec![1]);
        assert_eq!(envelope.headers, vec!["date"]);
        assert!(envelope.algorithm.is_empty());
    }

    #[test]
    fn test_envelope_header_round_trip() {
        let envelope = SignedEnvelope {
            key_id: TEST_KEY_ID.into(),
            headers: vec!["(request-target)".into(), "host".into(), "date".into()],
            signature: vec![9; 32],
            algorithm: SIGNATURE_ALGORITHM.into(),
        };
        let parsed = SignedEnvelope::parse(&envelope.to_header_value()).expect("should parse");
        assert_eq!(parsed, envelope);
    }

    #[test]
    fn test_parse_rejects_malformed_headers() {
        let cases = [
            "",
            r#"signature="AQ==""#,
            r#"keyId="https://a.example/actor""#,
            r#"keyId="https://a.example/actor",signature="not base64!""#,
            r#"keyId="https://a.example/actor,signature="AQ==""#,
            r#"keyId"#,
        ];

        for header in cases {
            let err = SignedEnvelope::parse(header).expect_err(header);
            assert!(
                matches!(err.current_context(), LitePubError::SignatureParse { .. }),
                "unexpected error for {:?}: {:?}",
                header,
                err
            );
        }
    }

    #[test]
    fn test_verify_rejects_unsupported_algorithm() {
        let mut request = signed_test_request(test_keypair(), b"{}");
        let header = request.headers()[HEADER_SIGNATURE]
            .to_str()
            .expect("ascii")
            .replace("rsa-sha256", "ed25519");
        request.headers_mut().insert(
            HEADER_SIGNATURE,
            HeaderValue::from_str(&header).expect("valid header"),
        );

        let err = verify_with_key(&test_keypair().public_key, &request).expect_err("should reject");
        assert!(matches!(
            err.current_context(),
            LitePubError::UnsupportedAlgorithm { algorithm } if algorithm == "ed25519"
        ));
    }

    #[test]
    fn test_verify_missing_signature_header() {
        let request = Request::builder()
            .uri("https://b.example/inbox")
            .body(())
            .expect("should build request");
        let err = verify_with_key(&test_keypair().public_key, &request).expect_err("should reject");
        assert!(matches!(
            err.current_context(),
            LitePubError::SignatureParse { .. }
        ));
    }

    #[test]
    fn test_verify_request_fetches_signer_key() {
        let client = MockHttpClient::new().with_json(
            "https://a.example/users/alice",
            actor_json(test_keypair()),
        );
        let fetcher = ObjectFetcher::new(&client);
        let request = signed_test_request(test_keypair(), b"{}");

        let key_id = verify_request(&fetcher, &request).expect("should verify");

        assert_eq!(key_id, TEST_KEY_ID);
        // Fragment is stripped before fetching.
        assert_eq!(client.requested_urls(), vec!["https://a.example/users/alice"]);
    }

    #[test]
    fn test_verify_request_refetches_every_time() {
        let client = MockHttpClient::new().with_json(
            "https://a.example/users/alice",
            actor_json(test_keypair()),
        );
        let fetcher = ObjectFetcher::new(&client);
        let request = signed_test_request(test_keypair(), b"{}");

        verify_request(&fetcher, &request).expect("should verify");
        verify_request(&fetcher, &request).expect("should verify");

        assert_eq!(client.requested_urls().len(), 2);
    }

    #[test]
    fn test_verify_request_with_rotated_key_fails() {
        let client = MockHttpClient::new().with_json(
            "https://a.example/users/alice",
            actor_json(test_other_keypair()),
        );
        let fetcher = ObjectFetcher::new(&client);
        let request = signed_test_request(test_keypair(), b"{}");

        let err = verify_request(&fetcher, &request).expect_err("should reject");
        assert!(matches!(
            err.current_context(),
            LitePubError::SignatureVerification { .. }
        ));
    }

    #[test]
    fn test_verify_request_bad_pem_is_hard_error() {
        let mut actor = actor_json(test_keypair());
        actor["publicKey"]["publicKeyPem"] = "garbage".into();
        let client = MockHttpClient::new().with_json("https://a.example/users/alice", actor);
        let fetcher = ObjectFetcher::new(&client);
        let request = signed_test_request(test_keypair(), b"{}");

        let err = verify_request(&fetcher, &request).expect_err("should reject");
        assert!(matches!(err.current_context(), LitePubError::Key { .. }));
        assert_eq!(client.requested_urls().len(), 1);
    }

    #[test]
    fn test_verify_request_unsupported_algorithm_skips_fetch() {
        let client = MockHttpClient::new();
        let fetcher = ObjectFetcher::new(&client);
        let mut request = signed_test_request(test_keypair(), b"{}");
        let header = request.headers()[HEADER_SIGNATURE]
            .to_str()
            .expect("ascii")
            .replace("rsa-sha256", "hs2019");
        request.headers_mut().insert(
            HEADER_SIGNATURE,
            HeaderValue::from_str(&header).expect("valid header"),
        );

        let err = verify_request(&fetcher, &request).expect_err("should reject");
        assert!(matches!(
            err.current_context(),
            LitePubError::UnsupportedAlgorithm { .. }
        ));
        assert!(client.requested_urls().is_empty());
    }
}
