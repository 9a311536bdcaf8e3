//! Wire-level constants shared across the crate.

/// Media type for ActivityPub objects, used for both `Accept` and `Content-Type`.
pub const ACTIVITY_JSON: &str = "application/activity+json";

/// Media type requested from webfinger endpoints.
pub const JRD_JSON: &str = "application/jrd+json";

/// The only signature algorithm accepted or produced.
pub const SIGNATURE_ALGORITHM: &str = "rsa-sha256";

/// Headers covered by outbound signatures, in signing order.
pub const SIGNED_HEADERS: &str = "(request-target) host date";

/// Pseudo-header naming the method and path in the signing string.
pub const REQUEST_TARGET: &str = "(request-target)";

/// Prefix of the `Digest` header value.
pub const DIGEST_PREFIX: &str = "SHA2-256=";

/// RFC 1123 GMT format expected in the `Date` header.
pub const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

pub const HEADER_SIGNATURE: &str = "signature";
pub const HEADER_DIGEST: &str = "digest";

/// Hard ceiling on identifiers gathered from a following/followers collection.
pub const FOLLOWING_ITEM_CAP: usize = 400;

/// Hard ceiling on notes gathered from an outbox.
pub const NOTES_ITEM_CAP: usize = 100;

/// Maximum number of body characters echoed back in decode errors.
pub const DECODE_SNIPPET_LEN: usize = 100;

/// RSA modulus size for generated keys.
pub const RSA_KEY_BITS: usize = 2048;

/// JSON-LD context emitted on every serialized object.
pub const LITEPUB_CONTEXT: [&str; 3] = [
    "https://www.w3.org/ns/activitystreams",
    "https://w3id.org/security/v1",
    "https://pleroma.site/schemas/litepub-0.1.jsonld",
];
