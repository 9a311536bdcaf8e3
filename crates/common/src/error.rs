//! Error types for the federation client.
//!
//! Every fallible operation returns `Result<T, Report<LitePubError>>`; callers
//! add context with [`error_stack::ResultExt`] as errors bubble up.

use derive_more::{Display, Error};

/// Errors raised while resolving, fetching, signing or verifying.
#[derive(Debug, Display, Error)]
pub enum LitePubError {
    /// Settings could not be loaded or failed validation.
    #[display("Configuration error: {message}")]
    Configuration { message: String },

    /// Malformed identifier, or webfinger returned no usable record.
    #[display("Identity resolution failed: {message}")]
    IdentityResolution { message: String },

    /// A response body did not match the expected shape.
    ///
    /// `snippet` carries at most the first 100 characters of the raw body.
    #[display("Failed to decode {type_name} (\"{snippet}\")")]
    Decode { type_name: String, snippet: String },

    /// The `Signature` header is missing or malformed.
    #[display("Malformed signature header: {message}")]
    SignatureParse { message: String },

    /// The signature does not match the reconstructed signing string.
    #[display("Signature verification failed: {message}")]
    SignatureVerification { message: String },

    /// Anything other than `rsa-sha256`.
    #[display("Unsupported signature algorithm: {algorithm}")]
    UnsupportedAlgorithm { algorithm: String },

    /// A value could not be serialized for sending.
    #[display("Failed to encode {type_name}: {message}")]
    Encode { type_name: String, message: String },

    /// PEM/DER encoding or key generation failure.
    #[display("Key error: {message}")]
    Key { message: String },

    /// Transport failure or non-success status.
    #[display("HTTP error: {message}")]
    Http { message: String },
}
