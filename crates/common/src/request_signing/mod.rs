//! Request signing for server-to-server delivery.
//!
//! RSA key handling lives in [`keys`]; HTTP Signatures over
//! `(request-target) host date` live in [`signing`].

pub mod keys;
pub mod signing;

pub use keys::*;
pub use signing::*;
