//! Common functionality for litepub.
//!
//! This crate holds the federation core used by the `lpcli` binary: typed
//! ActivityPub documents, fetching, pagination, discovery and HTTP Signatures.
//! All network access goes through the [`http_client::HttpClient`] trait.
//!
//! # Modules
//!
//! - [`collection`]: Bounded walks over paginated ordered collections
//! - [`constants`]: Media types, header names and limits
//! - [`delivery`]: Signed POSTs to remote inboxes
//! - [`error`]: Error types and error handling utilities
//! - [`fetch`]: Typed retrieval of remote objects
//! - [`http_client`]: Transport abstraction and the `ureq` implementation
//! - [`logging`]: `fern` logger setup
//! - [`models`]: ActivityPub and webfinger documents
//! - [`request_signing`]: RSA keys and HTTP Signatures
//! - [`settings`]: Configuration management and validation
//! - [`test_support`]: Testing utilities and mocks
//! - [`webfinger`]: `name@domain` discovery

pub mod collection;
pub mod constants;
pub mod delivery;
pub mod error;
pub mod fetch;
pub mod http_client;
pub mod logging;
pub mod models;
pub mod request_signing;
pub mod settings;
pub mod webfinger;
