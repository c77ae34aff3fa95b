//! # Escrow API client
//!
//! `escrow_client` is the HTTP layer the escrow front end uses to talk to the
//! escrow API. Call sites issue plain calls by path; the client takes care of
//! the security and session mechanics around them.
//!
//! ## Request protections
//!
//! - **Trace ids:** every attempt carries a fresh ULID in `x-request-id`.
//! - **CSRF:** mutations carry the anti-CSRF token in `x-xsrf-token`. The token
//!   is seeded lazily from `GET /auth/csrf` (one call shared by concurrent
//!   mutations) and replaced whenever a response rotates it via `x-csrf-token`.
//! - **Idempotency:** mutations against wallet, transaction, withdrawal and
//!   top-up resources carry an `x-idempotency-key`. The key is minted when the
//!   request is built and reused by its retry.
//!
//! ## Session refresh
//!
//! A 401 triggers one silent `POST /auth/refresh`. Concurrent 401s join the
//! same refresh, and each original request is retried once. When renewal
//! fails, the CSRF token and cached user are cleared and the navigator is sent
//! to the login surface, unless the user is already on an auth page or the
//! client runs on a public surface.
//!
//! The session cookie itself stays in the HTTP client's cookie jar and is
//! never read or logged by this crate.

pub mod cli;
pub mod client;

pub use client::{ApiClient, ApiError, ClientConfig};

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
