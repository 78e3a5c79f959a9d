//! Backend REST API client with offline-resilient caching.
//!
//! # Architecture
//!
//! - Every request goes through [`ApiClient`]; the backend is an opaque
//!   collaborator speaking JSON over HTTPS
//! - Successful GET responses are written through to [`cache::ResponseCache`]
//!   (in-memory `moka` front, persistent storage behind it, no TTL)
//! - A transient failure on a GET is answered from the cache when a prior
//!   entry exists, unless the caller asked for an explicit refresh
//! - An unauthorized response is never served from cache; it tears down the
//!   session instead
//!
//! # Example
//!
//! ```rust,ignore
//! use orchard_client::api::ApiClient;
//!
//! let products = client.get("products", &[("limit", "6")]).await?;
//!
//! // Pull-to-refresh must see real failures, not stale data:
//! let fresh = client.get_fresh("products", &[("limit", "6")]).await?;
//! ```

pub mod cache;
mod client;

pub use cache::{ResponseCache, cache_key};
pub use client::ApiClient;

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur when talking to the backend API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure: connection refused, DNS, timeout.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("server returned {status}: {message}")]
    Status {
        /// HTTP status code.
        status: StatusCode,
        /// Response body, truncated.
        message: String,
    },

    /// The server rejected the credential. Never recovered from cache.
    #[error("unauthorized")]
    Unauthorized,

    /// Response body was not valid JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Request path did not form a valid URL against the base.
    #[error("invalid request URL: {0}")]
    Url(#[from] url::ParseError),
}

impl ApiError {
    /// Whether a cached response may stand in for this failure.
    ///
    /// Transport failures (including timeouts) and non-success statuses
    /// qualify; unauthorized responses never do, and a malformed body or
    /// URL is a caller bug, not a network condition.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Status { .. })
    }
}
