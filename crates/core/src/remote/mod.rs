//! Remote book-metadata source (Gutendex / Project Gutenberg).
//!
//! The remote side is only ever read: title searches that miss the local
//! catalog fall back to it, and the most-downloaded listing always reflects
//! it rather than local holdings.

mod gutendex;
mod types;

pub use gutendex::GutendexClient;
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when talking to the remote source.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed (connection refused, timeout, TLS...).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Status { status: u16, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// A URL could not be built or was rejected.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Trait for remote book sources.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch book records.
    ///
    /// `None` returns the base listing (remote order), `Some(keyword)` narrows
    /// it with the remote full-text search.
    async fn fetch_books(&self, query: Option<&str>)
        -> Result<Vec<RemoteBookRecord>, FetchError>;
}
