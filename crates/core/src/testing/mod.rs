//! Testing utilities and a mock remote source.
//!
//! Lets the catalog service be exercised end to end without network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use libris_core::testing::{fixtures, MockFetcher};
//!
//! let fetcher = MockFetcher::new();
//! fetcher.add_record(fixtures::record("Dune", "Herbert, Frank", 1920, Some(1986))).await;
//!
//! let records = fetcher.fetch_books(Some("dune")).await?;
//! assert_eq!(records.len(), 1);
//! ```

mod mock_fetcher;
mod stale_catalog;

pub use mock_fetcher::MockFetcher;
pub use stale_catalog::StaleSearchCatalog;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::remote::{RemoteAuthor, RemoteBookRecord};

    /// Create a remote author.
    pub fn author(name: &str, birth_year: Option<i32>, death_year: Option<i32>) -> RemoteAuthor {
        RemoteAuthor {
            name: name.to_string(),
            birth_year,
            death_year,
        }
    }

    /// Create an English remote record with a single author.
    pub fn record(
        title: &str,
        author_name: &str,
        birth_year: i32,
        death_year: Option<i32>,
    ) -> RemoteBookRecord {
        RemoteBookRecord {
            title: title.to_string(),
            languages: vec!["en".to_string()],
            download_count: 100.0,
            authors: vec![author(author_name, Some(birth_year), death_year)],
        }
    }

    /// Create an authorless remote record with the given download count.
    pub fn with_downloads(title: &str, download_count: f64) -> RemoteBookRecord {
        RemoteBookRecord {
            title: title.to_string(),
            languages: vec!["en".to_string()],
            download_count,
            authors: Vec::new(),
        }
    }
}
