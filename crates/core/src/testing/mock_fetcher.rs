//! Mock remote source for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::remote::{FetchError, Fetcher, RemoteBookRecord};

/// Mock implementation of the Fetcher trait.
///
/// Serves a configurable list of records, in insertion order. A keyword
/// query keeps records whose title or author names contain every keyword
/// word, case-insensitively, roughly like the real search endpoint.
#[derive(Debug)]
pub struct MockFetcher {
    records: Arc<RwLock<Vec<RemoteBookRecord>>>,
    /// Recorded queries, `None` for an unfiltered listing.
    queries: Arc<RwLock<Vec<Option<String>>>>,
    /// If set, the next fetch will fail with this error.
    next_error: Arc<RwLock<Option<FetchError>>>,
}

impl Default for MockFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl MockFetcher {
    /// Create a new mock with no records.
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(Vec::new())),
            queries: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Append a record.
    pub async fn add_record(&self, record: RemoteBookRecord) {
        self.records.write().await.push(record);
    }

    /// Replace all records.
    pub async fn set_records(&self, records: Vec<RemoteBookRecord>) {
        *self.records.write().await = records;
    }

    /// Make the next fetch fail.
    pub async fn fail_next(&self, error: FetchError) {
        *self.next_error.write().await = Some(error);
    }

    /// Get all recorded queries.
    pub async fn queries(&self) -> Vec<Option<String>> {
        self.queries.read().await.clone()
    }

    /// Get the number of successful fetches.
    pub async fn call_count(&self) -> usize {
        self.queries.read().await.len()
    }

    async fn take_error(&self) -> Option<FetchError> {
        self.next_error.write().await.take()
    }
}

fn matches_query(record: &RemoteBookRecord, words: &[String]) -> bool {
    let mut text = record.title.to_lowercase();
    for author in &record.authors {
        text.push(' ');
        text.push_str(&author.name.to_lowercase());
    }
    words.iter().all(|word| text.contains(word.as_str()))
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch_books(
        &self,
        query: Option<&str>,
    ) -> Result<Vec<RemoteBookRecord>, FetchError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        self.queries.write().await.push(query.map(str::to_string));

        let records = self.records.read().await;
        let words: Vec<String> = query
            .map(|q| q.split_whitespace().map(str::to_lowercase).collect())
            .unwrap_or_default();

        Ok(records
            .iter()
            .filter(|r| matches_query(r, &words))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[tokio::test]
    async fn test_unfiltered_listing_returns_everything_in_order() {
        let fetcher = MockFetcher::new();
        fetcher.add_record(fixtures::with_downloads("B", 1.0)).await;
        fetcher.add_record(fixtures::with_downloads("A", 2.0)).await;

        let titles: Vec<String> = fetcher
            .fetch_books(None)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.title)
            .collect();
        assert_eq!(titles, vec!["B", "A"]);
        assert_eq!(fetcher.queries().await, vec![None]);
    }

    #[tokio::test]
    async fn test_query_matches_title_or_author() {
        let fetcher = MockFetcher::new();
        fetcher
            .set_records(vec![
                fixtures::record("Moby Dick", "Melville, Herman", 1819, Some(1891)),
                fixtures::record("Emma", "Austen, Jane", 1775, Some(1817)),
            ])
            .await;

        assert_eq!(fetcher.fetch_books(Some("moby")).await.unwrap().len(), 1);
        assert_eq!(fetcher.fetch_books(Some("AUSTEN emma")).await.unwrap().len(), 1);
        assert!(fetcher.fetch_books(Some("dune")).await.unwrap().is_empty());
        assert_eq!(fetcher.call_count().await, 3);
    }

    #[tokio::test]
    async fn test_fail_next_applies_once() {
        let fetcher = MockFetcher::new();
        fetcher
            .fail_next(FetchError::Parse("bad".to_string()))
            .await;

        assert!(fetcher.fetch_books(None).await.is_err());
        assert!(fetcher.fetch_books(None).await.is_ok());
        assert_eq!(fetcher.call_count().await, 1);
    }
}
