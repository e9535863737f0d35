//! Gutendex API client.
//!
//! Gutendex serves Project Gutenberg metadata as JSON pages of up to 32
//! books, each page linking to the next one.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use super::types::{RemoteAuthor, RemoteBookRecord};
use super::{FetchError, Fetcher};
use crate::config::RemoteConfig;

/// Gutendex API client.
pub struct GutendexClient {
    client: Client,
    base_url: String,
    max_pages: u32,
}

impl GutendexClient {
    /// Create a new Gutendex client.
    pub fn new(config: &RemoteConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(u64::from(config.timeout_secs)))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim().to_string(),
            max_pages: config.max_pages.max(1),
        })
    }

    /// URL of the listing, optionally narrowed by a search keyword.
    ///
    /// Keyword words are percent-encoded and joined with `+`.
    pub fn books_url(&self, query: Option<&str>) -> String {
        let search = query
            .map(|q| {
                q.split_whitespace()
                    .map(|word| urlencoding::encode(word).into_owned())
                    .collect::<Vec<_>>()
                    .join("+")
            })
            .filter(|s| !s.is_empty());

        match search {
            Some(search) => {
                let separator = if self.base_url.contains('?') { '&' } else { '?' };
                format!("{}{}search={}", self.base_url, separator, search)
            }
            None => self.base_url.clone(),
        }
    }

    /// GET a URL and return the raw body.
    pub async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(FetchError::InvalidUrl(url.to_string()));
        }

        debug!("Gutendex GET {}", url);

        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Gutendex returned {} for {}", status, url);
            return Err(FetchError::Status {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl Fetcher for GutendexClient {
    async fn fetch_books(
        &self,
        query: Option<&str>,
    ) -> Result<Vec<RemoteBookRecord>, FetchError> {
        let mut url = Some(self.books_url(query));
        let mut records = Vec::new();
        let mut pages = 0;

        while let Some(current) = url.take() {
            if pages == self.max_pages {
                break;
            }

            let body = self.fetch(&current).await?;
            let page = parse_page(&body)?;
            pages += 1;

            debug!(
                "Gutendex page {}: {} result(s) of {}",
                pages,
                page.results.len(),
                page.count
            );

            records.extend(page.results.into_iter().map(RemoteBookRecord::from));
            url = page.next;
        }

        Ok(records)
    }
}

/// Parse one Gutendex result page.
fn parse_page(body: &str) -> Result<GutendexPage, FetchError> {
    serde_json::from_str(body)
        .map_err(|e| FetchError::Parse(format!("Failed to parse Gutendex page: {}", e)))
}

// ============================================================================
// Gutendex API Response Types (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct GutendexPage {
    #[serde(default)]
    count: u64,
    #[serde(default)]
    next: Option<String>,
    #[serde(default)]
    results: Vec<GutendexBook>,
}

#[derive(Debug, Deserialize)]
struct GutendexBook {
    title: String,
    #[serde(default)]
    authors: Vec<GutendexPerson>,
    #[serde(default)]
    languages: Vec<String>,
    #[serde(default)]
    download_count: f64,
}

#[derive(Debug, Deserialize)]
struct GutendexPerson {
    name: String,
    #[serde(default)]
    birth_year: Option<i32>,
    #[serde(default)]
    death_year: Option<i32>,
}

impl From<GutendexBook> for RemoteBookRecord {
    fn from(book: GutendexBook) -> Self {
        RemoteBookRecord {
            title: book.title,
            languages: book.languages,
            download_count: book.download_count,
            authors: book
                .authors
                .into_iter()
                .map(|p| RemoteAuthor {
                    name: p.name,
                    birth_year: p.birth_year,
                    death_year: p.death_year,
                })
                .collect(),
        }
    }
}
