use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub query: QueryConfig,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("libris.db")
}

/// Remote book-metadata API configuration (Gutendex)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RemoteConfig {
    /// Listing endpoint, e.g. "https://gutendex.com/books/"
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
    /// User-Agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// How many result pages a single fetch follows through `next` links
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
            max_pages: default_max_pages(),
        }
    }
}

fn default_base_url() -> String {
    "https://gutendex.com/books/".to_string()
}

fn default_timeout() -> u32 {
    30
}

fn default_user_agent() -> String {
    format!("libris/{}", env!("CARGO_PKG_VERSION"))
}

fn default_max_pages() -> u32 {
    1
}

/// Query service tuning
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueryConfig {
    /// Size of the most-downloaded listing
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
        }
    }
}

fn default_top_n() -> usize {
    10
}
