//! Types for remote book records.

use serde::{Deserialize, Serialize};

use crate::catalog::{CatalogError, NewAuthor, NewBook};

/// A book as described by the remote source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteBookRecord {
    pub title: String,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub download_count: f64,
    #[serde(default)]
    pub authors: Vec<RemoteAuthor>,
}

impl RemoteBookRecord {
    /// Local book built from this record (authors are reconciled separately).
    pub fn to_new_book(&self) -> NewBook {
        NewBook {
            title: self.title.clone(),
            languages: self.languages.clone(),
            download_count: self.download_count,
        }
    }

    /// Author names as fetched.
    pub fn author_names(&self) -> Vec<&str> {
        self.authors.iter().map(|a| a.name.as_str()).collect()
    }
}

/// An author as described by the remote source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteAuthor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub death_year: Option<i32>,
}

impl RemoteAuthor {
    /// Local author built from this record, with the name normalized.
    pub fn to_new_author(&self) -> Result<NewAuthor, CatalogError> {
        NewAuthor::new(&self.name, self.birth_year, self.death_year)
    }
}
