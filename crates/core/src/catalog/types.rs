//! Types for the local book catalog.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::matcher::normalize;

/// Identifier of a stored author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthorId(pub i64);

/// Identifier of a stored book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookId(pub i64);

impl fmt::Display for AuthorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A stored author.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub id: AuthorId,
    /// Normalized name (trimmed, lower-cased). Unique across authors.
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_year: Option<i32>,
    /// `None` means still alive or unknown.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub death_year: Option<i32>,
}

/// A stored book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    /// Title as fetched. Unique case-insensitively.
    pub title: String,
    /// Language codes in the order they were fetched.
    pub languages: Vec<String>,
    /// Popularity metric, used for ranking only.
    pub download_count: f64,
}

/// An author together with the books they contributed to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorWithBooks {
    pub author: Author,
    pub books: Vec<Book>,
}

/// A book together with its authors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookWithAuthors {
    pub book: Book,
    pub authors: Vec<Author>,
}

impl BookWithAuthors {
    /// Author names in link order.
    pub fn author_names(&self) -> Vec<&str> {
        self.authors.iter().map(|a| a.name.as_str()).collect()
    }
}

/// An author that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAuthor {
    name: String,
    birth_year: Option<i32>,
    death_year: Option<i32>,
}

impl NewAuthor {
    /// Build a new author, normalizing the name.
    ///
    /// Fails when the name is blank or the death year precedes the birth year.
    pub fn new(
        name: &str,
        birth_year: Option<i32>,
        death_year: Option<i32>,
    ) -> Result<Self, CatalogError> {
        let name = normalize(name);
        if name.is_empty() {
            return Err(CatalogError::Invalid("author name is empty".to_string()));
        }
        if let (Some(birth), Some(death)) = (birth_year, death_year) {
            if death < birth {
                return Err(CatalogError::Invalid(format!(
                    "author '{}' died ({}) before being born ({})",
                    name, death, birth
                )));
            }
        }
        Ok(Self {
            name,
            birth_year,
            death_year,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn birth_year(&self) -> Option<i32> {
        self.birth_year
    }

    pub fn death_year(&self) -> Option<i32> {
        self.death_year
    }
}

/// A book that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBook {
    pub title: String,
    pub languages: Vec<String>,
    pub download_count: f64,
}

impl NewBook {
    /// Case-folded title used as the uniqueness key.
    pub fn title_key(&self) -> String {
        title_key(&self.title)
    }
}

/// Case-folded form of a title, the key behind case-insensitive uniqueness.
pub fn title_key(title: &str) -> String {
    title.trim().to_lowercase()
}

/// Author slot when saving a book together with its authors.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthorSlot {
    /// Link an author that is already stored.
    Existing(AuthorId),
    /// Create this author in the same transaction, then link it.
    New(NewAuthor),
}

/// Catalog statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogStats {
    pub total_books: u64,
    pub total_authors: u64,
    /// Number of distinct language codes.
    pub total_languages: u64,
}

/// Errors for catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Already exists: {0}")]
    Duplicate(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid entity: {0}")]
    Invalid(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
