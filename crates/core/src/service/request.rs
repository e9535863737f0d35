//! Request values built from raw user input.
//!
//! Parsing happens here, once, so service operations only ever see
//! well-formed requests.

use super::QueryError;
use crate::matcher::normalize;

/// Search books by a title keyword.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleQuery {
    keyword: String,
}

impl TitleQuery {
    pub fn parse(raw: &str) -> Result<Self, QueryError> {
        Ok(Self {
            keyword: parse_keyword(raw, "title keyword")?,
        })
    }

    /// Normalized keyword.
    pub fn keyword(&self) -> &str {
        &self.keyword
    }
}

/// Search authors by a name keyword.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorQuery {
    keyword: String,
}

impl AuthorQuery {
    pub fn parse(raw: &str) -> Result<Self, QueryError> {
        Ok(Self {
            keyword: parse_keyword(raw, "author keyword")?,
        })
    }

    /// Normalized keyword.
    pub fn keyword(&self) -> &str {
        &self.keyword
    }
}

/// Authors alive in a given year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearQuery {
    pub year: i32,
}

impl YearQuery {
    pub fn parse(raw: &str) -> Result<Self, QueryError> {
        let raw = raw.trim();
        raw.parse()
            .map(|year| Self { year })
            .map_err(|_| QueryError::Validation(format!("'{}' is not a valid year", raw)))
    }
}

/// Books available in a language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageQuery {
    code: String,
}

impl LanguageQuery {
    pub fn new(code: &str) -> Result<Self, QueryError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(QueryError::Validation("language code is empty".to_string()));
        }
        Ok(Self {
            code: code.to_string(),
        })
    }

    pub fn code(&self) -> &str {
        &self.code
    }
}

/// The `n` most downloaded remote books.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopDownloadsQuery {
    n: usize,
}

impl TopDownloadsQuery {
    pub fn new(n: usize) -> Result<Self, QueryError> {
        if n == 0 {
            return Err(QueryError::Validation(
                "top listing size must be at least 1".to_string(),
            ));
        }
        Ok(Self { n })
    }

    pub fn n(&self) -> usize {
        self.n
    }
}

impl Default for TopDownloadsQuery {
    fn default() -> Self {
        Self { n: 10 }
    }
}

/// Resolve a 1-based menu selection against a list of choices.
pub fn select<'a, T>(items: &'a [T], raw: &str) -> Result<&'a T, QueryError> {
    let raw = raw.trim();
    let index: i64 = raw
        .parse()
        .map_err(|_| QueryError::Validation(format!("'{}' is not a number", raw)))?;

    usize::try_from(index)
        .ok()
        .and_then(|i| i.checked_sub(1))
        .and_then(|i| items.get(i))
        .ok_or(QueryError::InvalidSelection {
            index,
            max: items.len(),
        })
}

fn parse_keyword(raw: &str, what: &str) -> Result<String, QueryError> {
    let keyword = normalize(raw);
    if keyword.is_empty() {
        return Err(QueryError::Validation(format!("{} is empty", what)));
    }
    if !keyword.chars().any(char::is_alphanumeric) {
        return Err(QueryError::Validation(format!(
            "{} '{}' has no letters or digits",
            what, keyword
        )));
    }
    Ok(keyword)
}
