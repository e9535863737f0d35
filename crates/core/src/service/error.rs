//! Errors surfaced by the query service.

use thiserror::Error;

use crate::catalog::CatalogError;
use crate::remote::FetchError;

/// Every failure an operation can report to its caller.
///
/// Expected outcomes (`NotFound`, bad input) are kept apart
/// from exceptional ones (`Fetch`, `Catalog`); none of them should end the
/// interactive session.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Nothing found: {0}")]
    NotFound(String),

    #[error("Invalid selection {index}: choose a number between 1 and {max}")]
    InvalidSelection { index: i64, max: usize },

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Could not reach remote source: {0}")]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl QueryError {
    /// Whether this is a normal outcome of user input rather than a failure.
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            QueryError::NotFound(_)
                | QueryError::InvalidSelection { .. }
                | QueryError::Validation(_)
        )
    }
}
