//! Book catalog - the local store of discovered books and authors.
//!
//! The catalog is checked before the remote API is queried, and every remote
//! hit worth keeping is reconciled into it.

mod sqlite;
mod types;

pub use sqlite::SqliteCatalog;
pub use types::*;

/// Trait for book catalog storage.
///
/// Substring lookups are candidate queries: they are cheap and deliberately
/// loose, callers narrow them with [`crate::matcher::contains_whole_word`].
pub trait CatalogStore: Send + Sync {
    /// Find an author by exact normalized name.
    fn find_author_by_exact_name(&self, name: &str) -> Result<Option<Author>, CatalogError>;

    /// Authors whose name contains `text`, case-insensitively.
    fn find_authors_by_substring(&self, text: &str) -> Result<Vec<Author>, CatalogError>;

    /// Find a book by its exact title.
    fn find_book_by_exact_title(&self, title: &str) -> Result<Option<Book>, CatalogError>;

    /// Books whose title contains `text`, case-insensitively.
    fn find_books_by_substring(&self, text: &str) -> Result<Vec<Book>, CatalogError>;

    /// Whether a book with this title exists, ignoring case.
    fn book_title_exists(&self, title: &str) -> Result<bool, CatalogError>;

    /// Every language code used by at least one book, deduplicated.
    fn distinct_languages(&self) -> Result<Vec<String>, CatalogError>;

    /// Books with a language code containing `code`, case-insensitively.
    fn books_in_language(&self, code: &str) -> Result<Vec<Book>, CatalogError>;

    /// Authors with `birth_year <= year` and no death year or `death_year >= year`.
    fn authors_alive_in_year(&self, year: i32) -> Result<Vec<Author>, CatalogError>;

    /// Books linked to an author.
    fn books_for_author(&self, author_id: AuthorId) -> Result<Vec<Book>, CatalogError>;

    /// Authors linked to a book.
    fn authors_for_book(&self, book_id: BookId) -> Result<Vec<Author>, CatalogError>;

    /// Insert an author. Fails with `Duplicate` when the name is taken.
    fn save_author(&self, author: &NewAuthor) -> Result<Author, CatalogError>;

    /// Insert a book linked to already stored authors.
    ///
    /// Fails with `Duplicate` when the title is taken; nothing is written then.
    fn save_book(&self, book: &NewBook, authors: &[AuthorId]) -> Result<Book, CatalogError>;

    /// Insert a book, creating any new authors, in a single transaction.
    ///
    /// On any failure (including `Duplicate`) neither the book nor the new
    /// authors are kept.
    fn save_book_with_authors(
        &self,
        book: &NewBook,
        authors: &[AuthorSlot],
    ) -> Result<BookWithAuthors, CatalogError>;

    /// All stored books, oldest first.
    fn all_books(&self) -> Result<Vec<Book>, CatalogError>;

    /// Remove a book and its author links.
    fn remove_book(&self, book_id: BookId) -> Result<(), CatalogError>;

    /// Remove an author and their book links.
    fn remove_author(&self, author_id: AuthorId) -> Result<(), CatalogError>;

    /// Get catalog statistics.
    fn stats(&self) -> Result<CatalogStats, CatalogError>;
}
