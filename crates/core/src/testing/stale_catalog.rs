//! Catalog wrapper with stale candidate searches.

use std::sync::Arc;

use crate::catalog::{
    Author, AuthorId, AuthorSlot, Book, BookId, BookWithAuthors, CatalogError, CatalogStats,
    CatalogStore, NewAuthor, NewBook,
};

/// Delegates to an inner store, except that substring searches find nothing.
///
/// Models rows that another writer stored after the local lookup ran, so a
/// title search goes remote and its reconciliation meets an existing book.
pub struct StaleSearchCatalog {
    inner: Arc<dyn CatalogStore>,
}

impl StaleSearchCatalog {
    pub fn new(inner: Arc<dyn CatalogStore>) -> Self {
        Self { inner }
    }
}

impl CatalogStore for StaleSearchCatalog {
    fn find_author_by_exact_name(&self, name: &str) -> Result<Option<Author>, CatalogError> {
        self.inner.find_author_by_exact_name(name)
    }
    fn find_authors_by_substring(&self, _text: &str) -> Result<Vec<Author>, CatalogError> {
        Ok(Vec::new())
    }
    fn find_book_by_exact_title(&self, title: &str) -> Result<Option<Book>, CatalogError> {
        self.inner.find_book_by_exact_title(title)
    }
    fn find_books_by_substring(&self, _text: &str) -> Result<Vec<Book>, CatalogError> {
        Ok(Vec::new())
    }
    fn book_title_exists(&self, title: &str) -> Result<bool, CatalogError> {
        self.inner.book_title_exists(title)
    }
    fn distinct_languages(&self) -> Result<Vec<String>, CatalogError> {
        self.inner.distinct_languages()
    }
    fn books_in_language(&self, code: &str) -> Result<Vec<Book>, CatalogError> {
        self.inner.books_in_language(code)
    }
    fn authors_alive_in_year(&self, year: i32) -> Result<Vec<Author>, CatalogError> {
        self.inner.authors_alive_in_year(year)
    }
    fn books_for_author(&self, author_id: AuthorId) -> Result<Vec<Book>, CatalogError> {
        self.inner.books_for_author(author_id)
    }
    fn authors_for_book(&self, book_id: BookId) -> Result<Vec<Author>, CatalogError> {
        self.inner.authors_for_book(book_id)
    }
    fn save_author(&self, author: &NewAuthor) -> Result<Author, CatalogError> {
        self.inner.save_author(author)
    }
    fn save_book(&self, book: &NewBook, authors: &[AuthorId]) -> Result<Book, CatalogError> {
        self.inner.save_book(book, authors)
    }
    fn save_book_with_authors(
        &self,
        book: &NewBook,
        authors: &[AuthorSlot],
    ) -> Result<BookWithAuthors, CatalogError> {
        self.inner.save_book_with_authors(book, authors)
    }
    fn all_books(&self) -> Result<Vec<Book>, CatalogError> {
        self.inner.all_books()
    }
    fn remove_book(&self, book_id: BookId) -> Result<(), CatalogError> {
        self.inner.remove_book(book_id)
    }
    fn remove_author(&self, author_id: AuthorId) -> Result<(), CatalogError> {
        self.inner.remove_author(author_id)
    }
    fn stats(&self) -> Result<CatalogStats, CatalogError> {
        self.inner.stats()
    }
}
