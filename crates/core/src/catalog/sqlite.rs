//! SQLite-backed book catalog implementation.

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{ffi, params, Connection, ErrorCode, OptionalExtension, Params};
use tracing::{debug, info};

use super::{
    title_key, Author, AuthorId, AuthorSlot, Book, BookId, BookWithAuthors, CatalogError,
    CatalogStats, CatalogStore, NewAuthor, NewBook,
};

const AUTHOR_COLUMNS: &str = "a.id, a.name, a.birth_year, a.death_year";
const BOOK_COLUMNS: &str = "b.id, b.title, b.download_count";

/// SQLite-backed book catalog.
///
/// Authors and books are linked through `book_authors`, indexed both by book
/// and by author, so either side can be materialized without an ownership
/// cycle between the two entity types.
pub struct SqliteCatalog {
    conn: Mutex<Connection>,
}

impl SqliteCatalog {
    /// Create a new SQLite catalog, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, CatalogError> {
        let conn = Connection::open(path).map_err(db)?;
        Self::initialize_schema(&conn)?;
        info!("Opened book catalog at {:?}", path);
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite catalog (useful for testing).
    pub fn in_memory() -> Result<Self, CatalogError> {
        let conn = Connection::open_in_memory().map_err(db)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), CatalogError> {
        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            -- Authors, keyed by normalized name
            CREATE TABLE IF NOT EXISTS authors (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                birth_year INTEGER,
                death_year INTEGER,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                CHECK (birth_year IS NULL OR death_year IS NULL OR death_year >= birth_year)
            );

            -- Books; title_key is the case-folded title and carries uniqueness
            CREATE TABLE IF NOT EXISTS books (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                title_key TEXT NOT NULL UNIQUE,
                download_count REAL NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            -- Ordered language codes per book
            CREATE TABLE IF NOT EXISTS book_languages (
                book_id INTEGER NOT NULL REFERENCES books(id) ON DELETE CASCADE,
                position INTEGER NOT NULL,
                code TEXT NOT NULL,
                PRIMARY KEY (book_id, position)
            );

            CREATE INDEX IF NOT EXISTS idx_book_languages_code ON book_languages(code);

            -- Author <-> book links
            CREATE TABLE IF NOT EXISTS book_authors (
                book_id INTEGER NOT NULL REFERENCES books(id) ON DELETE CASCADE,
                author_id INTEGER NOT NULL REFERENCES authors(id) ON DELETE CASCADE,
                position INTEGER NOT NULL,
                PRIMARY KEY (book_id, author_id)
            );

            CREATE INDEX IF NOT EXISTS idx_book_authors_author ON book_authors(author_id);
            "#,
        )
        .map_err(db)?;

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, CatalogError> {
        self.conn
            .lock()
            .map_err(|_| CatalogError::Internal("catalog connection lock poisoned".to_string()))
    }

    fn row_to_author(row: &rusqlite::Row) -> rusqlite::Result<Author> {
        Ok(Author {
            id: AuthorId(row.get(0)?),
            name: row.get(1)?,
            birth_year: row.get(2)?,
            death_year: row.get(3)?,
        })
    }

    /// Convert a row to Book (without languages).
    fn row_to_book(row: &rusqlite::Row) -> rusqlite::Result<Book> {
        Ok(Book {
            id: BookId(row.get(0)?),
            title: row.get(1)?,
            languages: Vec::new(), // Will be loaded separately
            download_count: row.get(2)?,
        })
    }

    /// Load language codes for a book, in stored order.
    fn load_languages(conn: &Connection, book_id: BookId) -> Result<Vec<String>, CatalogError> {
        let mut stmt = conn
            .prepare("SELECT code FROM book_languages WHERE book_id = ? ORDER BY position")
            .map_err(db)?;

        let rows = stmt
            .query_map(params![book_id.0], |row| row.get(0))
            .map_err(db)?;

        let mut languages = Vec::new();
        for row in rows {
            languages.push(row.map_err(db)?);
        }
        Ok(languages)
    }

    fn query_authors<P: Params>(
        conn: &Connection,
        sql: &str,
        params: P,
    ) -> Result<Vec<Author>, CatalogError> {
        let mut stmt = conn.prepare(sql).map_err(db)?;
        let rows = stmt.query_map(params, Self::row_to_author).map_err(db)?;

        let mut authors = Vec::new();
        for row in rows {
            authors.push(row.map_err(db)?);
        }
        Ok(authors)
    }

    fn query_books<P: Params>(
        conn: &Connection,
        sql: &str,
        params: P,
    ) -> Result<Vec<Book>, CatalogError> {
        let mut stmt = conn.prepare(sql).map_err(db)?;
        let rows = stmt.query_map(params, Self::row_to_book).map_err(db)?;

        let mut books = Vec::new();
        for row in rows {
            books.push(row.map_err(db)?);
        }
        for book in &mut books {
            book.languages = Self::load_languages(conn, book.id)?;
        }
        Ok(books)
    }

    fn get_author(conn: &Connection, author_id: AuthorId) -> Result<Author, CatalogError> {
        conn.query_row(
            &format!("SELECT {AUTHOR_COLUMNS} FROM authors a WHERE a.id = ?"),
            params![author_id.0],
            Self::row_to_author,
        )
        .optional()
        .map_err(db)?
        .ok_or_else(|| CatalogError::NotFound(format!("author {}", author_id)))
    }

    fn insert_author(conn: &Connection, author: &NewAuthor) -> Result<Author, CatalogError> {
        conn.execute(
            "INSERT INTO authors (name, birth_year, death_year) VALUES (?, ?, ?)",
            params![author.name(), author.birth_year(), author.death_year()],
        )
        .map_err(|e| write_err(e, || format!("author '{}'", author.name())))?;

        let id = AuthorId(conn.last_insert_rowid());
        info!("Created author {} '{}'", id, author.name());

        Ok(Author {
            id,
            name: author.name().to_string(),
            birth_year: author.birth_year(),
            death_year: author.death_year(),
        })
    }

    /// Insert an author unless one with the same name exists; return the stored row.
    fn insert_or_get_author(conn: &Connection, author: &NewAuthor) -> Result<Author, CatalogError> {
        let inserted = conn
            .execute(
                "INSERT INTO authors (name, birth_year, death_year) VALUES (?, ?, ?)
                 ON CONFLICT(name) DO NOTHING",
                params![author.name(), author.birth_year(), author.death_year()],
            )
            .map_err(|e| write_err(e, || format!("author '{}'", author.name())))?;

        if inserted == 0 {
            debug!("Author '{}' already stored, linking existing row", author.name());
        } else {
            info!("Created author '{}'", author.name());
        }

        conn.query_row(
            &format!("SELECT {AUTHOR_COLUMNS} FROM authors a WHERE a.name = ?"),
            params![author.name()],
            Self::row_to_author,
        )
        .map_err(db)
    }

    /// Insert a book row and its languages.
    fn insert_book(conn: &Connection, book: &NewBook) -> Result<Book, CatalogError> {
        conn.execute(
            "INSERT INTO books (title, title_key, download_count) VALUES (?, ?, ?)",
            params![&book.title, book.title_key(), book.download_count],
        )
        .map_err(|e| write_err(e, || format!("book '{}'", book.title)))?;

        let id = BookId(conn.last_insert_rowid());

        for (position, code) in book.languages.iter().enumerate() {
            conn.execute(
                "INSERT INTO book_languages (book_id, position, code) VALUES (?, ?, ?)",
                params![id.0, position as i64, code],
            )
            .map_err(db)?;
        }

        Ok(Book {
            id,
            title: book.title.clone(),
            languages: book.languages.clone(),
            download_count: book.download_count,
        })
    }

    fn link(
        conn: &Connection,
        book_id: BookId,
        author_id: AuthorId,
        position: usize,
    ) -> Result<(), CatalogError> {
        conn.execute(
            "INSERT INTO book_authors (book_id, author_id, position) VALUES (?, ?, ?)",
            params![book_id.0, author_id.0, position as i64],
        )
        .map_err(|e| write_err(e, || format!("link book {} -> author {}", book_id, author_id)))?;
        Ok(())
    }
}

impl CatalogStore for SqliteCatalog {
    fn find_author_by_exact_name(&self, name: &str) -> Result<Option<Author>, CatalogError> {
        let conn = self.lock()?;

        conn.query_row(
            &format!("SELECT {AUTHOR_COLUMNS} FROM authors a WHERE a.name = ?"),
            params![name],
            Self::row_to_author,
        )
        .optional()
        .map_err(db)
    }

    fn find_authors_by_substring(&self, text: &str) -> Result<Vec<Author>, CatalogError> {
        let conn = self.lock()?;
        let pattern = like_pattern(text);

        let authors = Self::query_authors(
            &conn,
            &format!(
                "SELECT {AUTHOR_COLUMNS} FROM authors a
                 WHERE a.name LIKE ?1 ESCAPE '\\'
                 ORDER BY a.name"
            ),
            params![&pattern],
        )?;

        debug!("Author candidates for {:?}: {}", text, authors.len());
        Ok(authors)
    }

    fn find_book_by_exact_title(&self, title: &str) -> Result<Option<Book>, CatalogError> {
        let conn = self.lock()?;

        let mut books = Self::query_books(
            &conn,
            &format!("SELECT {BOOK_COLUMNS} FROM books b WHERE b.title = ?"),
            params![title],
        )?;

        Ok(books.pop())
    }

    fn find_books_by_substring(&self, text: &str) -> Result<Vec<Book>, CatalogError> {
        let conn = self.lock()?;
        let pattern = like_pattern(text);

        let books = Self::query_books(
            &conn,
            &format!(
                "SELECT {BOOK_COLUMNS} FROM books b
                 WHERE b.title_key LIKE ?1 ESCAPE '\\'
                 ORDER BY b.id"
            ),
            params![&pattern],
        )?;

        debug!("Book candidates for {:?}: {}", text, books.len());
        Ok(books)
    }

    fn book_title_exists(&self, title: &str) -> Result<bool, CatalogError> {
        let conn = self.lock()?;

        conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM books WHERE title_key = ?)",
            params![title_key(title)],
            |row| row.get(0),
        )
        .map_err(db)
    }

    fn distinct_languages(&self) -> Result<Vec<String>, CatalogError> {
        let conn = self.lock()?;

        // First-seen order
        let mut stmt = conn
            .prepare("SELECT code FROM book_languages GROUP BY code ORDER BY MIN(rowid)")
            .map_err(db)?;

        let rows = stmt.query_map([], |row| row.get(0)).map_err(db)?;

        let mut languages = Vec::new();
        for row in rows {
            languages.push(row.map_err(db)?);
        }
        Ok(languages)
    }

    fn books_in_language(&self, code: &str) -> Result<Vec<Book>, CatalogError> {
        let conn = self.lock()?;
        let pattern = like_pattern(code);

        Self::query_books(
            &conn,
            &format!(
                "SELECT DISTINCT {BOOK_COLUMNS} FROM books b
                 JOIN book_languages bl ON bl.book_id = b.id
                 WHERE LOWER(bl.code) LIKE ?1 ESCAPE '\\'
                 ORDER BY b.id"
            ),
            params![&pattern],
        )
    }

    fn authors_alive_in_year(&self, year: i32) -> Result<Vec<Author>, CatalogError> {
        let conn = self.lock()?;

        Self::query_authors(
            &conn,
            &format!(
                "SELECT {AUTHOR_COLUMNS} FROM authors a
                 WHERE a.birth_year <= ?1
                   AND (a.death_year IS NULL OR a.death_year >= ?1)
                 ORDER BY a.name"
            ),
            params![year],
        )
    }

    fn books_for_author(&self, author_id: AuthorId) -> Result<Vec<Book>, CatalogError> {
        let conn = self.lock()?;

        Self::query_books(
            &conn,
            &format!(
                "SELECT {BOOK_COLUMNS} FROM books b
                 JOIN book_authors ba ON ba.book_id = b.id
                 WHERE ba.author_id = ?
                 ORDER BY b.id"
            ),
            params![author_id.0],
        )
    }

    fn authors_for_book(&self, book_id: BookId) -> Result<Vec<Author>, CatalogError> {
        let conn = self.lock()?;

        Self::query_authors(
            &conn,
            &format!(
                "SELECT {AUTHOR_COLUMNS} FROM authors a
                 JOIN book_authors ba ON ba.author_id = a.id
                 WHERE ba.book_id = ?
                 ORDER BY ba.position"
            ),
            params![book_id.0],
        )
    }

    fn save_author(&self, author: &NewAuthor) -> Result<Author, CatalogError> {
        let conn = self.lock()?;
        Self::insert_author(&conn, author)
    }

    fn save_book(&self, book: &NewBook, authors: &[AuthorId]) -> Result<Book, CatalogError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(db)?;

        let stored = Self::insert_book(&tx, book)?;

        let mut seen = HashSet::new();
        for author_id in authors {
            if seen.insert(*author_id) {
                Self::link(&tx, stored.id, *author_id, seen.len() - 1)?;
            }
        }

        tx.commit().map_err(db)?;
        info!("Created book {} '{}'", stored.id, stored.title);
        Ok(stored)
    }

    fn save_book_with_authors(
        &self,
        book: &NewBook,
        authors: &[AuthorSlot],
    ) -> Result<BookWithAuthors, CatalogError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(db)?;

        // Book first: a duplicate title aborts before any author is touched
        let stored = Self::insert_book(&tx, book)?;

        let mut linked: Vec<Author> = Vec::new();
        for slot in authors {
            let author = match slot {
                AuthorSlot::Existing(id) => Self::get_author(&tx, *id)?,
                AuthorSlot::New(new_author) => Self::insert_or_get_author(&tx, new_author)?,
            };
            if linked.iter().any(|a| a.id == author.id) {
                continue;
            }
            Self::link(&tx, stored.id, author.id, linked.len())?;
            linked.push(author);
        }

        tx.commit().map_err(db)?;
        info!(
            "Created book {} '{}' with {} author(s)",
            stored.id,
            stored.title,
            linked.len()
        );

        Ok(BookWithAuthors {
            book: stored,
            authors: linked,
        })
    }

    fn all_books(&self) -> Result<Vec<Book>, CatalogError> {
        let conn = self.lock()?;

        Self::query_books(
            &conn,
            &format!("SELECT {BOOK_COLUMNS} FROM books b ORDER BY b.id"),
            [],
        )
    }

    fn remove_book(&self, book_id: BookId) -> Result<(), CatalogError> {
        let conn = self.lock()?;

        // Cascades to languages and author links
        let rows_affected = conn
            .execute("DELETE FROM books WHERE id = ?", params![book_id.0])
            .map_err(db)?;

        if rows_affected == 0 {
            return Err(CatalogError::NotFound(format!("book {}", book_id)));
        }

        Ok(())
    }

    fn remove_author(&self, author_id: AuthorId) -> Result<(), CatalogError> {
        let conn = self.lock()?;

        let rows_affected = conn
            .execute("DELETE FROM authors WHERE id = ?", params![author_id.0])
            .map_err(db)?;

        if rows_affected == 0 {
            return Err(CatalogError::NotFound(format!("author {}", author_id)));
        }

        Ok(())
    }

    fn stats(&self) -> Result<CatalogStats, CatalogError> {
        let conn = self.lock()?;

        let total_books: u64 = conn
            .query_row("SELECT COUNT(*) FROM books", [], |row| row.get(0))
            .map_err(db)?;

        let total_authors: u64 = conn
            .query_row("SELECT COUNT(*) FROM authors", [], |row| row.get(0))
            .map_err(db)?;

        let total_languages: u64 = conn
            .query_row("SELECT COUNT(DISTINCT code) FROM book_languages", [], |row| {
                row.get(0)
            })
            .map_err(db)?;

        Ok(CatalogStats {
            total_books,
            total_authors,
            total_languages,
        })
    }
}

fn db(e: rusqlite::Error) -> CatalogError {
    CatalogError::Database(e.to_string())
}

/// Map a write failure, turning uniqueness violations into `Duplicate`.
fn write_err(e: rusqlite::Error, what: impl FnOnce() -> String) -> CatalogError {
    match &e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
                || err.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
        {
            CatalogError::Duplicate(what())
        }
        rusqlite::Error::SqliteFailure(err, _) if err.code == ErrorCode::ConstraintViolation => {
            CatalogError::Invalid(format!("{}: {}", what(), e))
        }
        _ => db(e),
    }
}

/// Build a case-insensitive `LIKE` pattern matching `text` anywhere.
fn like_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for c in text.trim().to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
