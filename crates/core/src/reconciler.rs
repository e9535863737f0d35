//! Reconciliation of remote book records into the local catalog.
//!
//! A remote record becomes exactly one stored book. Its authors are matched
//! by normalized name against stored authors and created only when missing,
//! so running the same record twice never duplicates anything.
//!
//! The title pre-check and the insert are two separate store calls. Nothing
//! makes them atomic with respect to another writer, which is why a storage
//! level duplicate is also reported as [`ReconcileOutcome::AlreadyExists`].

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::catalog::{AuthorSlot, BookWithAuthors, CatalogError, CatalogStore, NewAuthor};
use crate::remote::RemoteBookRecord;

/// Result of reconciling one remote record.
#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileOutcome {
    /// The book was new and has been stored with its authors.
    Created(BookWithAuthors),
    /// A book with the same title (ignoring case) is already stored; nothing was written.
    AlreadyExists { title: String },
}

/// Maps remote records onto existing-or-new catalog entities.
pub struct Reconciler {
    store: Arc<dyn CatalogStore>,
}

impl Reconciler {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    /// Persist a remote record as a book linked to its authors.
    pub fn reconcile(&self, record: &RemoteBookRecord) -> Result<ReconcileOutcome, CatalogError> {
        if record.title.trim().is_empty() {
            return Err(CatalogError::Invalid("remote book has no title".to_string()));
        }

        let slots = self.resolve_authors(record)?;
        let book = record.to_new_book();

        if self.store.book_title_exists(&book.title)? {
            info!("Book '{}' already in catalog, skipping insert", book.title);
            return Ok(ReconcileOutcome::AlreadyExists { title: book.title });
        }

        match self.store.save_book_with_authors(&book, &slots) {
            Ok(saved) => {
                info!(
                    "Reconciled '{}' as book {} ({} author(s))",
                    saved.book.title,
                    saved.book.id,
                    saved.authors.len()
                );
                Ok(ReconcileOutcome::Created(saved))
            }
            Err(CatalogError::Duplicate(what)) => {
                warn!("Insert of {} hit a uniqueness violation after pre-check", what);
                Ok(ReconcileOutcome::AlreadyExists { title: book.title })
            }
            Err(e) => Err(e),
        }
    }

    /// Find-or-create plan for the record's authors, deduplicated by normalized name.
    fn resolve_authors(&self, record: &RemoteBookRecord) -> Result<Vec<AuthorSlot>, CatalogError> {
        let mut seen = HashSet::new();
        let mut slots = Vec::with_capacity(record.authors.len());

        for remote in &record.authors {
            let new_author = match remote.to_new_author() {
                Ok(author) => author,
                Err(CatalogError::Invalid(reason)) if !remote.name.trim().is_empty() => {
                    warn!("Keeping author without life years: {}", reason);
                    NewAuthor::new(&remote.name, None, None)?
                }
                Err(e) => return Err(e),
            };
            if !seen.insert(new_author.name().to_string()) {
                continue;
            }

            match self.store.find_author_by_exact_name(new_author.name())? {
                Some(existing) => {
                    debug!("Author '{}' matched stored author {}", existing.name, existing.id);
                    slots.push(AuthorSlot::Existing(existing.id));
                }
                None => slots.push(AuthorSlot::New(new_author)),
            }
        }

        Ok(slots)
    }
}
