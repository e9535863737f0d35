//! Catalog query service - the six user-facing catalog operations.
//!
//! Title and author searches are two-phase: the store returns cheap substring
//! candidates, then [`contains_whole_word`] keeps the real matches. A title
//! search that finds nothing locally falls back to the remote source and
//! reconciles the first whole-word hit into the catalog.

mod error;
mod request;

pub use error::QueryError;
pub use request::{
    select, AuthorQuery, LanguageQuery, TitleQuery, TopDownloadsQuery, YearQuery,
};

use std::sync::Arc;

use tracing::{debug, info};

use crate::catalog::{
    Author, AuthorWithBooks, Book, BookWithAuthors, CatalogStats, CatalogStore,
};
use crate::matcher::{candidate_needle, contains_whole_word};
use crate::reconciler::{ReconcileOutcome, Reconciler};
use crate::remote::{Fetcher, RemoteBookRecord};

/// Outcome of a successful title search.
#[derive(Debug, Clone, PartialEq)]
pub enum TitleSearchOutcome {
    /// Matching books already in the catalog; the remote source was not queried.
    Local(Vec<BookWithAuthors>),
    /// Nothing local matched; this remote record was fetched and registered.
    Registered {
        record: RemoteBookRecord,
        saved: BookWithAuthors,
    },
    /// The remote match was already stored when it came to be written;
    /// nothing was written.
    AlreadyRegistered { record: RemoteBookRecord },
}

/// Composes the catalog store, the matcher, the reconciler and a remote
/// fetcher into request/response operations.
pub struct CatalogService {
    store: Arc<dyn CatalogStore>,
    fetcher: Arc<dyn Fetcher>,
    reconciler: Reconciler,
}

impl CatalogService {
    pub fn new(store: Arc<dyn CatalogStore>, fetcher: Arc<dyn Fetcher>) -> Self {
        let reconciler = Reconciler::new(Arc::clone(&store));
        Self {
            store,
            fetcher,
            reconciler,
        }
    }

    /// Find books whose title contains the keyword as whole words.
    ///
    /// Local matches are returned as-is. Otherwise the remote source is
    /// searched and its first whole-word match is registered.
    pub async fn search_book_by_title(
        &self,
        query: &TitleQuery,
    ) -> Result<TitleSearchOutcome, QueryError> {
        let keyword = query.keyword();

        let local = self.local_books_matching(keyword)?;
        if !local.is_empty() {
            debug!("Title '{}': {} local match(es)", keyword, local.len());
            return Ok(TitleSearchOutcome::Local(self.with_authors(local)?));
        }

        debug!("Title '{}': no local match, querying remote source", keyword);
        let remote = self.fetcher.fetch_books(Some(keyword)).await?;
        let remote_count = remote.len();

        let record = remote
            .into_iter()
            .find(|r| contains_whole_word(&r.title, keyword))
            .ok_or_else(|| {
                debug!(
                    "Title '{}': none of {} remote result(s) matched",
                    keyword, remote_count
                );
                QueryError::NotFound(format!("no book titled with '{}'", keyword))
            })?;

        match self.reconciler.reconcile(&record)? {
            ReconcileOutcome::Created(saved) => {
                info!("Registered '{}' from remote source", saved.book.title);
                Ok(TitleSearchOutcome::Registered { record, saved })
            }
            ReconcileOutcome::AlreadyExists { title } => {
                info!("'{}' was already registered", title);
                Ok(TitleSearchOutcome::AlreadyRegistered { record })
            }
        }
    }

    /// Find stored authors whose name contains the keyword as whole words.
    pub fn search_author_by_name(
        &self,
        query: &AuthorQuery,
    ) -> Result<Vec<AuthorWithBooks>, QueryError> {
        let keyword = query.keyword();
        let Some(needle) = candidate_needle(keyword) else {
            return Err(QueryError::NotFound(format!("no author named '{}'", keyword)));
        };

        let authors: Vec<Author> = self
            .store
            .find_authors_by_substring(&needle)?
            .into_iter()
            .filter(|a| contains_whole_word(&a.name, keyword))
            .collect();

        if authors.is_empty() {
            return Err(QueryError::NotFound(format!("no author named '{}'", keyword)));
        }

        self.with_books(authors)
    }

    /// Authors alive in the given year, each with their books.
    pub fn books_by_author_and_year(
        &self,
        query: &YearQuery,
    ) -> Result<Vec<AuthorWithBooks>, QueryError> {
        let authors = self.store.authors_alive_in_year(query.year)?;
        if authors.is_empty() {
            return Err(QueryError::NotFound(format!(
                "no authors alive in {}",
                query.year
            )));
        }

        self.with_books(authors)
    }

    /// Language codes present in the catalog.
    pub fn available_languages(&self) -> Result<Vec<String>, QueryError> {
        let languages = self.store.distinct_languages()?;
        if languages.is_empty() {
            return Err(QueryError::NotFound(
                "no books registered, so no languages yet".to_string(),
            ));
        }
        Ok(languages)
    }

    /// Books available in the selected language.
    pub fn books_by_language(
        &self,
        query: &LanguageQuery,
    ) -> Result<Vec<BookWithAuthors>, QueryError> {
        let books = self.store.books_in_language(query.code())?;
        if books.is_empty() {
            return Err(QueryError::NotFound(format!(
                "no books in language '{}'",
                query.code()
            )));
        }
        self.with_authors(books)
    }

    /// Every stored book with its authors.
    pub fn list_all_books(&self) -> Result<Vec<BookWithAuthors>, QueryError> {
        let books = self.store.all_books()?;
        self.with_authors(books)
    }

    /// The most downloaded books of the remote catalog, most popular first.
    ///
    /// Equal download counts keep the remote order.
    pub async fn top_n_downloaded(
        &self,
        query: &TopDownloadsQuery,
    ) -> Result<Vec<RemoteBookRecord>, QueryError> {
        let records = self.fetcher.fetch_books(None).await?;
        debug!("Ranking {} remote record(s)", records.len());
        Ok(rank_by_downloads(records, query.n()))
    }

    /// Catalog statistics.
    pub fn stats(&self) -> Result<CatalogStats, QueryError> {
        Ok(self.store.stats()?)
    }

    fn local_books_matching(&self, keyword: &str) -> Result<Vec<Book>, QueryError> {
        let Some(needle) = candidate_needle(keyword) else {
            return Ok(Vec::new());
        };

        Ok(self
            .store
            .find_books_by_substring(&needle)?
            .into_iter()
            .filter(|b| contains_whole_word(&b.title, keyword))
            .collect())
    }

    fn with_authors(&self, books: Vec<Book>) -> Result<Vec<BookWithAuthors>, QueryError> {
        books
            .into_iter()
            .map(|book| {
                let authors = self.store.authors_for_book(book.id)?;
                Ok(BookWithAuthors { book, authors })
            })
            .collect()
    }

    fn with_books(&self, authors: Vec<Author>) -> Result<Vec<AuthorWithBooks>, QueryError> {
        authors
            .into_iter()
            .map(|author| {
                let books = self.store.books_for_author(author.id)?;
                Ok(AuthorWithBooks { author, books })
            })
            .collect()
    }
}

/// Stable sort by descending download count, keeping the first `n`.
fn rank_by_downloads(mut records: Vec<RemoteBookRecord>, n: usize) -> Vec<RemoteBookRecord> {
    records.sort_by(|a, b| b.download_count.total_cmp(&a.download_count));
    records.truncate(n);
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SqliteCatalog;
    use crate::remote::FetchError;
    use crate::testing::{fixtures, MockFetcher, StaleSearchCatalog};

    struct Harness {
        store: Arc<SqliteCatalog>,
        fetcher: Arc<MockFetcher>,
        service: CatalogService,
    }

    fn harness() -> Harness {
        let store = Arc::new(SqliteCatalog::in_memory().unwrap());
        let fetcher = Arc::new(MockFetcher::new());
        let service = CatalogService::new(store.clone(), fetcher.clone());
        Harness {
            store,
            fetcher,
            service,
        }
    }

    fn register(h: &Harness, record: RemoteBookRecord) {
        h.service.reconciler.reconcile(&record).unwrap();
    }

    fn titles(books: &[BookWithAuthors]) -> Vec<&str> {
        books.iter().map(|b| b.book.title.as_str()).collect()
    }

    #[tokio::test]
    async fn test_title_search_local_hit_skips_remote() {
        let h = harness();
        register(&h, fixtures::record("Alice's Adventures in Wonderland", "Carroll, Lewis", 1832, Some(1898)));

        let outcome = h
            .service
            .search_book_by_title(&TitleQuery::parse("wonderland").unwrap())
            .await
            .unwrap();

        let TitleSearchOutcome::Local(books) = outcome else {
            panic!("expected local hit");
        };
        assert_eq!(titles(&books), vec!["Alice's Adventures in Wonderland"]);
        assert_eq!(books[0].author_names(), vec!["carroll, lewis"]);
        assert_eq!(h.fetcher.call_count().await, 0);
    }

    #[tokio::test]
    async fn test_title_search_substring_only_goes_remote() {
        let h = harness();
        register(&h, fixtures::record("Malice Aforethought", "Iles, Francis", 1893, Some(1970)));
        h.fetcher
            .add_record(fixtures::record("Alice in Wonderland", "Carroll, Lewis", 1832, Some(1898)))
            .await;

        let outcome = h
            .service
            .search_book_by_title(&TitleQuery::parse("Alice").unwrap())
            .await
            .unwrap();

        match outcome {
            TitleSearchOutcome::Registered { saved, .. } => {
                assert_eq!(saved.book.title, "Alice in Wonderland");
            }
            other => panic!("expected remote registration, got {:?}", other),
        }
        assert_eq!(h.fetcher.queries().await, vec![Some("alice".to_string())]);
    }

    #[tokio::test]
    async fn test_title_search_remote_skips_non_whole_word_results() {
        let h = harness();
        h.fetcher
            .set_records(vec![
                fixtures::record("Dunes and Deserts", "Someone", 1900, None),
                fixtures::record("Dune", "Herbert, Frank", 1920, Some(1986)),
            ])
            .await;

        let outcome = h
            .service
            .search_book_by_title(&TitleQuery::parse("dune").unwrap())
            .await
            .unwrap();

        let TitleSearchOutcome::Registered { record, saved } = outcome else {
            panic!("expected remote registration");
        };
        assert_eq!(record.title, "Dune");
        assert_eq!(saved.book.title, "Dune");
        assert!(!h.store.book_title_exists("Dunes and Deserts").unwrap());
    }

    #[tokio::test]
    async fn test_title_search_not_found_anywhere() {
        let h = harness();
        h.fetcher
            .add_record(fixtures::record("Malice", "Someone", 1900, None))
            .await;

        let result = h
            .service
            .search_book_by_title(&TitleQuery::parse("alice").unwrap())
            .await;

        assert!(matches!(result, Err(QueryError::NotFound(_))));
        assert_eq!(h.store.stats().unwrap().total_books, 0);
    }

    #[tokio::test]
    async fn test_title_search_fetch_failure_writes_nothing() {
        let h = harness();
        h.fetcher.add_record(fixtures::record("Dune", "Herbert, Frank", 1920, None)).await;
        h.fetcher
            .fail_next(FetchError::Parse("truncated body".to_string()))
            .await;

        let result = h
            .service
            .search_book_by_title(&TitleQuery::parse("dune").unwrap())
            .await;

        let err = result.unwrap_err();
        assert!(matches!(err, QueryError::Fetch(_)));
        assert!(!err.is_expected());
        assert_eq!(h.store.stats().unwrap(), CatalogStats::default());
    }

    #[tokio::test]
    async fn test_author_search_whole_word() {
        let h = harness();
        register(&h, fixtures::record("Moby Dick", "Melville, Herman", 1819, Some(1891)));
        register(&h, fixtures::record("Hermann und Dorothea", "Goethe, Johann Wolfgang von", 1749, Some(1832)));

        let authors = h
            .service
            .search_author_by_name(&AuthorQuery::parse("Herman").unwrap())
            .unwrap();
        assert_eq!(authors.len(), 1);
        assert_eq!(authors[0].author.name, "melville, herman");
        assert_eq!(authors[0].books[0].title, "Moby Dick");

        // Comma in the stored name does not break multi-word keywords
        let authors = h
            .service
            .search_author_by_name(&AuthorQuery::parse("melville herman").unwrap())
            .unwrap();
        assert_eq!(authors.len(), 1);
    }

    #[tokio::test]
    async fn test_author_search_never_queries_remote() {
        let h = harness();
        h.fetcher
            .add_record(fixtures::record("Emma", "Austen, Jane", 1775, Some(1817)))
            .await;

        let result = h
            .service
            .search_author_by_name(&AuthorQuery::parse("austen").unwrap());

        assert!(matches!(result, Err(QueryError::NotFound(_))));
        assert_eq!(h.fetcher.call_count().await, 0);
    }

    #[tokio::test]
    async fn test_books_by_author_and_year() {
        let h = harness();
        register(&h, fixtures::record("Bounded Life", "Bounded, Author", 1800, Some(1850)));
        register(&h, fixtures::record("Later Life", "Later, Author", 1900, None));

        for year in [1800, 1825, 1850] {
            let authors = h
                .service
                .books_by_author_and_year(&YearQuery { year })
                .unwrap();
            assert_eq!(authors.len(), 1);
            assert_eq!(authors[0].author.name, "bounded, author");
            assert_eq!(authors[0].books[0].title, "Bounded Life");
        }

        let result = h.service.books_by_author_and_year(&YearQuery { year: 1851 });
        assert!(matches!(result, Err(QueryError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_languages_flow() {
        let h = harness();
        assert!(matches!(
            h.service.available_languages(),
            Err(QueryError::NotFound(_))
        ));

        let mut bilingual = fixtures::record("Bilingual", "Someone", 1900, None);
        bilingual.languages = vec!["en".to_string(), "fr".to_string()];
        register(&h, bilingual);

        let languages = h.service.available_languages().unwrap();
        assert_eq!(languages, vec!["en", "fr"]);

        let chosen = select(&languages, "2").unwrap();
        let books = h
            .service
            .books_by_language(&LanguageQuery::new(chosen).unwrap())
            .unwrap();
        assert_eq!(titles(&books), vec!["Bilingual"]);

        let upper = h
            .service
            .books_by_language(&LanguageQuery::new("FR").unwrap())
            .unwrap();
        assert_eq!(upper.len(), 1);

        assert!(matches!(
            h.service.books_by_language(&LanguageQuery::new("de").unwrap()),
            Err(QueryError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_all_books() {
        let h = harness();
        assert!(h.service.list_all_books().unwrap().is_empty());

        register(&h, fixtures::record("First", "A, B", 1900, None));
        register(&h, fixtures::record("Second", "C, D", 1900, None));

        let books = h.service.list_all_books().unwrap();
        assert_eq!(titles(&books), vec!["First", "Second"]);
        assert_eq!(books[1].author_names(), vec!["c, d"]);
    }

    #[tokio::test]
    async fn test_top_n_downloaded() {
        let h = harness();
        h.fetcher
            .set_records(vec![
                fixtures::with_downloads("Five Hundred", 500.0),
                fixtures::with_downloads("One Hundred", 100.0),
                fixtures::with_downloads("Popular", 9999.0),
                fixtures::with_downloads("Obscure", 1.0),
            ])
            .await;

        let top = h
            .service
            .top_n_downloaded(&TopDownloadsQuery::new(2).unwrap())
            .await
            .unwrap();

        let titles: Vec<&str> = top.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Popular", "Five Hundred"]);
        // Listing uses the remote catalog, never the local store
        assert_eq!(h.fetcher.queries().await, vec![None]);
        assert_eq!(h.store.stats().unwrap().total_books, 0);
    }

    #[tokio::test]
    async fn test_top_n_fetch_failure() {
        let h = harness();
        h.fetcher
            .fail_next(FetchError::Status {
                status: 500,
                message: "boom".to_string(),
            })
            .await;

        let result = h.service.top_n_downloaded(&TopDownloadsQuery::default()).await;
        assert!(matches!(result, Err(QueryError::Fetch(_))));
    }

    #[tokio::test]
    async fn test_title_search_already_registered_returns_record() {
        let inner = Arc::new(SqliteCatalog::in_memory().unwrap());
        let fetcher = Arc::new(MockFetcher::new());
        let dune = fixtures::record("Dune", "Herbert, Frank", 1920, Some(1986));
        fetcher.add_record(dune.clone()).await;

        let writer = CatalogService::new(inner.clone(), fetcher.clone());
        writer
            .search_book_by_title(&TitleQuery::parse("dune").unwrap())
            .await
            .unwrap();

        let stale = Arc::new(StaleSearchCatalog::new(inner.clone()));
        let service = CatalogService::new(stale, fetcher.clone());
        let outcome = service
            .search_book_by_title(&TitleQuery::parse("dune").unwrap())
            .await
            .unwrap();

        assert_eq!(outcome, TitleSearchOutcome::AlreadyRegistered { record: dune });
        assert_eq!(inner.stats().unwrap().total_books, 1);
        assert_eq!(fetcher.call_count().await, 2);
    }

    #[tokio::test]
    async fn test_stats_counts_registered_entities() {
        let h = harness();
        assert_eq!(h.service.stats().unwrap(), CatalogStats::default());

        let mut record = fixtures::record("Candide", "Voltaire", 1694, Some(1778));
        record.languages = vec!["fr".to_string(), "en".to_string()];
        register(&h, record);

        assert_eq!(
            h.service.stats().unwrap(),
            CatalogStats {
                total_books: 1,
                total_authors: 1,
                total_languages: 2,
            }
        );
    }

    #[test]
    fn test_rank_by_downloads_ties_keep_input_order() {
        let records = vec![
            fixtures::with_downloads("A", 10.0),
            fixtures::with_downloads("B", 50.0),
            fixtures::with_downloads("C", 10.0),
            fixtures::with_downloads("D", 50.0),
        ];

        let ranked = rank_by_downloads(records, 10);
        let titles: Vec<&str> = ranked.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["B", "D", "A", "C"]);
    }

    #[test]
    fn test_rank_by_downloads_fewer_than_n() {
        let records = vec![fixtures::with_downloads("Only", 1.0)];
        assert_eq!(rank_by_downloads(records, 10).len(), 1);
    }
}
