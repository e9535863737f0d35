pub mod catalog;
pub mod config;
pub mod matcher;
pub mod reconciler;
pub mod remote;
pub mod service;
pub mod testing;

pub use catalog::{
    Author, AuthorId, AuthorWithBooks, Book, BookId, BookWithAuthors, CatalogError,
    CatalogStats, CatalogStore, SqliteCatalog,
};
pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, Config,
    ConfigError,
};
pub use reconciler::{ReconcileOutcome, Reconciler};
pub use remote::{FetchError, Fetcher, GutendexClient, RemoteAuthor, RemoteBookRecord};
pub use service::{
    select, AuthorQuery, CatalogService, LanguageQuery, QueryError, TitleQuery,
    TitleSearchOutcome, TopDownloadsQuery, YearQuery,
};
