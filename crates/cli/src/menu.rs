//! Interactive line-oriented menu.

use std::io::{BufRead, Write};

use anyhow::Result;
use tracing::{debug, error};

use libris_core::{
    select, Author, AuthorQuery, AuthorWithBooks, BookWithAuthors, CatalogService,
    LanguageQuery, QueryError, RemoteBookRecord, TitleQuery, TitleSearchOutcome,
    TopDownloadsQuery, YearQuery,
};

const MENU: &str = "
    **Libris**
Choose an option:
1 - Search book by title (registers remote hits)
2 - Search authors
3 - Books by authors alive in a year
4 - Books by language
5 - List all registered books
6 - Top most downloaded books
0 - Exit
";

/// Menu loop over any input and output.
pub struct Menu<'a, R, W> {
    service: &'a CatalogService,
    top_n: usize,
    input: R,
    output: W,
}

impl<'a, R: BufRead, W: Write> Menu<'a, R, W> {
    pub fn new(service: &'a CatalogService, top_n: usize, input: R, output: W) -> Self {
        Self {
            service,
            top_n,
            input,
            output,
        }
    }

    /// Run until the user picks `0` or input ends.
    pub async fn run(&mut self) -> Result<()> {
        loop {
            write!(self.output, "{}", MENU)?;
            self.output.flush()?;

            let Some(line) = self.read_line()? else {
                debug!("End of input, leaving menu");
                break;
            };

            let option: u32 = match line.trim().parse() {
                Ok(option) => option,
                Err(_) => {
                    writeln!(self.output, "Invalid input, please enter a whole number.")?;
                    continue;
                }
            };

            let result = match option {
                0 => {
                    writeln!(self.output, "Closing the application...")?;
                    break;
                }
                1 => self.search_book().await,
                2 => self.search_author(),
                3 => self.authors_alive_in_year(),
                4 => self.books_by_language(),
                5 => self.list_books(),
                6 => self.top_downloaded().await,
                _ => {
                    writeln!(self.output, "Invalid option")?;
                    continue;
                }
            };

            if let Err(e) = result {
                self.report(e)?;
            }
        }

        Ok(())
    }

    async fn search_book(&mut self) -> Result<(), MenuError> {
        let Some(raw) = self.prompt("Enter a keyword to search for a book:")? else {
            return Ok(());
        };
        let query = TitleQuery::parse(&raw)?;

        match self.service.search_book_by_title(&query).await? {
            TitleSearchOutcome::Local(books) => {
                writeln!(self.output, "\nAlready registered in the catalog:\n")?;
                for book in &books {
                    self.write_book(book)?;
                }
            }
            TitleSearchOutcome::Registered { record, .. } => {
                writeln!(self.output, "\nBook found remotely:\n")?;
                self.write_remote(&record)?;
                writeln!(self.output, "The book has been registered in the catalog.")?;
            }
            TitleSearchOutcome::AlreadyRegistered { record } => {
                writeln!(self.output, "\nBook found remotely:\n")?;
                self.write_remote(&record)?;
                writeln!(
                    self.output,
                    "The book already exists in the catalog: {}",
                    record.title
                )?;
            }
        }
        Ok(())
    }

    fn search_author(&mut self) -> Result<(), MenuError> {
        let Some(raw) = self.prompt("Enter a keyword to search for an author:")? else {
            return Ok(());
        };
        let query = AuthorQuery::parse(&raw)?;
        let authors = self.service.search_author_by_name(&query)?;

        let chosen = if authors.len() == 1 {
            &authors[0]
        } else {
            writeln!(self.output, "\nSeveral authors found. Choose one:")?;
            for (i, found) in authors.iter().enumerate() {
                writeln!(self.output, "{}. {}", i + 1, found.author.name)?;
            }
            let Some(raw) = self.prompt("\nEnter the author's number:")? else {
                return Ok(());
            };
            select(&authors, &raw)?
        };

        writeln!(self.output, "\nAuthor found:")?;
        self.write_author(chosen)?;
        Ok(())
    }

    fn authors_alive_in_year(&mut self) -> Result<(), MenuError> {
        let Some(raw) = self.prompt("Enter the year to filter authors by:")? else {
            return Ok(());
        };
        let query = YearQuery::parse(&raw)?;
        let authors = self.service.books_by_author_and_year(&query)?;

        writeln!(self.output, "Authors alive in {}:", query.year)?;
        for (i, found) in authors.iter().enumerate() {
            let author = &found.author;
            writeln!(
                self.output,
                "{} - {} (born: {}, died: {})",
                i + 1,
                author.name,
                year_or_na(author.birth_year),
                year_or_na(author.death_year)
            )?;
        }

        let Some(raw) = self.prompt("Choose an author (enter the number):")? else {
            return Ok(());
        };
        let chosen = select(&authors, &raw)?;

        if chosen.books.is_empty() {
            writeln!(self.output, "{} has no registered books.", chosen.author.name)?;
        } else {
            writeln!(self.output, "Books by {}:", chosen.author.name)?;
            for book in &chosen.books {
                writeln!(self.output, " - {}", book.title)?;
            }
        }
        Ok(())
    }

    fn books_by_language(&mut self) -> Result<(), MenuError> {
        let languages = self.service.available_languages()?;

        writeln!(self.output, "Available languages:")?;
        for (i, code) in languages.iter().enumerate() {
            writeln!(self.output, "{} - {}", i + 1, code)?;
        }

        let Some(raw) = self.prompt("Choose a language (enter the number):")? else {
            return Ok(());
        };
        let code = select(&languages, &raw)?;
        let books = self.service.books_by_language(&LanguageQuery::new(code)?)?;

        writeln!(self.output, "Books available in {}:", code)?;
        for found in &books {
            writeln!(self.output, " - {}", found.book.title)?;
        }
        Ok(())
    }

    fn list_books(&mut self) -> Result<(), MenuError> {
        let books = self.service.list_all_books()?;
        if books.is_empty() {
            writeln!(self.output, "No books registered yet.")?;
            return Ok(());
        }

        writeln!(self.output, "Registered books:")?;
        for book in &books {
            writeln!(self.output, "****** Book *******")?;
            self.write_book(book)?;
            writeln!(self.output, "*******************\n")?;
        }
        Ok(())
    }

    async fn top_downloaded(&mut self) -> Result<(), MenuError> {
        let query = TopDownloadsQuery::new(self.top_n)?;
        let records = self.service.top_n_downloaded(&query).await?;

        writeln!(self.output, "  Top {} most downloaded books:\n", query.n())?;
        for (i, record) in records.iter().enumerate() {
            writeln!(self.output, "{}. {}", i + 1, record.title.to_uppercase())?;
        }
        Ok(())
    }

    fn write_book(&mut self, found: &BookWithAuthors) -> std::io::Result<()> {
        writeln!(self.output, "Title: {}", found.book.title)?;
        writeln!(self.output, "Languages: {}", found.book.languages.join(", "))?;
        writeln!(self.output, "Downloads: {}", found.book.download_count)?;
        writeln!(self.output, "Authors: {}", found.author_names().join(", "))
    }

    fn write_remote(&mut self, record: &RemoteBookRecord) -> std::io::Result<()> {
        writeln!(self.output, "Title: {}", record.title)?;
        writeln!(self.output, "Languages: {}", record.languages.join(", "))?;
        writeln!(self.output, "Downloads: {}", record.download_count)?;
        writeln!(self.output, "Authors: {}", record.author_names().join(", "))
    }

    fn write_author(&mut self, found: &AuthorWithBooks) -> std::io::Result<()> {
        let Author {
            name,
            birth_year,
            death_year,
            ..
        } = &found.author;
        let titles: Vec<&str> = found.books.iter().map(|b| b.title.as_str()).collect();

        writeln!(self.output, "Name: {}", name)?;
        writeln!(self.output, "Born: {}", year_or_na(*birth_year))?;
        writeln!(self.output, "Died: {}", year_or_na(*death_year))?;
        writeln!(self.output, "Books: {}", titles.join(", "))?;
        writeln!(self.output, "*******************\n")
    }

    fn report(&mut self, err: MenuError) -> Result<()> {
        match err {
            MenuError::Io(e) => Err(e.into()),
            MenuError::Query(e) => {
                if !e.is_expected() {
                    error!("Operation failed: {}", e);
                }
                writeln!(self.output, "{}", e)?;
                Ok(())
            }
        }
    }

    fn prompt(&mut self, message: &str) -> std::io::Result<Option<String>> {
        writeln!(self.output, "{}", message)?;
        self.output.flush()?;
        self.read_line()
    }

    /// Next input line without its terminator; `None` at end of input.
    fn read_line(&mut self) -> std::io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

/// Failure of one menu action: a query outcome to show, or broken I/O.
#[derive(Debug, thiserror::Error)]
enum MenuError {
    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn year_or_na(year: Option<i32>) -> String {
    year.map_or_else(|| "N/A".to_string(), |y| y.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use libris_core::testing::{fixtures, MockFetcher, StaleSearchCatalog};
    use libris_core::SqliteCatalog;

    fn service_with(fetcher: Arc<MockFetcher>) -> CatalogService {
        let store = Arc::new(SqliteCatalog::in_memory().unwrap());
        CatalogService::new(store, fetcher)
    }

    async fn run_script(service: &CatalogService, script: &str) -> String {
        let mut output = Vec::new();
        Menu::new(service, 10, script.as_bytes(), &mut output)
            .run()
            .await
            .unwrap();
        String::from_utf8(output).unwrap()
    }

    #[tokio::test]
    async fn test_exit_option() {
        let service = service_with(Arc::new(MockFetcher::new()));
        let out = run_script(&service, "0\n").await;
        assert!(out.contains("**Libris**"));
        assert!(out.contains("Closing the application..."));
    }

    #[tokio::test]
    async fn test_end_of_input_leaves_loop() {
        let service = service_with(Arc::new(MockFetcher::new()));
        let out = run_script(&service, "").await;
        assert!(out.contains("0 - Exit"));
        assert!(!out.contains("Closing"));
    }

    #[tokio::test]
    async fn test_bad_option_input() {
        let service = service_with(Arc::new(MockFetcher::new()));
        let out = run_script(&service, "abc\n9\n0\n").await;
        assert!(out.contains("Invalid input, please enter a whole number."));
        assert!(out.contains("Invalid option"));
    }

    #[tokio::test]
    async fn test_search_registers_then_finds_locally() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher
            .add_record(fixtures::record("Dune", "Herbert, Frank", 1920, Some(1986)))
            .await;
        let service = service_with(fetcher.clone());

        let out = run_script(&service, "1\ndune\n1\nDune\n0\n").await;
        assert!(out.contains("Book found remotely:"));
        assert!(out.contains("The book has been registered in the catalog."));
        assert!(out.contains("Already registered in the catalog:"));
        assert!(out.contains("Authors: herbert, frank"));
        assert_eq!(fetcher.call_count().await, 1);
    }

    #[tokio::test]
    async fn test_search_already_registered_shows_remote_record() {
        let inner = Arc::new(SqliteCatalog::in_memory().unwrap());
        let fetcher = Arc::new(MockFetcher::new());
        fetcher
            .add_record(fixtures::record("Dune", "Herbert, Frank", 1920, Some(1986)))
            .await;
        run_script(&CatalogService::new(inner.clone(), fetcher.clone()), "1\ndune\n0\n").await;

        let stale = CatalogService::new(Arc::new(StaleSearchCatalog::new(inner)), fetcher);
        let out = run_script(&stale, "1\ndune\n0\n").await;

        let details = out.find("Title: Dune").expect("remote details printed");
        let notice = out
            .find("The book already exists in the catalog: Dune")
            .expect("already-registered notice printed");
        assert!(details < notice);
        assert!(out.contains("Authors: Herbert, Frank"));
        assert!(!out.contains("has been registered"));
    }

    #[tokio::test]
    async fn test_search_not_found_keeps_running() {
        let service = service_with(Arc::new(MockFetcher::new()));
        let out = run_script(&service, "1\nnothing\n5\n0\n").await;
        assert!(out.contains("Nothing found: no book titled with 'nothing'"));
        assert!(out.contains("No books registered yet."));
        assert!(out.contains("Closing the application..."));
    }

    #[tokio::test]
    async fn test_author_pick_among_several() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher
            .set_records(vec![
                fixtures::record("Emma", "Austen, Jane", 1775, Some(1817)),
                fixtures::record("Jane Eyre", "Bronte, Charlotte", 1816, Some(1855)),
                fixtures::record("Lady Susan", "Jane, Lady", 1800, None),
            ])
            .await;
        let service = service_with(fetcher);

        let out = run_script(&service, "1\nemma\n1\nlady susan\n2\njane\n5\n0\n").await;
        assert!(out.contains("Several authors found. Choose one:"));
        assert!(out.contains("Invalid selection 5: choose a number between 1 and 2"));

        let out = run_script(&service, "2\njane\n2\n0\n").await;
        assert!(out.contains("Name: jane, lady"));
        assert!(out.contains("Died: N/A"));
        assert!(out.contains("Books: Lady Susan"));
    }

    #[tokio::test]
    async fn test_year_filter_lists_books() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher
            .add_record(fixtures::record("Moby Dick", "Melville, Herman", 1819, Some(1891)))
            .await;
        let service = service_with(fetcher);

        let out = run_script(&service, "1\nmoby\n3\n1850\n1\n3\nyear\n0\n").await;
        assert!(out.contains("1 - melville, herman (born: 1819, died: 1891)"));
        assert!(out.contains("Books by melville, herman:"));
        assert!(out.contains(" - Moby Dick"));
        assert!(out.contains("Invalid input"));
    }

    #[tokio::test]
    async fn test_language_filter() {
        let fetcher = Arc::new(MockFetcher::new());
        let mut record = fixtures::record("Candide", "Voltaire", 1694, Some(1778));
        record.languages = vec!["fr".to_string()];
        fetcher.add_record(record).await;
        let service = service_with(fetcher);

        let out = run_script(&service, "4\n1\ncandide\n4\n1\n0\n").await;
        assert!(out.contains("Nothing found"));
        assert!(out.contains("1 - fr"));
        assert!(out.contains("Books available in fr:"));
        assert!(out.contains(" - Candide"));
    }

    #[tokio::test]
    async fn test_top_downloaded_uppercases_titles() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher
            .set_records(vec![
                fixtures::with_downloads("small", 1.0),
                fixtures::with_downloads("Big Book", 50.0),
            ])
            .await;
        let service = service_with(fetcher);

        let out = run_script(&service, "6\n0\n").await;
        assert!(out.contains("Top 10 most downloaded books:"));
        assert!(out.contains("1. BIG BOOK\n2. SMALL\n"));
    }
}
