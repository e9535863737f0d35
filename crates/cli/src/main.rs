mod menu;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use libris_core::{
    load_config, load_config_from_env, validate_config, CatalogService, CatalogStore,
    Fetcher, GutendexClient, SqliteCatalog,
};

use menu::Menu;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Logs to stderr, stdout belongs to the menu
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    // Determine config path
    let config_path = std::env::var("LIBRIS_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("libris.toml"));

    // Without a file: defaults plus LIBRIS_* overrides
    let config = if config_path.exists() {
        info!("Loading configuration from {:?}", config_path);
        load_config(&config_path)
            .with_context(|| format!("Failed to load config from {:?}", config_path))?
    } else {
        info!("No config file at {:?}, using defaults", config_path);
        load_config_from_env().context("Failed to load config from environment")?
    };

    validate_config(&config).context("Configuration validation failed")?;
    info!("Database path: {:?}", config.database.path);
    info!("Remote source: {}", config.remote.base_url);

    let store: Arc<dyn CatalogStore> = Arc::new(
        SqliteCatalog::new(&config.database.path).context("Failed to open book catalog")?,
    );

    let fetcher: Arc<dyn Fetcher> = Arc::new(
        GutendexClient::new(&config.remote).context("Failed to create Gutendex client")?,
    );

    let service = CatalogService::new(store, fetcher);

    let stats = service.stats().context("Failed to read catalog stats")?;
    info!(
        "Catalog: {} books, {} authors, {} languages",
        stats.total_books, stats.total_authors, stats.total_languages
    );

    let stdin = io::stdin();
    let stdout = io::stdout();
    Menu::new(&service, config.query.top_n, stdin.lock(), stdout.lock())
        .run()
        .await?;

    info!("Bye");
    Ok(())
}
