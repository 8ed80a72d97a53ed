// Load configuration (env, then CLI overrides)
// Set up logging
// Create database connection pool and stores
// Run the crawl and/or enrichment pass until done or Ctrl-C

use address_history_crawler::blockchain::{
    crawl, enrich, enrich_all, CrawlOutcome, EnrichReport, SolanaClient,
};
use address_history_crawler::cli::{Cli, Command, EnrichArgs};
use address_history_crawler::config::Config;
use address_history_crawler::db::{establish_connection, DetailStore, SignatureStore};
use address_history_crawler::error::PipelineError;
use address_history_crawler::input::load_signatures;
use address_history_crawler::validation::ValidationError;
use clap::Parser;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    // Load configuration
    let mut config = Config::from_env();
    cli.apply(&mut config);
    config.validate()?;
    tracing::info!("Configuration loaded: {:?}", config);

    // Setup database connection
    let db_pool = establish_connection(&config.database_url).await?;
    tracing::info!("Database connection established");

    let signatures = SignatureStore::new(db_pool.clone());
    let details = DetailStore::new(db_pool);

    let shutdown = CancellationToken::new();
    let client = Arc::new(SolanaClient::new(&config)?.with_shutdown(shutdown.clone()));

    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Ctrl-C received, stopping after the current request");
            ctrl_c.cancel();
        }
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Second Ctrl-C received, exiting immediately");
            std::process::exit(130);
        }
    });

    match &cli.command {
        Command::Crawl(_) => {
            run_crawl(&client, &signatures, &config, &shutdown).await?;
        }
        Command::Enrich(args) => {
            run_enrich(client, &signatures, details, &config, args, &shutdown).await?;
        }
        Command::Run { enrich: args, .. } => {
            run_crawl(&client, &signatures, &config, &shutdown).await?;
            if !shutdown.is_cancelled() {
                run_enrich(client, &signatures, details, &config, args, &shutdown).await?;
            }
        }
    }

    Ok(())
}

async fn run_crawl(
    client: &SolanaClient,
    store: &SignatureStore,
    config: &Config,
    shutdown: &CancellationToken,
) -> Result<(), PipelineError> {
    let address = config
        .target_address
        .as_deref()
        .ok_or_else(|| ValidationError::MissingParameter("address".to_string()))?;

    let report = crawl(client, store, &config.crawl_config(address), shutdown).await;

    // An aborted crawl still leaves whatever it stored; enrichment can proceed
    if let CrawlOutcome::Aborted(e) = &report.outcome {
        tracing::error!("Crawl ended early after {} pages: {}", report.pages, e);
    }

    Ok(())
}

async fn run_enrich(
    client: Arc<SolanaClient>,
    signatures: &SignatureStore,
    details: DetailStore,
    config: &Config,
    args: &EnrichArgs,
    shutdown: &CancellationToken,
) -> Result<EnrichReport, PipelineError> {
    let enrich_config = config.enrich_config();

    let report = match &args.signatures_file {
        Some(path) => {
            let keys = load_signatures(path).await?;
            enrich(client, details, keys, &enrich_config, shutdown).await
        }
        None => enrich_all(client, signatures, details, &enrich_config, shutdown).await?,
    };

    for (signature, reason) in &report.failed {
        tracing::warn!("Could not fetch or save transaction {}: {}", signature, reason);
    }

    Ok(report)
}
