/// CLI Module
///
/// Command-line interface configuration using clap.
use crate::config::Config;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

/// Crawl a Solana address's signature history into SQLite and enrich every
/// stored signature with its full transaction.
#[derive(Parser, Debug)]
#[command(name = "address-history-crawler")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// RPC endpoint URL (overrides SOLANA_RPC_URL env var)
    #[arg(short = 'r', long, value_name = "URL", global = true)]
    pub rpc_url: Option<String>,

    /// Database connection URL (overrides DATABASE_URL env var)
    #[arg(short = 'd', long, value_name = "URL", global = true)]
    pub database_url: Option<String>,

    /// Requests per second allowed towards the RPC endpoint
    #[arg(long, value_name = "RPS", global = true)]
    pub rate_limit: Option<u32>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Walk the address's signature history and store each signature once
    Crawl(CrawlArgs),
    /// Fetch and store full transaction details
    Enrich(EnrichArgs),
    /// Crawl, then enrich every stored signature
    Run {
        #[command(flatten)]
        crawl: CrawlArgs,
        #[command(flatten)]
        enrich: EnrichArgs,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct CrawlArgs {
    /// Address to crawl (overrides TARGET_ADDRESS env var)
    #[arg(short = 'a', long, value_name = "ADDRESS")]
    pub address: Option<String>,

    /// Signatures requested per page
    #[arg(short = 'b', long, value_name = "SIZE")]
    pub batch_size: Option<usize>,

    /// Stop once the store holds this many signatures
    #[arg(short = 'm', long, value_name = "COUNT")]
    pub max_transactions: Option<u64>,

    /// Pause between pages in milliseconds
    #[arg(long, value_name = "MILLIS")]
    pub page_delay_ms: Option<u64>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct EnrichArgs {
    /// Enrich the signatures listed in this file instead of the stored ones
    #[arg(short = 'f', long, value_name = "PATH")]
    pub signatures_file: Option<PathBuf>,

    /// Number of concurrent enrichment workers
    #[arg(short = 'w', long, value_name = "COUNT")]
    pub workers: Option<usize>,
}

impl Cli {
    /// Layer the command-line overrides on top of the environment config.
    pub fn apply(&self, config: &mut Config) {
        if let Some(url) = &self.rpc_url {
            config.solana_rpc_url = url.clone();
        }
        if let Some(url) = &self.database_url {
            config.database_url = url.clone();
        }
        if self.rate_limit.is_some() {
            config.rpc_rate_limit = self.rate_limit;
        }

        match &self.command {
            Command::Crawl(crawl) => crawl.apply(config),
            Command::Enrich(enrich) => enrich.apply(config),
            Command::Run { crawl, enrich } => {
                crawl.apply(config);
                enrich.apply(config);
            }
        }
    }
}

impl CrawlArgs {
    fn apply(&self, config: &mut Config) {
        if let Some(address) = &self.address {
            config.target_address = Some(address.clone());
        }
        if let Some(size) = self.batch_size {
            config.batch_size = size;
        }
        if let Some(max) = self.max_transactions {
            config.max_transactions = max;
        }
        if let Some(ms) = self.page_delay_ms {
            config.page_delay = Duration::from_millis(ms);
        }
    }
}

impl EnrichArgs {
    fn apply(&self, config: &mut Config) {
        if let Some(workers) = self.workers {
            config.enrich_workers = workers;
        }
    }
}
