// Configuration structure for:
// - RPC endpoint URL and target address
// - Database connection string
// - Crawl pagination limits and pacing
// - Enrichment concurrency and pacing

use crate::blockchain::crawler::CrawlConfig;
use crate::blockchain::enricher::EnrichConfig;
use crate::validation::{validate_solana_address, ValidationError};
use dotenv::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Largest page `getSignaturesForAddress` will serve.
pub const MAX_BATCH_SIZE: usize = 1000;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub solana_rpc_url: String,
    pub target_address: Option<String>,
    pub batch_size: usize,
    pub max_transactions: u64,
    pub page_delay: Duration,
    pub detail_delay: Duration,
    pub rate_limit_backoff: Duration,
    pub rpc_timeout_secs: u64,
    pub rpc_rate_limit: Option<u32>,
    pub enrich_workers: usize,
    pub solana_commitment_level: Option<String>,
    pub seed_latest: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite:data.db".to_string(),
            solana_rpc_url: "https://api.mainnet-beta.solana.com".to_string(),
            target_address: None,
            batch_size: MAX_BATCH_SIZE,
            max_transactions: 200,
            page_delay: Duration::from_secs(2),
            detail_delay: Duration::from_millis(500),
            rate_limit_backoff: Duration::from_secs(60),
            rpc_timeout_secs: 30,
            rpc_rate_limit: None,
            enrich_workers: 1,
            solana_commitment_level: None,
            seed_latest: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let defaults = Self::default();

        Self {
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            solana_rpc_url: env::var("SOLANA_RPC_URL").unwrap_or(defaults.solana_rpc_url),
            target_address: env::var("TARGET_ADDRESS").ok().filter(|a| !a.trim().is_empty()),
            batch_size: parse_var("CRAWL_BATCH_SIZE").unwrap_or(defaults.batch_size),
            max_transactions: parse_var("CRAWL_MAX_TRANSACTIONS").unwrap_or(defaults.max_transactions),
            page_delay: parse_var("CRAWL_PAGE_DELAY_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.page_delay),
            detail_delay: parse_var("ENRICH_DELAY_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.detail_delay),
            rate_limit_backoff: parse_var("RATE_LIMIT_BACKOFF_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.rate_limit_backoff),
            rpc_timeout_secs: parse_var("RPC_TIMEOUT_SECS").unwrap_or(defaults.rpc_timeout_secs),
            rpc_rate_limit: parse_var("RPC_RATE_LIMIT"),
            enrich_workers: parse_workers(env::var("ENRICH_WORKERS").ok().as_deref())
                .unwrap_or(defaults.enrich_workers),
            solana_commitment_level: env::var("SOLANA_COMMITMENT_LEVEL").ok(),
            seed_latest: parse_var("CRAWL_SEED_LATEST").unwrap_or(defaults.seed_latest),
        }
    }

    /// Check the numeric limits and, when set, the target address.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.batch_size == 0 || self.batch_size > MAX_BATCH_SIZE {
            return Err(ValidationError::InvalidParameter(format!(
                "batch size must be between 1 and {}, got {}",
                MAX_BATCH_SIZE, self.batch_size
            )));
        }

        if self.max_transactions == 0 {
            return Err(ValidationError::InvalidParameter(
                "max transactions must be greater than 0".to_string(),
            ));
        }

        if self.enrich_workers == 0 {
            return Err(ValidationError::InvalidParameter(
                "enrich workers must be greater than 0".to_string(),
            ));
        }

        if let Some(level) = &self.solana_commitment_level {
            if !matches!(level.as_str(), "processed" | "confirmed" | "finalized") {
                return Err(ValidationError::InvalidParameter(format!(
                    "unknown commitment level: {}",
                    level
                )));
            }
        }

        if let Some(address) = &self.target_address {
            validate_solana_address(address)?;
        }

        Ok(())
    }

    pub fn crawl_config(&self, address: &str) -> CrawlConfig {
        CrawlConfig {
            address: address.to_string(),
            batch_size: self.batch_size,
            max_transactions: self.max_transactions,
            page_delay: self.page_delay,
            commitment: self.solana_commitment_level.clone(),
            seed_latest: self.seed_latest,
        }
    }

    pub fn enrich_config(&self) -> EnrichConfig {
        EnrichConfig {
            workers: self.enrich_workers,
            detail_delay: self.detail_delay,
        }
    }
}

/// Worker count from `ENRICH_WORKERS`; `auto` means one per CPU.
fn parse_workers(value: Option<&str>) -> Option<usize> {
    match value.map(str::trim)? {
        "auto" => Some(num_cpus::get()),
        count => count.parse().ok(),
    }
}

fn parse_var<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
