pub mod blockchain;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod input;
pub mod validation;

#[cfg(test)]
pub mod tests;

// Re-export specific items for convenience
pub use blockchain::{crawl, enrich, enrich_all, SolanaClient};
pub use config::Config;
pub use db::{connection, migration, DetailStore, SignatureStore};
pub use error::PipelineError;
pub use validation::{validate_signature, validate_solana_address};
