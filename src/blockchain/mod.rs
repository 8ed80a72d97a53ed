pub mod client;
pub mod crawler;
pub mod enricher;
pub mod models;
pub mod worker_pool;

// Re-exports for convenience
pub use client::{ClientError, SolanaClient};
pub use crawler::{crawl, CrawlConfig, CrawlCursor, CrawlOutcome, CrawlReport};
pub use enricher::{enrich, enrich_all, EnrichConfig, EnrichOutcome, EnrichReport};
pub use models::{SignatureRecord, TransactionDetail, TxStatus};
