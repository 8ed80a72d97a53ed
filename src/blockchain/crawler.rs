//! Backward pagination walk over an address's signature history.

use crate::blockchain::client::{ClientError, SolanaClient};
use crate::blockchain::models::SignatureRecord;
use crate::db::SignatureStore;
use crate::error::PipelineError;
use std::fmt;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub address: String,
    pub batch_size: usize,
    pub max_transactions: u64,
    pub page_delay: Duration,
    pub commitment: Option<String>,
    pub seed_latest: bool,
}

/// How a crawl run ended. None of these are resumed within the same run.
#[derive(Debug)]
pub enum CrawlOutcome {
    /// The node returned an empty page.
    Exhausted,
    /// The next boundary repeated the one used on the previous page.
    Stalled,
    /// The store holds at least `max_transactions` signatures.
    LimitReached,
    /// A page fetch or store write failed.
    Aborted(PipelineError),
    Cancelled,
}

impl fmt::Display for CrawlOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exhausted => write!(f, "exhausted"),
            Self::Stalled => write!(f, "stalled"),
            Self::LimitReached => write!(f, "limit reached"),
            Self::Aborted(e) => write!(f, "aborted: {}", e),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug)]
pub struct CrawlReport {
    pub outcome: CrawlOutcome,
    pub pages: usize,
    pub new_signatures: u64,
    pub total_in_store: u64,
}

/// Cursor state for one crawl run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CrawlCursor {
    before: Option<String>,
    previous_before: Option<String>,
    total_fetched: u64,
}

/// Returned by [`CrawlCursor::advance`] when the frontier stops moving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stalled {
    pub boundary: String,
}

impl CrawlCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Boundary for the next page request; `None` asks for the newest page.
    pub fn before(&self) -> Option<&str> {
        self.before.as_deref()
    }

    pub fn previous_before(&self) -> Option<&str> {
        self.previous_before.as_deref()
    }

    pub fn total_fetched(&self) -> u64 {
        self.total_fetched
    }

    pub fn set_total_fetched(&mut self, total: u64) {
        self.total_fetched = total;
    }

    /// Signature of the page entry with the smallest block time. Missing block
    /// times sort last and ties keep page order, so the result does not depend
    /// on the node returning the page in chronological order.
    pub fn next_boundary(page: &[SignatureRecord]) -> Option<&str> {
        page.iter()
            .min_by_key(|record| (record.block_time.is_none(), record.block_time))
            .map(|record| record.signature.as_str())
    }

    /// Move the cursor to `next`. Fails without moving when `next` equals the
    /// boundary used one page earlier.
    pub fn advance(&mut self, next: &str) -> Result<(), Stalled> {
        if self.previous_before.as_deref() == Some(next) {
            return Err(Stalled {
                boundary: next.to_string(),
            });
        }

        self.previous_before = self.before.take();
        self.before = Some(next.to_string());
        Ok(())
    }
}

/// Walk the address's history backwards from the newest signature, storing
/// each signature once, until the node runs dry, the frontier stalls, the
/// store reaches `max_transactions`, or something fails.
pub async fn crawl(
    client: &SolanaClient,
    store: &SignatureStore,
    config: &CrawlConfig,
    shutdown: &CancellationToken,
) -> CrawlReport {
    info!(
        "Starting signature crawl for {} (batch size {}, max {})",
        config.address, config.batch_size, config.max_transactions
    );

    let mut report = CrawlReport {
        outcome: CrawlOutcome::Exhausted,
        pages: 0,
        new_signatures: 0,
        total_in_store: 0,
    };

    if config.seed_latest {
        match seed_latest(client, store, &config.address).await {
            Ok(true) => report.new_signatures += 1,
            Ok(false) => {}
            Err(e) => warn!("Could not seed latest signature: {}", e),
        }
    }

    let mut cursor = CrawlCursor::new();

    report.outcome = loop {
        if shutdown.is_cancelled() {
            break CrawlOutcome::Cancelled;
        }

        match crawl_page(client, store, config, &mut cursor).await {
            Ok(PageResult::Continue { new }) => {
                report.pages += 1;
                report.new_signatures += new;
            }
            Ok(PageResult::Done { new, outcome }) => {
                if !matches!(outcome, CrawlOutcome::Exhausted) {
                    report.pages += 1;
                }
                report.new_signatures += new;
                break outcome;
            }
            Err(PipelineError::Rpc(ClientError::Cancelled)) => break CrawlOutcome::Cancelled,
            Err(e) => break CrawlOutcome::Aborted(e),
        }

        tokio::select! {
            biased;
            _ = shutdown.cancelled() => break CrawlOutcome::Cancelled,
            _ = tokio::time::sleep(config.page_delay) => {}
        }
    };

    report.total_in_store = match store.count().await {
        Ok(total) => total,
        Err(e) => {
            warn!("Could not count stored signatures: {}", e);
            cursor.total_fetched()
        }
    };

    match &report.outcome {
        CrawlOutcome::Aborted(e) => error!("Signature crawl aborted: {}", e),
        outcome => info!(
            "Signature crawl finished ({}): {} pages, {} new, {} total in store",
            outcome, report.pages, report.new_signatures, report.total_in_store
        ),
    }

    report
}

enum PageResult {
    Continue { new: u64 },
    Done { new: u64, outcome: CrawlOutcome },
}

async fn crawl_page(
    client: &SolanaClient,
    store: &SignatureStore,
    config: &CrawlConfig,
    cursor: &mut CrawlCursor,
) -> Result<PageResult, PipelineError> {
    let page = client
        .get_signatures_for_address(
            &config.address,
            config.batch_size,
            cursor.before(),
            config.commitment.as_deref(),
        )
        .await?;

    if page.is_empty() {
        info!("No more transactions available.");
        return Ok(PageResult::Done {
            new: 0,
            outcome: CrawlOutcome::Exhausted,
        });
    }

    let mut new = 0;
    for record in &page {
        if store.insert_if_absent(record).await? {
            new += 1;
        }
    }

    // Count what is persisted rather than trusting a running sum
    cursor.set_total_fetched(store.count().await?);
    info!(
        "Fetched {} new transactions. Total in DB: {}",
        new,
        cursor.total_fetched()
    );

    if cursor.total_fetched() >= config.max_transactions {
        info!("Reached {} transactions. Stopping.", config.max_transactions);
        return Ok(PageResult::Done {
            new,
            outcome: CrawlOutcome::LimitReached,
        });
    }

    // Non-empty page, so there is always a candidate
    let Some(next) = CrawlCursor::next_boundary(&page) else {
        return Ok(PageResult::Done {
            new,
            outcome: CrawlOutcome::Exhausted,
        });
    };

    if let Some(oldest) = page
        .iter()
        .find(|record| record.signature == next)
        .and_then(SignatureRecord::block_time_utc)
    {
        debug!("Page reaches back to {}", oldest.format("%Y-%m-%d %H:%M:%S UTC"));
    }

    match cursor.advance(next) {
        Ok(()) => Ok(PageResult::Continue { new }),
        Err(stalled) => {
            warn!(
                "No further progress detected at {}. Ending to avoid infinite loop.",
                stalled.boundary
            );
            Ok(PageResult::Done {
                new,
                outcome: CrawlOutcome::Stalled,
            })
        }
    }
}

/// Store the single newest confirmed signature ahead of the walk.
async fn seed_latest(
    client: &SolanaClient,
    store: &SignatureStore,
    address: &str,
) -> Result<bool, PipelineError> {
    let latest = client
        .get_signatures_for_address(address, 1, None, Some("confirmed"))
        .await?;

    match latest.first() {
        Some(record) => {
            let inserted = store.insert_if_absent(record).await?;
            if inserted {
                info!("Inserted latest transaction: {}", record.signature);
            }
            Ok(inserted)
        }
        None => {
            info!("No transactions found for latest fetch.");
            Ok(false)
        }
    }
}
