//! Detail enrichment: fetch every known signature's full transaction and
//! upsert it with its derived fields.

use crate::blockchain::client::{ClientError, SolanaClient};
use crate::blockchain::worker_pool::WorkerPool;
use crate::db::{DetailStore, SignatureStore, UpsertOutcome};
use crate::error::PipelineError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct EnrichConfig {
    pub workers: usize,
    pub detail_delay: Duration,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            detail_delay: Duration::from_millis(500),
        }
    }
}

/// Everything a worker needs to enrich one signature.
pub struct EnrichContext {
    pub client: Arc<SolanaClient>,
    pub store: DetailStore,
    pub detail_delay: Duration,
    pub shutdown: CancellationToken,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrichOutcome {
    Created,
    Modified,
    Unchanged,
    /// The node has no transaction for this signature (yet).
    NotFound,
    Failed(String),
    /// Shutdown arrived while the fetch was waiting out a rate limit.
    Cancelled,
}

impl From<UpsertOutcome> for EnrichOutcome {
    fn from(outcome: UpsertOutcome) -> Self {
        match outcome {
            UpsertOutcome::Created => Self::Created,
            UpsertOutcome::Modified => Self::Modified,
            UpsertOutcome::Unchanged => Self::Unchanged,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SignatureReport {
    pub signature: String,
    pub outcome: EnrichOutcome,
}

#[derive(Debug, Default, Clone)]
pub struct EnrichReport {
    pub total: usize,
    pub created: usize,
    pub modified: usize,
    pub unchanged: usize,
    pub not_found: Vec<String>,
    pub failed: Vec<(String, String)>,
    /// Never attempted, or abandoned mid-backoff, because the pass was cancelled.
    pub skipped: usize,
}

impl EnrichReport {
    fn record(&mut self, report: SignatureReport) {
        match report.outcome {
            EnrichOutcome::Created => self.created += 1,
            EnrichOutcome::Modified => self.modified += 1,
            EnrichOutcome::Unchanged => self.unchanged += 1,
            EnrichOutcome::NotFound => self.not_found.push(report.signature),
            EnrichOutcome::Failed(reason) => self.failed.push((report.signature, reason)),
            // Counted as skipped
            EnrichOutcome::Cancelled => {}
        }
    }

    pub fn attempted(&self) -> usize {
        self.created + self.modified + self.unchanged + self.not_found.len() + self.failed.len()
    }

    pub fn saved(&self) -> usize {
        self.created + self.modified + self.unchanged
    }
}

/// Fetch, derive and upsert a single signature. Never fails: every problem is
/// folded into the outcome so one signature cannot stop the pass.
pub async fn enrich_signature(
    client: &SolanaClient,
    store: &DetailStore,
    signature: &str,
) -> EnrichOutcome {
    debug!("Fetching transaction details for: {}", signature);

    let detail = match client.get_transaction(signature).await {
        Ok(Some(detail)) => detail,
        Ok(None) => {
            warn!("Transaction {} not found or not available", signature);
            return EnrichOutcome::NotFound;
        }
        Err(ClientError::Cancelled) => {
            debug!("Fetch of {} cancelled", signature);
            return EnrichOutcome::Cancelled;
        }
        Err(e) => {
            warn!("Error fetching transaction {}: {}", signature, e);
            return EnrichOutcome::Failed(e.to_string());
        }
    };

    match store.upsert(&detail).await {
        Ok(UpsertOutcome::Unchanged) => {
            debug!("Transaction {} already exists. No changes made.", signature);
            EnrichOutcome::Unchanged
        }
        Ok(outcome) => {
            info!("Transaction {} saved ({:?})", signature, outcome);
            outcome.into()
        }
        Err(e) => {
            warn!("Error saving transaction {}: {}", signature, e);
            EnrichOutcome::Failed(e.to_string())
        }
    }
}

/// Enrich `signatures` on a bounded worker pool. One worker reproduces the
/// strictly sequential pass.
pub async fn enrich(
    client: Arc<SolanaClient>,
    store: DetailStore,
    signatures: Vec<String>,
    config: &EnrichConfig,
    shutdown: &CancellationToken,
) -> EnrichReport {
    let mut report = EnrichReport {
        total: signatures.len(),
        ..EnrichReport::default()
    };

    if signatures.is_empty() {
        info!("No signatures to enrich");
        return report;
    }

    let worker_count = config.workers.clamp(1, signatures.len());
    info!(
        "Fetching transaction details for {} signatures with {} workers",
        signatures.len(),
        worker_count
    );

    let ctx = Arc::new(EnrichContext {
        client,
        store,
        detail_delay: config.detail_delay,
        shutdown: shutdown.clone(),
    });

    let (report_tx, mut report_rx) = mpsc::unbounded_channel();
    let pool = WorkerPool::new(ctx, worker_count, report_tx);
    let sender = pool.get_sender();

    for signature in signatures {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            sent = sender.send(signature) => {
                if sent.is_err() {
                    break;
                }
            }
        }
    }
    drop(sender);

    pool.shutdown().await;

    while let Some(signature_report) = report_rx.recv().await {
        report.record(signature_report);
    }

    report.skipped = report.total - report.attempted();

    info!(
        "Enrichment finished: {} created, {} modified, {} unchanged, {} not found, {} failed, {} skipped",
        report.created,
        report.modified,
        report.unchanged,
        report.not_found.len(),
        report.failed.len(),
        report.skipped
    );

    report
}

/// Re-enrich every signature currently in the signature store. Relies on the
/// idempotent upsert instead of tracking which signatures are already done.
pub async fn enrich_all(
    client: Arc<SolanaClient>,
    signatures: &SignatureStore,
    details: DetailStore,
    config: &EnrichConfig,
    shutdown: &CancellationToken,
) -> Result<EnrichReport, PipelineError> {
    let keys = signatures.distinct_signatures().await?;
    Ok(enrich(client, details, keys, config, shutdown).await)
}
