use crate::blockchain::enricher::{enrich_signature, EnrichContext, SignatureReport};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// Fixed set of tasks pulling signatures off one shared queue.
pub struct WorkerPool {
    workers: Vec<WorkerHandle>,
    sender: mpsc::Sender<String>,
}

struct WorkerHandle {
    id: usize,
    handle: tokio::task::JoinHandle<()>,
}

impl WorkerPool {
    pub fn new(
        ctx: Arc<EnrichContext>,
        worker_count: usize,
        reports: mpsc::UnboundedSender<SignatureReport>,
    ) -> Self {
        let (sender, receiver) = mpsc::channel(worker_count * 2);
        let receiver = Arc::new(tokio::sync::Mutex::new(receiver));

        let mut workers = Vec::with_capacity(worker_count);

        for id in 0..worker_count {
            let worker = Worker {
                id,
                ctx: ctx.clone(),
                receiver: receiver.clone(),
                reports: reports.clone(),
            };

            let handle = tokio::spawn(async move {
                worker.run().await;
            });

            workers.push(WorkerHandle { id, handle });
        }

        Self { workers, sender }
    }

    pub fn get_sender(&self) -> mpsc::Sender<String> {
        self.sender.clone()
    }

    /// Close the queue and wait for every worker to drain it.
    pub async fn shutdown(self) {
        drop(self.sender);

        let (ids, handles): (Vec<_>, Vec<_>) =
            self.workers.into_iter().map(|w| (w.id, w.handle)).unzip();

        for (id, result) in ids.into_iter().zip(futures::future::join_all(handles).await) {
            if let Err(e) = result {
                error!("Worker {} terminated abnormally: {}", id, e);
            }
        }
    }
}

struct Worker {
    id: usize,
    ctx: Arc<EnrichContext>,
    receiver: Arc<tokio::sync::Mutex<mpsc::Receiver<String>>>,
    reports: mpsc::UnboundedSender<SignatureReport>,
}

impl Worker {
    async fn run(&self) {
        debug!("Worker {} started", self.id);

        loop {
            if self.ctx.shutdown.is_cancelled() {
                info!("Worker {} cancelled", self.id);
                break;
            }

            let signature = {
                let mut receiver = self.receiver.lock().await;
                match receiver.recv().await {
                    Some(signature) => signature,
                    None => break,
                }
            };

            let outcome = enrich_signature(&self.ctx.client, &self.ctx.store, &signature).await;

            if self.reports.send(SignatureReport { signature, outcome }).is_err() {
                error!("Worker {} lost its report channel", self.id);
                break;
            }

            // Courtesy pause between detail fetches
            tokio::select! {
                _ = tokio::time::sleep(self.ctx.detail_delay) => {}
                _ = self.ctx.shutdown.cancelled() => {}
            }
        }

        debug!("Worker {} shutting down", self.id);
    }
}
