use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{Semaphore, mpsc};
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::ingest_file;
use crate::registry::SampleRegistry;

#[derive(Debug, thiserror::Error)]
#[error("ingest queue is closed, {0:?} was not queued")]
pub struct SubmitError(pub PathBuf);

/// Sending side of the ingest queue, shared by upload handlers.
#[derive(Debug, Clone)]
pub struct IngestHandle {
    tx: mpsc::Sender<PathBuf>,
}

impl IngestHandle {
    /// Queues a scratch file for ingestion, waiting while the queue is full.
    pub async fn submit(&self, path: PathBuf) -> Result<(), SubmitError> {
        self.tx.send(path).await.map_err(|e| SubmitError(e.0))
    }
}

/// Bounded pool running queued ingestions in the background.
pub struct IngestPool {
    dispatcher: JoinHandle<()>,
}

impl IngestPool {
    pub fn spawn<S>(
        registry: S,
        workers: usize,
        queue_capacity: usize,
        cancel: CancellationToken,
    ) -> (IngestHandle, Self)
    where
        S: SampleRegistry,
    {
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let dispatcher = tokio::spawn(run_dispatcher(registry, rx, workers.max(1), cancel));

        (IngestHandle { tx }, Self { dispatcher })
    }

    /// Resolves once `cancel` has fired and every queued and running
    /// ingestion has finished.
    pub async fn join(self) {
        if let Err(e) = self.dispatcher.await {
            error!(error = ?e, "Ingest dispatcher panicked");
        }
    }
}

async fn run_dispatcher<S>(
    registry: S,
    mut rx: mpsc::Receiver<PathBuf>,
    workers: usize,
    cancel: CancellationToken,
) where
    S: SampleRegistry,
{
    let permits = Arc::new(Semaphore::new(workers));
    let mut jobs = JoinSet::new();
    info!(workers, "Ingest pool started");

    loop {
        let path = tokio::select! {
            _ = cancel.cancelled() => break,
            Some(path) = rx.recv() => path,
            else => break,
        };

        start_job(&registry, &permits, &mut jobs, path).await;

        while let Some(result) = jobs.try_join_next() {
            log_join(result);
        }
    }

    rx.close();
    while let Some(path) = rx.recv().await {
        start_job(&registry, &permits, &mut jobs, path).await;
    }

    while let Some(result) = jobs.join_next().await {
        log_join(result);
    }

    info!("Ingest pool shut down");
}

async fn start_job<S>(
    registry: &S,
    permits: &Arc<Semaphore>,
    jobs: &mut JoinSet<()>,
    path: PathBuf,
) where
    S: SampleRegistry,
{
    let Ok(permit) = permits.clone().acquire_owned().await else {
        error!(path = ?path, "Ingest pool closed, dropping upload");
        return;
    };

    debug!(path = ?path, "Starting ingestion");
    let registry = registry.clone();
    jobs.spawn(async move {
        let _permit = permit;
        // failures are logged by ingest_file
        let _ = ingest_file(&registry, &path).await;
    });
}

fn log_join(result: Result<(), JoinError>) {
    if let Err(e) = result {
        error!(error = ?e, "Ingestion task panicked");
    }
}
