mod pool;

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use evr_core::{NewSensorSample, RecordError, map_record};
use tracing::{error, info, warn};

use crate::registry::SampleRegistry;
use crate::scratch::ScratchStore;

pub use pool::{IngestHandle, IngestPool, SubmitError};

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("failed to open {path:?}: {source}")]
    Open { path: PathBuf, source: io::Error },
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("record on line {line}: {source}")]
    Record { line: u64, source: RecordError },
    #[error("storage error: {0}")]
    Store(Box<dyn std::error::Error + Send + Sync>),
    #[error("ingestion task failed: {0}")]
    Worker(String),
}

/// Reads every record of a comma separated file into samples.
///
/// Any malformed row fails the whole file. Empty rows are skipped.
pub fn read_samples(path: &Path) -> Result<Vec<NewSensorSample>, IngestError> {
    let file = File::open(path).map_err(|source| IngestError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(file);

    let mut samples = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let record = result?;
        if record.is_empty() {
            continue;
        }

        let line = record
            .position()
            .map(|position| position.line())
            .unwrap_or(index as u64 + 1);
        let fields: Vec<&str> = record.iter().collect();
        let sample = map_record(&fields).map_err(|source| IngestError::Record { line, source })?;
        samples.push(sample);
    }

    Ok(samples)
}

/// Loads one scratch file into `registry` and removes it.
///
/// A file that cannot be opened is left alone. Otherwise the file is
/// deleted whether or not the batch was stored; a failed deletion is only
/// logged.
pub async fn ingest_file<S>(registry: &S, path: &Path) -> Result<u64, IngestError>
where
    S: SampleRegistry,
{
    let owned = path.to_path_buf();
    let parsed = match tokio::task::spawn_blocking(move || read_samples(&owned)).await {
        Ok(parsed) => parsed,
        Err(e) => Err(IngestError::Worker(e.to_string())),
    };

    store_parsed(registry, path, parsed).await
}

async fn store_parsed<S>(
    registry: &S,
    path: &Path,
    parsed: Result<Vec<NewSensorSample>, IngestError>,
) -> Result<u64, IngestError>
where
    S: SampleRegistry,
{
    if let Err(e @ IngestError::Open { .. }) = parsed {
        error!(path = ?path, error = %e, "Failed to open upload");
        return Err(e);
    }

    let result = match parsed {
        Ok(samples) => {
            let rows = samples.len();
            match registry.batch_store(samples).await {
                Ok(inserted) => {
                    info!(path = ?path, rows, inserted, "Inserted samples");
                    Ok(inserted)
                }
                Err(e) => Err(IngestError::Store(Box::new(e))),
            }
        }
        Err(e) => Err(e),
    };

    if let Err(e) = tokio::fs::remove_file(path).await {
        warn!(path = ?path, error = ?e, "Failed to delete scratch file");
    }

    if let Err(e) = &result {
        error!(path = ?path, error = %e, "Failed to ingest upload");
    }

    result
}

/// Queues every upload an earlier run left in `scratch`.
///
/// Returns how many files were queued. Stops early if the queue closes.
pub async fn requeue_pending(handle: &IngestHandle, scratch: &ScratchStore) -> io::Result<usize> {
    let pending = scratch.pending()?;
    let mut queued = 0;
    for path in pending {
        if let Err(e) = handle.submit(path).await {
            warn!(error = %e, "Stopped requeueing leftover uploads");
            break;
        }
        queued += 1;
    }

    if queued > 0 {
        info!(queued, dir = ?scratch.dir(), "Requeued leftover uploads");
    }
    Ok(queued)
}
