use std::sync::Arc;

use async_trait::async_trait;
use evr_core::{NewSensorSample, SampleId, SensorSample};
use tokio::sync::RwLock;

use crate::registry::SampleRegistry;

use super::InMemoryError;

#[derive(Default)]
struct SampleTable {
    samples: Vec<SensorSample>,
    last_id: i64,
}

#[derive(Clone, Default)]
pub struct InMemorySampleRegistry {
    table: Arc<RwLock<SampleTable>>,
}

impl InMemorySampleRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SampleRegistry for InMemorySampleRegistry {
    type Error = InMemoryError;

    async fn batch_store(&self, samples: Vec<NewSensorSample>) -> Result<u64, Self::Error> {
        let mut table = self.table.write().await;

        // assign every id before touching the table so a failed batch leaves
        // nothing behind
        let mut next = table.last_id;
        let mut stored = Vec::with_capacity(samples.len());
        for sample in samples {
            next = next.checked_add(1).ok_or(InMemoryError::IdSpaceExhausted)?;
            stored.push(sample.with_id(SampleId(next)));
        }

        let count = stored.len() as u64;
        table.last_id = next;
        table.samples.extend(stored);

        Ok(count)
    }

    async fn latest(&self, limit: i64) -> Result<Vec<SensorSample>, Self::Error> {
        let table = self.table.read().await;

        let mut ordered: Vec<&SensorSample> = table.samples.iter().collect();
        ordered.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));

        // negative limits mean "no limit", as in SQLite
        let keep = usize::try_from(limit).unwrap_or(ordered.len());
        let skip = ordered.len().saturating_sub(keep);

        Ok(ordered.into_iter().skip(skip).cloned().collect())
    }

    async fn count(&self) -> Result<u64, Self::Error> {
        let table = self.table.read().await;
        Ok(table.samples.len() as u64)
    }
}
