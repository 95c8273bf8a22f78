use async_trait::async_trait;
use evr_core::{NewSensorSample, SampleId, SensorSample};
use sqlx::{
    QueryBuilder, Row, Sqlite, SqlitePool,
    sqlite::{SqlitePoolOptions, SqliteRow},
};

use crate::registry::SampleRegistry;

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS sensor_data (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp INTEGER NOT NULL,
    accel_x REAL NOT NULL,
    accel_y REAL NOT NULL,
    accel_z REAL NOT NULL,
    latitude REAL,
    longitude REAL
)
"#;

const CREATE_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS sensor_data_timestamp_idx ON sensor_data (timestamp)";

// SQLite allows 32766 bound parameters per statement; six per row.
const ROWS_PER_STATEMENT: usize = 5_000;

#[derive(Debug, thiserror::Error)]
pub enum SqliteSampleError {
    #[error("sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("timestamp {0} does not fit in 64-bit nanoseconds")]
    TimestampRange(jiff::Timestamp),
    #[error("invalid stored timestamp: {0}")]
    InvalidTimestamp(i64),
}

/// Samples in SQLite, timestamps stored as integer nanoseconds since the
/// Unix epoch.
#[derive(Clone)]
pub struct SqliteSampleRegistry {
    pool: SqlitePool,
}

impl SqliteSampleRegistry {
    pub async fn new(path: impl AsRef<str>) -> Result<Self, SqliteSampleError> {
        let connection_string = format!("sqlite:{}?mode=rwc", path.as_ref());
        let pool = SqlitePoolOptions::new().connect(&connection_string).await?;

        Self::bootstrap(pool).await
    }

    pub async fn new_in_memory() -> Result<Self, SqliteSampleError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        Self::bootstrap(pool).await
    }

    async fn bootstrap(pool: SqlitePool) -> Result<Self, SqliteSampleError> {
        sqlx::query(CREATE_TABLE).execute(&pool).await?;
        sqlx::query(CREATE_INDEX).execute(&pool).await?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl SampleRegistry for SqliteSampleRegistry {
    type Error = SqliteSampleError;

    async fn batch_store(&self, samples: Vec<NewSensorSample>) -> Result<u64, Self::Error> {
        if samples.is_empty() {
            return Ok(0);
        }

        let mut rows = Vec::with_capacity(samples.len());
        for sample in samples {
            let nanos = i64::try_from(sample.timestamp.as_nanosecond())
                .map_err(|_| SqliteSampleError::TimestampRange(sample.timestamp))?;
            rows.push((nanos, sample));
        }

        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;

        for chunk in rows.chunks(ROWS_PER_STATEMENT) {
            let mut query_builder: QueryBuilder<Sqlite> = QueryBuilder::new(
                "INSERT INTO sensor_data (timestamp, accel_x, accel_y, accel_z, latitude, longitude) ",
            );

            query_builder.push_values(chunk, |mut row, (nanos, sample)| {
                row.push_bind(*nanos)
                    .push_bind(sample.accel_x)
                    .push_bind(sample.accel_y)
                    .push_bind(sample.accel_z)
                    .push_bind(sample.latitude)
                    .push_bind(sample.longitude);
            });

            inserted += query_builder
                .build()
                .execute(&mut *tx)
                .await?
                .rows_affected();
        }

        tx.commit().await?;
        Ok(inserted)
    }

    async fn latest(&self, limit: i64) -> Result<Vec<SensorSample>, Self::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, timestamp, accel_x, accel_y, accel_z, latitude, longitude FROM (
                SELECT * FROM sensor_data ORDER BY timestamp DESC, id DESC LIMIT ?
            ) ORDER BY timestamp ASC, id ASC
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_row_to_sample).collect()
    }

    async fn count(&self) -> Result<u64, Self::Error> {
        let count: i64 = sqlx::query("SELECT COUNT(*) FROM sensor_data")
            .fetch_one(&self.pool)
            .await?
            .try_get(0)?;

        Ok(count as u64)
    }
}

fn map_row_to_sample(r: &SqliteRow) -> Result<SensorSample, SqliteSampleError> {
    let nanos: i64 = r.try_get("timestamp")?;
    let timestamp = jiff::Timestamp::from_nanosecond(i128::from(nanos))
        .map_err(|_| SqliteSampleError::InvalidTimestamp(nanos))?;

    Ok(SensorSample {
        id: SampleId(r.try_get("id")?),
        timestamp,
        accel_x: r.try_get("accel_x")?,
        accel_y: r.try_get("accel_y")?,
        accel_z: r.try_get("accel_z")?,
        latitude: r.try_get("latitude")?,
        longitude: r.try_get("longitude")?,
    })
}

#[cfg(test)]
mod tests {
    use evr_core::NewSensorSample;
    use jiff::Timestamp;

    use crate::registry::SampleRegistry;

    use super::SqliteSampleRegistry;

    fn sample(second: i64, nanos: i32, latitude: Option<f64>) -> NewSensorSample {
        NewSensorSample {
            timestamp: Timestamp::new(second, nanos).unwrap(),
            accel_x: second as f64,
            accel_y: -0.5,
            accel_z: 0.98,
            latitude,
            longitude: latitude.map(|l| l + 87.0),
        }
    }

    #[tokio::test]
    async fn test_batch_store_and_count() {
        let registry = SqliteSampleRegistry::new_in_memory().await.unwrap();

        let inserted = registry
            .batch_store(vec![
                sample(1, 0, None),
                sample(2, 0, Some(13.7)),
                sample(3, 0, None),
            ])
            .await
            .unwrap();

        assert_eq!(inserted, 3);
        assert_eq!(registry.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_latest_window_is_sorted_ascending() {
        let registry = SqliteSampleRegistry::new_in_memory().await.unwrap();

        let batch = (1..=10).rev().map(|s| sample(s, 0, None)).collect();
        registry.batch_store(batch).await.unwrap();

        let latest = registry.latest(3).await.unwrap();
        let seconds: Vec<i64> = latest.iter().map(|s| s.timestamp.as_second()).collect();
        assert_eq!(seconds, vec![8, 9, 10]);
    }

    #[tokio::test]
    async fn test_round_trip_keeps_nanoseconds_and_optionals() {
        let registry = SqliteSampleRegistry::new_in_memory().await.unwrap();

        registry
            .batch_store(vec![
                sample(1_700_000_000, 123_456_789, Some(13.75)),
                sample(1_700_000_001, 5_000, None),
            ])
            .await
            .unwrap();

        let stored = registry.latest(500).await.unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].timestamp.subsec_nanosecond(), 123_456_789);
        assert_eq!(stored[0].latitude, Some(13.75));
        assert_eq!(stored[0].longitude, Some(100.75));
        assert_eq!(stored[1].timestamp.subsec_nanosecond(), 5_000);
        assert_eq!(stored[1].latitude, None);
        assert!(stored[0].id < stored[1].id);
    }

    #[tokio::test]
    async fn test_empty_table() {
        let registry = SqliteSampleRegistry::new_in_memory().await.unwrap();
        assert!(registry.latest(500).await.unwrap().is_empty());
        assert_eq!(registry.batch_store(vec![]).await.unwrap(), 0);
    }
}
