use async_trait::async_trait;
use evr_core::{NewSensorSample, SampleId, SensorSample};
use sqlx::{
    PgPool, Postgres, QueryBuilder, Row,
    postgres::{PgPoolOptions, PgRow},
    types::time::OffsetDateTime,
};

use crate::registry::SampleRegistry;

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS sensor_data (
    id BIGSERIAL PRIMARY KEY,
    timestamp TIMESTAMPTZ NOT NULL,
    accel_x DOUBLE PRECISION NOT NULL,
    accel_y DOUBLE PRECISION NOT NULL,
    accel_z DOUBLE PRECISION NOT NULL,
    latitude DOUBLE PRECISION,
    longitude DOUBLE PRECISION
)
"#;

const CREATE_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS sensor_data_timestamp_idx ON sensor_data (timestamp)";

// Postgres caps a statement at 65535 bind parameters; six per row.
const ROWS_PER_STATEMENT: usize = 10_000;

#[derive(Debug, thiserror::Error)]
pub enum PostgresSampleError {
    #[error("sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("timestamp {0} is outside the supported range")]
    TimestampRange(jiff::Timestamp),
    #[error("invalid stored timestamp: {0}")]
    InvalidTimestamp(OffsetDateTime),
}

/// Samples in the `sensor_data` table of a PostgreSQL database.
///
/// Postgres keeps microsecond precision, so the last three digits of a
/// sample's nanoseconds are dropped on the way in.
#[derive(Clone)]
pub struct PostgresSampleRegistry {
    pool: PgPool,
}

impl PostgresSampleRegistry {
    pub async fn new(url: &str, max_connections: u32) -> Result<Self, PostgresSampleError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;

        sqlx::query(CREATE_TABLE).execute(&pool).await?;
        sqlx::query(CREATE_INDEX).execute(&pool).await?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl SampleRegistry for PostgresSampleRegistry {
    type Error = PostgresSampleError;

    async fn batch_store(&self, samples: Vec<NewSensorSample>) -> Result<u64, Self::Error> {
        if samples.is_empty() {
            return Ok(0);
        }

        let mut rows = Vec::with_capacity(samples.len());
        for sample in samples {
            rows.push((to_offset(sample.timestamp)?, sample));
        }

        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;

        for chunk in rows.chunks(ROWS_PER_STATEMENT) {
            let mut query_builder: QueryBuilder<Postgres> = QueryBuilder::new(
                "INSERT INTO sensor_data (timestamp, accel_x, accel_y, accel_z, latitude, longitude) ",
            );

            query_builder.push_values(chunk, |mut row, (timestamp, sample)| {
                row.push_bind(*timestamp)
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
                SELECT * FROM sensor_data ORDER BY timestamp DESC, id DESC LIMIT $1
            ) recent ORDER BY timestamp ASC, id ASC
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

fn to_offset(timestamp: jiff::Timestamp) -> Result<OffsetDateTime, PostgresSampleError> {
    OffsetDateTime::from_unix_timestamp_nanos(timestamp.as_nanosecond())
        .map_err(|_| PostgresSampleError::TimestampRange(timestamp))
}

fn map_row_to_sample(r: &PgRow) -> Result<SensorSample, PostgresSampleError> {
    let stored: OffsetDateTime = r.try_get("timestamp")?;
    let timestamp = jiff::Timestamp::from_nanosecond(stored.unix_timestamp_nanos())
        .map_err(|_| PostgresSampleError::InvalidTimestamp(stored))?;

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
