pub mod memory;
pub mod mongo;
pub mod postgres;
pub mod sqlite;

use async_trait::async_trait;
use evr_core::{NewRoute, NewSensorSample, Route, RouteId, SensorSample};

/// Relational store for accelerometer/GPS samples.
#[async_trait]
pub trait SampleRegistry: Clone + Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Inserts the whole batch atomically, preserving order. Returns the
    /// number of rows written.
    async fn batch_store(&self, samples: Vec<NewSensorSample>) -> Result<u64, Self::Error>;

    /// The `limit` most recent samples by timestamp, returned oldest first.
    ///
    /// `limit` is handed to the backend as-is; how a negative value behaves is
    /// up to the store.
    async fn latest(&self, limit: i64) -> Result<Vec<SensorSample>, Self::Error>;

    async fn count(&self) -> Result<u64, Self::Error>;
}

/// Document store for named routes.
#[async_trait]
pub trait RouteRegistry: Clone + Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn list(&self) -> Result<Vec<Route>, Self::Error>;
    async fn get(&self, id: RouteId) -> Result<Option<Route>, Self::Error>;

    /// Stores a new route under a freshly generated id.
    async fn create(&self, route: NewRoute) -> Result<Route, Self::Error>;

    /// Replaces every field of an existing route. `None` if `id` is unknown.
    async fn replace(&self, id: RouteId, route: NewRoute) -> Result<Option<Route>, Self::Error>;

    /// Returns whether a route was actually removed.
    async fn delete(&self, id: RouteId) -> Result<bool, Self::Error>;
}
