pub mod error;
pub mod models;
pub mod routes;
pub mod sensors;
pub mod train;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::ingest::IngestHandle;
use crate::registry::{RouteRegistry, SampleRegistry};
use crate::scratch::ScratchStore;
use crate::state::TrainLock;

/// Everything the handlers share, built once at start-up.
#[derive(Clone)]
pub struct ApiState<S, R> {
    pub samples: S,
    pub routes: R,
    pub ingest: IngestHandle,
    pub scratch: ScratchStore,
    pub lock: TrainLock,
}

/// Builds the HTTP API.
///
/// `max_upload_bytes` caps `POST /upload` bodies; `None` accepts any size.
pub fn api_router<S, R>(state: ApiState<S, R>, max_upload_bytes: Option<usize>) -> Router
where
    S: SampleRegistry,
    R: RouteRegistry,
{
    let upload_limit = match max_upload_bytes {
        Some(limit) => DefaultBodyLimit::max(limit),
        None => DefaultBodyLimit::disable(),
    };

    Router::new()
        // Sensor routes
        .route(
            "/upload",
            post(sensors::upload::<S, R>).layer(upload_limit),
        )
        .route("/sensor_data", get(sensors::sensor_data::<S, R>))
        .route("/vibration_status", get(sensors::vibration_status::<S, R>))
        // Route registry
        .route(
            "/route",
            get(routes::list_routes::<S, R>).post(routes::create_route::<S, R>),
        )
        .route(
            "/route/",
            get(routes::list_routes::<S, R>).post(routes::create_route::<S, R>),
        )
        .route(
            "/route/{id}",
            get(routes::get_route::<S, R>)
                .put(routes::update_route::<S, R>)
                .delete(routes::delete_route::<S, R>),
        )
        // Train lock
        .route(
            "/train/lock",
            get(train::get_lock::<S, R>).put(train::put_lock::<S, R>),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
