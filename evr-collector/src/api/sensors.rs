use axum::{
    Json,
    body::Bytes,
    extract::{Query, State, rejection::BytesRejection, rejection::QueryRejection},
    http::StatusCode,
};
use evr_core::{SensorSample, VibrationReport, vibration::VIBRATION_WINDOW};
use tracing::{error, info, warn};

use crate::registry::{RouteRegistry, SampleRegistry};
use crate::scratch::ScratchError;

use super::{
    ApiState,
    error::ApiError,
    models::{SensorDataQuery, VibrationStatusResponse},
};

/// POST /upload
///
/// Answers as soon as the body is on disk and queued. Parsing and storage
/// happen later and never reach the caller.
pub async fn upload<S, R>(
    State(state): State<ApiState<S, R>>,
    body: Result<Bytes, BytesRejection>,
) -> Result<StatusCode, ApiError>
where
    S: SampleRegistry,
    R: RouteRegistry,
{
    let body = body.map_err(|e| {
        error!(error = %e, "Failed to read request body");
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge("Request body too large".to_string())
        } else {
            ApiError::Internal("Failed to read request body".to_string())
        }
    })?;

    let scratch = state.scratch.clone();
    let size = body.len();
    let written = tokio::task::spawn_blocking(move || scratch.write(&body))
        .await
        .map_err(|e| {
            error!(error = ?e, "Scratch write task failed");
            ApiError::Internal("Failed to create file".to_string())
        })?;

    let path = written.map_err(|e| {
        error!(error = %e, "Failed to store upload");
        match e {
            ScratchError::Create { .. } => ApiError::Internal("Failed to create file".to_string()),
            ScratchError::Write { .. } => {
                ApiError::Internal("Failed to write body to file".to_string())
            }
        }
    })?;

    if let Err(e) = state.ingest.submit(path).await {
        error!(error = %e, "Failed to queue upload");
        if let Err(remove) = tokio::fs::remove_file(&e.0).await {
            warn!(path = ?e.0, error = ?remove, "Failed to delete scratch file");
        }
        return Err(ApiError::Internal("Failed to queue upload".to_string()));
    }

    info!(bytes = size, "Upload queued");
    Ok(StatusCode::OK)
}

/// GET /sensor_data?size=N
pub async fn sensor_data<S, R>(
    State(state): State<ApiState<S, R>>,
    query: Result<Query<SensorDataQuery>, QueryRejection>,
) -> Result<Json<Vec<SensorSample>>, ApiError>
where
    S: SampleRegistry,
    R: RouteRegistry,
{
    let Query(query) = query.map_err(|e| {
        warn!(error = %e, "Invalid sensor data query");
        ApiError::BadRequest("Invalid query parameters".to_string())
    })?;

    let samples = state.samples.latest(query.size).await.map_err(|e| {
        error!(error = ?e, size = query.size, "Failed to query samples");
        ApiError::Internal("Error querying database".to_string())
    })?;

    Ok(Json(samples))
}

/// GET /vibration_status
pub async fn vibration_status<S, R>(
    State(state): State<ApiState<S, R>>,
) -> Result<Json<VibrationStatusResponse>, ApiError>
where
    S: SampleRegistry,
    R: RouteRegistry,
{
    let samples = state.samples.latest(VIBRATION_WINDOW).await.map_err(|e| {
        error!(error = ?e, "Failed to query vibration window");
        ApiError::Internal("Error querying database".to_string())
    })?;

    let report = VibrationReport::from_samples(&samples);
    Ok(Json(VibrationStatusResponse {
        is_vibrating: report.is_vibrating(),
    }))
}
