use axum::{
    Json,
    body::Bytes,
    extract::{State, rejection::BytesRejection},
};
use tracing::{info, warn};

use crate::registry::{RouteRegistry, SampleRegistry};

use super::{
    ApiState,
    error::ApiError,
    models::{LockRequest, LockStatusResponse, LockUpdateResponse},
};

/// GET /train/lock
pub async fn get_lock<S, R>(State(state): State<ApiState<S, R>>) -> Json<LockStatusResponse>
where
    S: SampleRegistry,
    R: RouteRegistry,
{
    Json(LockStatusResponse {
        locked: state.lock.is_locked(),
    })
}

/// PUT /train/lock
///
/// The body is read as JSON whatever its content type.
pub async fn put_lock<S, R>(
    State(state): State<ApiState<S, R>>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<LockUpdateResponse>, ApiError>
where
    S: SampleRegistry,
    R: RouteRegistry,
{
    let request: LockRequest = body
        .map_err(|e| e.to_string())
        .and_then(|body| serde_json::from_slice(&body).map_err(|e| e.to_string()))
        .map_err(|e| {
            warn!(error = %e, "Invalid lock body");
            ApiError::BadRequest("Invalid JSON format".to_string())
        })?;

    state.lock.set(request.locked);
    info!(locked = request.locked, "Train lock updated");

    let status = if request.locked { "locked" } else { "unlocked" };
    Ok(Json(LockUpdateResponse {
        status: status.to_string(),
    }))
}
