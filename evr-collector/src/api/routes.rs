use axum::{
    Json,
    body::Bytes,
    extract::{
        Path, State,
        rejection::{BytesRejection, PathRejection},
    },
    http::StatusCode,
};
use evr_core::{NewRoute, Route, RouteId};
use tracing::{error, info, warn};

use crate::registry::{RouteRegistry, SampleRegistry};

use super::{ApiState, error::ApiError, models::MessageResponse};

fn parse_route_id(id: Result<Path<String>, PathRejection>) -> Result<RouteId, ApiError> {
    let Path(id) = id.map_err(|e| {
        warn!(error = %e, "Invalid route path");
        ApiError::BadRequest("Invalid query parameters".to_string())
    })?;

    id.parse::<RouteId>().map_err(|e| {
        warn!(id = %id, error = %e, "Invalid route id");
        ApiError::BadRequest("Invalid ID format".to_string())
    })
}

/// Any content type is accepted as long as the body is a JSON route.
fn parse_route_body(body: Result<Bytes, BytesRejection>) -> Result<NewRoute, ApiError> {
    let body = body.map_err(|e| {
        warn!(error = %e, "Failed to read route body");
        ApiError::BadRequest("Invalid JSON".to_string())
    })?;

    serde_json::from_slice(&body).map_err(|e| {
        warn!(error = %e, "Invalid route body");
        ApiError::BadRequest("Invalid JSON".to_string())
    })
}

/// GET /route
pub async fn list_routes<S, R>(
    State(state): State<ApiState<S, R>>,
) -> Result<Json<Vec<Route>>, ApiError>
where
    S: SampleRegistry,
    R: RouteRegistry,
{
    let routes = state.routes.list().await.map_err(|e| {
        error!(error = ?e, "Failed to list routes");
        ApiError::Internal("Error fetching routes".to_string())
    })?;

    Ok(Json(routes))
}

/// GET /route/{id}
pub async fn get_route<S, R>(
    State(state): State<ApiState<S, R>>,
    id: Result<Path<String>, PathRejection>,
) -> Result<Json<Route>, ApiError>
where
    S: SampleRegistry,
    R: RouteRegistry,
{
    let id = parse_route_id(id)?;

    match state.routes.get(id).await {
        Ok(Some(route)) => Ok(Json(route)),
        Ok(None) => Err(ApiError::NotFound("Route not found".to_string())),
        Err(e) => {
            error!(error = ?e, id = %id, "Failed to get route");
            Err(ApiError::Internal("Error fetching route".to_string()))
        }
    }
}

/// POST /route
///
/// Any `id` in the body is ignored; the store assigns a fresh one.
pub async fn create_route<S, R>(
    State(state): State<ApiState<S, R>>,
    body: Result<Bytes, BytesRejection>,
) -> Result<(StatusCode, Json<Route>), ApiError>
where
    S: SampleRegistry,
    R: RouteRegistry,
{
    let route = parse_route_body(body)?;

    let route = state.routes.create(route).await.map_err(|e| {
        error!(error = ?e, "Failed to create route");
        ApiError::Internal("Error inserting route".to_string())
    })?;

    info!(id = %route.id, name = %route.name, "Route created");
    Ok((StatusCode::CREATED, Json(route)))
}

/// PUT /route/{id}
///
/// Replaces every field. An unknown id is rejected before the body is
/// looked at.
pub async fn update_route<S, R>(
    State(state): State<ApiState<S, R>>,
    id: Result<Path<String>, PathRejection>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<Route>, ApiError>
where
    S: SampleRegistry,
    R: RouteRegistry,
{
    let id = parse_route_id(id)?;

    match state.routes.get(id).await {
        Ok(Some(_)) => {}
        Ok(None) => return Err(ApiError::NotFound("Route not found".to_string())),
        Err(e) => {
            error!(error = ?e, id = %id, "Failed to check route");
            return Err(ApiError::Internal("Error fetching route".to_string()));
        }
    }

    let route = parse_route_body(body)?;

    match state.routes.replace(id, route).await {
        Ok(Some(route)) => {
            info!(id = %id, "Route updated");
            Ok(Json(route))
        }
        // removed between the check and the write
        Ok(None) => Err(ApiError::NotFound("Route not found".to_string())),
        Err(e) => {
            error!(error = ?e, id = %id, "Failed to update route");
            Err(ApiError::Internal("Error updating route".to_string()))
        }
    }
}

/// DELETE /route/{id}
///
/// Confirms even when nothing was stored under `id`.
pub async fn delete_route<S, R>(
    State(state): State<ApiState<S, R>>,
    id: Result<Path<String>, PathRejection>,
) -> Result<Json<MessageResponse>, ApiError>
where
    S: SampleRegistry,
    R: RouteRegistry,
{
    let id = parse_route_id(id)?;

    let deleted = state.routes.delete(id).await.map_err(|e| {
        error!(error = ?e, id = %id, "Failed to delete route");
        ApiError::Internal("Error deleting route".to_string())
    })?;

    info!(id = %id, deleted, "Route delete handled");
    Ok(Json(MessageResponse {
        message: "Route deleted successfully".to_string(),
    }))
}
