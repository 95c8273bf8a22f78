use serde::{Deserialize, Serialize};

const DEFAULT_SENSOR_DATA_SIZE: i64 = 500;

// Query Parameters
#[derive(Debug, Deserialize)]
pub struct SensorDataQuery {
    /// Number of most recent samples; handed to the store unchecked.
    #[serde(default = "default_size")]
    pub size: i64,
}

fn default_size() -> i64 {
    DEFAULT_SENSOR_DATA_SIZE
}

// Response Models
#[derive(Debug, Serialize, Deserialize)]
pub struct VibrationStatusResponse {
    pub is_vibrating: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LockStatusResponse {
    pub locked: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LockUpdateResponse {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

// Request Models
#[derive(Debug, Deserialize)]
pub struct LockRequest {
    #[serde(default)]
    pub locked: bool,
}
