mod error;
pub mod record;
pub mod timestamp;
pub mod vibration;

use std::fmt;
use std::str::FromStr;

use bson::oid::ObjectId;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub use error::{FormatError, RecordError};
pub use record::map_record;
pub use timestamp::decode_timestamp;
pub use vibration::VibrationReport;

/// Storage-assigned identifier of a persisted sample. Monotonic per store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SampleId(pub i64);

/// A sample decoded from an upload that has not been persisted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSensorSample {
    /// Instant the sample was taken, UTC with nanosecond resolution.
    pub timestamp: jiff::Timestamp,
    /// Acceleration along X in multiples of g.
    pub accel_x: f64,
    /// Acceleration along Y in multiples of g.
    pub accel_y: f64,
    /// Acceleration along Z in multiples of g.
    pub accel_z: f64,
    /// GPS latitude, absent when the device had no fix.
    pub latitude: Option<f64>,
    /// GPS longitude, absent when the device had no fix.
    pub longitude: Option<f64>,
}

impl NewSensorSample {
    pub fn with_id(self, id: SampleId) -> SensorSample {
        SensorSample {
            id,
            timestamp: self.timestamp,
            accel_x: self.accel_x,
            accel_y: self.accel_y,
            accel_z: self.accel_z,
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

/// One accelerometer/GPS reading as stored and served back to clients.
///
/// Latitude and longitude are independent optionals; nothing requires both to
/// be present together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorSample {
    pub id: SampleId,
    pub timestamp: jiff::Timestamp,
    pub accel_x: f64,
    pub accel_y: f64,
    pub accel_z: f64,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Document-store identifier of a route, rendered as 24 hex digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RouteId(pub ObjectId);

impl RouteId {
    pub fn generate() -> Self {
        Self(ObjectId::new())
    }
}

impl FromStr for RouteId {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ObjectId::parse_str(s)
            .map(RouteId)
            .map_err(|_| FormatError::Identifier {
                input: s.to_owned(),
            })
    }
}

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_hex())
    }
}

impl Serialize for RouteId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_hex())
    }
}

impl<'de> Deserialize<'de> for RouteId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        hex.parse().map_err(serde::de::Error::custom)
    }
}

/// A single waypoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

/// A named, ordered sequence of waypoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub id: RouteId,
    pub name: String,
    pub route_points: Vec<Location>,
}

/// Route body accepted on create and replace. Any client-supplied `id` is
/// ignored; identifiers are always assigned by the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewRoute {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub route_points: Vec<Location>,
}

impl NewRoute {
    pub fn into_route(self, id: RouteId) -> Route {
        Route {
            id,
            name: self.name,
            route_points: self.route_points,
        }
    }
}
