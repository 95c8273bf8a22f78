use crate::{NewSensorSample, RecordError, decode_timestamp};

/// Number of fields a sample record carries:
/// `timestamp, accel_x, accel_y, accel_z, latitude, longitude`.
pub const RECORD_FIELDS: usize = 6;

/// Maps one delimited record to a sample.
///
/// Only the timestamp is strict. Acceleration fields fall back to zero when
/// they do not parse, and coordinates are absent when empty and zero when
/// present but unparsable. Fields past the sixth are ignored.
pub fn map_record<S: AsRef<str>>(fields: &[S]) -> Result<NewSensorSample, RecordError> {
    if fields.len() < RECORD_FIELDS {
        return Err(RecordError::MissingFields {
            found: fields.len(),
            expected: RECORD_FIELDS,
        });
    }

    let field = |i: usize| fields[i].as_ref();

    Ok(NewSensorSample {
        timestamp: decode_timestamp(field(0))?,
        accel_x: parse_or_zero(field(1)),
        accel_y: parse_or_zero(field(2)),
        accel_z: parse_or_zero(field(3)),
        latitude: optional_coordinate(field(4)),
        longitude: optional_coordinate(field(5)),
    })
}

/// Parse-or-default policy for numeric telemetry fields.
pub fn parse_or_zero(field: &str) -> f64 {
    field.parse().unwrap_or(0.0)
}

/// Empty means "no fix"; anything else goes through [`parse_or_zero`].
pub fn optional_coordinate(field: &str) -> Option<f64> {
    if field.is_empty() {
        None
    } else {
        Some(parse_or_zero(field))
    }
}
