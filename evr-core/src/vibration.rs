use crate::SensorSample;

/// Number of most recent samples the classification looks at.
pub const VIBRATION_WINDOW: i64 = 2500;

/// |accel_x| above this (in g) counts as a shaking sample.
pub const ACCEL_X_THRESHOLD: f64 = 5.0;

/// Fraction of shaking samples above which the window is vibrating.
pub const VIBRATING_FRACTION: f64 = 0.2;

/// Summary of one vibration window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VibrationReport {
    /// Samples in the window.
    pub window: usize,
    /// Samples whose |accel_x| exceeded [`ACCEL_X_THRESHOLD`].
    pub exceeding: usize,
}

impl VibrationReport {
    pub fn from_samples(samples: &[SensorSample]) -> Self {
        let exceeding = samples
            .iter()
            .filter(|s| s.accel_x.abs() > ACCEL_X_THRESHOLD)
            .count();

        Self {
            window: samples.len(),
            exceeding,
        }
    }

    /// `None` for an empty window.
    pub fn fraction(&self) -> Option<f64> {
        if self.window == 0 {
            return None;
        }
        Some(self.exceeding as f64 / self.window as f64)
    }

    /// An empty window is never vibrating.
    pub fn is_vibrating(&self) -> bool {
        self.fraction()
            .is_some_and(|fraction| fraction > VIBRATING_FRACTION)
    }
}
