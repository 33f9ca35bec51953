//! Adaptive baseline calibration

use crate::config::CalibrationConfig;
use crate::measure::FaceMeasurements;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Per-subject reference values, frozen once calibration ends
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BaselineState {
    pub ear: Option<f64>,
    /// Mouth width / face width
    pub mouth_width: Option<f64>,
    /// Inter-eye distance / face width
    pub eye_distance: Option<f64>,
    /// Brow-to-lid distance / face width
    pub brow_distance: Option<f64>,
}

/// Builds baselines from the first face frames using a running EWMA
#[derive(Debug, Clone)]
pub struct BaselineCalibrator {
    config: CalibrationConfig,
    state: BaselineState,
    frozen: bool,
}

impl BaselineCalibrator {
    /// Create a new calibrator with no baselines yet
    pub fn new(config: CalibrationConfig) -> Self {
        Self {
            config,
            state: BaselineState::default(),
            frozen: false,
        }
    }

    /// Blend one frame into the baselines. Calls at or past the calibration
    /// window are ignored. Returns whether anything was updated.
    pub fn observe(&mut self, measurements: &FaceMeasurements, frame_index: u64) -> bool {
        if frame_index >= self.config.frames {
            if !self.frozen {
                self.frozen = true;
                info!(
                    ear = ?self.state.ear,
                    mouth_width = ?self.state.mouth_width,
                    eye_distance = ?self.state.eye_distance,
                    brow_distance = ?self.state.brow_distance,
                    "Baseline calibration complete"
                );
            }
            return false;
        }

        let w = self.config.blend;
        let s = &mut self.state;
        let updated = [
            blend(&mut s.ear, measurements.ear, w),
            blend(&mut s.mouth_width, measurements.mouth_width, w),
            blend(&mut s.eye_distance, measurements.eye_distance, w),
            blend(&mut s.brow_distance, measurements.brow_distance, w),
        ];

        debug!(frame_index, ear = ?self.state.ear, "Calibration sample");
        updated.iter().any(|&u| u)
    }

    pub fn baselines(&self) -> &BaselineState {
        &self.state
    }

    /// Whether the next frame with this index would still update baselines
    pub fn is_calibrating(&self, frame_index: u64) -> bool {
        frame_index < self.config.frames
    }
}

/// Running average; the first sample seeds directly, degenerate samples are skipped
fn blend(slot: &mut Option<f64>, sample: Option<f64>, weight: f64) -> bool {
    let Some(sample) = sample.filter(|v| v.is_finite()) else {
        return false;
    };
    *slot = Some(match *slot {
        None => sample,
        Some(current) => current * (1.0 - weight) + sample * weight,
    });
    true
}
