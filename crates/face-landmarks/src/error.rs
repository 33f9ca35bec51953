//! Landmark Error Types

use crate::frame::FeaturePoint;
use thiserror::Error;

/// Errors raised while building a landmark frame
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LandmarkError {
    /// A required feature role was not supplied
    #[error("Missing required landmark: {0}")]
    MissingPoint(FeaturePoint),

    /// A coordinate was NaN or infinite
    #[error("Landmark {point} has a non-finite coordinate")]
    NonFinite { point: FeaturePoint },

    /// Face mesh has fewer points than the highest index we read
    #[error("Face mesh too short: expected at least {expected} points, got {actual}")]
    MeshTooShort { expected: usize, actual: usize },
}
