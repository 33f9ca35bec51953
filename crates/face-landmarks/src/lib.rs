//! Facial Landmark Frames
//!
//! Provides the per-frame keypoint input of the engagement pipeline:
//! - Named feature roles (eye corners and lids, mouth, brows, cheeks)
//! - Validated frames (every required role present, finite coordinates)
//! - MediaPipe face-mesh index mapping
//! - Distance and ratio helpers that never divide by a degenerate segment

mod error;
pub mod frame;
pub mod geometry;

pub use error::LandmarkError;
pub use frame::{EyeContour, EyeSide, FeaturePoint, LandmarkFrame};
pub use geometry::{ratio, Point, MIN_SEGMENT};
