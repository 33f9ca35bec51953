//! Monitoring session
//!
//! Owns one subject's pipeline state from start to stop:
//! - Frame intake with ordering checks
//! - Per-frame snapshots for the dashboard
//! - Emotion timeline recording
//! - JSON export and report insights

pub mod recorder;
pub mod session;
pub mod summary;

pub use recorder::SessionRecorder;
pub use session::{FrameKind, FrameSnapshot, MonitoringSession};
pub use summary::{Insight, InsightKind, SessionSummary};

use affect::AffectError;
use face_landmarks::LandmarkError;
use thiserror::Error;

/// Session error types
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Session already stopped")]
    Stopped,

    #[error("Stale frame: timestamp {got_ms} ms is before last processed {last_ms} ms")]
    StaleFrame { last_ms: u64, got_ms: u64 },

    #[error("Malformed frame: {0}")]
    Landmark(#[from] LandmarkError),

    #[error("Configuration error: {0}")]
    Config(#[from] AffectError),

    #[error("Export format error: {0}")]
    Export(#[from] serde_json::Error),
}
