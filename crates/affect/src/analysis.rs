//! Per-frame pipeline input and output

use crate::emotion::{EmotionVector, RawEmotions};
use crate::engagement::EngagementScore;
use crate::eye::{SleepState, SleepTransition};
use face_landmarks::LandmarkFrame;
use serde::{Deserialize, Serialize};

/// Landmark model output for one frame
#[derive(Debug, Clone, PartialEq)]
pub enum Detection {
    Face(LandmarkFrame),
    /// Detector ran but found no face
    NoFace,
}

impl Detection {
    pub fn is_face(&self) -> bool {
        matches!(self, Detection::Face(_))
    }
}

impl From<Option<LandmarkFrame>> for Detection {
    fn from(frame: Option<LandmarkFrame>) -> Self {
        frame.map_or(Detection::NoFace, Detection::Face)
    }
}

/// Everything the pipeline derived from one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameAnalysis {
    pub face_detected: bool,

    /// Instantaneous EAR (face frames with usable eye geometry)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ear: Option<f64>,

    /// Mean of the EAR history
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_ear: Option<f64>,

    pub blinked: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub transition: Option<SleepTransition>,

    pub sleep: SleepState,

    /// This frame was blended into the baselines
    pub calibrating: bool,

    /// Scorer output before smoothing; absent on no-face frames
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_emotions: Option<RawEmotions>,

    pub emotions: EmotionVector,

    pub engagement: EngagementScore,
}

impl FrameAnalysis {
    pub fn is_sleeping(&self) -> bool {
        self.sleep.is_sleeping()
    }
}
