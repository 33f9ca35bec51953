//! Session recording
//!
//! Counters and the per-channel emotion timeline for one session.

use affect::{EmotionChannels, EmotionVector, FrameAnalysis};
use tracing::debug;

/// Accumulated time series and counters
#[derive(Debug, Clone, Default)]
pub struct SessionRecorder {
    /// Every processed frame, face or not
    frame_count: u64,
    face_frames: u64,
    blink_count: u32,
    /// Smoothed values of face frames, in arrival order
    timeline: EmotionChannels<Vec<f64>>,
}

impl SessionRecorder {
    /// Create a new, empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one frame's results. No-face frames bump the counters but add
    /// nothing to the timeline.
    pub fn record(&mut self, analysis: &FrameAnalysis) {
        self.frame_count += 1;
        if analysis.blinked {
            self.blink_count += 1;
        }
        if analysis.face_detected {
            self.face_frames += 1;
            for (emotion, value) in analysis.emotions.iter() {
                self.timeline.get_mut(emotion).push(*value);
            }
        }
        debug!(frame = self.frame_count, blinks = self.blink_count, "Frame recorded");
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn face_frames(&self) -> u64 {
        self.face_frames
    }

    pub fn blink_count(&self) -> u32 {
        self.blink_count
    }

    pub fn is_empty(&self) -> bool {
        self.frame_count == 0
    }

    pub fn timeline(&self) -> &EmotionChannels<Vec<f64>> {
        &self.timeline
    }

    /// Per-channel mean over the full timeline, `None` with no face frames
    pub fn averages(&self) -> Option<EmotionVector> {
        if self.face_frames == 0 {
            return None;
        }
        Some(self.timeline.map(|_, values| {
            values.iter().sum::<f64>() / values.len() as f64
        }))
    }
}
