//! Landmark-to-affect inference
//!
//! Turns one frame of facial landmarks at a time into:
//! - Per-subject baselines (first 30 face frames)
//! - Blink count and sleep/wake state
//! - Smoothed emotion intensities
//! - A composite engagement score and status

pub mod analysis;
pub mod calibration;
pub mod config;
pub mod emotion;
pub mod engagement;
pub mod eye;
pub mod measure;
pub mod smoothing;
pub mod synthetic;

pub use analysis::{Detection, FrameAnalysis};
pub use calibration::{BaselineCalibrator, BaselineState};
pub use config::{AffectConfig, EmotionMode, SmoothingMethod};
pub use emotion::{Emotion, EmotionChannels, EmotionScorer, EmotionVector, RawEmotions};
pub use engagement::{EngagementAggregator, EngagementScore, EngagementStatus};
pub use eye::{EyeStateTracker, EyeUpdate, SleepState, SleepTransition};
pub use measure::FaceMeasurements;
pub use smoothing::TemporalSmoother;

use thiserror::Error;

/// Affect pipeline error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AffectError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Single-subject pipeline. Data flows one way per frame:
/// calibrator, eye tracker, scorer, smoother, aggregator.
#[derive(Debug, Clone)]
pub struct AffectPipeline {
    config: AffectConfig,
    calibrator: BaselineCalibrator,
    tracker: EyeStateTracker,
    scorer: EmotionScorer,
    smoother: TemporalSmoother,
    aggregator: EngagementAggregator,
    face_frames: u64,
}

impl AffectPipeline {
    /// Create a new pipeline after validating `config`
    pub fn new(config: AffectConfig) -> Result<Self, AffectError> {
        config.validate()?;
        Ok(Self {
            calibrator: BaselineCalibrator::new(config.calibration.clone()),
            tracker: EyeStateTracker::new(config.eye.clone()),
            scorer: EmotionScorer::new(config.emotion.clone()),
            smoother: TemporalSmoother::new(config.smoothing.method),
            aggregator: EngagementAggregator::new(config.engagement.clone()),
            face_frames: 0,
            config,
        })
    }

    /// Run one frame through every stage
    pub fn process(&mut self, detection: &Detection, now_ms: u64) -> FrameAnalysis {
        match detection {
            Detection::Face(frame) => self.process_face(frame, now_ms),
            Detection::NoFace => self.process_no_face(now_ms),
        }
    }

    fn process_face(&mut self, frame: &face_landmarks::LandmarkFrame, now_ms: u64) -> FrameAnalysis {
        let measurements = FaceMeasurements::from_landmarks(frame);

        // Calibration counts face frames only
        let calibrating = self.calibrator.is_calibrating(self.face_frames);
        self.calibrator.observe(&measurements, self.face_frames);
        self.face_frames += 1;
        let baselines = *self.calibrator.baselines();

        let eye = self.tracker.observe(measurements.ear, baselines.ear, now_ms);
        let sleeping = self.tracker.is_sleeping();

        let raw = self.scorer.score(&measurements, &baselines, sleeping);
        let emotions = self.smoother.smooth_vector(&raw);
        let engagement = self.aggregator.aggregate(&emotions, sleeping);

        FrameAnalysis {
            face_detected: true,
            ear: measurements.ear,
            avg_ear: eye.avg_ear,
            blinked: eye.blinked,
            transition: eye.transition,
            sleep: self.tracker.sleep_state(),
            calibrating,
            raw_emotions: Some(raw),
            emotions,
            engagement,
        }
    }

    fn process_no_face(&mut self, now_ms: u64) -> FrameAnalysis {
        let eye = self.tracker.observe_no_face(now_ms);
        let sleeping = self.tracker.is_sleeping();

        // Emotions hold their last smoothed value; engagement still sees the sleep flag
        let emotions = self.smoother.current().unwrap_or_default();
        let engagement = self.aggregator.aggregate(&emotions, sleeping);

        FrameAnalysis {
            face_detected: false,
            ear: None,
            avg_ear: eye.avg_ear,
            blinked: false,
            transition: eye.transition,
            sleep: self.tracker.sleep_state(),
            calibrating: false,
            raw_emotions: None,
            emotions,
            engagement,
        }
    }

    pub fn config(&self) -> &AffectConfig {
        &self.config
    }

    pub fn baselines(&self) -> &BaselineState {
        self.calibrator.baselines()
    }

    pub fn eye_tracker(&self) -> &EyeStateTracker {
        &self.tracker
    }

    pub fn aggregator(&self) -> &EngagementAggregator {
        &self.aggregator
    }

    /// Face frames seen so far
    pub fn face_frames(&self) -> u64 {
        self.face_frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::FaceBuilder;
    use proptest::prelude::*;

    const FRAME_MS: u64 = 33;

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = AffectConfig::default();
        config.eye.wake_confirm_frames = 0;
        assert!(AffectPipeline::new(config).is_err());
    }

    #[test]
    fn test_calibration_window() {
        let mut pipeline = AffectPipeline::new(AffectConfig::default()).unwrap();
        let face = Detection::Face(FaceBuilder::neutral().build());
        let mut flags = Vec::new();
        for i in 0..32 {
            flags.push(pipeline.process(&face, i * FRAME_MS).calibrating);
        }
        assert!(flags[..30].iter().all(|&c| c));
        assert!(flags[30..].iter().all(|&c| !c));
        assert!((pipeline.baselines().ear.unwrap() - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_no_face_frames_do_not_calibrate() {
        let mut pipeline = AffectPipeline::new(AffectConfig::default()).unwrap();
        for i in 0..40 {
            let analysis = pipeline.process(&Detection::NoFace, i * FRAME_MS);
            assert!(!analysis.calibrating);
        }
        assert_eq!(pipeline.face_frames(), 0);
        assert_eq!(pipeline.baselines().ear, None);
    }

    #[test]
    fn test_neutral_face_engagement() {
        let mut pipeline = AffectPipeline::new(AffectConfig::default()).unwrap();
        let face = Detection::Face(FaceBuilder::neutral().build());
        let mut last = None;
        for i in 0..60 {
            last = Some(pipeline.process(&face, i * FRAME_MS));
        }
        let analysis = last.unwrap();
        // 95 * 0.6
        assert!((analysis.engagement.score - 57.0).abs() < 1e-6);
        assert_eq!(analysis.engagement.status, EngagementStatus::ModeratelyEngaged);
        assert!(!analysis.is_sleeping());
    }

    #[test]
    fn test_closed_eyes_fall_asleep() {
        let mut pipeline = AffectPipeline::new(AffectConfig::default()).unwrap();
        let open = Detection::Face(FaceBuilder::neutral().build());
        let closed = Detection::Face(FaceBuilder::neutral().eyes_closed().build());

        let mut t = 0;
        for _ in 0..30 {
            t += FRAME_MS;
            pipeline.process(&open, t);
        }
        let mut fell_asleep = false;
        for _ in 0..80 {
            t += FRAME_MS;
            let analysis = pipeline.process(&closed, t);
            if analysis.transition == Some(SleepTransition::FellAsleep) {
                fell_asleep = true;
            }
        }
        assert!(fell_asleep);
        let analysis = pipeline.process(&closed, t + FRAME_MS);
        assert_eq!(analysis.engagement.status, EngagementStatus::Sleeping);
        assert!(analysis.emotions.focused < 1.0);
    }

    #[test]
    fn test_no_face_holds_emotions() {
        let mut pipeline = AffectPipeline::new(AffectConfig::default()).unwrap();
        let face = Detection::Face(FaceBuilder::neutral().smiling().build());
        let seen = pipeline.process(&face, 0);
        let missing = pipeline.process(&Detection::NoFace, FRAME_MS);
        assert!(!missing.face_detected);
        assert_eq!(missing.emotions, seen.emotions);
        assert_eq!(missing.raw_emotions, None);
    }

    #[test]
    fn test_detection_from_option() {
        assert_eq!(Detection::from(None), Detection::NoFace);
        assert!(Detection::from(Some(FaceBuilder::neutral().build())).is_face());
    }

    #[test]
    fn test_dominant_only_preset_keeps_one_channel() {
        let mut pipeline = AffectPipeline::new(AffectConfig::dominant_only()).unwrap();
        let neutral = Detection::Face(FaceBuilder::neutral().build());
        let smiling = Detection::Face(FaceBuilder::neutral().smiling().build());

        let mut t = 0;
        for _ in 0..30 {
            t += FRAME_MS;
            pipeline.process(&neutral, t);
        }
        t += FRAME_MS;
        let raw = pipeline.process(&smiling, t).raw_emotions.unwrap();
        let nonzero = raw.iter().filter(|(_, v)| v.is_some_and(|v| v > 0.0)).count();
        assert_eq!(nonzero, 1);
        assert!(raw.smile.unwrap() > 90.0);
    }

    #[test]
    fn test_moving_average_preset_forgets_old_frames() {
        let mut pipeline = AffectPipeline::new(AffectConfig::moving_average()).unwrap();
        let smiling = Detection::Face(FaceBuilder::neutral().smiling().build());
        let neutral = Detection::Face(FaceBuilder::neutral().build());

        let mut t = 0;
        for _ in 0..10 {
            t += FRAME_MS;
            pipeline.process(&smiling, t);
        }
        let mut last = None;
        for _ in 0..5 {
            t += FRAME_MS;
            last = Some(pipeline.process(&neutral, t));
        }
        // Five-frame window holds only neutral frames now
        assert_eq!(last.unwrap().emotions.smile, 0.0);
    }

    fn preset(index: usize) -> AffectConfig {
        match index {
            0 => AffectConfig::default(),
            1 => AffectConfig::dominant_only(),
            _ => AffectConfig::moving_average(),
        }
    }

    proptest! {
        #[test]
        fn pipeline_outputs_stay_in_range(
            preset_index in 0usize..3,
            frames in prop::collection::vec(
                prop::option::of((0.0f64..0.6, 0.1f64..0.8, 0.0f64..1.5, -0.1f64..0.1, 0.0f64..0.2)),
                1..120,
            ),
        ) {
            let mut pipeline = AffectPipeline::new(preset(preset_index)).unwrap();
            for (i, frame) in frames.iter().enumerate() {
                let detection = match frame {
                    Some((ear, width, openness, lift, brow)) => Detection::Face(
                        FaceBuilder::neutral()
                            .ear(*ear)
                            .mouth_width(*width)
                            .mouth_openness(*openness)
                            .corner_lift(*lift)
                            .brow_distance(*brow)
                            .build(),
                    ),
                    None => Detection::NoFace,
                };
                let analysis = pipeline.process(&detection, i as u64 * FRAME_MS);
                for (_, v) in analysis.emotions.iter() {
                    prop_assert!((0.0..=100.0).contains(v));
                }
                prop_assert!((0.0..=100.0).contains(&analysis.engagement.score));
            }
        }
    }
}
