//! Pipeline configuration

use crate::AffectError;
use serde::{Deserialize, Serialize};

/// Full pipeline configuration. Every section falls back to its defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AffectConfig {
    pub calibration: CalibrationConfig,
    pub eye: EyeConfig,
    pub emotion: EmotionConfig,
    pub smoothing: SmoothingConfig,
    pub engagement: EngagementConfig,
}

impl AffectConfig {
    /// Zero out all but the strongest emotion each frame
    pub fn dominant_only() -> Self {
        Self {
            emotion: EmotionConfig {
                mode: EmotionMode::DominantOnly,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Five-sample moving average instead of exponential smoothing
    pub fn moving_average() -> Self {
        Self {
            smoothing: SmoothingConfig {
                method: SmoothingMethod::MovingAverage { window: 5 },
            },
            ..Default::default()
        }
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<(), AffectError> {
        let fail = |msg: &str| Err(AffectError::InvalidConfig(msg.to_string()));

        if !(self.calibration.blend > 0.0 && self.calibration.blend <= 1.0) {
            return fail("calibration.blend must be in (0, 1]");
        }
        if self.eye.ear_history_size == 0 {
            return fail("eye.ear_history_size must be > 0");
        }
        if self.eye.fallback_ear_baseline <= 0.0 {
            return fail("eye.fallback_ear_baseline must be > 0");
        }
        if self.eye.blink_ratio <= 0.0 || self.eye.sleep_ratio <= 0.0 {
            return fail("eye.blink_ratio and eye.sleep_ratio must be > 0");
        }
        if self.eye.sleep_confirm_frames == 0 || self.eye.wake_confirm_frames == 0 {
            return fail("eye confirm frame counts must be > 0");
        }
        if self.emotion.smile_full_lift <= self.emotion.smile_min_lift {
            return fail("emotion.smile_full_lift must exceed emotion.smile_min_lift");
        }
        if self.emotion.focus_neutral_max <= 0.0 {
            return fail("emotion.focus_neutral_max must be > 0");
        }
        match self.smoothing.method {
            SmoothingMethod::Exponential { alpha } if !(alpha > 0.0 && alpha <= 1.0) => {
                return fail("smoothing alpha must be in (0, 1]");
            }
            SmoothingMethod::MovingAverage { window: 0 } => {
                return fail("smoothing window must be > 0");
            }
            _ => {}
        }
        let t = &self.engagement;
        if !(t.highly_engaged >= t.engaged && t.engaged >= t.moderately_engaged) {
            return fail("engagement status thresholds must be descending");
        }
        Ok(())
    }
}

/// Baseline calibration window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Face frames used to build the baselines before they freeze
    pub frames: u64,
    /// Weight of each new sample in the running average
    pub blend: f64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            frames: 30,
            blend: 0.1,
        }
    }
}

/// Blink debounce and sleep hysteresis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EyeConfig {
    /// EAR history window feeding the sleep decision
    pub ear_history_size: usize,
    /// EAR baseline assumed before calibration produced one
    pub fallback_ear_baseline: f64,
    /// Blink threshold as a fraction of the EAR baseline
    pub blink_ratio: f64,
    /// Sleep threshold as a fraction of the EAR baseline
    pub sleep_ratio: f64,
    /// Minimum gap between two counted blinks
    pub blink_debounce_ms: u64,
    /// Closure evidence needed to fall asleep (~1.5 s at 30fps)
    pub sleep_confirm_frames: u32,
    /// Open frames needed to wake up (~0.5 s at 30fps)
    pub wake_confirm_frames: u32,
    /// Closure evidence removed per open frame
    pub closure_decay: u32,
}

impl Default for EyeConfig {
    fn default() -> Self {
        Self {
            ear_history_size: 10,
            fallback_ear_baseline: 0.25,
            blink_ratio: 0.7,
            sleep_ratio: 0.6,
            blink_debounce_ms: 300,
            sleep_confirm_frames: 45,
            wake_confirm_frames: 15,
            closure_decay: 3,
        }
    }
}

/// How the per-frame emotion vector is shaped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmotionMode {
    /// Every channel scored independently; several may be non-zero
    #[default]
    Additive,
    /// Only the strongest channel survives; focused when nothing clears the floor
    DominantOnly,
}

/// Inclusive value range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub min: f64,
    pub max: f64,
}

impl Band {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Emotion heuristic constants. Geometry ratios are relative to face width.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmotionConfig {
    pub mode: EmotionMode,

    // Smile
    pub smile_min_lift: f64,
    pub smile_full_lift: f64,
    pub smile_wide_mouth: f64,
    pub smile_max_boost: f64,

    // Happy
    pub happy_min_smile: f64,
    pub happy_ear_band: Band,
    pub happy_factor: f64,

    // Surprised
    pub surprise_mouth_open: f64,
    pub surprise_mouth_gain: f64,
    pub surprise_ear_margin: f64,
    pub surprise_ear_gain: f64,

    // Confused
    pub furrow_span: f64,
    pub furrow_weight: f64,
    pub frown_min_lift: f64,
    pub frown_full_lift: f64,
    pub frown_weight: f64,
    pub asymmetry_min: f64,
    pub asymmetry_full: f64,
    pub asymmetry_weight: f64,

    // Focused
    pub focus_neutral_max: f64,
    pub focus_ear_band: Band,
    pub focus_floor: f64,
    pub focus_steadiness_bonus: f64,
    pub steady_tolerance: f64,

    /// Dominant-only mode: below this nothing is dominant
    pub dominant_floor: f64,
}

impl Default for EmotionConfig {
    fn default() -> Self {
        Self {
            mode: EmotionMode::Additive,
            smile_min_lift: 0.008,
            smile_full_lift: 0.03,
            smile_wide_mouth: 0.42,
            smile_max_boost: 1.5,
            happy_min_smile: 30.0,
            happy_ear_band: Band::new(0.85, 1.15),
            happy_factor: 0.9,
            surprise_mouth_open: 0.35,
            surprise_mouth_gain: 150.0,
            surprise_ear_margin: 0.15,
            surprise_ear_gain: 200.0,
            furrow_span: 0.15,
            furrow_weight: 60.0,
            frown_min_lift: 0.004,
            frown_full_lift: 0.02,
            frown_weight: 40.0,
            asymmetry_min: 0.005,
            asymmetry_full: 0.03,
            asymmetry_weight: 30.0,
            focus_neutral_max: 25.0,
            focus_ear_band: Band::new(0.75, 1.25),
            focus_floor: 70.0,
            focus_steadiness_bonus: 25.0,
            steady_tolerance: 0.1,
            dominant_floor: 20.0,
        }
    }
}

/// Smoothing filter applied per emotion channel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SmoothingMethod {
    /// Single-pole EMA: `alpha * raw + (1 - alpha) * previous`
    Exponential { alpha: f64 },
    /// Mean of the last `window` raw samples
    MovingAverage { window: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    pub method: SmoothingMethod,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            method: SmoothingMethod::Exponential { alpha: 0.3 },
        }
    }
}

/// Signed per-channel weights of the engagement score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmotionWeights {
    pub smile: f64,
    pub happy: f64,
    pub surprised: f64,
    pub confused: f64,
    pub focused: f64,
}

impl Default for EmotionWeights {
    fn default() -> Self {
        Self {
            smile: 0.1,
            happy: 0.3,
            surprised: 0.0,
            confused: -0.3,
            focused: 0.6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngagementConfig {
    pub weights: EmotionWeights,
    /// Subtracted while asleep
    pub sleep_penalty: f64,
    pub highly_engaged: f64,
    pub engaged: f64,
    pub moderately_engaged: f64,
}

impl Default for EngagementConfig {
    fn default() -> Self {
        Self {
            weights: EmotionWeights::default(),
            sleep_penalty: 50.0,
            highly_engaged: 80.0,
            engaged: 60.0,
            moderately_engaged: 40.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(AffectConfig::default().validate().is_ok());
        assert!(AffectConfig::dominant_only().validate().is_ok());
        assert!(AffectConfig::moving_average().validate().is_ok());
    }

    #[test]
    fn test_invalid_alpha() {
        let config = AffectConfig {
            smoothing: SmoothingConfig {
                method: SmoothingMethod::Exponential { alpha: 1.5 },
            },
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(AffectError::InvalidConfig(_))));
    }

    #[test]
    fn test_invalid_history() {
        let mut config = AffectConfig::default();
        config.eye.ear_history_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{"eye": {"sleep_confirm_frames": 60}, "smoothing": {"method": {"kind": "moving_average", "window": 7}}}"#;
        let config: AffectConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.eye.sleep_confirm_frames, 60);
        assert_eq!(config.eye.wake_confirm_frames, 15);
        assert_eq!(config.smoothing.method, SmoothingMethod::MovingAverage { window: 7 });
        assert_eq!(config.calibration, CalibrationConfig::default());
    }
}
