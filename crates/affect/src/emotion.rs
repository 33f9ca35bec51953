//! Geometry-driven emotion heuristics

use crate::calibration::BaselineState;
use crate::config::{EmotionConfig, EmotionMode};
use crate::measure::FaceMeasurements;
use face_landmarks::{ratio, LandmarkFrame};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Emotion channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Emotion {
    Smile,
    Happy,
    Surprised,
    Confused,
    Focused,
}

impl Emotion {
    pub const ALL: [Emotion; 5] = [
        Emotion::Smile,
        Emotion::Happy,
        Emotion::Surprised,
        Emotion::Confused,
        Emotion::Focused,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Emotion::Smile => "smile",
            Emotion::Happy => "happy",
            Emotion::Surprised => "surprised",
            Emotion::Confused => "confused",
            Emotion::Focused => "focused",
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One value per emotion channel
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EmotionChannels<T> {
    pub smile: T,
    pub happy: T,
    pub surprised: T,
    pub confused: T,
    pub focused: T,
}

/// Intensities in [0, 100]
pub type EmotionVector = EmotionChannels<f64>;

/// Raw scorer output; `None` where the geometry behind a channel was degenerate
pub type RawEmotions = EmotionChannels<Option<f64>>;

impl<T> EmotionChannels<T> {
    pub fn from_fn(mut f: impl FnMut(Emotion) -> T) -> Self {
        Self {
            smile: f(Emotion::Smile),
            happy: f(Emotion::Happy),
            surprised: f(Emotion::Surprised),
            confused: f(Emotion::Confused),
            focused: f(Emotion::Focused),
        }
    }

    pub fn get(&self, emotion: Emotion) -> &T {
        match emotion {
            Emotion::Smile => &self.smile,
            Emotion::Happy => &self.happy,
            Emotion::Surprised => &self.surprised,
            Emotion::Confused => &self.confused,
            Emotion::Focused => &self.focused,
        }
    }

    pub fn get_mut(&mut self, emotion: Emotion) -> &mut T {
        match emotion {
            Emotion::Smile => &mut self.smile,
            Emotion::Happy => &mut self.happy,
            Emotion::Surprised => &mut self.surprised,
            Emotion::Confused => &mut self.confused,
            Emotion::Focused => &mut self.focused,
        }
    }

    pub fn map<U>(&self, mut f: impl FnMut(Emotion, &T) -> U) -> EmotionChannels<U> {
        EmotionChannels::from_fn(|emotion| f(emotion, self.get(emotion)))
    }

    /// `(channel, value)` pairs in channel order
    pub fn iter(&self) -> impl Iterator<Item = (Emotion, &T)> + '_ {
        Emotion::ALL.iter().map(move |&emotion| (emotion, self.get(emotion)))
    }
}

impl EmotionVector {
    /// Strongest channel (earliest wins ties)
    pub fn dominant(&self) -> (Emotion, f64) {
        self.iter().fold((Emotion::Smile, f64::MIN), |best, (emotion, &value)| {
            if value > best.1 {
                (emotion, value)
            } else {
                best
            }
        })
    }
}

/// Clamp to [0, 100]; non-finite collapses to 0
pub fn clamp_score(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// Fixed, explainable heuristic scorer
#[derive(Debug, Clone)]
pub struct EmotionScorer {
    config: EmotionConfig,
}

impl EmotionScorer {
    /// Create a new scorer
    pub fn new(config: EmotionConfig) -> Self {
        Self { config }
    }

    pub fn score_landmarks(
        &self,
        frame: &LandmarkFrame,
        baselines: &BaselineState,
        is_sleeping: bool,
    ) -> RawEmotions {
        self.score(&FaceMeasurements::from_landmarks(frame), baselines, is_sleeping)
    }

    /// Score every channel independently from one frame's geometry
    pub fn score(&self, m: &FaceMeasurements, baselines: &BaselineState, is_sleeping: bool) -> RawEmotions {
        // Relative eye openness; 1.0 until a baseline exists
        let ear_ratio = m.ear.and_then(|ear| match baselines.ear {
            Some(base) => ratio(ear, base),
            None => Some(1.0),
        });

        let smile = self.smile(m);
        let happy = smile.and_then(|s| self.happy(s, ear_ratio));
        let surprised = self.surprised(m, ear_ratio);
        let confused = self.confused(m, baselines);
        let focused = match (smile, happy, surprised, confused) {
            (Some(s), Some(h), Some(su), Some(c)) => {
                self.focused([s, h, su, c], m, ear_ratio, baselines, is_sleeping)
            }
            _ => None,
        };

        let raw = RawEmotions {
            smile,
            happy,
            surprised,
            confused,
            focused,
        }
        .map(|_, v| v.map(clamp_score));

        match self.config.mode {
            EmotionMode::Additive => raw,
            EmotionMode::DominantOnly => self.keep_dominant(raw),
        }
    }

    fn smile(&self, m: &FaceMeasurements) -> Option<f64> {
        let c = &self.config;
        let lift = m.corner_lift?;
        if lift <= c.smile_min_lift {
            return Some(0.0);
        }

        let mut score = (lift / c.smile_full_lift * 100.0).min(100.0);
        if let Some(width) = m.mouth_width.filter(|&w| w > c.smile_wide_mouth) {
            score *= (width / c.smile_wide_mouth).min(c.smile_max_boost);
        }
        Some(clamp_score(score))
    }

    fn happy(&self, smile: f64, ear_ratio: Option<f64>) -> Option<f64> {
        let c = &self.config;
        if smile <= c.happy_min_smile {
            return Some(0.0);
        }
        // Relaxed eyes: neither squeezed shut nor wide open
        let relaxed = c.happy_ear_band.contains(ear_ratio?);
        Some(if relaxed { smile * c.happy_factor } else { 0.0 })
    }

    fn surprised(&self, m: &FaceMeasurements, ear_ratio: Option<f64>) -> Option<f64> {
        let c = &self.config;
        let openness = m.mouth_openness?;
        let ear_ratio = ear_ratio?;

        let mouth_open = openness > c.surprise_mouth_open;
        let eyes_wide = ear_ratio > 1.0 + c.surprise_ear_margin;
        if !mouth_open && !eyes_wide {
            return Some(0.0);
        }

        let mouth_term = (openness - c.surprise_mouth_open).max(0.0) * c.surprise_mouth_gain;
        let eye_term = (ear_ratio - 1.0).max(0.0) * c.surprise_ear_gain;
        Some(clamp_score(mouth_term + eye_term))
    }

    fn confused(&self, m: &FaceMeasurements, baselines: &BaselineState) -> Option<f64> {
        let c = &self.config;

        // Brows pulled toward the eyes relative to this subject's rest position
        let brow_ratio = match baselines.brow_distance {
            Some(base) => ratio(m.brow_distance?, base)?,
            None => 1.0,
        };
        let furrow = ((1.0 - brow_ratio) / c.furrow_span).clamp(0.0, 1.0) * c.furrow_weight;

        let lift = m.corner_lift?;
        let frown = if lift < -c.frown_min_lift {
            ((-lift) / c.frown_full_lift).min(1.0) * c.frown_weight
        } else {
            0.0
        };

        let asymmetry = m.corner_asymmetry?;
        let lopsided = if asymmetry > c.asymmetry_min {
            (asymmetry / c.asymmetry_full).min(1.0) * c.asymmetry_weight
        } else {
            0.0
        };

        Some(clamp_score(furrow + frown + lopsided))
    }

    fn focused(
        &self,
        others: [f64; 4],
        m: &FaceMeasurements,
        ear_ratio: Option<f64>,
        baselines: &BaselineState,
        is_sleeping: bool,
    ) -> Option<f64> {
        let c = &self.config;
        let ear_ratio = ear_ratio?;

        let neutral = others.iter().all(|&v| v < c.focus_neutral_max);
        if is_sleeping || !neutral || !c.focus_ear_band.contains(ear_ratio) {
            return Some(0.0);
        }

        // Calm face: how far the other channels sit below the neutral ceiling
        let calm = 1.0 - others.iter().sum::<f64>() / (4.0 * c.focus_neutral_max);

        // Still posture: mouth width and head turn close to their baselines
        let near = |value: Option<f64>, base: Option<f64>| match (value, base) {
            (Some(v), Some(b)) => ratio(v, b).is_some_and(|r| (r - 1.0).abs() <= c.steady_tolerance),
            _ => true,
        };
        let posture = if near(m.mouth_width, baselines.mouth_width)
            && near(m.eye_distance, baselines.eye_distance)
        {
            1.0
        } else {
            0.0
        };

        let steadiness = 0.5 * calm.clamp(0.0, 1.0) + 0.5 * posture;
        Some(clamp_score(c.focus_floor + c.focus_steadiness_bonus * steadiness))
    }

    fn keep_dominant(&self, raw: RawEmotions) -> RawEmotions {
        // Unscored channels never win
        let (winner, value) = raw.map(|_, v| v.unwrap_or(f64::NEG_INFINITY)).dominant();

        match raw.get(winner) {
            Some(_) if value >= self.config.dominant_floor => {
                raw.map(|emotion, v| v.map(|v| if emotion == winner { v } else { 0.0 }))
            }
            _ => raw.map(|emotion, v| {
                v.map(|_| {
                    if emotion == Emotion::Focused {
                        self.config.focus_floor
                    } else {
                        0.0
                    }
                })
            }),
        }
    }
}
