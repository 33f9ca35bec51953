//! Composite engagement score

use crate::config::EngagementConfig;
use crate::emotion::{clamp_score, EmotionVector};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Categorical engagement label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngagementStatus {
    #[serde(rename = "Highly Engaged")]
    HighlyEngaged,
    #[serde(rename = "Engaged")]
    Engaged,
    #[serde(rename = "Moderately Engaged")]
    ModeratelyEngaged,
    #[serde(rename = "Low Engagement")]
    LowEngagement,
    /// Forced while asleep, regardless of the numeric score
    #[serde(rename = "Sleeping")]
    Sleeping,
}

impl EngagementStatus {
    pub fn label(self) -> &'static str {
        match self {
            EngagementStatus::HighlyEngaged => "Highly Engaged",
            EngagementStatus::Engaged => "Engaged",
            EngagementStatus::ModeratelyEngaged => "Moderately Engaged",
            EngagementStatus::LowEngagement => "Low Engagement",
            EngagementStatus::Sleeping => "Sleeping",
        }
    }
}

impl fmt::Display for EngagementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngagementScore {
    /// In [0, 100]
    pub score: f64,
    pub status: EngagementStatus,
}

/// Weighted sum of the smoothed channels minus the sleep penalty
#[derive(Debug, Clone)]
pub struct EngagementAggregator {
    config: EngagementConfig,
}

impl EngagementAggregator {
    /// Create a new aggregator with the given channel weights
    pub fn new(config: EngagementConfig) -> Self {
        Self { config }
    }

    /// Live score for one frame
    pub fn aggregate(&self, emotions: &EmotionVector, is_sleeping: bool) -> EngagementScore {
        let penalty = if is_sleeping { self.config.sleep_penalty } else { 0.0 };
        let score = clamp_score(self.weighted(emotions) - penalty);
        let status = if is_sleeping {
            EngagementStatus::Sleeping
        } else {
            self.status_for(score)
        };
        EngagementScore { score, status }
    }

    /// Session score from per-channel averages. The penalty is scaled by the
    /// share of the session spent asleep.
    pub fn aggregate_session(&self, averages: &EmotionVector, sleep_fraction: f64) -> EngagementScore {
        let fraction = if sleep_fraction.is_finite() {
            sleep_fraction.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let score = clamp_score(self.weighted(averages) - fraction * self.config.sleep_penalty);
        EngagementScore {
            score,
            status: self.status_for(score),
        }
    }

    pub fn status_for(&self, score: f64) -> EngagementStatus {
        let c = &self.config;
        if score >= c.highly_engaged {
            EngagementStatus::HighlyEngaged
        } else if score >= c.engaged {
            EngagementStatus::Engaged
        } else if score >= c.moderately_engaged {
            EngagementStatus::ModeratelyEngaged
        } else {
            EngagementStatus::LowEngagement
        }
    }

    fn weighted(&self, e: &EmotionVector) -> f64 {
        let w = &self.config.weights;
        e.focused * w.focused
            + e.happy * w.happy
            + e.smile * w.smile
            + e.surprised * w.surprised
            + e.confused * w.confused
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn aggregator() -> EngagementAggregator {
        EngagementAggregator::new(EngagementConfig::default())
    }

    fn vector(focused: f64, happy: f64, smile: f64, confused: f64) -> EmotionVector {
        EmotionVector {
            smile,
            happy,
            surprised: 0.0,
            confused,
            focused,
        }
    }

    #[test]
    fn test_weighted_score() {
        let result = aggregator().aggregate(&vector(80.0, 50.0, 20.0, 10.0), false);
        assert!((result.score - 62.0).abs() < 1e-9);
        assert_eq!(result.status, EngagementStatus::Engaged);
    }

    #[test]
    fn test_status_thresholds() {
        let a = aggregator();
        assert_eq!(a.status_for(80.0), EngagementStatus::HighlyEngaged);
        assert_eq!(a.status_for(79.9), EngagementStatus::Engaged);
        assert_eq!(a.status_for(40.0), EngagementStatus::ModeratelyEngaged);
        assert_eq!(a.status_for(39.9), EngagementStatus::LowEngagement);
    }

    #[test]
    fn test_sleep_forces_status() {
        let result = aggregator().aggregate(&vector(100.0, 100.0, 100.0, 0.0), true);
        // 60 + 30 + 10 - 50
        assert!((result.score - 50.0).abs() < 1e-9);
        assert_eq!(result.status, EngagementStatus::Sleeping);
    }

    #[test]
    fn test_clamped_at_zero() {
        let result = aggregator().aggregate(&vector(0.0, 0.0, 0.0, 100.0), true);
        assert_eq!(result.score, 0.0);
    }

    #[test]
    fn test_session_penalty_scales_with_sleep_fraction() {
        let a = aggregator();
        let averages = vector(80.0, 50.0, 20.0, 10.0);
        assert!((a.aggregate_session(&averages, 0.0).score - 62.0).abs() < 1e-9);
        assert!((a.aggregate_session(&averages, 0.2).score - 52.0).abs() < 1e-9);
        assert_eq!(a.aggregate_session(&averages, 0.2).status, EngagementStatus::ModeratelyEngaged);
    }

    #[test]
    fn test_status_serializes_as_label() {
        let json = serde_json::to_string(&EngagementStatus::ModeratelyEngaged).unwrap();
        assert_eq!(json, "\"Moderately Engaged\"");
    }

    proptest! {
        #[test]
        fn score_stays_in_range(
            smile in 0.0f64..=100.0,
            happy in 0.0f64..=100.0,
            surprised in 0.0f64..=100.0,
            confused in 0.0f64..=100.0,
            focused in 0.0f64..=100.0,
            sleeping in any::<bool>(),
        ) {
            let v = EmotionVector { smile, happy, surprised, confused, focused };
            let result = aggregator().aggregate(&v, sleeping);
            prop_assert!((0.0..=100.0).contains(&result.score));
        }
    }
}
