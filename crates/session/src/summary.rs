//! Session export document and report insights

use crate::recorder::SessionRecorder;
use crate::SessionError;
use affect::{EmotionChannels, EmotionVector, EngagementAggregator};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Exported session. Field names are read by the report viewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Export time
    pub timestamp: DateTime<Utc>,
    pub duration_seconds: u64,
    pub blink_count: u32,
    pub blink_rate_per_min: f64,
    /// Includes a sleep interval still running at export time
    pub sleep_time_seconds: u64,
    /// In [0, 100]
    pub sleep_percentage: f64,
    /// Recomputed from the averages, not the last live score
    pub engagement_score: f64,
    pub emotions_average: EmotionVector,
    pub emotion_timeline: EmotionChannels<Vec<f64>>,
}

impl SessionSummary {
    /// Summarize a recording. `None` when no frame was ever recorded.
    pub fn build(
        recorder: &SessionRecorder,
        aggregator: &EngagementAggregator,
        duration_ms: u64,
        sleep_ms: u64,
        exported_at: DateTime<Utc>,
    ) -> Option<Self> {
        if recorder.is_empty() {
            return None;
        }

        let minutes = duration_ms as f64 / 60_000.0;
        let blink_rate = if minutes > 0.0 {
            f64::from(recorder.blink_count()) / minutes
        } else {
            0.0
        };
        let sleep_fraction = if duration_ms > 0 {
            (sleep_ms as f64 / duration_ms as f64).min(1.0)
        } else {
            0.0
        };

        let averages = recorder
            .averages()
            .unwrap_or_default()
            .map(|_, v| round2(*v));
        let engagement = aggregator.aggregate_session(&averages, sleep_fraction);

        Some(Self {
            timestamp: exported_at,
            duration_seconds: round_seconds(duration_ms),
            blink_count: recorder.blink_count(),
            blink_rate_per_min: round2(blink_rate),
            sleep_time_seconds: round_seconds(sleep_ms),
            sleep_percentage: round2(sleep_fraction * 100.0),
            engagement_score: round2(engagement.score),
            emotions_average: averages,
            emotion_timeline: recorder.timeline().clone(),
        })
    }

    /// Parse an exported document
    pub fn from_json(json: &str) -> Result<Self, SessionError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, SessionError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Observations shown by the report viewer, most important first
    pub fn insights(&self) -> Vec<Insight> {
        let mut insights = Vec::new();

        insights.push(if self.engagement_score >= 80.0 {
            Insight::success(
                "Excellent Engagement",
                "Student maintained high engagement throughout the session.",
            )
        } else if self.engagement_score >= 60.0 {
            Insight::info(
                "Good Engagement",
                "Student showed consistent attention with room for improvement.",
            )
        } else {
            Insight::warning(
                "Low Engagement",
                "Student engagement was below optimal levels. Consider shorter sessions or breaks.",
            )
        });

        if self.sleep_percentage > 10.0 {
            insights.push(Insight::warning(
                "Sleep Detected",
                format!(
                    "Student appeared to sleep for {}s ({}% of session). Consider session timing or duration.",
                    self.sleep_time_seconds, self.sleep_percentage
                ),
            ));
        } else if self.sleep_percentage > 0.0 {
            insights.push(Insight::info(
                "Brief Drowsiness",
                "Minor sleep detected. Student may benefit from a break.",
            ));
        }

        if self.blink_rate_per_min < 10.0 {
            insights.push(Insight::info(
                "Low Blink Rate",
                "Below-average blink rate may indicate screen fatigue. Encourage regular breaks.",
            ));
        } else if self.blink_rate_per_min > 25.0 {
            insights.push(Insight::info(
                "High Blink Rate",
                "Elevated blink rate may suggest tiredness or eye strain.",
            ));
        }

        let avg = &self.emotions_average;
        if avg.focused > 70.0 {
            insights.push(Insight::success(
                "Strong Focus",
                "Student demonstrated excellent concentration during the session.",
            ));
        }
        if avg.confused > 30.0 {
            insights.push(Insight::warning(
                "Confusion Detected",
                "Student showed signs of confusion. Material may need clarification or review.",
            ));
        }
        if avg.happy > 40.0 {
            insights.push(Insight::success(
                "Positive Emotions",
                "Student displayed positive emotions, indicating enjoyment of the content.",
            ));
        }

        insights
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightKind {
    Success,
    Info,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: InsightKind,
}

impl Insight {
    fn new(kind: InsightKind, title: &str, description: impl Into<String>) -> Self {
        Self {
            title: title.to_string(),
            description: description.into(),
            kind,
        }
    }

    fn success(title: &str, description: impl Into<String>) -> Self {
        Self::new(InsightKind::Success, title, description)
    }

    fn info(title: &str, description: impl Into<String>) -> Self {
        Self::new(InsightKind::Info, title, description)
    }

    fn warning(title: &str, description: impl Into<String>) -> Self {
        Self::new(InsightKind::Warning, title, description)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn round_seconds(ms: u64) -> u64 {
    (ms + 500) / 1000
}
