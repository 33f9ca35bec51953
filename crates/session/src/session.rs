//! Monitoring session

use crate::recorder::SessionRecorder;
use crate::summary::SessionSummary;
use crate::SessionError;
use affect::{
    AffectConfig, AffectPipeline, Detection, EmotionVector, EngagementScore, FrameAnalysis,
    SleepState, SleepTransition,
};
use chrono::{DateTime, Utc};
use face_landmarks::{LandmarkFrame, Point};
use metrics::{counter, gauge, histogram};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, info_span, warn, Span};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameKind {
    Face,
    NoFace,
}

impl FrameKind {
    fn as_label(self) -> &'static str {
        match self {
            FrameKind::Face => "face",
            FrameKind::NoFace => "no_face",
        }
    }
}

/// Live outputs after one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSnapshot {
    pub timestamp_ms: u64,
    /// 1-based index of this frame in the session
    pub frame_index: u64,
    pub kind: FrameKind,
    pub emotions: EmotionVector,
    pub engagement: EngagementScore,
    pub blink_count: u32,
    /// Blinks per elapsed minute; 0 before any time has passed
    pub blink_rate_per_min: f64,
    pub sleep: SleepState,
    pub sleep_elapsed_seconds: f64,
    pub sleep_percentage: f64,
    pub calibrating: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ear: Option<f64>,
}

/// One subject, one session. A new session starts from a fresh instance.
///
/// Timestamps are Unix epoch milliseconds supplied by the frame producer.
#[derive(Debug)]
pub struct MonitoringSession {
    id: Uuid,
    span: Span,
    pipeline: AffectPipeline,
    recorder: SessionRecorder,
    started_at_ms: u64,
    last_timestamp_ms: Option<u64>,
    stopped_at_ms: Option<u64>,
}

impl MonitoringSession {
    /// Create a new session with a fresh pipeline, started at `started_at_ms`
    pub fn new(config: AffectConfig, started_at_ms: u64) -> Result<Self, SessionError> {
        let pipeline = AffectPipeline::new(config)?;
        let id = Uuid::new_v4();
        let span = info_span!("session", id = %id);
        span.in_scope(|| info!(started_at_ms, "Session started"));

        Ok(Self {
            id,
            span,
            pipeline,
            recorder: SessionRecorder::new(),
            started_at_ms,
            last_timestamp_ms: None,
            stopped_at_ms: None,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn started_at_ms(&self) -> u64 {
        self.started_at_ms
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped_at_ms.is_some()
    }

    pub fn frame_count(&self) -> u64 {
        self.recorder.frame_count()
    }

    pub fn pipeline(&self) -> &AffectPipeline {
        &self.pipeline
    }

    /// Process one detection cycle. Rejected frames leave the session untouched.
    pub fn process_frame(
        &mut self,
        detection: &Detection,
        timestamp_ms: u64,
    ) -> Result<FrameSnapshot, SessionError> {
        let _guard = self.span.clone().entered();
        self.accept(timestamp_ms)?;

        let start = Instant::now();
        let analysis = self.pipeline.process(detection, timestamp_ms);
        self.recorder.record(&analysis);
        self.last_timestamp_ms = Some(timestamp_ms);

        let snapshot = self.snapshot(&analysis, timestamp_ms);
        self.observe(&analysis, &snapshot);
        histogram!("edugaze_frame_processing_seconds").record(start.elapsed().as_secs_f64());

        Ok(snapshot)
    }

    /// Process a raw face mesh (`None` when the detector found no face).
    /// A mesh missing required points is rejected before any state changes.
    pub fn process_mesh(
        &mut self,
        mesh: Option<&[Point]>,
        timestamp_ms: u64,
    ) -> Result<FrameSnapshot, SessionError> {
        self.span.in_scope(|| self.accept(timestamp_ms))?;

        let detection = match mesh {
            Some(points) => match LandmarkFrame::from_face_mesh(points) {
                Ok(frame) => Detection::Face(frame),
                Err(e) => {
                    self.span.in_scope(|| warn!(error = %e, timestamp_ms, "Frame rejected"));
                    counter!("edugaze_frames_rejected_total").increment(1);
                    return Err(e.into());
                }
            },
            None => Detection::NoFace,
        };
        self.process_frame(&detection, timestamp_ms)
    }

    fn accept(&self, timestamp_ms: u64) -> Result<(), SessionError> {
        if self.is_stopped() {
            return Err(SessionError::Stopped);
        }
        if let Some(last_ms) = self.last_timestamp_ms {
            if timestamp_ms < last_ms {
                warn!(last_ms, got_ms = timestamp_ms, "Stale frame rejected");
                counter!("edugaze_frames_rejected_total").increment(1);
                return Err(SessionError::StaleFrame {
                    last_ms,
                    got_ms: timestamp_ms,
                });
            }
        }
        Ok(())
    }

    fn snapshot(&self, analysis: &FrameAnalysis, now_ms: u64) -> FrameSnapshot {
        let elapsed_ms = now_ms.saturating_sub(self.started_at_ms);
        let sleep_ms = self.pipeline.eye_tracker().sleep_elapsed_ms(now_ms);
        let blink_count = self.recorder.blink_count();

        let blink_rate_per_min = if elapsed_ms > 0 {
            f64::from(blink_count) / (elapsed_ms as f64 / 60_000.0)
        } else {
            0.0
        };
        let sleep_percentage = if elapsed_ms > 0 {
            (sleep_ms as f64 / elapsed_ms as f64 * 100.0).min(100.0)
        } else {
            0.0
        };

        FrameSnapshot {
            timestamp_ms: now_ms,
            frame_index: self.recorder.frame_count(),
            kind: if analysis.face_detected {
                FrameKind::Face
            } else {
                FrameKind::NoFace
            },
            emotions: analysis.emotions,
            engagement: analysis.engagement,
            blink_count,
            blink_rate_per_min,
            sleep: analysis.sleep,
            sleep_elapsed_seconds: sleep_ms as f64 / 1000.0,
            sleep_percentage,
            calibrating: analysis.calibrating,
            ear: analysis.ear,
        }
    }

    fn observe(&self, analysis: &FrameAnalysis, snapshot: &FrameSnapshot) {
        counter!("edugaze_frames_total", "kind" => snapshot.kind.as_label()).increment(1);
        if analysis.blinked {
            counter!("edugaze_blinks_total").increment(1);
        }
        gauge!("edugaze_engagement_score").set(snapshot.engagement.score);

        match analysis.transition {
            Some(SleepTransition::FellAsleep) => {
                info!(frame = snapshot.frame_index, "Sleep started");
            }
            Some(SleepTransition::WokeUp { slept_ms }) => {
                info!(frame = snapshot.frame_index, slept_ms, "Sleep ended");
            }
            None => {}
        }
        debug!(
            frame = snapshot.frame_index,
            engagement = snapshot.engagement.score,
            status = %snapshot.engagement.status,
            "Frame processed"
        );
    }

    /// End the session. Further frames are refused; export stays available.
    pub fn stop(&mut self, now_ms: u64) {
        if self.stopped_at_ms.is_some() {
            return;
        }
        let stopped_at = self.last_timestamp_ms.map_or(now_ms, |last| now_ms.max(last));
        self.stopped_at_ms = Some(stopped_at);
        self.span.in_scope(|| {
            info!(
                frames = self.recorder.frame_count(),
                duration_ms = stopped_at.saturating_sub(self.started_at_ms),
                "Session stopped"
            )
        });
    }

    /// Summarize the session as of `now_ms`, or as of the stop time once
    /// stopped. `None` when no frame was recorded.
    pub fn export(&self, now_ms: u64) -> Option<SessionSummary> {
        let end_ms = self.stopped_at_ms.unwrap_or(now_ms);
        let duration_ms = end_ms.saturating_sub(self.started_at_ms);
        let sleep_ms = self.pipeline.eye_tracker().sleep_elapsed_ms(end_ms);
        let exported_at = i64::try_from(end_ms)
            .ok()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .unwrap_or_else(Utc::now);

        let summary = SessionSummary::build(
            &self.recorder,
            self.pipeline.aggregator(),
            duration_ms,
            sleep_ms,
            exported_at,
        );
        if summary.is_none() {
            self.span.in_scope(|| info!("Export requested with no recorded frames"));
        }
        summary
    }
}
