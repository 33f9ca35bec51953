//! Blink counting and sleep/wake hysteresis

use crate::config::EyeConfig;
use ring_buffer::RingBuffer;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Sleep state. The start time lives inside `Asleep`, so it is set exactly
/// while the subject is asleep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SleepState {
    #[default]
    Awake,
    Asleep { since_ms: u64 },
}

impl SleepState {
    pub fn is_sleeping(&self) -> bool {
        matches!(self, SleepState::Asleep { .. })
    }

    pub fn sleep_start_ms(&self) -> Option<u64> {
        match self {
            SleepState::Asleep { since_ms } => Some(*since_ms),
            SleepState::Awake => None,
        }
    }
}

/// Sleep state change produced by one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SleepTransition {
    FellAsleep,
    WokeUp { slept_ms: u64 },
}

/// What one frame did to the eye state
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EyeUpdate {
    pub blinked: bool,
    pub transition: Option<SleepTransition>,
    /// Mean of the EAR history after this frame
    pub avg_ear: Option<f64>,
}

/// Eye-closure tracker
#[derive(Debug, Clone)]
pub struct EyeStateTracker {
    config: EyeConfig,
    ear_history: RingBuffer<f64>,
    /// Closure evidence; decays by `closure_decay` per open frame, floored at 0
    closed_frames: u32,
    /// Consecutive frames without closure evidence
    open_frames: u32,
    sleep: SleepState,
    cumulative_sleep_ms: u64,
    blink_count: u32,
    last_blink_ms: Option<u64>,
}

impl EyeStateTracker {
    /// Create a new tracker: awake, no blinks, empty EAR history
    pub fn new(config: EyeConfig) -> Self {
        Self {
            ear_history: RingBuffer::new(config.ear_history_size.max(1)),
            config,
            closed_frames: 0,
            open_frames: 0,
            sleep: SleepState::Awake,
            cumulative_sleep_ms: 0,
            blink_count: 0,
            last_blink_ms: None,
        }
    }

    /// Feed one face frame's averaged EAR. A degenerate EAR (`None`) leaves
    /// the state untouched.
    pub fn observe(&mut self, ear: Option<f64>, ear_baseline: Option<f64>, now_ms: u64) -> EyeUpdate {
        let Some(ear) = ear.filter(|v| v.is_finite()) else {
            return EyeUpdate {
                avg_ear: self.ear_history.mean(),
                ..Default::default()
            };
        };

        let baseline = ear_baseline.unwrap_or(self.config.fallback_ear_baseline);

        // Blink: plain debounce on the instantaneous value
        let blinked = ear < baseline * self.config.blink_ratio
            && self
                .last_blink_ms
                .map_or(true, |last| now_ms.saturating_sub(last) >= self.config.blink_debounce_ms);
        if blinked {
            self.blink_count += 1;
            self.last_blink_ms = Some(now_ms);
            debug!(ear, count = self.blink_count, "Blink");
        }

        self.ear_history.push(ear);
        let avg_ear = self.ear_history.mean();
        let closed = avg_ear.is_some_and(|avg| avg < baseline * self.config.sleep_ratio);

        EyeUpdate {
            blinked,
            transition: self.record_evidence(closed, now_ms),
            avg_ear,
        }
    }

    /// A frame without a detected face counts as closure evidence
    pub fn observe_no_face(&mut self, now_ms: u64) -> EyeUpdate {
        EyeUpdate {
            blinked: false,
            transition: self.record_evidence(true, now_ms),
            avg_ear: self.ear_history.mean(),
        }
    }

    fn record_evidence(&mut self, closed: bool, now_ms: u64) -> Option<SleepTransition> {
        if closed {
            self.closed_frames += 1;
            self.open_frames = 0;
        } else {
            self.closed_frames = self.closed_frames.saturating_sub(self.config.closure_decay);
            self.open_frames += 1;
        }

        match self.sleep {
            SleepState::Awake if self.closed_frames >= self.config.sleep_confirm_frames => {
                self.sleep = SleepState::Asleep { since_ms: now_ms };
                info!(closed_frames = self.closed_frames, "Subject fell asleep");
                Some(SleepTransition::FellAsleep)
            }
            SleepState::Asleep { since_ms }
                if self.closed_frames < self.config.wake_confirm_frames
                    && self.open_frames >= self.config.wake_confirm_frames =>
            {
                let slept_ms = now_ms.saturating_sub(since_ms);
                self.cumulative_sleep_ms += slept_ms;
                self.sleep = SleepState::Awake;
                info!(slept_ms, total_ms = self.cumulative_sleep_ms, "Subject woke up");
                Some(SleepTransition::WokeUp { slept_ms })
            }
            _ => None,
        }
    }

    pub fn sleep_state(&self) -> SleepState {
        self.sleep
    }

    pub fn is_sleeping(&self) -> bool {
        self.sleep.is_sleeping()
    }

    pub fn blink_count(&self) -> u32 {
        self.blink_count
    }

    pub fn closed_frames(&self) -> u32 {
        self.closed_frames
    }

    /// Completed sleep intervals only
    pub fn cumulative_sleep_ms(&self) -> u64 {
        self.cumulative_sleep_ms
    }

    /// Completed intervals plus the one still running at `now_ms`
    pub fn sleep_elapsed_ms(&self, now_ms: u64) -> u64 {
        let running = self
            .sleep
            .sleep_start_ms()
            .map_or(0, |since| now_ms.saturating_sub(since));
        self.cumulative_sleep_ms + running
    }

    pub fn avg_ear(&self) -> Option<f64> {
        self.ear_history.mean()
    }
}
