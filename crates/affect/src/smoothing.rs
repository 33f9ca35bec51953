//! Per-channel temporal smoothing

use crate::config::SmoothingMethod;
use crate::emotion::{clamp_score, Emotion, EmotionChannels, EmotionVector, RawEmotions};
use ring_buffer::RingBuffer;

#[derive(Debug, Clone)]
enum Filter {
    Exponential { alpha: f64 },
    MovingAverage { window: RingBuffer<f64> },
}

#[derive(Debug, Clone)]
struct ChannelState {
    filter: Filter,
    /// Last smoothed output
    last: Option<f64>,
}

impl ChannelState {
    fn new(method: SmoothingMethod) -> Self {
        let filter = match method {
            SmoothingMethod::Exponential { alpha } => Filter::Exponential {
                alpha: alpha.clamp(0.0, 1.0),
            },
            SmoothingMethod::MovingAverage { window } => Filter::MovingAverage {
                window: RingBuffer::new(window.max(1)),
            },
        };
        Self { filter, last: None }
    }

    fn update(&mut self, raw: f64) -> f64 {
        let smoothed = match &mut self.filter {
            Filter::Exponential { alpha } => match self.last {
                // First sample seeds the memory
                None => raw,
                Some(previous) => *alpha * raw + (1.0 - *alpha) * previous,
            },
            Filter::MovingAverage { window } => {
                window.push(raw);
                window.mean().unwrap_or(raw)
            }
        };
        let smoothed = clamp_score(smoothed);
        self.last = Some(smoothed);
        smoothed
    }
}

/// One filter per emotion channel. The method is fixed for the lifetime of
/// the smoother, so a session never mixes EMA and moving-average output.
#[derive(Debug, Clone)]
pub struct TemporalSmoother {
    method: SmoothingMethod,
    channels: EmotionChannels<ChannelState>,
    seeded: bool,
}

impl TemporalSmoother {
    /// Create a new smoother; every channel starts unseeded
    pub fn new(method: SmoothingMethod) -> Self {
        Self {
            method,
            channels: EmotionChannels::from_fn(|_| ChannelState::new(method)),
            seeded: false,
        }
    }

    pub fn method(&self) -> SmoothingMethod {
        self.method
    }

    /// Smooth one raw sample on one channel
    pub fn smooth(&mut self, emotion: Emotion, raw: f64) -> f64 {
        self.seeded = true;
        self.channels.get_mut(emotion).update(clamp_score(raw))
    }

    /// Smooth a raw vector. Skipped channels (`None`) carry their previous
    /// smoothed value forward, or 0 if they have never been seen.
    pub fn smooth_vector(&mut self, raw: &RawEmotions) -> EmotionVector {
        self.seeded = true;
        EmotionVector::from_fn(|emotion| {
            let channel = self.channels.get_mut(emotion);
            match raw.get(emotion) {
                Some(value) => channel.update(clamp_score(*value)),
                None => channel.last.unwrap_or(0.0),
            }
        })
    }

    /// Last smoothed vector, `None` before the first sample
    pub fn current(&self) -> Option<EmotionVector> {
        self.seeded
            .then(|| self.channels.map(|_, channel| channel.last.unwrap_or(0.0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all(value: f64) -> RawEmotions {
        RawEmotions::from_fn(|_| Some(value))
    }

    #[test]
    fn test_first_sample_seeds() {
        let mut smoother = TemporalSmoother::new(SmoothingMethod::Exponential { alpha: 0.3 });
        assert_eq!(smoother.current(), None);
        assert_eq!(smoother.smooth(Emotion::Happy, 40.0), 40.0);
    }

    #[test]
    fn test_ema_step() {
        let mut smoother = TemporalSmoother::new(SmoothingMethod::Exponential { alpha: 0.3 });
        smoother.smooth(Emotion::Focused, 100.0);
        let v = smoother.smooth(Emotion::Focused, 0.0);
        assert!((v - 70.0).abs() < 1e-12);
    }

    #[test]
    fn test_channels_are_independent() {
        let mut smoother = TemporalSmoother::new(SmoothingMethod::Exponential { alpha: 0.3 });
        smoother.smooth(Emotion::Smile, 80.0);
        // Confused has no memory yet, so it seeds
        assert_eq!(smoother.smooth(Emotion::Confused, 10.0), 10.0);
        let current = smoother.current().unwrap();
        assert_eq!(current.smile, 80.0);
        assert_eq!(current.confused, 10.0);
    }

    #[test]
    fn test_moving_average_window() {
        let mut smoother = TemporalSmoother::new(SmoothingMethod::MovingAverage { window: 5 });
        let mut last = 0.0;
        for v in [10.0, 20.0, 30.0, 40.0, 50.0, 60.0] {
            last = smoother.smooth(Emotion::Surprised, v);
        }
        // Mean of the last five samples
        assert!((last - 40.0).abs() < 1e-12);
    }

    #[test]
    fn test_skipped_channel_carries_forward() {
        let mut smoother = TemporalSmoother::new(SmoothingMethod::Exponential { alpha: 0.3 });
        smoother.smooth_vector(&all(50.0));

        let mut partial = all(0.0);
        partial.smile = None;
        let v = smoother.smooth_vector(&partial);
        assert_eq!(v.smile, 50.0);
        assert!((v.happy - 35.0).abs() < 1e-12);
    }

    #[test]
    fn test_output_stays_in_range() {
        let mut smoother = TemporalSmoother::new(SmoothingMethod::Exponential { alpha: 0.3 });
        assert_eq!(smoother.smooth(Emotion::Smile, 250.0), 100.0);
        assert_eq!(smoother.smooth(Emotion::Smile, f64::NAN), 70.0);
    }
}
