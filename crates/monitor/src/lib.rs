//! EduGaze monitoring driver
//!
//! Paces frames from a source into one monitoring session, logs live
//! snapshots and writes the session export when the run ends.

pub mod settings;
pub mod source;

pub use settings::{MonitorSettings, SourceSettings};
pub use source::{DetectionRecord, FrameSource, ReplaySource, SyntheticSource};

use affect::AffectError;
use chrono::Utc;
use session::{MonitoringSession, SessionError, SessionSummary};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::time::{self, Duration, Instant, MissedTickBehavior};
use tracing::{debug, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Monitor error types
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Settings error: {0}")]
    Settings(#[from] config::ConfigError),

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("Pipeline configuration error: {0}")]
    Affect(#[from] AffectError),

    #[error("Failed to open frame source {path}: {source}")]
    SourceOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Failed to write export {path}: {source}")]
    Export {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Initialize logging
pub fn init_logging(level: &str, json: bool) {
    let level = level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);

    let result = if json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };
    if result.is_err() {
        debug!("Tracing subscriber already installed");
    }
}

/// Elapsed time as `MM:SS`
pub fn format_clock(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Wall-clock Unix time in milliseconds
pub fn epoch_ms() -> u64 {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0)
}

/// Frame timestamp: the session's start epoch advanced by monotonic elapsed
/// time, so wall-clock steps never reorder frames
pub fn session_clock_ms(start_epoch_ms: u64, started: Instant) -> u64 {
    let elapsed = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    start_epoch_ms.saturating_add(elapsed)
}

/// Open the configured frame source
pub fn open_source(settings: &SourceSettings) -> Result<Box<dyn FrameSource>, MonitorError> {
    Ok(match settings {
        SourceSettings::Replay { path } => Box::new(ReplaySource::open(path)?),
        SourceSettings::Synthetic { frames } => Box::new(SyntheticSource::new(*frames)),
    })
}

/// Run one session until the source is exhausted or Ctrl-C, then stop it
/// and return its export (`None` if no frame was processed).
pub async fn run_session<S>(
    settings: &MonitorSettings,
    source: &mut S,
) -> Result<Option<SessionSummary>, MonitorError>
where
    S: FrameSource + ?Sized,
{
    settings.validate()?;
    let frame_period = settings.frame_period()?;

    let start_epoch_ms = epoch_ms();
    let started = Instant::now();
    let mut session = MonitoringSession::new(settings.affect.clone(), start_epoch_ms)?;
    info!(session = %session.id(), fps = settings.fps, "Monitoring started");

    // The ticker only reads the start instant
    let status_period = Duration::from_secs(settings.status_interval_secs);
    let ticker = tokio::spawn(async move {
        let mut interval = time::interval_at(started + status_period, status_period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            info!(elapsed = %format_clock(started.elapsed().as_secs()), "Session time");
        }
    });

    let mut frames = time::interval(frame_period);
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Stop requested");
                break;
            }
            _ = frames.tick() => {
                let Some(detection) = source.next_detection() else {
                    info!("Frame source exhausted");
                    break;
                };
                match session.process_frame(&detection, session_clock_ms(start_epoch_ms, started)) {
                    Ok(snapshot) if settings.snapshot_every > 0
                        && snapshot.frame_index % settings.snapshot_every == 0 =>
                    {
                        info!(
                            frame = snapshot.frame_index,
                            engagement = snapshot.engagement.score.round(),
                            status = %snapshot.engagement.status,
                            blinks = snapshot.blink_count,
                            sleeping = snapshot.sleep.is_sleeping(),
                            "Live snapshot"
                        );
                    }
                    Ok(_) => {}
                    Err(e) => warn!(error = %e, "Frame rejected"),
                }
            }
        }
    }

    ticker.abort();
    let now = session_clock_ms(start_epoch_ms, started);
    session.stop(now);
    Ok(session.export(now))
}

/// Write the export next to other sessions as `edugaze_session_<time>.json`
pub fn write_export(summary: &SessionSummary, dir: &Path) -> Result<PathBuf, MonitorError> {
    let name = format!(
        "edugaze_session_{}.json",
        summary.timestamp.format("%Y-%m-%dT%H-%M-%S")
    );
    let path = dir.join(name);
    let json = summary.to_json_pretty()?;
    std::fs::write(&path, json).map_err(|source| MonitorError::Export {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(75), "01:15");
        assert_eq!(format_clock(3_600), "60:00");
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_session_exports_synthetic_frames() {
        let settings = MonitorSettings {
            fps: 100.0,
            ..Default::default()
        };
        let mut source = SyntheticSource::new(60);
        let summary = run_session(&settings, &mut source).await.unwrap().unwrap();
        assert_eq!(summary.emotion_timeline.focused.len(), 60);
        assert!((0.0..=100.0).contains(&summary.engagement_score));
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_clock_is_monotonic() {
        let started = Instant::now();
        assert_eq!(session_clock_ms(1_000, started), 1_000);

        time::advance(Duration::from_millis(1_500)).await;
        assert_eq!(session_clock_ms(1_000, started), 2_500);
        assert_eq!(session_clock_ms(u64::MAX, started), u64::MAX);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_session_spans_paced_frames() {
        let settings = MonitorSettings {
            fps: 10.0,
            ..Default::default()
        };
        let mut source = SyntheticSource::new(21);
        let summary = run_session(&settings, &mut source).await.unwrap().unwrap();
        // First tick fires immediately, the rest every 100 ms of paused time
        assert_eq!(summary.duration_seconds, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_session_rejects_unusable_fps() {
        let settings = MonitorSettings {
            fps: 1.0e12,
            ..Default::default()
        };
        let mut source = SyntheticSource::new(10);
        assert!(matches!(
            run_session(&settings, &mut source).await,
            Err(MonitorError::InvalidSettings(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_source_has_no_data() {
        let settings = MonitorSettings::default();
        let mut source = SyntheticSource::new(0);
        assert!(run_session(&settings, &mut source).await.unwrap().is_none());
    }

    #[test]
    fn test_write_export() {
        let mut session = MonitoringSession::new(Default::default(), 1_700_000_000_000).unwrap();
        session
            .process_frame(&affect::Detection::NoFace, 1_700_000_001_000)
            .unwrap();
        let summary = session.export(1_700_000_001_000).unwrap();

        let dir = std::env::temp_dir().join(format!("edugaze-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = write_export(&summary, &dir).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_dir_all(&dir).ok();

        assert!(path.ends_with("edugaze_session_2023-11-14T22-13-21.json"));
        assert_eq!(SessionSummary::from_json(&written).unwrap(), summary);
    }
}
