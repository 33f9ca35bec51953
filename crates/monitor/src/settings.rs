//! Layered settings: defaults, optional TOML file, then `EDUGAZE__*` env vars

use crate::MonitorError;
use affect::AffectConfig;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// File read when no explicit path is given (any supported extension)
pub const DEFAULT_CONFIG_NAME: &str = "edugaze";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorSettings {
    pub log_level: String,
    pub json_logs: bool,
    /// Frame pacing; late ticks are skipped, never queued
    pub fps: f64,
    /// Period of the elapsed-time log line
    pub status_interval_secs: u64,
    /// Log a live snapshot every N processed frames
    pub snapshot_every: u64,
    /// Directory the session export is written to
    pub export_dir: PathBuf,
    pub source: SourceSettings,
    pub affect: AffectConfig,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            fps: 30.0,
            status_interval_secs: 1,
            snapshot_every: 30,
            export_dir: PathBuf::from("."),
            source: SourceSettings::default(),
            affect: AffectConfig::default(),
        }
    }
}

/// Where frames come from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceSettings {
    /// JSON-lines file of recorded detections
    Replay { path: PathBuf },
    /// Scripted demo face
    Synthetic { frames: u64 },
}

impl Default for SourceSettings {
    fn default() -> Self {
        // 30 seconds at 30 fps
        SourceSettings::Synthetic { frames: 900 }
    }
}

impl MonitorSettings {
    /// Load settings. An explicit `path` must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, MonitorError> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_NAME).required(false),
        };

        let settings: MonitorSettings = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix("EDUGAZE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        debug!(?settings, "Settings loaded");
        Ok(settings)
    }

    /// Interval between frames; rejects rates with no representable non-zero period
    pub fn frame_period(&self) -> Result<Duration, MonitorError> {
        if !(self.fps.is_finite() && self.fps > 0.0) {
            return Err(MonitorError::InvalidSettings("fps must be > 0".to_string()));
        }
        match Duration::try_from_secs_f64(1.0 / self.fps) {
            Ok(period) if !period.is_zero() => Ok(period),
            _ => Err(MonitorError::InvalidSettings(format!(
                "fps {} has no usable frame period",
                self.fps
            ))),
        }
    }

    pub fn validate(&self) -> Result<(), MonitorError> {
        self.frame_period()?;
        if self.status_interval_secs == 0 {
            return Err(MonitorError::InvalidSettings(
                "status_interval_secs must be > 0".to_string(),
            ));
        }
        self.affect.validate()?;
        Ok(())
    }
}
