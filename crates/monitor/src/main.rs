//! EduGaze Monitor - Main Entry Point

use anyhow::Context;
use monitor::{init_logging, open_source, run_session, write_export, MonitorSettings};
use std::path::PathBuf;
use tracing::info;

/// `--config <path>`; otherwise `edugaze.toml` in the working directory if present
fn config_path() -> Option<PathBuf> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return args.next().map(PathBuf::from);
        }
    }
    None
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = MonitorSettings::load(config_path().as_deref()).context("loading settings")?;
    init_logging(&settings.log_level, settings.json_logs);

    info!("=== EduGaze Monitor v{} ===", env!("CARGO_PKG_VERSION"));

    let mut source = open_source(&settings.source).context("initialising frame source")?;
    match run_session(&settings, source.as_mut()).await? {
        Some(summary) => {
            let path = write_export(&summary, &settings.export_dir)?;
            info!(
                path = %path.display(),
                duration_seconds = summary.duration_seconds,
                engagement = summary.engagement_score,
                "Session exported"
            );
            for insight in summary.insights() {
                info!(kind = ?insight.kind, "{}: {}", insight.title, insight.description);
            }
        }
        None => info!("No session data available"),
    }

    Ok(())
}
