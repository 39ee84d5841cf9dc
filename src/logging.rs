//! Per-run diagnostics sink
//!
//! Every run writes to a fresh timestamped file under the repository's log
//! directory and mirrors the same events to stdout. The subscriber is
//! returned as a [`Dispatch`] rather than installed process-wide; callers
//! attach it to the work they want captured.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::Dispatch;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Verbosity and destination of a run's diagnostics
#[derive(Debug, Clone)]
pub struct LogSettings {
    pub verbose: bool,
    pub log_dir: PathBuf,
}

/// A ready-to-use subscriber plus the file it writes to
pub struct DiagnosticsSink {
    pub dispatch: Dispatch,
    pub log_file: PathBuf,
}

pub fn log_file_name(started_at: DateTime<Local>) -> String {
    format!("submodule_update_{}.log", started_at.format("%Y%m%d_%H%M%S"))
}

fn level_filter(verbose: bool) -> EnvFilter {
    if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// Create the log directory and file and build the subscriber for one run
pub fn init(settings: &LogSettings) -> Result<DiagnosticsSink> {
    std::fs::create_dir_all(&settings.log_dir).with_context(|| {
        format!(
            "Failed to create log directory: {}",
            settings.log_dir.display()
        )
    })?;

    let log_file = settings.log_dir.join(log_file_name(Local::now()));
    let file = File::create(&log_file)
        .with_context(|| format!("Failed to create log file: {}", log_file.display()))?;

    let subscriber = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(
            fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(false),
        )
        .with(level_filter(settings.verbose));

    Ok(DiagnosticsSink {
        dispatch: Dispatch::new(subscriber),
        log_file,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_log_file_name() {
        let started = Local.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(log_file_name(started), "submodule_update_20240102_030405.log");
    }

    #[test]
    fn test_events_reach_the_log_file() {
        let temp = tempfile::tempdir().unwrap();
        let settings = LogSettings {
            verbose: false,
            log_dir: temp.path().join("logs"),
        };

        let sink = init(&settings).unwrap();
        assert!(sink.log_file.starts_with(temp.path().join("logs")));

        tracing::dispatcher::with_default(&sink.dispatch, || {
            tracing::info!("Logging initialized. Log file: {}", sink.log_file.display());
            tracing::trace!("hidden at info level");
        });

        let written = std::fs::read_to_string(&sink.log_file).unwrap();
        assert!(written.contains("Logging initialized"));
        assert!(!written.contains("hidden at info level"));
        assert!(!written.contains("\u{1b}["));
    }
}
