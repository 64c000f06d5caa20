//! Logging bootstrap
//!
//! Console output plus a date-stamped plain-text file under the configured
//! log directory, each with its own level filter from `log_settings`.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, Layer};

use certwatch_config::LogSettings;

/// Initialize the global subscriber.
///
/// `verbose` raises the console level to debug regardless of configuration.
/// Returns the path of the log file being appended to.
pub fn init(settings: &LogSettings, verbose: bool) -> std::io::Result<PathBuf> {
    let console_level = if verbose {
        LevelFilter::DEBUG
    } else {
        parse_level(&settings.console_level)
    };
    let file_level = parse_level(&settings.file_level);

    fs::create_dir_all(&settings.log_dir)?;
    let file_name = format!("certwatch_{}.log", Local::now().format("%Y%m%d"));
    let path = Path::new(&settings.log_dir).join(file_name);
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_filter(console_level),
        )
        .with(
            fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Arc::new(file))
                .with_filter(file_level),
        )
        .init();

    Ok(path)
}

/// Map a configured level name onto a tracing filter.
///
/// `critical` has no tracing equivalent and maps to error; unknown names
/// fall back to info.
fn parse_level(raw: &str) -> LevelFilter {
    match raw.to_lowercase().as_str() {
        "debug" => LevelFilter::DEBUG,
        "info" => LevelFilter::INFO,
        "warning" => LevelFilter::WARN,
        "error" | "critical" => LevelFilter::ERROR,
        _ => LevelFilter::INFO,
    }
}
