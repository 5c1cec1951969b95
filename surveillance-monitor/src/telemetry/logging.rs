//! Logging configuration and initialization
//!
//! Console output in compact or JSON form, optionally mirrored into a plain
//! text file through a non-blocking writer.

use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "SURVEILLANCE_LOG";

/// Environment variable selecting the log format ("json" or anything else)
pub const LOG_FORMAT_ENV: &str = "SURVEILLANCE_LOG_FORMAT";

/// Environment variable naming a file to mirror log output into
pub const LOG_FILE_ENV: &str = "SURVEILLANCE_LOG_FILE";

/// Keeps the file writer flushing; hold it for the program's lifetime
pub type LogGuard = WorkerGuard;

/// Logging configuration
#[derive(Debug, Clone, PartialEq)]
pub struct LogConfig {
    /// Filter used when neither `SURVEILLANCE_LOG` nor `RUST_LOG` is set
    pub default_level: String,
    /// JSON console output instead of compact lines
    pub json_format: bool,
    /// Mirror output into this file (no ANSI colours)
    pub log_file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            default_level: "info".to_string(),
            json_format: false,
            log_file: None,
        }
    }
}

impl LogConfig {
    /// Defaults, overridden by `SURVEILLANCE_LOG_FORMAT` and `SURVEILLANCE_LOG_FILE`
    pub fn from_env() -> Self {
        Self::default().with_overrides(
            std::env::var(LOG_FORMAT_ENV).ok(),
            std::env::var_os(LOG_FILE_ENV).map(PathBuf::from),
        )
    }

    fn with_overrides(mut self, format: Option<String>, file: Option<PathBuf>) -> Self {
        if let Some(format) = format {
            self.json_format = format.eq_ignore_ascii_case("json");
        }
        if let Some(file) = file.filter(|p| !p.as_os_str().is_empty()) {
            self.log_file = Some(file);
        }
        self
    }
}

/// Install the global subscriber
///
/// The returned guard is `Some` when file output is enabled and must be kept
/// alive so buffered lines reach the file.
///
/// ```no_run
/// use surveillance_monitor::telemetry::{init_logging, LogConfig};
///
/// let _guard = init_logging(&LogConfig::from_env()).expect("Failed to initialize logging");
/// ```
pub fn init_logging(
    config: &LogConfig,
) -> Result<Option<LogGuard>, Box<dyn std::error::Error + Send + Sync>> {
    // SURVEILLANCE_LOG first, then RUST_LOG, then the configured default
    let env_filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_env("RUST_LOG"))
        .unwrap_or_else(|_| EnvFilter::new(&config.default_level));

    let (file_layer, guard) = match &config.log_file {
        Some(path) => {
            let file = std::fs::File::create(path)?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_thread_names(true);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let (json_layer, compact_layer) = if config.json_format {
        (Some(fmt::layer().json().with_thread_names(true)), None)
    } else {
        (None, Some(fmt::layer().compact().with_target(false)))
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(json_layer)
        .with(compact_layer)
        .try_init()?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        json = config.json_format,
        file = ?config.log_file,
        "Logging initialized"
    );

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_config_default() {
        let config = LogConfig::default();
        assert_eq!(config.default_level, "info");
        assert!(!config.json_format);
        assert!(config.log_file.is_none());
    }

    #[test]
    fn test_format_override() {
        let config = LogConfig::default().with_overrides(Some("JSON".to_string()), None);
        assert!(config.json_format);

        let config = LogConfig::default().with_overrides(Some("pretty".to_string()), None);
        assert!(!config.json_format);
    }

    #[test]
    fn test_file_override_ignores_empty_path() {
        let config = LogConfig::default().with_overrides(None, Some(PathBuf::new()));
        assert!(config.log_file.is_none());

        let config = LogConfig::default().with_overrides(None, Some(PathBuf::from("/tmp/monitor.log")));
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/monitor.log")));
    }
}
