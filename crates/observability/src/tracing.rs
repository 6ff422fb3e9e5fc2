use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::Deserialize;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Filter directives used when `RUST_LOG` is unset.
    pub filter: String,
    /// JSON lines instead of human-readable output.
    pub json: bool,
    /// Write to this file (truncated on start) instead of stdout.
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: true,
            file: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum LogError {
    #[error("cannot open log file {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid log filter '{filter}': {message}")]
    Filter { filter: String, message: String },
}

fn filter(config: &LogConfig) -> Result<EnvFilter, LogError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.filter).map_err(|e| LogError::Filter {
        filter: config.filter.clone(),
        message: e.to_string(),
    })
}

/// Install the subscriber. A subscriber installed earlier wins and this call
/// is a no-op.
pub fn init_with(config: &LogConfig) -> Result<(), LogError> {
    let filter = filter(config)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false);

    let file = match &config.file {
        Some(path) => Some(File::create(path).map_err(|source| LogError::File {
            path: path.clone(),
            source,
        })?),
        None => None,
    };

    // Result ignored: an already-installed subscriber is not an error.
    let _ = match (config.json, file) {
        (true, Some(file)) => builder.json().with_writer(Mutex::new(file)).try_init(),
        (true, None) => builder.json().try_init(),
        (false, Some(file)) => builder.with_ansi(false).with_writer(Mutex::new(file)).try_init(),
        (false, None) => builder.try_init(),
    };
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let config: LogConfig = serde_json::from_str(r#"{ "json": false }"#).unwrap();
        assert_eq!(config.filter, "info");
        assert!(!config.json);
        assert!(config.file.is_none());
    }

    #[test]
    fn bad_filter_is_reported() {
        let config = LogConfig {
            filter: "shopfeed=loud".into(),
            ..LogConfig::default()
        };
        if std::env::var_os("RUST_LOG").is_none() {
            assert!(matches!(filter(&config), Err(LogError::Filter { .. })));
        }
    }
}
