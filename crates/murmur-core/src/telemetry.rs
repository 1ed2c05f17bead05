//! Telemetry - ログ初期化（`tracing` + `tracing-subscriber`）
//!
//! `RUST_LOG` があればそれを優先し、なければ設定の level を使います。出力先は stderr です。

use tracing_subscriber::EnvFilter;

use crate::config::{ConfigError, LoggingConfig};

/// Build the filter: `RUST_LOG` when set, otherwise the configured directive.
pub fn env_filter(config: &LoggingConfig) -> Result<EnvFilter, ConfigError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.level).map_err(|e| ConfigError::LogFilter {
        directive: config.level.clone(),
        message: e.to_string(),
    })
}

/// Install the global subscriber, logging to stderr.
///
/// Returns `false` when one is already installed.
pub fn init(config: &LoggingConfig) -> Result<bool, ConfigError> {
    let filter = env_filter(config)?;
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok();
    Ok(installed)
}
