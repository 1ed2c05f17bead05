//! ConfigLoader - 設定の読み込み
//!
//! # 読み込み順
//! 1. デフォルト値
//! 2. 設定ファイル（TOML、指定されたときだけ）
//! 3. 環境変数（`MURMUR_*`）
//!
//! 後の層が前の層を上書きします。

use std::path::{Path, PathBuf};

use tracing::debug;

use super::{ConfigError, SyncConfig};

pub const ENV_TOPIC_PREFIX: &str = "MURMUR_TOPIC_PREFIX";
pub const ENV_INBOUND_CAPACITY: &str = "MURMUR_INBOUND_CAPACITY";
pub const ENV_REPLY_TIMEOUT_MS: &str = "MURMUR_REPLY_TIMEOUT_MS";
pub const ENV_LOG: &str = "MURMUR_LOG";

/// Configuration loader with builder pattern.
///
/// ```ignore
/// let config = ConfigLoader::new()
///     .with_file("murmur.toml")
///     .skip_env_vars()
///     .load()?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    file: Option<PathBuf>,
    skip_env: bool,
}

impl ConfigLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Useful for testing with deterministic config.
    #[must_use]
    pub fn skip_env_vars(mut self) -> Self {
        self.skip_env = true;
        self
    }

    pub fn load(&self) -> Result<SyncConfig, ConfigError> {
        let mut config = match &self.file {
            Some(path) => load_file(path)?,
            None => SyncConfig::default(),
        };

        if !self.skip_env {
            apply_env(&mut config, |name| std::env::var(name).ok())?;
        }

        config.validate()?;
        Ok(config)
    }
}

fn load_file(path: &Path) -> Result<SyncConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
    let config = toml::from_str(&text).map_err(|e| ConfigError::parse_toml(path, e))?;
    debug!("loaded config from {}", path.display());
    Ok(config)
}

/// Apply `MURMUR_*` overrides. `lookup` is injectable for tests.
fn apply_env(
    config: &mut SyncConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    if let Some(prefix) = lookup(ENV_TOPIC_PREFIX) {
        config.channel.topic_prefix = prefix;
    }
    if let Some(raw) = lookup(ENV_INBOUND_CAPACITY) {
        config.channel.inbound_capacity = raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::invalid_env_var(ENV_INBOUND_CAPACITY, "expected integer"))?;
    }
    if let Some(raw) = lookup(ENV_REPLY_TIMEOUT_MS) {
        config.channel.reply_timeout_ms = raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::invalid_env_var(ENV_REPLY_TIMEOUT_MS, "expected integer"))?;
    }
    if let Some(level) = lookup(ENV_LOG) {
        config.logging.level = level;
    }
    Ok(())
}
