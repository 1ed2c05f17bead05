//! Config - 同期セッションの設定
//!
//! ```toml
//! [channel]
//! topic_prefix = "comments"
//! inbound_capacity = 64
//! reply_timeout_ms = 10000
//!
//! [logging]
//! level = "info"
//! ```

mod error;
mod loader;

pub use error::ConfigError;
pub use loader::ConfigLoader;

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::DEFAULT_TOPIC_PREFIX;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub channel: ChannelConfig,
    pub logging: LoggingConfig,
}

impl SyncConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.channel.topic_prefix.trim().is_empty() || self.channel.topic_prefix.contains(':') {
            return Err(ConfigError::Invalid(format!(
                "topic_prefix must be non-empty and contain no ':' (got {:?})",
                self.channel.topic_prefix
            )));
        }
        if self.channel.inbound_capacity == 0 {
            return Err(ConfigError::Invalid(
                "inbound_capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Topic is `<topic_prefix>:<postId>`.
    pub topic_prefix: String,

    /// Buffer of the inbound event stream. A full buffer makes the transport wait.
    pub inbound_capacity: usize,

    /// Join/push reply timeout. 0 disables it.
    pub reply_timeout_ms: u64,
}

impl ChannelConfig {
    pub fn reply_timeout(&self) -> Option<Duration> {
        (self.reply_timeout_ms > 0).then(|| Duration::from_millis(self.reply_timeout_ms))
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            topic_prefix: DEFAULT_TOPIC_PREFIX.to_string(),
            inbound_capacity: 64,
            reply_timeout_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive. `RUST_LOG` takes precedence.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
