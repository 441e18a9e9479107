use crate::core::Result;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Process-level settings shared by every engine a `Driver` starts.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct EngineConfig {
    /// Requests that may queue in front of an engine before senders wait.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Applied to sessions whose connection string sets no timeout. 0 disables.
    #[serde(default)]
    pub default_timeout_ms: u64,
}

fn default_channel_capacity() -> usize { 64 }
fn default_log_level() -> String { "info".to_string() }

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
            log_level: default_log_level(),
            default_timeout_ms: 0,
        }
    }
}

impl EngineConfig {
    /// Load configuration with priority: ENV > config file > defaults
    ///
    /// Reads `./inmemsql.toml` when present, then `INMEMSQL_*` variables.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("inmemsql.toml"))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let mut builder = Config::builder();
        if path.exists() {
            builder = builder.add_source(File::from(path));
        }
        builder = builder.add_source(Environment::with_prefix("INMEMSQL"));

        Ok(builder.build()?.try_deserialize()?)
    }

    #[must_use]
    pub const fn default_timeout(&self) -> Option<Duration> {
        match self.default_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }
}
