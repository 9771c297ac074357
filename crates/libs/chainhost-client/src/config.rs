use crate::log_sink::{LogLevel, LogSink, Logger};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const DEFAULT_MAX_LOG_LEVEL: u32 = LogLevel::Info as u32;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Lines with a level above this are dropped. `0` disables logging.
    #[serde(default = "default_max_log_level")]
    pub max_log_level: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self { max_log_level: DEFAULT_MAX_LOG_LEVEL }
    }
}

impl ClientConfig {
    pub fn from_toml(input: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(input)
    }

    pub fn logger(&self, sink: Arc<dyn LogSink>) -> Logger {
        Logger::new(sink, self.max_log_level)
    }
}

fn default_max_log_level() -> u32 {
    DEFAULT_MAX_LOG_LEVEL
}

#[cfg(feature = "loopback")]
pub use crate::engine::loopback::LoopbackConfig;
