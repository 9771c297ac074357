//! Logging sink shared by the client and the engine.
//!
//! Embedders receive `(level, target, message)` triples where level runs from 1 (error) to
//! 5 (trace). A [`Logger`] pairs a sink with a maximum level and drops anything above it
//! before the message is formatted.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
#[repr(u32)]
pub enum LogLevel {
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
    Trace = 5,
}

impl LogLevel {
    pub fn as_u32(self) -> u32 {
        self as u32
    }

    pub fn from_u32(level: u32) -> Option<Self> {
        match level {
            1 => Some(Self::Error),
            2 => Some(Self::Warn),
            3 => Some(Self::Info),
            4 => Some(Self::Debug),
            5 => Some(Self::Trace),
            _ => None,
        }
    }

    fn to_log(self) -> log::Level {
        match self {
            Self::Error => log::Level::Error,
            Self::Warn => log::Level::Warn,
            Self::Info => log::Level::Info,
            Self::Debug => log::Level::Debug,
            Self::Trace => log::Level::Trace,
        }
    }
}

/// Receives log lines. `level` is always within `1..=5`.
pub trait LogSink: Send + Sync {
    fn log(&self, level: u32, target: &str, message: &str);
}

impl<F> LogSink for F
where
    F: Fn(u32, &str, &str) + Send + Sync,
{
    fn log(&self, level: u32, target: &str, message: &str) {
        self(level, target, message)
    }
}

/// Forwards every line to the `log` facade.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogFacadeSink;

impl LogSink for LogFacadeSink {
    fn log(&self, level: u32, target: &str, message: &str) {
        let level = LogLevel::from_u32(level).unwrap_or(LogLevel::Trace).to_log();
        log::log!(target: target, level, "{message}");
    }
}

/// A sink plus the maximum level it accepts. `max_level == 0` silences everything.
#[derive(Clone)]
pub struct Logger {
    sink: Arc<dyn LogSink>,
    max_level: u32,
}

impl Logger {
    pub fn new(sink: Arc<dyn LogSink>, max_level: u32) -> Self {
        Self { sink, max_level: max_level.min(LogLevel::Trace.as_u32()) }
    }

    pub fn silent() -> Self {
        Self::new(Arc::new(LogFacadeSink), 0)
    }

    pub fn max_level(&self) -> u32 {
        self.max_level
    }

    pub fn enabled(&self, level: LogLevel) -> bool {
        level.as_u32() <= self.max_level
    }

    pub fn log(&self, level: LogLevel, target: &str, args: fmt::Arguments<'_>) {
        if !self.enabled(level) {
            return;
        }
        let message = match args.as_str() {
            Some(literal) => literal.to_owned(),
            None => args.to_string(),
        };
        self.sink.log(level.as_u32(), target, &message);
    }

    pub fn error(&self, target: &str, args: fmt::Arguments<'_>) {
        self.log(LogLevel::Error, target, args);
    }

    pub fn warn(&self, target: &str, args: fmt::Arguments<'_>) {
        self.log(LogLevel::Warn, target, args);
    }

    pub fn info(&self, target: &str, args: fmt::Arguments<'_>) {
        self.log(LogLevel::Info, target, args);
    }

    pub fn debug(&self, target: &str, args: fmt::Arguments<'_>) {
        self.log(LogLevel::Debug, target, args);
    }

    pub fn trace(&self, target: &str, args: fmt::Arguments<'_>) {
        self.log(LogLevel::Trace, target, args);
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(Arc::new(LogFacadeSink), LogLevel::Info.as_u32())
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger").field("max_level", &self.max_level).finish_non_exhaustive()
    }
}
