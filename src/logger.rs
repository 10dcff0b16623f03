//! Leveled, timestamped, context-tagged logging for the tab widgets.
//!
//! Every logger carries its own minimum level, handed in at construction
//! (usually from `logging.level` in the config file). Lines look like:
//!
//! ```text
//! 2025-03-01T09:30:12.345Z [INFO][RemoteCall] Calling function 'myFunc'
//! ```
//!
//! Auxiliary values are appended after the message exactly as given.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Log levels, ordered from most to least verbose
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown log level '{0}' (expected debug, info, warn or error)")]
pub struct ParseLogLevelError(String);

impl FromStr for LogLevel {
    type Err = ParseLogLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(ParseLogLevelError(s.to_string())),
        }
    }
}

/// A single emitted log line before formatting
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub level: LogLevel,
    pub timestamp: DateTime<Utc>,
    pub context: Option<String>,
    pub message: String,
    /// Auxiliary values, passed through untouched
    pub data: Vec<Value>,
}

impl LogRecord {
    /// `<timestamp> [LEVEL][context]`
    pub fn prefix(&self) -> String {
        let timestamp = self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true);
        match &self.context {
            Some(context) => format!("{} [{}][{}]", timestamp, self.level, context),
            None => format!("{} [{}]", timestamp, self.level),
        }
    }

    /// Full formatted line, auxiliary values appended space-separated
    pub fn line(&self) -> String {
        let mut line = format!("{} {}", self.prefix(), self.message);
        for value in &self.data {
            line.push(' ');
            match value {
                Value::String(text) => line.push_str(text),
                other => line.push_str(&other.to_string()),
            }
        }
        line
    }
}

/// Destination for log records
pub trait LogSink: Send + Sync {
    fn write(&self, record: &LogRecord);
}

/// Writes debug/info lines to stdout and warn/error lines to stderr
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink;

impl LogSink for ConsoleSink {
    fn write(&self, record: &LogRecord) {
        match record.level {
            LogLevel::Debug | LogLevel::Info => println!("{}", record.line()),
            LogLevel::Warn | LogLevel::Error => eprintln!("{}", record.line()),
        }
    }
}

/// Keeps records in memory (tests, diagnostics endpoints)
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<LogRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<LogRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.records().iter().map(LogRecord::line).collect()
    }
}

impl LogSink for MemorySink {
    fn write(&self, record: &LogRecord) {
        if let Ok(mut records) = self.records.lock() {
            records.push(record.clone());
        }
    }
}

/// Logger construction options
#[derive(Debug, Clone)]
pub struct LoggerOptions {
    /// Tag prepended to every line, e.g. "AudioCapture"
    pub context: Option<String>,
    /// Calls below this level are dropped
    pub min_level: LogLevel,
    /// When false the logger emits nothing
    pub enable_console: bool,
}

impl Default for LoggerOptions {
    fn default() -> Self {
        Self {
            context: None,
            min_level: LogLevel::Debug,
            enable_console: true,
        }
    }
}

impl LoggerOptions {
    pub fn with_context(context: impl Into<String>, min_level: LogLevel) -> Self {
        Self {
            context: Some(context.into()),
            min_level,
            enable_console: true,
        }
    }
}

#[derive(Clone)]
pub struct Logger {
    context: Option<String>,
    min_level: LogLevel,
    enabled: bool,
    sink: Arc<dyn LogSink>,
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("context", &self.context)
            .field("min_level", &self.min_level)
            .field("enabled", &self.enabled)
            .finish()
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(LoggerOptions::default())
    }
}

impl Logger {
    /// Logger writing to the console
    pub fn new(options: LoggerOptions) -> Self {
        Self::with_sink(options, Arc::new(ConsoleSink))
    }

    pub fn with_sink(options: LoggerOptions, sink: Arc<dyn LogSink>) -> Self {
        Self {
            context: options.context.filter(|c| !c.is_empty()),
            min_level: options.min_level,
            enabled: options.enable_console,
            sink,
        }
    }

    /// Same sink and level, different context tag
    pub fn child(&self, context: impl Into<String>) -> Self {
        let context = context.into();
        Self {
            context: if context.is_empty() { None } else { Some(context) },
            min_level: self.min_level,
            enabled: self.enabled,
            sink: Arc::clone(&self.sink),
        }
    }

    pub fn min_level(&self) -> LogLevel {
        self.min_level
    }

    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    pub fn log(&self, level: LogLevel, message: impl AsRef<str>, data: &[Value]) {
        if !self.enabled || level < self.min_level {
            return;
        }

        let record = LogRecord {
            level,
            timestamp: Utc::now(),
            context: self.context.clone(),
            message: message.as_ref().to_string(),
            data: data.to_vec(),
        };
        self.sink.write(&record);
    }

    pub fn debug(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Debug, message, &[]);
    }

    pub fn debug_with(&self, message: impl AsRef<str>, data: &[Value]) {
        self.log(LogLevel::Debug, message, data);
    }

    pub fn info(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Info, message, &[]);
    }

    pub fn info_with(&self, message: impl AsRef<str>, data: &[Value]) {
        self.log(LogLevel::Info, message, data);
    }

    pub fn warn(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Warn, message, &[]);
    }

    pub fn warn_with(&self, message: impl AsRef<str>, data: &[Value]) {
        self.log(LogLevel::Warn, message, data);
    }

    pub fn error(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Error, message, &[]);
    }

    pub fn error_with(&self, message: impl AsRef<str>, data: &[Value]) {
        self.log(LogLevel::Error, message, data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn memory_logger(context: Option<&str>, min_level: LogLevel) -> (Logger, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        let options = LoggerOptions {
            context: context.map(str::to_string),
            min_level,
            enable_console: true,
        };
        (Logger::with_sink(options, sink.clone()), sink)
    }

    #[test]
    fn test_levels_are_ordered() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Error);
    }

    #[test]
    fn test_below_min_level_is_dropped() {
        let (logger, sink) = memory_logger(None, LogLevel::Warn);

        logger.debug("debug");
        logger.info("info");
        assert!(sink.records().is_empty());

        logger.warn("warn");
        logger.error("error");
        assert_eq!(sink.records().len(), 2);
    }

    #[test]
    fn test_disabled_logger_emits_nothing() {
        let sink = Arc::new(MemorySink::new());
        let options = LoggerOptions {
            enable_console: false,
            ..LoggerOptions::default()
        };
        let logger = Logger::with_sink(options, sink.clone());

        logger.error("nobody hears this");
        assert!(sink.records().is_empty());
    }

    #[test]
    fn test_line_format_with_context_and_data() {
        let record = LogRecord {
            level: LogLevel::Info,
            timestamp: Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 12).unwrap(),
            context: Some("RemoteCall".to_string()),
            message: "response received".to_string(),
            data: vec![json!({"status": 200}), json!("ok"), json!(3)],
        };

        assert_eq!(
            record.line(),
            r#"2025-03-01T09:30:12.000Z [INFO][RemoteCall] response received {"status":200} ok 3"#
        );
    }

    #[test]
    fn test_string_values_are_written_raw() {
        let (logger, sink) = memory_logger(Some("AudioCapture"), LogLevel::Debug);

        logger.error_with("Failed to acquire audio", &[json!("Permission denied: \"mic\"")]);

        let lines = sink.lines();
        assert!(lines[0].ends_with(r#"[ERROR][AudioCapture] Failed to acquire audio Permission denied: "mic""#));
    }

    #[test]
    fn test_line_format_without_context() {
        let record = LogRecord {
            level: LogLevel::Error,
            timestamp: Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 12).unwrap(),
            context: None,
            message: "boom".to_string(),
            data: vec![],
        };

        assert_eq!(record.line(), "2025-03-01T09:30:12.000Z [ERROR] boom");
    }

    #[test]
    fn test_data_is_passed_through_unmodified() {
        let (logger, sink) = memory_logger(Some("AudioCapture"), LogLevel::Debug);
        let payload = json!({"nested": {"list": [1, 2, 3]}, "flag": true});

        logger.debug_with("context fetched", &[payload.clone()]);

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].data, vec![payload]);
        assert_eq!(records[0].context.as_deref(), Some("AudioCapture"));
        assert_eq!(records[0].level, LogLevel::Debug);
    }

    #[test]
    fn test_child_shares_sink_and_level() {
        let (logger, sink) = memory_logger(Some("Tab"), LogLevel::Info);
        let child = logger.child("HostShim");

        child.debug("filtered");
        child.info("kept");

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].context.as_deref(), Some("HostShim"));
    }

    #[test]
    fn test_parse_level() {
        assert_eq!("INFO".parse::<LogLevel>().unwrap(), LogLevel::Info);
        assert_eq!("warning".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert!("verbose".parse::<LogLevel>().is_err());
    }
}
