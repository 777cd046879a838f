//! logging - component-tagged JSON lines on stderr
//!
//! Output shape:
//!   {"timestamp":"2026-01-10T12:34:56Z","level":"info","component":"SERVER","message":"listening on 0.0.0.0:3000"}

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Mutex;

lazy_static::lazy_static! {
    static ref MIN_LEVEL: Mutex<LogLevel> = Mutex::new(LogLevel::Info);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    /// Parse a level name; unknown names fall back to Info.
    pub fn parse(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "debug" => LogLevel::Debug,
            "warn" | "warning" => LogLevel::Warn,
            "error" => LogLevel::Error,
            _ => LogLevel::Info,
        }
    }
}

#[derive(Debug, Serialize)]
struct LogEntry<'a> {
    timestamp: DateTime<Utc>,
    level: &'static str,
    component: &'a str,
    message: &'a str,
}

/// Set the minimum level emitted; entries below it are dropped.
pub fn init(min_level: LogLevel) {
    if let Ok(mut level) = MIN_LEVEL.lock() {
        *level = min_level;
    }
}

pub fn log(level: LogLevel, component: &str, message: &str) {
    let min = MIN_LEVEL.lock().map(|l| *l).unwrap_or(LogLevel::Info);
    if level < min {
        return;
    }

    let entry = LogEntry {
        timestamp: Utc::now(),
        level: level.as_str(),
        component,
        message,
    };

    match serde_json::to_string(&entry) {
        Ok(line) => eprintln!("{}", line),
        Err(_) => eprintln!("[{}] {}", component, message),
    }
}

pub fn debug(component: &str, message: &str) {
    log(LogLevel::Debug, component, message);
}

pub fn info(component: &str, message: &str) {
    log(LogLevel::Info, component, message);
}

pub fn warn(component: &str, message: &str) {
    log(LogLevel::Warn, component, message);
}

pub fn error(component: &str, message: &str) {
    log(LogLevel::Error, component, message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Error);
    }

    #[test]
    fn test_parse_falls_back_to_info() {
        assert_eq!(LogLevel::parse("debug"), LogLevel::Debug);
        assert_eq!(LogLevel::parse("WARN"), LogLevel::Warn);
        assert_eq!(LogLevel::parse("warning"), LogLevel::Warn);
        assert_eq!(LogLevel::parse("nonsense"), LogLevel::Info);
    }

    #[test]
    fn test_entry_serialization() {
        let entry = LogEntry {
            timestamp: Utc::now(),
            level: "info",
            component: "TEST",
            message: "hello",
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"level\":\"info\""));
        assert!(json.contains("\"component\":\"TEST\""));
        assert!(json.contains("\"message\":\"hello\""));
    }
}
