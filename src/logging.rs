use std::fmt;
use std::io::{stderr, Write};
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use humantime::format_rfc3339;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

const CAPTURE_LIMIT: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "debug" | "trace" => Ok(Level::Debug),
            "info" => Ok(Level::Info),
            "warn" | "warning" => Ok(Level::Warn),
            "error" => Ok(Level::Error),
            other => Err(anyhow!("unsupported log level: {other}")),
        }
    }
}

pub trait LogSink: Send + Sync {
    fn emit(&self, entry: &Map<String, Value>);
}

/// Writes each entry as one JSON line on stderr.
pub struct StderrSink;

impl LogSink for StderrSink {
    fn emit(&self, entry: &Map<String, Value>) {
        if let Ok(serialized) = serde_json::to_string(entry) {
            let _ = writeln!(stderr(), "{}", serialized);
        }
    }
}

/// Keeps entries in memory, up to a fixed limit.
#[derive(Default)]
pub struct MemorySink {
    entries: Mutex<Vec<Value>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<Value> {
        self.entries.lock().expect("log sink poisoned").clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.entries()
            .iter()
            .filter_map(|entry| entry.get("message").and_then(Value::as_str))
            .map(str::to_string)
            .collect()
    }
}

impl LogSink for MemorySink {
    fn emit(&self, entry: &Map<String, Value>) {
        let mut entries = self.entries.lock().expect("log sink poisoned");
        if entries.len() < CAPTURE_LIMIT {
            entries.push(Value::Object(entry.clone()));
        } else if entries.len() == CAPTURE_LIMIT {
            entries.push(json!({
                "level": "warn",
                "message": "log capture truncated",
                "tags": { "reason": "log-overflow" }
            }));
        }
    }
}

#[derive(Clone)]
pub struct Logger {
    threshold: Level,
    sink: Arc<dyn LogSink>,
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(Level::Warn, Arc::new(StderrSink))
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("threshold", &self.threshold)
            .finish_non_exhaustive()
    }
}

fn current_timestamp() -> String {
    format_rfc3339(std::time::SystemTime::now()).to_string()
}

impl Logger {
    pub fn new(threshold: Level, sink: Arc<dyn LogSink>) -> Self {
        Self { threshold, sink }
    }

    pub fn enabled(&self, level: Level) -> bool {
        level >= self.threshold
    }

    pub fn log(&self, level: Level, helper: &str, message: impl Into<String>) {
        if !self.enabled(level) {
            return;
        }
        let mut entry = Map::new();
        entry.insert("level".to_string(), Value::String(level.as_str().to_string()));
        entry.insert("message".to_string(), Value::String(message.into()));
        entry.insert("tags".to_string(), json!({ "helper": helper }));
        entry.insert("timestamp".to_string(), Value::String(current_timestamp()));
        self.sink.emit(&entry);
    }
}
