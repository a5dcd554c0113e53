//! Real-time log streaming via Server-Sent Events (SSE).
//!
//! Pipeline progress and row exclusions go through a broadcast channel that
//! both prints to stdout and feeds `/api/logs` subscribers.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::transform::diagnostics::{DiagnosticSink, Exclusion, ExclusionCount, ExclusionLog};

/// Per-row exclusions printed before switching to the summary only.
const MAX_LOGGED_EXCLUSIONS: usize = 10;

/// Log level for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A single log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    /// Nesting depth for display
    #[serde(default)]
    pub indent: u8,
    pub timestamp: DateTime<Utc>,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            indent: 0,
            timestamp: Utc::now(),
        }
    }

    pub fn with_indent(mut self, indent: u8) -> Self {
        self.indent = indent;
        self
    }
}

/// Global log broadcaster
pub static LOG_BROADCASTER: Lazy<LogBroadcaster> = Lazy::new(LogBroadcaster::new);

/// Broadcasts log entries to all connected SSE clients
pub struct LogBroadcaster {
    sender: broadcast::Sender<LogEntry>,
}

impl LogBroadcaster {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(100);
        Self { sender }
    }

    /// Print the entry and send it to all subscribers
    pub fn log(&self, entry: LogEntry) {
        let prefix = match entry.level {
            LogLevel::Info => "   ",
            LogLevel::Success => "   ✓",
            LogLevel::Warning => "   ⚠️",
            LogLevel::Error => "   ❌",
        };
        let indent = "   ".repeat(entry.indent as usize);
        println!("{}{} {}", indent, prefix, entry.message);

        // No receivers is fine
        let _ = self.sender.send(entry);
    }

    /// Get a receiver for SSE streaming
    pub fn subscribe(&self) -> broadcast::Receiver<LogEntry> {
        self.sender.subscribe()
    }
}

impl Default for LogBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

pub fn log_info(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::new(LogLevel::Info, msg));
}

pub fn log_success(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::new(LogLevel::Success, msg));
}

pub fn log_warning(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::new(LogLevel::Warning, msg));
}

pub fn log_error(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::new(LogLevel::Error, msg));
}

pub fn log_warning_indent(msg: impl Into<String>, indent: u8) {
    LOG_BROADCASTER.log(LogEntry::new(LogLevel::Warning, msg).with_indent(indent));
}

/// [`DiagnosticSink`] that logs exclusions through [`LOG_BROADCASTER`].
///
/// The first few exclusions are logged individually; [`finish`](Self::finish)
/// logs the per-reason totals.
#[derive(Debug, Default)]
pub struct BroadcastSink {
    log: ExclusionLog,
}

impl BroadcastSink {
    /// Log the summary and return the counts.
    pub fn finish(self) -> Vec<ExclusionCount> {
        let counts = self.log.counts();
        if counts.is_empty() {
            log_success("No rows excluded");
            return counts;
        }

        log_warning(format!("{} rows excluded", self.log.len()));
        for count in &counts {
            log_warning_indent(format!("{}: {}", count.reason, count.count), 1);
        }
        counts
    }
}

impl DiagnosticSink for BroadcastSink {
    fn exclude(&mut self, exclusion: Exclusion) {
        if self.log.len() < MAX_LOGGED_EXCLUSIONS {
            log_warning_indent(exclusion.to_string(), 1);
        } else if self.log.len() == MAX_LOGGED_EXCLUSIONS {
            log_warning_indent("… further exclusions summarised below", 1);
        }
        self.log.exclude(exclusion);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::diagnostics::ExclusionReason;

    #[test]
    fn test_entry_serializes_lowercase_level() {
        let entry = LogEntry::new(LogLevel::Warning, "careful").with_indent(2);
        let json = serde_json::to_value(&entry).unwrap();

        assert_eq!(json["level"], "warning");
        assert_eq!(json["message"], "careful");
        assert_eq!(json["indent"], 2);
        assert!(json.get("timestamp").is_some());
    }

    #[test]
    fn test_subscribers_receive_entries() {
        let broadcaster = LogBroadcaster::new();
        let mut rx = broadcaster.subscribe();

        broadcaster.log(LogEntry::new(LogLevel::Info, "hello"));

        let entry = rx.try_recv().unwrap();
        assert_eq!(entry.message, "hello");
        assert_eq!(entry.level, LogLevel::Info);
    }

    #[test]
    fn test_broadcast_sink_counts() {
        let mut sink = BroadcastSink::default();
        for row in 0..15 {
            sink.exclude(Exclusion {
                row,
                landing_page: None,
                reason: ExclusionReason::RootPage,
            });
        }

        let counts = sink.finish();
        assert_eq!(counts.len(), 1);
        assert_eq!(counts[0].count, 15);
    }
}
