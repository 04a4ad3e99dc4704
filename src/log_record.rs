//! Canonical record shipped to the collector.
//!
//! This module defines [`LogRecord`], the immutable value serialised onto the
//! wire, together with [`RecordBuilder`], which stamps application events with
//! the current UTC time and the sink's instance hash.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::level::LogLevel;

/// Origin of a log call.
///
/// Every field is optional at the call site; [`CallSite::default`] yields
/// empty strings and line `0` so record construction never fails.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallSite {
    /// Rust module path (or equivalent) where the log call originated.
    pub module_path: String,
    /// Source file of the log call.
    pub file: String,
    /// Line number in the source file.
    pub line: u32,
}

impl CallSite {
    /// Build a call site from the optional parts exposed by the `log` crate.
    pub fn from_parts(module_path: Option<&str>, file: Option<&str>, line: Option<u32>) -> Self {
        Self {
            module_path: module_path.unwrap_or_default().to_owned(),
            file: file.unwrap_or_default().to_owned(),
            line: line.unwrap_or(0),
        }
    }
}

/// One structured log event as it appears on the wire.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Creation time, rendered as ISO-8601 UTC with millisecond precision.
    #[serde(with = "wire_timestamp")]
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    /// Fully rendered message text.
    pub message: String,
    /// Logger or category name.
    pub target: String,
    pub module_path: String,
    pub file: String,
    pub line: u32,
    /// Instance identifier of the sink that produced the record.
    pub hash: String,
}

impl LogRecord {
    /// Timestamp in the wire representation (`2024-01-01T00:00:00.000Z`).
    pub fn timestamp_string(&self) -> String {
        wire_timestamp::render(&self.timestamp)
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] {} - {}", self.timestamp_string(), self.level, self.target, self.message)
    }
}

/// Produces [`LogRecord`] values tagged with a fixed instance hash.
///
/// The builder is pure apart from reading the clock and is cheap to call
/// from any producer thread.
#[derive(Clone, Debug)]
pub struct RecordBuilder {
    hash: String,
}

impl RecordBuilder {
    pub fn new(hash: impl Into<String>) -> Self {
        Self { hash: hash.into() }
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Build a record stamped with the current UTC time.
    pub fn build(
        &self,
        level: LogLevel,
        message: impl Into<String>,
        target: &str,
        call_site: CallSite,
    ) -> LogRecord {
        self.build_at(Utc::now(), level, message, target, call_site)
    }

    /// Build a record with an explicit timestamp.
    pub fn build_at(
        &self,
        timestamp: DateTime<Utc>,
        level: LogLevel,
        message: impl Into<String>,
        target: &str,
        call_site: CallSite,
    ) -> LogRecord {
        LogRecord {
            timestamp,
            level,
            message: message.into(),
            target: target.to_owned(),
            module_path: call_site.module_path,
            file: call_site.file,
            line: call_site.line,
            hash: self.hash.clone(),
        }
    }

    /// Convert a record emitted through the `log` facade.
    pub fn from_log(&self, record: &log::Record<'_>) -> LogRecord {
        self.build(
            LogLevel::from(record.level()),
            record.args().to_string(),
            record.target(),
            CallSite::from_parts(record.module_path(), record.file(), record.line()),
        )
    }
}

mod wire_timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn render(ts: &DateTime<Utc>) -> String {
        ts.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub(super) fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&render(ts))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    #[rstest]
    fn build_populates_every_field() {
        let before = Utc::now();
        let record = RecordBuilder::new("abc").build(
            LogLevel::Info,
            "started",
            "app",
            CallSite {
                module_path: "app::main".into(),
                file: "a.py".into(),
                line: 10,
            },
        );
        assert_eq!(record.level, LogLevel::Info);
        assert_eq!(record.message, "started");
        assert_eq!(record.target, "app");
        assert_eq!(record.module_path, "app::main");
        assert_eq!(record.file, "a.py");
        assert_eq!(record.line, 10);
        assert_eq!(record.hash, "abc");
        assert!(record.timestamp >= before);
        assert!(record.timestamp <= Utc::now());
    }

    #[rstest]
    fn missing_call_site_defaults_to_empty_values() {
        let record = RecordBuilder::new("h").build(LogLevel::Debug, "m", "t", CallSite::default());
        assert_eq!(record.module_path, "");
        assert_eq!(record.file, "");
        assert_eq!(record.line, 0);

        let site = CallSite::from_parts(None, Some("lib.rs"), None);
        assert_eq!(site.file, "lib.rs");
        assert_eq!(site.line, 0);
    }

    #[rstest]
    fn timestamp_renders_with_millis_and_zulu_suffix() {
        let ts = Utc
            .with_ymd_and_hms(2024, 3, 9, 7, 5, 1)
            .single()
            .expect("valid timestamp");
        let record = RecordBuilder::new("h").build_at(ts, LogLevel::Info, "m", "t", CallSite::default());
        assert_eq!(record.timestamp_string(), "2024-03-09T07:05:01.000Z");
    }

    #[rstest]
    fn from_log_copies_call_site() {
        let record = RecordBuilder::new("inst").from_log(
            &log::Record::builder()
                .args(format_args!("hello {}", 42))
                .level(log::Level::Warn)
                .target("bridge")
                .module_path(Some("bridge::test"))
                .file(Some("lib.rs"))
                .line(Some(7))
                .build(),
        );
        assert_eq!(record.level, LogLevel::Warn);
        assert_eq!(record.message, "hello 42");
        assert_eq!(record.target, "bridge");
        assert_eq!(record.module_path, "bridge::test");
        assert_eq!(record.file, "lib.rs");
        assert_eq!(record.line, 7);
        assert_eq!(record.hash, "inst");
    }
}
