use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Severity attached to every shipped record.
///
/// The wire form is the upper-case name. `WARNING` is accepted when parsing
/// and normalised to [`LogLevel::Warn`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Upper-case name used on the wire.
    pub const fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    pub fn parse_or_info(s: &str) -> Self {
        s.parse().unwrap_or(Self::Info)
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string does not name a known level.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown log level: {0}")]
pub struct ParseLevelError(pub String);

impl FromStr for LogLevel {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TRACE" => Ok(Self::Trace),
            "DEBUG" => Ok(Self::Debug),
            "INFO" => Ok(Self::Info),
            "WARN" | "WARNING" => Ok(Self::Warn),
            "ERROR" => Ok(Self::Error),
            _ => Err(ParseLevelError(s.to_owned())),
        }
    }
}

impl From<log::Level> for LogLevel {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Trace => LogLevel::Trace,
            log::Level::Debug => LogLevel::Debug,
            log::Level::Info => LogLevel::Info,
            log::Level::Warn => LogLevel::Warn,
            log::Level::Error => LogLevel::Error,
        }
    }
}

impl From<LogLevel> for log::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => log::Level::Trace,
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Info => log::Level::Info,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Error => log::Level::Error,
        }
    }
}

impl Serialize for LogLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for LogLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("TRACE", LogLevel::Trace)]
    #[case("debug", LogLevel::Debug)]
    #[case("Info", LogLevel::Info)]
    #[case("WARN", LogLevel::Warn)]
    #[case("WARNING", LogLevel::Warn)]
    #[case("error", LogLevel::Error)]
    fn parses_known_levels(#[case] raw: &str, #[case] expected: LogLevel) {
        assert_eq!(raw.parse::<LogLevel>(), Ok(expected));
    }

    #[rstest]
    fn rejects_unknown_levels() {
        assert!("CRITICAL".parse::<LogLevel>().is_err());
        assert_eq!(LogLevel::parse_or_info("nope"), LogLevel::Info);
    }

    #[rstest]
    #[case(log::Level::Trace, LogLevel::Trace)]
    #[case(log::Level::Debug, LogLevel::Debug)]
    #[case(log::Level::Info, LogLevel::Info)]
    #[case(log::Level::Warn, LogLevel::Warn)]
    #[case(log::Level::Error, LogLevel::Error)]
    fn log_crate_levels_map_directly(#[case] level: log::Level, #[case] expected: LogLevel) {
        assert_eq!(LogLevel::from(level), expected);
        assert_eq!(log::Level::from(expected), level);
    }

    #[rstest]
    fn serialises_as_wire_name() {
        let json = serde_json::to_string(&LogLevel::Warn).expect("serialise level");
        assert_eq!(json, "\"WARN\"");
        let parsed: LogLevel = serde_json::from_str("\"WARNING\"").expect("parse level");
        assert_eq!(parsed, LogLevel::Warn);
    }
}
