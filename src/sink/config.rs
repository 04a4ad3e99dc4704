//! Configuration structures consumed by the sink lifecycle.
//!
//! [`SinkBuilder`](crate::SinkBuilder) constructs these values before passing
//! them to [`TcpSink`](super::TcpSink) for runtime use.

use std::time::Duration;

use log::LevelFilter;

use crate::{error::SinkError, rate_limited_warner::DEFAULT_WARN_INTERVAL};

use super::transport::Destination;

/// Default per-attempt connection timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Default write timeout applied to the socket.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(5);
/// Default pause between failed connection attempts.
pub const DEFAULT_RECONNECT_INTERVAL: Duration = Duration::from_secs(5);
/// Default queue poll timeout used by the worker.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
/// Default bounded wait for the worker during `close()`.
pub const DEFAULT_JOIN_TIMEOUT: Duration = Duration::from_secs(5);
/// Default maximum payload size (in bytes) accepted for one record.
pub const DEFAULT_MAX_FRAME_SIZE: usize = 1 << 20; // 1 MiB
/// Logger name used by the sink's convenience methods.
pub const DEFAULT_TARGET: &str = "root";

/// Configuration object describing how to construct a [`TcpSink`](super::TcpSink).
#[derive(Clone, Debug)]
pub struct SinkConfig {
    pub destination: Destination,
    /// Instance identifier attached to every record.
    pub hash: String,
    /// Target used by the `trace`..`error` convenience methods.
    pub target: String,
    /// Most verbose level accepted through the `log` bridge.
    pub level: LevelFilter,
    pub connect_timeout: Duration,
    pub write_timeout: Duration,
    pub reconnect: ReconnectPolicy,
    pub poll_interval: Duration,
    pub join_timeout: Duration,
    pub max_frame_size: usize,
    pub warn_interval: Duration,
}

/// Defaults target a collector on the local machine; `hash` is left empty and
/// must be supplied before the sink can be built.
impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            destination: Destination::new("127.0.0.1", 5000),
            hash: String::new(),
            target: DEFAULT_TARGET.to_owned(),
            level: LevelFilter::Trace,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            reconnect: ReconnectPolicy::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            join_timeout: DEFAULT_JOIN_TIMEOUT,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            warn_interval: DEFAULT_WARN_INTERVAL,
        }
    }
}

impl SinkConfig {
    /// Configuration for `destination` tagged with `hash`, defaults elsewhere.
    pub fn new(destination: Destination, hash: impl Into<String>) -> Self {
        Self {
            destination,
            hash: hash.into(),
            ..Self::default()
        }
    }

    /// Use a fixed reconnect interval.
    pub fn with_reconnect_interval(mut self, interval: Duration) -> Self {
        self.reconnect = ReconnectPolicy::fixed(interval);
        self
    }

    pub(crate) fn validate(&self) -> Result<(), SinkError> {
        if self.destination.host.trim().is_empty() {
            return Err(invalid("host must not be empty"));
        }
        if self.hash.is_empty() {
            return Err(invalid("hash must not be empty"));
        }
        for (value, field) in [
            (self.connect_timeout, "connect_timeout"),
            (self.write_timeout, "write_timeout"),
            (self.poll_interval, "poll_interval"),
            (self.join_timeout, "join_timeout"),
            (self.reconnect.interval, "reconnect_interval"),
        ] {
            if value.is_zero() {
                return Err(invalid(&format!("{field} must be greater than zero")));
            }
        }
        if self.reconnect.cap < self.reconnect.interval {
            return Err(invalid("reconnect_cap must not be shorter than reconnect_interval"));
        }
        if self.max_frame_size == 0 {
            return Err(invalid("max_frame_size must be greater than zero"));
        }
        Ok(())
    }
}

fn invalid(msg: &str) -> SinkError {
    SinkError::InvalidConfig(msg.to_owned())
}

/// Delay policy between connection attempts.
///
/// The default is a fixed interval (`cap == interval`). Raising `cap` doubles
/// the delay after each consecutive failure up to the cap; `jitter`
/// randomises each delay within its upper half. Attempts never stop while the
/// sink is running.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub interval: Duration,
    pub cap: Duration,
    pub jitter: bool,
}

impl ReconnectPolicy {
    pub fn fixed(interval: Duration) -> Self {
        Self {
            interval,
            cap: interval,
            jitter: false,
        }
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::fixed(DEFAULT_RECONNECT_INTERVAL)
    }
}
