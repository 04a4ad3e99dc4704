//! Network log shipping over TCP.
//!
//! A [`TcpSink`] captures log events from any thread, queues them without
//! blocking, and a background worker writes them to a collector as
//! newline-delimited JSON. The worker reconnects whenever the connection
//! breaks and retries each failed record once before dropping it.
//!
//! ```no_run
//! use std::time::Duration;
//! use ironlog::{LogLevel, TcpSink};
//!
//! let sink = TcpSink::new("127.0.0.1:5000", "abc", Duration::from_secs(5))?;
//! sink.record(LogLevel::Info, "service started", "app", module_path!(), file!(), line!());
//! sink.close();
//! # Ok::<(), ironlog::SinkError>(())
//! ```

mod builder;
mod error;
mod file_config;
mod level;
mod log_compat;
mod log_record;
mod queue;
mod rate_limited_warner;
mod shutdown;
mod sink;
mod stats;

#[cfg(test)]
mod test_utils;

/// `tracing` target for the sink's own diagnostics.
///
/// Events under this target are never shipped, even when the sink is the
/// global `log` logger.
pub const DIAGNOSTIC_TARGET: &str = "ironlog::diagnostics";

pub use builder::{ReconnectOverrides, SinkBuilder};
pub use error::{DeliveryError, SinkError};
pub use file_config::SECTION as INI_SECTION;
pub use level::{LogLevel, ParseLevelError};
pub use log_compat::{LOG_FLUSH_TIMEOUT, global, init};
pub use log_record::{CallSite, LogRecord, RecordBuilder};
pub use queue::{Popped, QueueConsumer, QueueProducer, pending_queue};
pub use rate_limited_warner::{DEFAULT_WARN_INTERVAL, RateLimitedWarner};
pub use shutdown::ShutdownToken;
pub use sink::{
    AbortHandle, ConnectionState, Connector, DEFAULT_CONNECT_TIMEOUT, DEFAULT_JOIN_TIMEOUT,
    DEFAULT_MAX_FRAME_SIZE, DEFAULT_POLL_INTERVAL, DEFAULT_RECONNECT_INTERVAL, DEFAULT_TARGET,
    DEFAULT_WRITE_TIMEOUT, Destination, PendingSink, ReconnectPolicy, SinkConfig, TcpConnector,
    TcpSink, decode_line, encode_frame, frame_payload, serialise_record,
};
pub use stats::{SinkStats, StatsSnapshot};
