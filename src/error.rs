//! Error types surfaced by the sink and reported by its worker.

use std::io;

use thiserror::Error;

/// Errors returned while configuring, constructing or submitting to a sink.
///
/// The capture entry points ([`TcpSink::record`](crate::TcpSink::record) and
/// the `log` bridge) never return these; they drop silently instead.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Invalid user supplied configuration.
    #[error("invalid sink configuration: {0}")]
    InvalidConfig(String),
    /// The configuration file could not be read or parsed.
    #[error("failed to load configuration from {path}: {reason}")]
    ConfigFile { path: String, reason: String },
    /// Construction was cancelled before a connection was established.
    #[error("sink construction cancelled before a connection was established")]
    Cancelled,
    /// The sink has been closed and no longer accepts records.
    #[error("sink is closed")]
    Closed,
    /// A global logger is already installed.
    #[error("a global logger is already installed")]
    LoggerAlreadySet,
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Failures encountered by the delivery worker.
///
/// These never reach producers; the worker reports them on the diagnostic
/// stream and applies the retry or drop policy.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The destination could not be reached.
    #[error("failed to connect to {destination}: {source}")]
    Connect {
        destination: String,
        #[source]
        source: io::Error,
    },
    /// A write on an established connection failed.
    #[error("failed to send record: {0}")]
    Send(#[source] io::Error),
    #[error("failed to serialise record: {0}")]
    Serialise(#[from] serde_json::Error),
    #[error("frame of {size} bytes exceeds the {limit} byte limit")]
    FrameTooLarge { size: usize, limit: usize },
    /// Shutdown was requested while the operation was pending.
    #[error("shutdown requested")]
    Cancelled,
}
