//! TCP log sink implementation.
//!
//! This module defines [`TcpSink`], which serialises
//! [`LogRecord`](crate::log_record::LogRecord) values into newline-delimited
//! JSON frames and forwards them to a remote collector. A dedicated worker
//! thread owns the connection, drains the pending queue, and reconnects
//! whenever a write fails.

mod backoff;
mod config;
mod connection;
mod handler;
mod pending;
mod serialise;
mod transport;
mod worker;


pub use config::{
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_JOIN_TIMEOUT, DEFAULT_MAX_FRAME_SIZE, DEFAULT_POLL_INTERVAL,
    DEFAULT_RECONNECT_INTERVAL, DEFAULT_TARGET, DEFAULT_WRITE_TIMEOUT, ReconnectPolicy, SinkConfig,
};
pub use connection::ConnectionState;
pub use handler::TcpSink;
pub use pending::PendingSink;
pub use serialise::{decode_line, encode_frame, frame_payload, serialise_record};
pub use transport::{AbortHandle, Connector, Destination, TcpConnector};
