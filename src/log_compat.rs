//! Compatibility bridge for the Rust `log` crate.
//!
//! [`TcpSink`] implements `log::Log`, so it can be installed as the global
//! logger with [`init`]. The sink's own diagnostics are emitted through
//! `tracing` under [`DIAGNOSTIC_TARGET`]; records carrying that target are
//! ignored here so the sink never ships its own diagnostics.

use std::time::Duration;

use log::{Metadata, Record};
use once_cell::sync::OnceCell;

use crate::{DIAGNOSTIC_TARGET, error::SinkError, sink::TcpSink};

/// Upper bound applied by `log::logger().flush()`.
pub const LOG_FLUSH_TIMEOUT: Duration = Duration::from_secs(1);

static GLOBAL_SINK: OnceCell<&'static TcpSink> = OnceCell::new();

fn is_own_diagnostic(target: &str) -> bool {
    target.starts_with(DIAGNOSTIC_TARGET)
}

impl log::Log for TcpSink {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level && !is_own_diagnostic(metadata.target())
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let _ = self.submit(self.builder().from_log(record));
    }

    fn flush(&self) {
        TcpSink::flush(self, LOG_FLUSH_TIMEOUT);
    }
}

/// Install `sink` as the global `log` logger.
///
/// The global maximum level is set to the sink's configured level. The sink
/// lives for the rest of the process; call [`TcpSink::close`] on the returned
/// reference to stop delivery before exit. When another logger is already
/// installed the sink is closed and [`SinkError::LoggerAlreadySet`] returned.
pub fn init(sink: TcpSink) -> Result<&'static TcpSink, SinkError> {
    let level = sink.level;
    let sink: &'static TcpSink = Box::leak(Box::new(sink));
    if log::set_logger(sink).is_err() {
        sink.close();
        return Err(SinkError::LoggerAlreadySet);
    }
    log::set_max_level(level);
    let _ = GLOBAL_SINK.set(sink);
    Ok(sink)
}

/// The sink installed by [`init`], if any.
pub fn global() -> Option<&'static TcpSink> {
    GLOBAL_SINK.get().copied()
}
