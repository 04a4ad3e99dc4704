//! Worker thread driving socket I/O.
//!
//! The worker pops records from the pending queue, frames them, and writes
//! them over the connection it owns. A failed write triggers one reconnect
//! followed by exactly one resend of the same frame; if that fails too the
//! record is dropped.

use std::{
    sync::Arc,
    thread::{self, JoinHandle},
    time::Duration,
};

use crossbeam_channel::{Receiver, bounded};
use tracing::{debug, warn};

use crate::{
    DIAGNOSTIC_TARGET,
    error::DeliveryError,
    log_record::LogRecord,
    queue::{Popped, QueueConsumer},
    rate_limited_warner::RateLimitedWarner,
    shutdown::ShutdownToken,
    stats::SinkStats,
};

use super::{
    config::SinkConfig,
    connection::ConnectionManager,
    serialise::encode_frame,
    transport::Connector,
};

/// Join handle plus a channel that disconnects when the worker exits.
pub(crate) struct WorkerHandle {
    pub(crate) handle: JoinHandle<()>,
    pub(crate) done_rx: Receiver<()>,
}

pub(crate) struct DeliveryWorker<C: Connector> {
    connection: ConnectionManager<C>,
    queue: QueueConsumer,
    shutdown: ShutdownToken,
    stats: Arc<SinkStats>,
    warner: RateLimitedWarner,
    poll_interval: Duration,
    max_frame_size: usize,
}

impl<C: Connector> DeliveryWorker<C> {
    pub(crate) fn new(
        connection: ConnectionManager<C>,
        queue: QueueConsumer,
        config: &SinkConfig,
        shutdown: ShutdownToken,
        stats: Arc<SinkStats>,
    ) -> Self {
        Self {
            connection,
            queue,
            shutdown,
            stats,
            warner: RateLimitedWarner::new(config.warn_interval),
            poll_interval: config.poll_interval,
            max_frame_size: config.max_frame_size,
        }
    }

    /// Start the worker on a dedicated thread.
    pub(crate) fn spawn(self) -> std::io::Result<WorkerHandle> {
        let (done_tx, done_rx) = bounded::<()>(0);
        let handle = thread::Builder::new()
            .name("ironlog-delivery".into())
            .spawn(move || {
                // Dropped on exit, including unwinding, which wakes `close()`.
                let _done = done_tx;
                self.run();
            })?;
        Ok(WorkerHandle { handle, done_rx })
    }

    pub(crate) fn run(mut self) {
        while !self.shutdown.is_cancelled() {
            match self.queue.pop(self.poll_interval) {
                Popped::Record(record) => self.deliver(&record),
                Popped::Empty => continue,
                Popped::Closed => break,
            }
        }
        let abandoned = self.queue.len();
        if abandoned > 0 {
            debug!(target: DIAGNOSTIC_TARGET, abandoned, "worker stopping with queued records");
        }
        self.warner.flush(|count| {
            warn!(target: DIAGNOSTIC_TARGET, dropped = count, "records dropped before shutdown");
        });
        self.connection.close();
    }

    pub(crate) fn deliver(&mut self, record: &LogRecord) {
        let frame = match encode_frame(record, self.max_frame_size) {
            Ok(frame) => frame,
            Err(err) => {
                self.drop_record(&err);
                return;
            }
        };
        match self.connection.send(&frame) {
            Ok(()) => self.stats.record_sent(),
            Err(err) => self.resend_after_reconnect(&frame, &err),
        }
    }

    fn resend_after_reconnect(&mut self, frame: &[u8], first: &DeliveryError) {
        warn!(target: DIAGNOSTIC_TARGET, error = %first, "send failed; reconnecting");
        if let Err(err) = self.connection.establish() {
            self.drop_record(&err);
            return;
        }
        self.stats.record_retry();
        match self.connection.send(frame) {
            Ok(()) => self.stats.record_sent(),
            Err(err) => self.drop_record(&err),
        }
    }

    fn drop_record(&self, reason: &DeliveryError) {
        self.stats.record_dropped();
        debug!(target: DIAGNOSTIC_TARGET, reason = %reason, "record dropped");
        self.warner.record_drop();
        self.warner.warn_if_due(|count| {
            warn!(
                target: DIAGNOSTIC_TARGET,
                dropped = count,
                reason = %reason,
                "records dropped"
            );
        });
    }

    #[cfg(test)]
    pub(crate) fn connection(&self) -> &ConnectionManager<C> {
        &self.connection
    }
}
