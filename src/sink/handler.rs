//! Public sink type exported by the crate.

use std::{
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use crossbeam_channel::RecvTimeoutError;
use parking_lot::{Mutex, RwLock};
use tracing::warn;

use crate::{
    DIAGNOSTIC_TARGET,
    error::{DeliveryError, SinkError},
    level::LogLevel,
    log_record::{CallSite, LogRecord, RecordBuilder},
    queue::{QueueProducer, pending_queue},
    rate_limited_warner::RateLimitedWarner,
    shutdown::ShutdownToken,
    stats::{SinkStats, StatsSnapshot},
};

use super::{
    config::SinkConfig,
    connection::{AbortSlot, ConnectionManager},
    pending::PendingSink,
    transport::{Connector, TcpConnector},
    worker::{DeliveryWorker, WorkerHandle},
};

const FLUSH_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Log sink shipping records to a collector over TCP.
///
/// Capture (`record`, the convenience methods and the `log::Log`
/// implementation) never blocks and never fails: records are queued and a
/// background worker delivers them, reconnecting whenever the connection
/// breaks.
pub struct TcpSink {
    producer: RwLock<Option<QueueProducer>>,
    builder: RecordBuilder,
    target: String,
    pub(crate) level: log::LevelFilter,
    shutdown: ShutdownToken,
    stats: Arc<SinkStats>,
    worker: Mutex<Option<WorkerHandle>>,
    abort_slot: AbortSlot,
    warner: RateLimitedWarner,
    join_timeout: Duration,
    destination: String,
}

impl TcpSink {
    /// Connect to `server_address` (`host:port`) using defaults and a fixed
    /// reconnect interval. Blocks until the first connection succeeds.
    pub fn new(server_address: &str, hash: &str, reconnect_interval: Duration) -> Result<Self, SinkError> {
        let config = SinkConfig::new(server_address.parse()?, hash).with_reconnect_interval(reconnect_interval);
        Self::connect(config)
    }

    /// Construct the sink from a configuration object.
    ///
    /// Blocks until the first connection succeeds. With an unreachable
    /// collector this never returns; prefer [`TcpSink::spawn_connect`] when
    /// construction must be bounded.
    pub fn connect(config: SinkConfig) -> Result<Self, SinkError> {
        Self::connect_with_token(config, ShutdownToken::new())
    }

    /// As [`TcpSink::connect`], aborting with [`SinkError::Cancelled`] once
    /// `shutdown` is cancelled.
    pub fn connect_with_token(config: SinkConfig, shutdown: ShutdownToken) -> Result<Self, SinkError> {
        let connector = tcp_connector(&config);
        Self::with_connector(config, connector, shutdown)
    }

    /// Construct the sink over an arbitrary [`Connector`].
    pub fn with_connector<C: Connector>(
        config: SinkConfig,
        connector: C,
        shutdown: ShutdownToken,
    ) -> Result<Self, SinkError> {
        config.validate()?;
        let stats = Arc::new(SinkStats::new());
        let mut connection = ConnectionManager::new(
            connector,
            config.connect_timeout,
            config.reconnect.clone(),
            shutdown.clone(),
            Arc::clone(&stats),
        );
        connection.establish().map_err(|err| match err {
            DeliveryError::Cancelled => SinkError::Cancelled,
            other => SinkError::Io(std::io::Error::other(other)),
        })?;
        let abort_slot = connection.abort_slot();
        let (producer, consumer) = pending_queue();
        let worker = DeliveryWorker::new(connection, consumer, &config, shutdown.clone(), Arc::clone(&stats))
            .spawn()
            .inspect_err(|_| {
                abort_slot.abort();
            })?;
        Ok(Self {
            producer: RwLock::new(Some(producer)),
            builder: RecordBuilder::new(config.hash.clone()),
            target: config.target.clone(),
            level: config.level,
            shutdown,
            stats,
            worker: Mutex::new(Some(worker)),
            abort_slot,
            warner: RateLimitedWarner::new(config.warn_interval),
            join_timeout: config.join_timeout,
            destination: config.destination.to_string(),
        })
    }

    /// Start construction on a background thread.
    ///
    /// The returned handle lets the caller wait with its own timeout or
    /// cancel the initial connect loop.
    pub fn spawn_connect(config: SinkConfig) -> PendingSink {
        Self::spawn_connect_with_token(config, ShutdownToken::new())
    }

    /// As [`TcpSink::spawn_connect`], also stopping once `shutdown` is
    /// cancelled, whether construction is still running or not.
    pub fn spawn_connect_with_token(config: SinkConfig, shutdown: ShutdownToken) -> PendingSink {
        let connector = tcp_connector(&config);
        PendingSink::spawn(config, connector, shutdown)
    }

    /// Capture one event. Never blocks and never fails; after [`close`]
    /// records are dropped silently.
    ///
    /// [`close`]: TcpSink::close
    pub fn record(&self, level: LogLevel, message: &str, target: &str, module_path: &str, file: &str, line: u32) {
        let call_site = CallSite {
            module_path: module_path.to_owned(),
            file: file.to_owned(),
            line,
        };
        let _ = self.submit(self.builder.build(level, message, target, call_site));
    }

    /// Queue an already built record.
    pub fn submit(&self, record: LogRecord) -> Result<(), SinkError> {
        let guard = self.producer.read();
        let Some(producer) = guard.as_ref() else {
            self.note_rejected("sink is closed");
            return Err(SinkError::Closed);
        };
        // Counted before the push so a concurrent `flush` already waits on it.
        self.stats.record_enqueued();
        match producer.push(record) {
            Ok(()) => Ok(()),
            Err(_) => {
                self.stats.revert_enqueued();
                self.note_rejected("delivery worker has stopped");
                Err(SinkError::Closed)
            }
        }
    }

    fn note_rejected(&self, reason: &'static str) {
        self.warner.record_drop();
        self.warner.warn_if_due(|count| {
            warn!(target: DIAGNOSTIC_TARGET, dropped = count, reason, "records rejected");
        });
    }

    /// Wait until every record queued before this call has been sent or
    /// dropped. Returns `false` when `timeout` elapses first.
    pub fn flush(&self, timeout: Duration) -> bool {
        let target = self.stats.enqueued();
        let deadline = Instant::now() + timeout;
        loop {
            if self.stats.settled() >= target {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            thread::sleep(FLUSH_POLL_INTERVAL.min(deadline - now));
        }
    }

    /// Stop the worker and close the connection.
    ///
    /// Waits up to the configured join timeout for the worker, then closes
    /// the connection regardless. Records still queued are discarded.
    /// Idempotent.
    pub fn close(&self) {
        self.shutdown.cancel();
        self.producer.write().take();
        if let Some(worker) = self.worker.lock().take() {
            self.join_worker(worker);
        }
        self.abort_slot.abort();
        self.warner.flush(|count| {
            warn!(target: DIAGNOSTIC_TARGET, dropped = count, "records rejected after close");
        });
    }

    fn join_worker(&self, worker: WorkerHandle) {
        match worker.done_rx.recv_timeout(self.join_timeout) {
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    target: DIAGNOSTIC_TARGET,
                    timeout_ms = self.join_timeout.as_millis() as u64,
                    "delivery worker did not stop in time; closing connection"
                );
                // Detach; the worker exits once its current operation ends.
            }
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if worker.handle.join().is_err() {
                    warn!(target: DIAGNOSTIC_TARGET, "delivery worker panicked");
                }
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.producer.read().is_none()
    }

    pub fn hash(&self) -> &str {
        self.builder.hash()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Records waiting for the worker.
    pub fn pending(&self) -> usize {
        self.producer.read().as_ref().map_or(0, QueueProducer::len)
    }

    pub(crate) fn builder(&self) -> &RecordBuilder {
        &self.builder
    }

    #[track_caller]
    fn emit(&self, level: LogLevel, message: &str) {
        let location = std::panic::Location::caller();
        let call_site = CallSite {
            module_path: String::new(),
            file: location.file().to_owned(),
            line: location.line(),
        };
        let _ = self.submit(self.builder.build(level, message, &self.target, call_site));
    }

    #[track_caller]
    pub fn trace(&self, message: &str) {
        self.emit(LogLevel::Trace, message);
    }

    #[track_caller]
    pub fn debug(&self, message: &str) {
        self.emit(LogLevel::Debug, message);
    }

    #[track_caller]
    pub fn info(&self, message: &str) {
        self.emit(LogLevel::Info, message);
    }

    #[track_caller]
    pub fn warn(&self, message: &str) {
        self.emit(LogLevel::Warn, message);
    }

    #[track_caller]
    pub fn error(&self, message: &str) {
        self.emit(LogLevel::Error, message);
    }
}

fn tcp_connector(config: &SinkConfig) -> TcpConnector {
    TcpConnector::new(config.destination.clone()).with_write_timeout(config.write_timeout)
}

impl Drop for TcpSink {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for TcpSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpSink")
            .field("destination", &self.destination)
            .field("hash", &self.builder.hash())
            .field("closed", &self.is_closed())
            .finish()
    }
}
