//! Connection lifecycle state machine owned by the delivery worker.
//!
//! ```text
//! Disconnected --establish--> Connecting --ok--> Connected
//!                                 ^   |                |
//!                                 +---+ fail + sleep   | send error
//!                                                      v
//!                                                 Disconnected
//! ```
//!
//! Connecting retries without limit. The shutdown token is checked before
//! every attempt and interrupts the sleep between attempts; a cancelled
//! connect loop settles in `Disconnected`.

use std::{
    io::{self, Write},
    sync::Arc,
    time::Duration,
};

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::{DIAGNOSTIC_TARGET, error::DeliveryError, shutdown::ShutdownToken, stats::SinkStats};

use super::{
    backoff::ReconnectSchedule,
    config::ReconnectPolicy,
    transport::{AbortHandle, Connector},
};

/// Lifecycle state of the worker's connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Slot holding the abort handle of the live connection, if any.
///
/// Shared with the sink so `close()` can terminate a connection the worker
/// is still blocked on.
#[derive(Clone, Debug, Default)]
pub(crate) struct AbortSlot(Arc<Mutex<Option<AbortHandle>>>);

impl AbortSlot {
    fn set(&self, handle: Option<AbortHandle>) {
        *self.0.lock() = handle;
    }

    fn clear(&self) {
        self.0.lock().take();
    }

    /// Abort the current connection, if one is registered.
    pub(crate) fn abort(&self) -> bool {
        let handle = self.0.lock().take();
        match handle {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }
}

pub(crate) struct ConnectionManager<C: Connector> {
    connector: C,
    connect_timeout: Duration,
    schedule: ReconnectSchedule,
    state: ConnectionState,
    stream: Option<C::Stream>,
    abort_slot: AbortSlot,
    shutdown: ShutdownToken,
    stats: Arc<SinkStats>,
    connections: u64,
}

impl<C: Connector> ConnectionManager<C> {
    pub(crate) fn new(
        connector: C,
        connect_timeout: Duration,
        policy: ReconnectPolicy,
        shutdown: ShutdownToken,
        stats: Arc<SinkStats>,
    ) -> Self {
        Self {
            connector,
            connect_timeout,
            schedule: ReconnectSchedule::new(policy),
            state: ConnectionState::Disconnected,
            stream: None,
            abort_slot: AbortSlot::default(),
            shutdown,
            stats,
            connections: 0,
        }
    }

    pub(crate) fn state(&self) -> ConnectionState {
        self.state
    }

    pub(crate) fn abort_slot(&self) -> AbortSlot {
        self.abort_slot.clone()
    }

    /// Connect, retrying until a connection is established or shutdown is
    /// requested. The only error returned is [`DeliveryError::Cancelled`].
    pub(crate) fn establish(&mut self) -> Result<(), DeliveryError> {
        self.disconnect();
        loop {
            if self.shutdown.is_cancelled() {
                self.state = ConnectionState::Disconnected;
                return Err(DeliveryError::Cancelled);
            }
            self.state = ConnectionState::Connecting;
            match self.connector.connect(self.connect_timeout) {
                Ok(stream) => {
                    self.on_connected(stream);
                    return Ok(());
                }
                Err(source) => {
                    self.stats.record_connect_failure();
                    let delay = self.schedule.next_delay();
                    let err = DeliveryError::Connect {
                        destination: self.connector.describe(),
                        source,
                    };
                    warn!(
                        target: DIAGNOSTIC_TARGET,
                        error = %err,
                        retry_in_ms = delay.as_millis() as u64,
                        "connection attempt failed"
                    );
                    if !self.shutdown.sleep(delay) {
                        self.state = ConnectionState::Disconnected;
                        return Err(DeliveryError::Cancelled);
                    }
                }
            }
        }
    }

    fn on_connected(&mut self, stream: C::Stream) {
        self.abort_slot.set(self.connector.abort_handle(&stream));
        self.stream = Some(stream);
        self.state = ConnectionState::Connected;
        self.schedule.reset();
        if self.connections > 0 {
            self.stats.record_reconnect();
        }
        self.connections += 1;
        info!(
            target: DIAGNOSTIC_TARGET,
            destination = %self.connector.describe(),
            connections = self.connections,
            "connected to collector"
        );
    }

    /// Write one frame. Any failure drops the connection.
    pub(crate) fn send(&mut self, frame: &[u8]) -> Result<(), DeliveryError> {
        let Some(stream) = self.stream.as_mut() else {
            return Err(DeliveryError::Send(io::Error::new(
                io::ErrorKind::NotConnected,
                "no active connection",
            )));
        };
        match stream.write_all(frame).and_then(|()| stream.flush()) {
            Ok(()) => Ok(()),
            Err(err) => {
                self.disconnect();
                Err(DeliveryError::Send(err))
            }
        }
    }

    pub(crate) fn disconnect(&mut self) {
        self.abort_slot.clear();
        self.stream = None;
        self.state = ConnectionState::Disconnected;
    }

    /// Flush and release the connection on worker exit.
    pub(crate) fn close(&mut self) {
        if let Some(stream) = self.stream.as_mut() {
            let _ = stream.flush();
        }
        self.disconnect();
    }
}
