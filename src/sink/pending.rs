//! Sink construction running on a background thread.

use std::{sync::Arc, thread, time::Duration};

use crossbeam_channel::{Receiver, RecvTimeoutError, bounded};
use parking_lot::Mutex;

use crate::{error::SinkError, shutdown::ShutdownToken};

use super::{config::SinkConfig, handler::TcpSink, transport::Connector};

/// Decides whether a cancel request still reaches the connect loop.
///
/// Once the sink is connected the flag is set under the lock and cancel
/// requests from the handle are ignored from then on.
#[derive(Debug, Default)]
struct Handover {
    connected: Mutex<bool>,
}

/// A sink whose initial connection is still being established.
///
/// Dropping the handle before the sink is received cancels construction; a
/// sink that finishes connecting afterwards is closed immediately.
#[derive(Debug)]
pub struct PendingSink {
    shutdown: ShutdownToken,
    handover: Arc<Handover>,
    rx: Receiver<Result<TcpSink, SinkError>>,
    delivered: bool,
}

impl PendingSink {
    pub(crate) fn spawn<C: Connector>(config: SinkConfig, connector: C, shutdown: ShutdownToken) -> Self {
        let handover = Arc::new(Handover::default());
        let (tx, rx) = bounded(1);
        let spawned = thread::Builder::new().name("ironlog-connect".into()).spawn({
            let tx = tx.clone();
            let token = shutdown.clone();
            let handover = Arc::clone(&handover);
            move || {
                let result = TcpSink::with_connector(config, connector, token.clone())
                    .and_then(|sink| hand_over(sink, &token, &handover));
                let _ = tx.send(result);
            }
        });
        if let Err(err) = spawned {
            let _ = tx.send(Err(SinkError::Io(err)));
        }
        Self {
            shutdown,
            handover,
            rx,
            delivered: false,
        }
    }

    /// Abort the connect loop. Waiting afterwards yields
    /// [`SinkError::Cancelled`] unless the connection had already succeeded,
    /// in which case the call has no effect.
    pub fn cancel(&self) {
        if self.delivered {
            return;
        }
        let connected = self.handover.connected.lock();
        if !*connected {
            self.shutdown.cancel();
        }
    }

    pub fn is_ready(&self) -> bool {
        !self.rx.is_empty()
    }

    /// Block until construction finishes.
    pub fn wait(mut self) -> Result<TcpSink, SinkError> {
        let result = self.rx.recv().unwrap_or(Err(SinkError::Cancelled));
        self.delivered = true;
        result
    }

    /// Wait at most `timeout`; `None` means construction is still running.
    pub fn wait_timeout(&mut self, timeout: Duration) -> Option<Result<TcpSink, SinkError>> {
        if self.delivered {
            return Some(Err(SinkError::Cancelled));
        }
        match self.rx.recv_timeout(timeout) {
            Ok(result) => {
                self.delivered = true;
                Some(result)
            }
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                self.delivered = true;
                Some(Err(SinkError::Cancelled))
            }
        }
    }
}

/// Commit a connected sink, unless a cancel slipped in after the connect
/// loop finished.
fn hand_over(sink: TcpSink, token: &ShutdownToken, handover: &Handover) -> Result<TcpSink, SinkError> {
    let mut connected = handover.connected.lock();
    if token.is_cancelled() {
        drop(connected);
        sink.close();
        return Err(SinkError::Cancelled);
    }
    *connected = true;
    Ok(sink)
}

impl Drop for PendingSink {
    fn drop(&mut self) {
        self.cancel();
    }
}
