//! Unbounded FIFO buffer between producers and the delivery worker.
//!
//! Producers hold clonable [`QueueProducer`] handles and never block; the
//! single [`QueueConsumer`] polls with a timeout so the worker can observe
//! shutdown between records. There is no size bound: while the collector is
//! unreachable the queue grows with every submitted record.

use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError, unbounded};

use crate::log_record::LogRecord;

/// Create a connected producer/consumer pair.
pub fn pending_queue() -> (QueueProducer, QueueConsumer) {
    let (tx, rx) = unbounded();
    (QueueProducer { tx }, QueueConsumer { rx })
}

/// Outcome of [`QueueConsumer::pop`].
#[derive(Debug)]
pub enum Popped {
    Record(LogRecord),
    /// Nothing arrived within the timeout.
    Empty,
    /// Every producer is gone and the queue is drained.
    Closed,
}

/// Producer side of the pending queue.
#[derive(Clone, Debug)]
pub struct QueueProducer {
    tx: Sender<LogRecord>,
}

impl QueueProducer {
    /// Append a record without blocking.
    ///
    /// The record is handed back only when the consumer has gone away.
    pub fn push(&self, record: LogRecord) -> Result<(), LogRecord> {
        match self.tx.try_send(record) {
            Ok(()) => Ok(()),
            // Unbounded channels are never full.
            Err(TrySendError::Full(record)) | Err(TrySendError::Disconnected(record)) => Err(record),
        }
    }

    pub fn len(&self) -> usize {
        self.tx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tx.is_empty()
    }
}

/// Consumer side of the pending queue, owned by the delivery worker.
#[derive(Debug)]
pub struct QueueConsumer {
    rx: Receiver<LogRecord>,
}

impl QueueConsumer {
    /// Wait up to `timeout` for the next record.
    pub fn pop(&self, timeout: Duration) -> Popped {
        match self.rx.recv_timeout(timeout) {
            Ok(record) => Popped::Record(record),
            Err(RecvTimeoutError::Timeout) => Popped::Empty,
            Err(RecvTimeoutError::Disconnected) => Popped::Closed,
        }
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}
