//! Delivery counters shared by a sink and its worker.

use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic counters describing what happened to submitted records.
///
/// Every enqueued record eventually settles as either `sent` or `dropped`
/// unless it is still queued when the sink shuts down.
#[derive(Debug, Default)]
pub struct SinkStats {
    enqueued: AtomicU64,
    sent: AtomicU64,
    retried: AtomicU64,
    dropped: AtomicU64,
    reconnects: AtomicU64,
    connect_failures: AtomicU64,
}

/// Point-in-time copy of [`SinkStats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub enqueued: u64,
    pub sent: u64,
    /// Records written a second time after a reconnect.
    pub retried: u64,
    pub dropped: u64,
    /// Connections established after the initial one.
    pub reconnects: u64,
    pub connect_failures: u64,
}

impl StatsSnapshot {
    /// Records that have been sent or dropped.
    pub fn settled(&self) -> u64 {
        self.sent + self.dropped
    }
}

impl SinkStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_enqueued(&self) {
        self.enqueued.fetch_add(1, Ordering::Relaxed);
    }

    /// Undo [`record_enqueued`](Self::record_enqueued) for a rejected push.
    pub(crate) fn revert_enqueued(&self) {
        self.enqueued.fetch_sub(1, Ordering::Relaxed);
    }

    pub(crate) fn record_sent(&self) {
        self.sent.fetch_add(1, Ordering::Release);
    }

    pub(crate) fn record_retry(&self) {
        self.retried.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Release);
    }

    pub(crate) fn record_reconnect(&self) {
        self.reconnects.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_connect_failure(&self) {
        self.connect_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn enqueued(&self) -> u64 {
        self.enqueued.load(Ordering::Relaxed)
    }

    pub fn settled(&self) -> u64 {
        self.sent.load(Ordering::Acquire) + self.dropped.load(Ordering::Acquire)
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            enqueued: self.enqueued.load(Ordering::Relaxed),
            sent: self.sent.load(Ordering::Acquire),
            retried: self.retried.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Acquire),
            reconnects: self.reconnects.load(Ordering::Relaxed),
            connect_failures: self.connect_failures.load(Ordering::Relaxed),
        }
    }
}
