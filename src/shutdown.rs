//! Cooperative cancellation shared between a sink and its worker.
//!
//! A [`ShutdownToken`] replaces a bare running flag: the worker checks it at
//! every loop boundary and uses [`ShutdownToken::sleep`] for the reconnect
//! interval so cancellation wakes it immediately. Cancelling drops the
//! internal sender, which disconnects every cloned receiver at once.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, bounded};
use parking_lot::Mutex;

#[derive(Debug)]
struct Shared {
    cancelled: AtomicBool,
    wake_tx: Mutex<Option<Sender<()>>>,
}

/// Clonable cancellation token.
#[derive(Clone, Debug)]
pub struct ShutdownToken {
    shared: Arc<Shared>,
    wake_rx: Receiver<()>,
}

impl ShutdownToken {
    pub fn new() -> Self {
        let (wake_tx, wake_rx) = bounded(0);
        Self {
            shared: Arc::new(Shared {
                cancelled: AtomicBool::new(false),
                wake_tx: Mutex::new(Some(wake_tx)),
            }),
            wake_rx,
        }
    }

    /// Request shutdown. Idempotent.
    pub fn cancel(&self) {
        self.shared.cancelled.store(true, Ordering::Release);
        self.shared.wake_tx.lock().take();
    }

    pub fn is_cancelled(&self) -> bool {
        self.shared.cancelled.load(Ordering::Acquire)
    }

    /// Sleep for `duration` unless cancelled first.
    ///
    /// Returns `true` when the full duration elapsed and `false` when the
    /// token was (or already had been) cancelled.
    pub fn sleep(&self, duration: Duration) -> bool {
        if self.is_cancelled() {
            return false;
        }
        match self.wake_rx.recv_timeout(duration) {
            Err(RecvTimeoutError::Timeout) => !self.is_cancelled(),
            // Nothing is ever sent; any other outcome means the sender was dropped.
            Ok(()) | Err(RecvTimeoutError::Disconnected) => false,
        }
    }
}

impl Default for ShutdownToken {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn sleep_runs_to_completion_when_not_cancelled() {
        let token = ShutdownToken::new();
        let start = Instant::now();
        assert!(token.sleep(Duration::from_millis(30)));
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn cancel_wakes_sleeping_clone() {
        let token = ShutdownToken::new();
        let sleeper = token.clone();
        let handle = thread::spawn(move || {
            let start = Instant::now();
            let completed = sleeper.sleep(Duration::from_secs(10));
            (completed, start.elapsed())
        });
        thread::sleep(Duration::from_millis(50));
        token.cancel();
        let (completed, elapsed) = handle.join().expect("sleeper thread");
        assert!(!completed);
        assert!(elapsed < Duration::from_secs(5), "sleep not interrupted: {elapsed:?}");
    }

    #[test]
    fn cancelled_token_never_sleeps() {
        let token = ShutdownToken::new();
        token.cancel();
        token.cancel();
        assert!(token.is_cancelled());
        let start = Instant::now();
        assert!(!token.sleep(Duration::from_secs(10)));
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
