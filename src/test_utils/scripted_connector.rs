//! In-memory [`Connector`] whose connect and write outcomes are scripted.
//!
//! Lets the connection state machine and the delivery worker be exercised
//! without sockets or timing-sensitive peers.

use std::{
    io::{self, Write},
    sync::Arc,
    thread,
    time::Duration,
};

use parking_lot::Mutex;

use crate::sink::{AbortHandle, Connector};

#[derive(Debug, Default)]
struct Script {
    refusals: usize,
    refuse_all: bool,
    failing_writes: usize,
    stall: Option<Duration>,
    stalled_writes: usize,
    attempts: usize,
    connections: usize,
    aborts: usize,
    frames: Vec<(usize, Vec<u8>)>,
}

/// Connector handing out in-memory streams.
///
/// Connection attempts succeed unless refusals are queued; writes succeed
/// unless failures are queued. Every successful write is recorded along with
/// the index of the connection that carried it.
#[derive(Clone, Debug, Default)]
pub struct ScriptedConnector {
    script: Arc<Mutex<Script>>,
}

impl ScriptedConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse the next `count` connection attempts.
    pub fn refuse_next(&self, count: usize) {
        self.script.lock().refusals += count;
    }

    /// Refuse every attempt until cleared.
    pub fn refuse_all(&self, refuse: bool) {
        self.script.lock().refuse_all = refuse;
    }

    /// Fail the next `count` writes on whichever connection is live.
    pub fn fail_next_writes(&self, count: usize) {
        self.script.lock().failing_writes += count;
    }

    /// Make the next write block for `duration` before completing.
    pub fn stall_next_write(&self, duration: Duration) {
        self.script.lock().stall = Some(duration);
    }

    /// Writes that have entered a stall.
    pub fn stalled_writes(&self) -> usize {
        self.script.lock().stalled_writes
    }

    pub fn attempts(&self) -> usize {
        self.script.lock().attempts
    }

    pub fn connections(&self) -> usize {
        self.script.lock().connections
    }

    pub fn aborts(&self) -> usize {
        self.script.lock().aborts
    }

    /// Frames written so far, tagged with their 1-based connection index.
    pub fn frames(&self) -> Vec<(usize, Vec<u8>)> {
        self.script.lock().frames.clone()
    }

    /// Written frames as UTF-8 lines without their terminators.
    pub fn lines(&self) -> Vec<String> {
        self.frames()
            .into_iter()
            .map(|(_, frame)| {
                String::from_utf8_lossy(&frame)
                    .trim_end_matches('\n')
                    .to_owned()
            })
            .collect()
    }
}

impl Connector for ScriptedConnector {
    type Stream = ScriptedStream;

    fn connect(&self, _timeout: Duration) -> io::Result<ScriptedStream> {
        let mut script = self.script.lock();
        script.attempts += 1;
        let refused = script.refuse_all || script.refusals > 0;
        if refused {
            script.refusals = script.refusals.saturating_sub(1);
            return Err(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "scripted refusal",
            ));
        }
        script.connections += 1;
        Ok(ScriptedStream {
            script: Arc::clone(&self.script),
            connection: script.connections,
        })
    }

    fn abort_handle(&self, _stream: &ScriptedStream) -> Option<AbortHandle> {
        let script = Arc::clone(&self.script);
        Some(AbortHandle::new(move || {
            script.lock().aborts += 1;
        }))
    }

    fn describe(&self) -> String {
        "scripted".to_owned()
    }
}

/// Stream produced by [`ScriptedConnector`].
#[derive(Debug)]
pub struct ScriptedStream {
    script: Arc<Mutex<Script>>,
    connection: usize,
}

impl Write for ScriptedStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let stall = {
            let mut script = self.script.lock();
            let stall = script.stall.take();
            if stall.is_some() {
                script.stalled_writes += 1;
            }
            stall
        };
        if let Some(duration) = stall {
            thread::sleep(duration);
        }
        let mut script = self.script.lock();
        if script.failing_writes > 0 {
            script.failing_writes -= 1;
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "scripted write failure"));
        }
        script.frames.push((self.connection, buf.to_vec()));
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
