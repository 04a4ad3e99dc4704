//! Minimal newline-delimited JSON collector used by integration tests.
//!
//! Accepts connections one after another on a background thread and forwards
//! every decoded line together with the index of the connection that carried
//! it. A connection can be cut after a fixed number of lines to simulate a
//! collector restart.

use std::{
    io::{BufRead, BufReader},
    net::{SocketAddr, TcpListener},
    sync::mpsc,
    thread,
    time::Duration,
};

use ironlog::{LogRecord, decode_line};

/// One line received by the collector.
#[derive(Debug)]
pub struct Received {
    /// 1-based connection index.
    #[allow(dead_code)]
    pub connection: usize,
    pub record: LogRecord,
}

pub struct Collector {
    addr: SocketAddr,
    rx: mpsc::Receiver<Received>,
}

impl Collector {
    /// Start a collector that keeps every connection open.
    pub fn start() -> Self {
        Self::start_with_cuts(Vec::new())
    }

    /// Start a collector that closes connection `n` after `cuts[n - 1]` lines.
    pub fn start_with_cuts(cuts: Vec<usize>) -> Self {
        let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind collector");
        let addr = listener.local_addr().expect("collector address");
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            for (index, stream) in listener.incoming().enumerate() {
                let Ok(stream) = stream else { break };
                let connection = index + 1;
                let limit = cuts.get(index).copied();
                let mut seen = 0;
                for line in BufReader::new(stream).lines() {
                    let Ok(line) = line else { break };
                    let record = decode_line(&line).expect("collector received valid json");
                    if tx.send(Received { connection, record }).is_err() {
                        return;
                    }
                    seen += 1;
                    if limit == Some(seen) {
                        break;
                    }
                }
            }
        });
        Self { addr, rx }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn recv(&self) -> Received {
        self.rx
            .recv_timeout(Duration::from_secs(3))
            .expect("collector received a line in time")
    }

    /// Assert nothing more arrives within `wait`.
    #[allow(dead_code)]
    pub fn assert_silent(&self, wait: Duration) {
        if let Ok(extra) = self.rx.recv_timeout(wait) {
            panic!("unexpected line: {extra:?}");
        }
    }
}
