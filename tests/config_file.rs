//! Building a sink from an INI file.

mod test_utils;

use std::{io::Write, net::TcpListener, time::Duration};

use ironlog::{ShutdownToken, SinkBuilder, SinkError};
use rstest::rstest;
use tempfile::NamedTempFile;
use test_utils::{Collector, init_tracing};

fn ini_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp ini file");
    file.write_all(contents.as_bytes()).expect("write ini contents");
    file
}

#[rstest]
fn sink_built_from_ini_ships_records() {
    init_tracing();
    let collector = Collector::start();
    let file = ini_file(&format!(
        "[ironlog]\nhost = 127.0.0.1\nport = {}\nhash = from-ini\ntarget = svc\nreconnect_interval_ms = 50\n",
        collector.addr().port()
    ));
    let sink = SinkBuilder::from_ini_file(file.path())
        .expect("valid ini")
        .build()
        .expect("sink connects");
    sink.error("configured");

    let received = collector.recv();
    assert_eq!(received.record.hash, "from-ini");
    assert_eq!(received.record.target, "svc");
    assert_eq!(received.record.message, "configured");
    sink.close();
}

#[rstest]
fn spawn_validates_before_connecting() {
    let file = ini_file("[ironlog]\nhost = 127.0.0.1\nport = 9\nhash = abc\njoin_timeout_ms = 0\n");
    let err = SinkBuilder::from_ini_file(file.path())
        .expect("valid ini")
        .spawn()
        .expect_err("zero timeout is rejected");
    assert!(matches!(err, SinkError::InvalidConfig(msg) if msg.contains("join_timeout_ms")));
}

#[rstest]
fn spawned_sink_can_be_awaited() {
    let collector = Collector::start();
    let mut pending = SinkBuilder::new()
        .with_tcp("127.0.0.1", collector.addr().port())
        .with_hash("abc")
        .spawn()
        .expect("valid config");
    let sink = pending
        .wait_timeout(Duration::from_secs(3))
        .expect("connected in time")
        .expect("sink connects");
    sink.info("spawned");
    assert_eq!(collector.recv().record.message, "spawned");
    sink.close();
}

#[rstest]
fn spawn_honours_builder_shutdown_token() {
    init_tracing();
    let port = {
        let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind listener");
        listener.local_addr().expect("listener address").port()
    };
    let token = ShutdownToken::new();
    let mut pending = SinkBuilder::new()
        .with_tcp("127.0.0.1", port)
        .with_hash("abc")
        .with_reconnect_interval(Duration::from_secs(30))
        .with_shutdown_token(token.clone())
        .spawn()
        .expect("valid config");
    token.cancel();
    let result = pending
        .wait_timeout(Duration::from_secs(3))
        .expect("construction stopped in time");
    assert!(matches!(result, Err(SinkError::Cancelled)));
}
