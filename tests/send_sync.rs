//! Send/Sync guarantees for core types.

use ironlog::{
    LogRecord, PendingSink, QueueProducer, RecordBuilder, ShutdownToken, SinkBuilder, SinkConfig,
    TcpConnector, TcpSink,
};
use rstest::rstest;
use static_assertions::assert_impl_all;

#[rstest]
fn builders_are_send_sync() {
    assert_impl_all!(SinkBuilder: Send, Sync);
    assert_impl_all!(SinkConfig: Send, Sync);
    assert_impl_all!(RecordBuilder: Send, Sync);
}

#[rstest]
fn components_are_send_sync() {
    assert_impl_all!(TcpSink: Send, Sync);
    assert_impl_all!(LogRecord: Send, Sync);
    assert_impl_all!(QueueProducer: Send, Sync, Clone);
    assert_impl_all!(ShutdownToken: Send, Sync, Clone);
    assert_impl_all!(TcpConnector: Send, Sync);
    assert_impl_all!(PendingSink: Send);
}
