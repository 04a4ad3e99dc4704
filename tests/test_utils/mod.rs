pub mod collector;

pub use collector::Collector;

/// Route the sink's diagnostics to the test harness output.
#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
