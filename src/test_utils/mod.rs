//! Test-only helpers shared across crate unit tests.

pub mod scripted_connector;

pub use scripted_connector::ScriptedConnector;
