//! Shared test utilities for taskping integration tests.
//!
//! - [`MemoryStore`]: in-memory task/user collections with operation recording
//!   and failure injection
//! - [`RecordingPush`] / [`RecordingEmail`]: delivery fakes that remember
//!   every message
//! - [`MemoryClaims`]: in-process claim guard
//! - Fixture builders for task and user documents

#![allow(clippy::unwrap_used)]

pub mod delivery;
pub mod fixtures;
pub mod store;

pub use delivery::*;
pub use fixtures::*;
pub use store::*;

/// Initialize test logging (safe to call from every test).
pub fn init_test_logging() {
    use tracing_subscriber::{EnvFilter, fmt};

    let _ = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("taskping=debug")),
        )
        .with_test_writer()
        .try_init();
}
