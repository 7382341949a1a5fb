//! Logging setup for binaries and tests.
//!
//! The library itself only emits `tracing` events; it never installs a global
//! subscriber. Hand the dispatch built here to
//! [`ServerBuilder::subscriber`](crate::ServerBuilder::subscriber).

use tracing::{Dispatch, Level};
use tracing_subscriber::FmtSubscriber;

/// A `fmt` subscriber printing events up to `level`.
pub fn fmt_dispatch(level: Level) -> Dispatch {
    Dispatch::new(FmtSubscriber::builder().with_max_level(level).finish())
}

