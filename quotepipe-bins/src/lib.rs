//! Shared CLI/logging/signal-handling glue for the `client` and `server` binaries.

pub mod common;
