//! Shared initialization for both binaries: CLI parsing, logging, panic hook, and the
//! ctrlc-driven shutdown flag (§4.7).

use anyhow::Result;
use clap::Parser;
use std::panic;
use std::process;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Positional config-file argument shared by `client` and `server`.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Args {
    /// Path to the TOML configuration file.
    pub config_path: String,
}

/// Initialize `tracing-subscriber` from `level`, falling back to `RUST_LOG`/`EnvFilter`
/// if set (matching the teacher's `bog-bins::common::init_logging`).
pub fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    Ok(())
}

/// Install a panic hook that logs the panic location/message via `tracing` before the
/// process exits non-zero, grounded on the teacher's
/// `resilience::panic::install_panic_handler`. Stage-thread panics are caught separately
/// by `catch_unwind` in the controller (§7) — this hook covers panics on the main thread.
pub fn install_panic_hook() {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |panic_info| {
        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}:{}", loc.file(), loc.line(), loc.column()))
            .unwrap_or_else(|| "<unknown location>".to_string());

        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "<no message>".to_string()
        };

        error!(location = %location, message = %message, "fatal panic, shutting down");
        default_hook(panic_info);
        process::exit(1);
    }));
}

/// Install a SIGINT/SIGTERM handler that stores `true` into the returned flag.
pub fn install_shutdown_flag() -> Result<Arc<AtomicBool>> {
    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = shutdown.clone();
    ctrlc::set_handler(move || {
        flag.store(true, std::sync::atomic::Ordering::Release);
    })?;
    Ok(shutdown)
}
