//! Client binary: connects to the market feed, runs the strategy/execution pipeline
//! until a shutdown signal arrives, then stops cleanly (§4.7, §6.3).

use anyhow::Result;
use clap::Parser;
use quotepipe_bins::common::{install_panic_hook, install_shutdown_flag, init_logging, Args};
use quotepipe_core::{Config, DefaultController};
use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;
use tracing::{error, info};

fn main() -> Result<()> {
    install_panic_hook();

    let args = Args::parse();

    let config = match Config::load(&args.config_path) {
        Ok(c) => c,
        Err(e) => {
            // Logging may not be initialized yet if the config itself couldn't be read;
            // fall back to a best-effort default filter so the error is still visible.
            let _ = init_logging("info");
            error!(error = %e, path = %args.config_path, "failed to load configuration");
            std::process::exit(1);
        }
    };

    init_logging(&config.logging.level)?;

    let shutdown = install_shutdown_flag()?;

    let mut controller: DefaultController = DefaultController::new(config);

    if let Err(e) = controller.initialize_client() {
        error!(error = %e, "failed to initialize client");
        std::process::exit(1);
    }

    if let Err(e) = controller.work_client() {
        error!(error = %e, "failed to start client pipeline");
        std::process::exit(1);
    }

    info!("client running, waiting for shutdown signal (Ctrl-C)");
    while !shutdown.load(Ordering::Acquire) {
        thread::sleep(Duration::from_millis(100));
    }

    controller.stop_client();
    info!("client exited cleanly");
    Ok(())
}
