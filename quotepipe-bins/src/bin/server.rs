//! Server binary: synthesizes ticks and streams them to a connected client until a
//! shutdown signal arrives (§4.6, §6.3).

use anyhow::Result;
use clap::Parser;
use quotepipe_bins::common::{install_panic_hook, install_shutdown_flag, init_logging, Args};
use quotepipe_core::{Config, DefaultController};
use tracing::{error, info};

fn main() -> Result<()> {
    install_panic_hook();

    let args = Args::parse();

    let config = match Config::load(&args.config_path) {
        Ok(c) => c,
        Err(e) => {
            let _ = init_logging("info");
            error!(error = %e, path = %args.config_path, "failed to load configuration");
            std::process::exit(1);
        }
    };

    init_logging(&config.logging.level)?;

    let shutdown = install_shutdown_flag()?;

    let mut controller: DefaultController = DefaultController::new(config);

    if let Err(e) = controller.initialize_server() {
        error!(error = %e, "failed to initialize server");
        std::process::exit(1);
    }

    info!("server listening, waiting for a client connection");
    if let Err(e) = controller.work_server(&shutdown) {
        error!(error = %e, "server stopped with an error");
        std::process::exit(1);
    }

    info!("server exited cleanly");
    Ok(())
}
