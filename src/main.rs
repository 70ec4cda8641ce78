use std::{process, sync::Arc};

use clap::Parser;
use log::{error, info};

use jotter::{initialize_logger, App, Cli, Config, Result, Workspace};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        error!("{}", e);
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }

    initialize_logger(&config.log_filter, cli.verbose);
    info!("Application starting up");

    let workspace = Arc::new(Workspace::from_config(&config).await);
    let app = App::new(
        Arc::clone(&workspace),
        config.clone(),
        cli.config.clone(),
        cli.verbose,
    );

    let outcome = app.run(cli.command).await;

    // Writes are fire-and-forget; drain them before the runtime goes away
    if let Err(e) = workspace.shutdown(config.flush_timeout()).await {
        error!("Pending writes may be lost: {}", e);
    }

    info!("Application shutting down");
    outcome
}
