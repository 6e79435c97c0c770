mod cli;
mod config;
mod sqlite_url;

use clap::Parser;
use services::{AppServices, Clock};

use crate::cli::Cli;

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let policies = config::load(cli.config.as_deref())?;

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    let db_url = sqlite_url::normalize(&cli.db_url)?;
    sqlite_url::prepare_file(&db_url)?;
    log::debug!("using database {db_url}");

    let services = AppServices::new_sqlite(&db_url, Clock::default_clock(), policies).await?;
    cli::execute(cli.command, &services).await
}

#[tokio::main]
async fn main() {
    env_logger::init();
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("error: {err}");
        std::process::exit(2);
    }
}
