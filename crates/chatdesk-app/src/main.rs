use anyhow::Result;
use clap::Parser;

use chatdesk::{run_command, run_repl_mode, AppConfig, Cli};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    // Parse CLI arguments
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let config = AppConfig::load(&cli)?;
    log::debug!("Using server {}", config.server_url);

    // If a subcommand was provided, execute it and exit
    if let Some(command) = &cli.command {
        return run_command(command, &config).await;
    }

    run_repl_mode(&config).await
}
