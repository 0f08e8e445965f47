//! build-tracker - Travis CI build status from the terminal
//!
//! Available as the `bt` command.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use build_tracker::cli::commands::{Cli, Commands};
use build_tracker::cli::{accounts, auth, builds, config, repos};
use build_tracker::error::{BuildTrackerError, Result};

#[tokio::main]
async fn main() {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        handle_error(&e);
        std::process::exit(1);
    }
}

fn handle_error(e: &BuildTrackerError) {
    eprintln!("Error: {}", e);
    if e.is_offline() {
        eprintln!();
        eprintln!("Tracked repositories keep their last known status.");
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let data_dir = cli.data_dir;

    match cli.command {
        Commands::Auth(args) => auth::handle_auth(args.command, data_dir).await,
        Commands::Repos(args) => repos::handle_repos(args.command, data_dir).await,
        Commands::Builds(args) => builds::handle_builds(args.command, data_dir).await,
        Commands::Accounts(args) => accounts::handle_accounts(args.command, data_dir).await,
        // Config commands only touch the config file
        Commands::Config(args) => config::handle_config(args.command),
    }
}
