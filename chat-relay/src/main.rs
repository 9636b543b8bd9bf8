//! Binary for the chat relay.

use anyhow::Result;
use chat_relay::{load_config, run_relay, Cli, Commands};
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run(args) => {
            let config = load_config(&args)?;
            run_relay(config).await
        }
    };

    // The stdin reader blocks a runtime thread that cannot be cancelled; exit without
    // waiting for it.
    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
    std::process::exit(0)
}
