//! CLI parser and config loading.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use crate::config::RelayConfig;

#[derive(Parser)]
#[command(name = "chat-relay")]
#[command(
    about = "Chat relay: monitor a messaging session and forward conversations",
    long_about = None
)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the relay (config from env; flags override it).
    Run(RunArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Session bridge address; overrides BRIDGE_ADDR.
    #[arg(long)]
    pub bridge: Option<String>,
    /// Session database path; overrides SESSION_DB_PATH.
    #[arg(long)]
    pub session_db: Option<String>,
    /// Phone number to monitor at startup; overrides TARGET_PHONE.
    #[arg(short, long)]
    pub target: Option<String>,
    /// Log outbound jobs instead of sending them.
    #[arg(long)]
    pub dry_run: bool,
}

/// Load RelayConfig from environment, then apply CLI overrides.
pub fn load_config(args: &RunArgs) -> Result<RelayConfig> {
    let mut config = RelayConfig::load()?;
    if let Some(ref bridge) = args.bridge {
        config.base.bridge_addr = bridge.clone();
    }
    if let Some(ref session_db) = args.session_db {
        config.base.session_db_path = session_db.clone();
    }
    if let Some(ref target) = args.target {
        config.base.target_phone = Some(target.clone());
    }
    config.dry_run = args.dry_run;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_parse_run_flags() {
        let cli = Cli::try_parse_from([
            "chat-relay",
            "run",
            "--bridge",
            "127.0.0.1:9000",
            "-t",
            "919800000001",
            "--dry-run",
        ])
        .unwrap();

        let Commands::Run(args) = cli.command;
        assert_eq!(args.bridge.as_deref(), Some("127.0.0.1:9000"));
        assert_eq!(args.target.as_deref(), Some("919800000001"));
        assert_eq!(args.session_db, None);
        assert!(args.dry_run);
    }

    #[test]
    #[serial]
    fn test_overrides_win_over_env() {
        std::env::set_var("BRIDGE_ADDR", "10.0.0.1:7301");
        std::env::set_var("TARGET_PHONE", "919800000009");

        let config = load_config(&RunArgs {
            bridge: Some("127.0.0.1:9000".to_string()),
            session_db: Some("/tmp/session.db".to_string()),
            target: Some("919800000001".to_string()),
            dry_run: true,
        })
        .unwrap();

        assert_eq!(config.bridge_addr(), "127.0.0.1:9000");
        assert_eq!(config.session_db_path(), "/tmp/session.db");
        assert_eq!(config.target_phone(), Some("919800000001"));
        assert!(config.dry_run);

        std::env::remove_var("BRIDGE_ADDR");
        std::env::remove_var("TARGET_PHONE");
    }
}
