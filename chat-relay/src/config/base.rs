//! Base config: transport bridge, session database, logging, initial target. Loaded from env.

use anyhow::Result;
use std::env;
use std::time::Duration;

use crate::selector::normalize_phone;

/// Base config: session connectivity and logging only.
#[derive(Debug, Clone)]
pub struct BaseConfig {
    /// BRIDGE_ADDR: TCP address of the transport bridge
    pub bridge_addr: String,
    /// BRIDGE_CONNECT_TIMEOUT_SECS: how long to wait for the bridge to report the device identity
    pub bridge_connect_timeout_secs: u64,
    /// SESSION_DB_PATH: session database holding contacts and the alias map
    pub session_db_path: String,
    /// IDENTITY_LOOKUP_TIMEOUT_MS
    pub identity_lookup_timeout_ms: u64,
    /// PAIRING_CODE_FILE
    pub pairing_code_file: String,
    /// LOG_FILE
    pub log_file: String,
    /// TARGET_PHONE: optional initial target; monitor everyone when unset
    pub target_phone: Option<String>,
}

impl BaseConfig {
    /// Load from environment variables.
    pub fn load() -> Result<Self> {
        let bridge_addr =
            env::var("BRIDGE_ADDR").unwrap_or_else(|_| "127.0.0.1:7301".to_string());
        let bridge_connect_timeout_secs = parse_env("BRIDGE_CONNECT_TIMEOUT_SECS", 120)?;
        let session_db_path =
            env::var("SESSION_DB_PATH").unwrap_or_else(|_| "./whatsapp_session.db".to_string());
        let identity_lookup_timeout_ms = parse_env("IDENTITY_LOOKUP_TIMEOUT_MS", 500)?;
        let pairing_code_file =
            env::var("PAIRING_CODE_FILE").unwrap_or_else(|_| "pairing_code.txt".to_string());
        let log_file = env::var("LOG_FILE").unwrap_or_else(|_| "logs/chat-relay.log".to_string());
        let target_phone = env::var("TARGET_PHONE").ok().filter(|s| !s.trim().is_empty());

        Ok(Self {
            bridge_addr,
            bridge_connect_timeout_secs,
            session_db_path,
            identity_lookup_timeout_ms,
            pairing_code_file,
            log_file,
            target_phone,
        })
    }

    /// Validate config (timeouts non-zero, initial target a usable phone number).
    pub fn validate(&self) -> Result<()> {
        if self.bridge_addr.trim().is_empty() {
            anyhow::bail!("BRIDGE_ADDR must not be empty");
        }
        if self.bridge_connect_timeout_secs == 0 {
            anyhow::bail!("BRIDGE_CONNECT_TIMEOUT_SECS must be greater than 0");
        }
        if self.identity_lookup_timeout_ms == 0 {
            anyhow::bail!("IDENTITY_LOOKUP_TIMEOUT_MS must be greater than 0");
        }
        if let Some(ref phone) = self.target_phone {
            if let Err(e) = normalize_phone(phone) {
                anyhow::bail!("TARGET_PHONE is set but not a phone number: {}", e);
            }
        }
        Ok(())
    }

    pub fn bridge_connect_timeout(&self) -> Duration {
        Duration::from_secs(self.bridge_connect_timeout_secs)
    }

    pub fn identity_lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.identity_lookup_timeout_ms)
    }
}

/// Reads a numeric env var; unset means `default`, unparsable is an error.
pub(crate) fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} is not a valid number: {}", key, raw)),
        Err(_) => Ok(default),
    }
}
