//! RelayConfig: BaseConfig + EndpointConfig. Use load() for env-based loading.

use anyhow::Result;

use super::{BaseConfig, EndpointConfig};

/// Relay config. Use RelayConfig::load() for env-based loading, then validate().
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub base: BaseConfig,
    pub endpoints: EndpointConfig,
    /// Log outbound jobs instead of sending them. Set from the CLI.
    pub dry_run: bool,
}

impl RelayConfig {
    /// Load full config from environment variables.
    pub fn load() -> Result<Self> {
        let base = BaseConfig::load()?;
        let endpoints = EndpointConfig::from_env()?;
        Ok(Self {
            base,
            endpoints,
            dry_run: false,
        })
    }

    /// Validate config. Call after load() to fail fast before connecting.
    pub fn validate(&self) -> Result<()> {
        self.base.validate()?;
        self.endpoints.validate()
    }

    pub fn base(&self) -> &BaseConfig {
        &self.base
    }
    pub fn endpoints(&self) -> &EndpointConfig {
        &self.endpoints
    }

    pub fn bridge_addr(&self) -> &str {
        &self.base.bridge_addr
    }
    pub fn session_db_path(&self) -> &str {
        &self.base.session_db_path
    }
    pub fn log_file(&self) -> &str {
        &self.base.log_file
    }
    pub fn target_phone(&self) -> Option<&str> {
        self.base.target_phone.as_deref()
    }
}
