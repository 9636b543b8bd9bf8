//! Downstream endpoints: context forwarding and invoice submission.

use anyhow::Result;
use std::env;
use std::time::Duration;

use super::base::parse_env;

const DEFAULT_BACKEND_BASE_URL: &str = "https://invoice-makeaton-production.up.railway.app";

/// Outbound HTTP config for the notifier.
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    /// BACKEND_BASE_URL
    pub base_url: String,
    /// CONTEXT_FORWARD_PATH
    pub context_forward_path: String,
    /// INVOICE_SUBMIT_PATH
    pub invoice_submit_path: String,
    /// HTTP_TIMEOUT_SECS: per-request timeout, one attempt only
    pub http_timeout_secs: u64,
    /// OUTBOUND_MAX_IN_FLIGHT: concurrent requests allowed
    pub max_in_flight: usize,
    /// SHUTDOWN_GRACE_SECS: wait for in-flight requests on shutdown
    pub shutdown_grace_secs: u64,
}

impl EndpointConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            base_url: env::var("BACKEND_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BACKEND_BASE_URL.to_string()),
            context_forward_path: env::var("CONTEXT_FORWARD_PATH")
                .unwrap_or_else(|_| "/api/messages".to_string()),
            invoice_submit_path: env::var("INVOICE_SUBMIT_PATH")
                .unwrap_or_else(|_| "/api/generate-invoice".to_string()),
            http_timeout_secs: parse_env("HTTP_TIMEOUT_SECS", 15)?,
            max_in_flight: parse_env("OUTBOUND_MAX_IN_FLIGHT", 32)?,
            shutdown_grace_secs: parse_env("SHUTDOWN_GRACE_SECS", 5)?,
        })
    }

    /// Endpoints rooted at `base_url` with default paths and limits (used by tests and tooling).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            context_forward_path: "/api/messages".to_string(),
            invoice_submit_path: "/api/generate-invoice".to_string(),
            http_timeout_secs: 15,
            max_in_flight: 32,
            shutdown_grace_secs: 5,
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.context_forward_url()?;
        self.invoice_submit_url()?;
        if self.http_timeout_secs == 0 {
            anyhow::bail!("HTTP_TIMEOUT_SECS must be greater than 0");
        }
        if self.max_in_flight == 0 {
            anyhow::bail!("OUTBOUND_MAX_IN_FLIGHT must be greater than 0");
        }
        Ok(())
    }

    pub fn context_forward_url(&self) -> Result<reqwest::Url> {
        self.join(&self.context_forward_path)
    }

    pub fn invoice_submit_url(&self) -> Result<reqwest::Url> {
        self.join(&self.invoice_submit_path)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }

    fn join(&self, path: &str) -> Result<reqwest::Url> {
        let base = reqwest::Url::parse(&self.base_url).map_err(|e| {
            anyhow::anyhow!("BACKEND_BASE_URL is not a valid URL: {} ({})", self.base_url, e)
        })?;
        base.join(path)
            .map_err(|e| anyhow::anyhow!("Invalid endpoint path {}: {}", path, e))
    }
}
