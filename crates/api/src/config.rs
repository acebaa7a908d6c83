//! Process configuration, read from `BOOKSTOCK_*` environment variables.

use std::net::SocketAddr;

use anyhow::{Context, Result};

use bookstock_core::page::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use bookstock_infra::ServiceConfig;
use bookstock_observability::LogFormat;

pub const BIND_ADDR_VAR: &str = "BOOKSTOCK_BIND_ADDR";
pub const LOG_FORMAT_VAR: &str = "BOOKSTOCK_LOG_FORMAT";
pub const MAX_CONFLICT_RETRIES_VAR: &str = "BOOKSTOCK_MAX_CONFLICT_RETRIES";
pub const DEFAULT_PAGE_SIZE_VAR: &str = "BOOKSTOCK_DEFAULT_PAGE_SIZE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub log_format: LogFormat,
    pub service: ServiceConfig,
    /// Page size for list/search requests that do not ask for one.
    pub default_page_size: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            log_format: LogFormat::default(),
            service: ServiceConfig::default(),
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(raw) = lookup(BIND_ADDR_VAR) {
            config.bind_addr = raw
                .parse()
                .with_context(|| format!("{BIND_ADDR_VAR}: invalid socket address '{raw}'"))?;
        }
        if let Some(raw) = lookup(LOG_FORMAT_VAR) {
            config.log_format = raw.parse().context(LOG_FORMAT_VAR)?;
        }
        if let Some(raw) = lookup(MAX_CONFLICT_RETRIES_VAR) {
            config.service.max_conflict_retries = raw
                .trim()
                .parse()
                .with_context(|| format!("{MAX_CONFLICT_RETRIES_VAR}: expected a non-negative integer, got '{raw}'"))?;
        }
        if let Some(raw) = lookup(DEFAULT_PAGE_SIZE_VAR) {
            let size: u64 = raw
                .trim()
                .parse()
                .with_context(|| format!("{DEFAULT_PAGE_SIZE_VAR}: expected a positive integer, got '{raw}'"))?;
            anyhow::ensure!(size > 0, "{DEFAULT_PAGE_SIZE_VAR} must be greater than zero");
            config.default_page_size = size.min(MAX_PAGE_SIZE);
        }

        Ok(config)
    }
}
