//! Audit pipeline configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Longest accepted cache TTL.
const MAX_CACHE_TTL_SECS: u64 = 24 * 60 * 60;

/// Audit engine and result cache settings
#[derive(Debug, Clone, Deserialize)]
pub struct AuditConfig {
    /// Lifetime of anonymous results
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,

    /// Upper bound on cached anonymous results
    #[serde(default = "default_cache_max_entries")]
    pub cache_max_entries: usize,

    /// How often expired cache entries and old webhook records are purged
    #[serde(default = "default_purge_interval")]
    pub purge_interval_secs: u64,

    /// Webhook delivery records older than this are deleted
    #[serde(default = "default_webhook_retention_days")]
    pub webhook_retention_days: i64,

    /// Storefront fetch timeout
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,

    /// User agent sent with storefront fetches
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl AuditConfig {
    pub fn cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.cache_ttl_secs as i64)
    }

    pub fn purge_interval(&self) -> Duration {
        Duration::from_secs(self.purge_interval_secs.max(1))
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Validate audit configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.cache_ttl_secs == 0 || self.cache_ttl_secs > MAX_CACHE_TTL_SECS {
            return Err(ValidationError::InvalidCacheTtl);
        }
        if self.cache_max_entries == 0 {
            return Err(ValidationError::InvalidCacheCapacity);
        }
        if self.fetch_timeout_secs == 0 || self.fetch_timeout_secs > 120 {
            return Err(ValidationError::InvalidFetchTimeout);
        }
        Ok(())
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: default_cache_ttl(),
            cache_max_entries: default_cache_max_entries(),
            purge_interval_secs: default_purge_interval(),
            webhook_retention_days: default_webhook_retention_days(),
            fetch_timeout_secs: default_fetch_timeout(),
            user_agent: None,
        }
    }
}

fn default_cache_ttl() -> u64 {
    3600
}

fn default_cache_max_entries() -> usize {
    10_000
}

fn default_purge_interval() -> u64 {
    300
}

fn default_webhook_retention_days() -> i64 {
    30
}

fn default_fetch_timeout() -> u64 {
    15
}
