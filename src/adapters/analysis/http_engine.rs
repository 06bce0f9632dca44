//! Audit engine backed by a single HTTP fetch of the storefront.

use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::domain::audit::{AuditScores, StoreUrl};
use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::AuditEngine;

use super::heuristics::{score_page, PageSignals};

/// Fetch settings for the engine.
#[derive(Debug, Clone)]
pub struct HttpAuditEngineConfig {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpAuditEngineConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            user_agent: format!("storefront-audit/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

pub struct HttpAuditEngine {
    http_client: reqwest::Client,
}

impl HttpAuditEngine {
    pub fn new(config: HttpAuditEngineConfig) -> Result<Self, DomainError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent)
            .build()
            .map_err(|e| {
                DomainError::new(
                    ErrorCode::InternalError,
                    format!("Failed to build HTTP client: {}", e),
                )
            })?;

        Ok(Self { http_client })
    }

    fn engine_error(message: impl Into<String>) -> DomainError {
        DomainError::new(ErrorCode::AuditEngineError, message)
    }
}

#[async_trait]
impl AuditEngine for HttpAuditEngine {
    async fn analyze(&self, store_url: &StoreUrl) -> Result<AuditScores, DomainError> {
        let started = Instant::now();

        let response = self
            .http_client
            .get(store_url.as_str())
            .send()
            .await
            .map_err(|e| Self::engine_error(format!("Failed to fetch {}: {}", store_url, e)))?;

        if !response.status().is_success() {
            return Err(Self::engine_error(format!(
                "Store {} responded with {}",
                store_url,
                response.status()
            )));
        }

        let uses_https = response.url().scheme() == "https";
        let html = response
            .text()
            .await
            .map_err(|e| Self::engine_error(format!("Failed to read {}: {}", store_url, e)))?;
        let response_ms = started.elapsed().as_millis() as u64;

        let signals = PageSignals::from_html(&html, response_ms, uses_https);
        tracing::debug!(
            store_url = %store_url,
            response_ms,
            html_bytes = signals.html_bytes,
            "Storefront fetched"
        );

        Ok(score_page(&signals))
    }
}
