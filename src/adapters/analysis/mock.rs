//! Scripted audit engine for tests and offline development.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::domain::audit::{AuditScores, StoreUrl};
use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::AuditEngine;

#[derive(Debug)]
struct MockState {
    scores: AuditScores,
    fail_next: Option<String>,
    analyzed: Vec<String>,
}

/// Returns the same scores for every storefront and records what it was asked to analyze.
#[derive(Debug, Clone)]
pub struct MockAuditEngine {
    inner: Arc<Mutex<MockState>>,
}

impl MockAuditEngine {
    pub fn new(scores: AuditScores) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockState {
                scores,
                fail_next: None,
                analyzed: Vec::new(),
            })),
        }
    }

    /// Fails the next `analyze` call with an engine error.
    pub fn fail_next(&self, message: impl Into<String>) {
        self.lock().fail_next = Some(message.into());
    }

    /// Number of completed or attempted analyses.
    pub fn calls(&self) -> usize {
        self.lock().analyzed.len()
    }

    /// Storefront URLs in call order.
    pub fn analyzed(&self) -> Vec<String> {
        self.lock().analyzed.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MockAuditEngine {
    fn default() -> Self {
        Self::new(
            AuditScores::new(82, 71, 1_350).with_findings(
                vec!["Hero image is not lazy loaded".to_string()],
                vec!["No trust badges near checkout".to_string()],
            ),
        )
    }
}

#[async_trait]
impl AuditEngine for MockAuditEngine {
    async fn analyze(&self, store_url: &StoreUrl) -> Result<AuditScores, DomainError> {
        let mut state = self.lock();
        state.analyzed.push(store_url.as_str().to_string());
        if let Some(message) = state.fail_next.take() {
            return Err(DomainError::new(ErrorCode::AuditEngineError, message));
        }
        Ok(state.scores.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url() -> StoreUrl {
        StoreUrl::parse("https://example.myshopify.com").unwrap()
    }

    #[tokio::test]
    async fn returns_configured_scores() {
        let engine = MockAuditEngine::new(AuditScores::new(90, 50, 10));
        let scores = engine.analyze(&url()).await.unwrap();
        assert_eq!(scores.performance, 90);
        assert_eq!(scores.conversion, 50);
        assert_eq!(engine.calls(), 1);
    }

    #[tokio::test]
    async fn fail_next_fails_once() {
        let engine = MockAuditEngine::default();
        engine.fail_next("timeout");

        let err = engine.analyze(&url()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::AuditEngineError);
        assert!(engine.analyze(&url()).await.is_ok());
        assert_eq!(engine.calls(), 2);
    }
}
