//! Process-local result cache with a fixed TTL.
//!
//! Entries are visible strictly before `inserted_at + ttl` and absent from
//! that instant on. Expired entries are removed lazily on lookup and in bulk
//! by `purge_expired`; neither affects what callers observe.
//!
//! The cache is not shared between processes. Behind a load balancer an
//! anonymous result is only retrievable from the instance that produced it.

use async_trait::async_trait;
use chrono::Duration;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::audit::AuditResult;
use crate::domain::foundation::{AuditId, DomainError, Timestamp};
use crate::ports::{Clock, ResultCache};

/// Default entry lifetime.
pub const DEFAULT_TTL_SECS: u64 = 3600;

#[derive(Debug, Clone)]
struct CacheEntry {
    result: AuditResult,
    expires_at: Timestamp,
}

impl CacheEntry {
    fn is_live(&self, now: Timestamp) -> bool {
        now.is_before(&self.expires_at)
    }
}

pub struct InMemoryResultCache {
    entries: RwLock<HashMap<AuditId, CacheEntry>>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    max_entries: usize,
}

impl InMemoryResultCache {
    pub fn new(clock: Arc<dyn Clock>, ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    /// One-hour TTL, bounded to `max_entries`.
    pub fn with_default_ttl(clock: Arc<dyn Clock>, max_entries: usize) -> Self {
        Self::new(clock, Duration::seconds(DEFAULT_TTL_SECS as i64), max_entries)
    }

    /// Number of stored entries, expired or not.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl ResultCache for InMemoryResultCache {
    async fn put(&self, result: AuditResult) -> Result<(), DomainError> {
        let now = self.clock.now();
        let mut entries = self.entries.write().await;

        if entries.len() >= self.max_entries && !entries.contains_key(&result.id) {
            entries.retain(|_, e| e.is_live(now));
            if entries.len() >= self.max_entries {
                let oldest = entries
                    .iter()
                    .min_by_key(|(_, e)| e.expires_at)
                    .map(|(id, _)| *id);
                if let Some(id) = oldest {
                    entries.remove(&id);
                    tracing::warn!(audit_id = %id, "Result cache full, evicted oldest entry");
                }
            }
        }

        entries.insert(
            result.id,
            CacheEntry {
                result,
                expires_at: now.plus(self.ttl),
            },
        );
        Ok(())
    }

    async fn get(&self, id: &AuditId) -> Result<Option<AuditResult>, DomainError> {
        let now = self.clock.now();
        {
            let entries = self.entries.read().await;
            match entries.get(id) {
                None => return Ok(None),
                Some(entry) if entry.is_live(now) => return Ok(Some(entry.result.clone())),
                Some(_) => {}
            }
        }

        let mut entries = self.entries.write().await;
        if entries.get(id).is_some_and(|e| !e.is_live(now)) {
            entries.remove(id);
        }
        Ok(None)
    }

    async fn purge_expired(&self) -> Result<usize, DomainError> {
        let now = self.clock.now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, e| e.is_live(now));
        Ok(before - entries.len())
    }
}
