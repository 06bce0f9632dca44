//! RunAuditHandler - Command handler for the entitlement-gated audit pipeline.
//!
//! Identified callers reserve one audit before any work starts. A failed run
//! or a failed save gives the reservation back, so only persisted results
//! consume quota. Anonymous callers skip the gate and their result goes to
//! the result cache instead of storage.

use std::sync::Arc;

use crate::domain::audit::{AuditError, AuditRequest, AuditResult, StoreUrl};
use crate::domain::billing::QuotaDecision;
use crate::domain::foundation::UserId;
use crate::ports::{
    AuditEngine, AuditRepository, Clock, ProfileRepository, ResultCache, SubscriptionRepository,
};

/// Command to run an audit.
#[derive(Debug, Clone)]
pub struct RunAuditCommand {
    pub store_url: String,
    /// Identity claimed in the request body, if any.
    pub claimed_user_id: Option<String>,
    /// Identity proven by the bearer token, if any.
    pub authenticated_user: Option<UserId>,
}

pub struct RunAuditHandler {
    engine: Arc<dyn AuditEngine>,
    audits: Arc<dyn AuditRepository>,
    cache: Arc<dyn ResultCache>,
    profiles: Arc<dyn ProfileRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    clock: Arc<dyn Clock>,
}

impl RunAuditHandler {
    pub fn new(
        engine: Arc<dyn AuditEngine>,
        audits: Arc<dyn AuditRepository>,
        cache: Arc<dyn ResultCache>,
        profiles: Arc<dyn ProfileRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            engine,
            audits,
            cache,
            profiles,
            subscriptions,
            clock,
        }
    }

    pub async fn handle(&self, cmd: RunAuditCommand) -> Result<AuditResult, AuditError> {
        // 1. Validate input
        let store_url = StoreUrl::parse(&cmd.store_url)?;
        let user_id = resolve_identity(cmd.claimed_user_id, cmd.authenticated_user)?;
        let request = AuditRequest::new(store_url, user_id);

        match request.user_id() {
            Some(user_id) => self.run_identified(&request, user_id).await,
            None => self.run_anonymous(&request).await,
        }
    }

    async fn run_anonymous(&self, request: &AuditRequest) -> Result<AuditResult, AuditError> {
        let scores = self.engine.analyze(request.store_url()).await?;
        let result = AuditResult::completed(request, scores, self.clock.now());

        self.cache.put(result.clone()).await?;

        tracing::info!(
            audit_id = %result.id,
            store_url = %result.store_url,
            overall_score = result.overall_score,
            "Anonymous audit cached"
        );
        Ok(result)
    }

    async fn run_identified(
        &self,
        request: &AuditRequest,
        user_id: &UserId,
    ) -> Result<AuditResult, AuditError> {
        // 2. Reserve one audit (check and increment in a single step)
        match self.profiles.try_reserve_audit(user_id, self.clock.now()).await? {
            QuotaDecision::Granted { used, limit } => {
                tracing::debug!(user_id = %user_id, used, limit, "Audit reserved");
            }
            QuotaDecision::Exhausted { used, limit } => {
                tracing::info!(user_id = %user_id, used, limit, "Audit quota exhausted");
                return Err(AuditError::quota_exceeded(used, limit));
            }
        }

        // 3. Run and persist, giving the reservation back on failure
        let result = match self.execute_and_save(request).await {
            Ok(result) => result,
            Err(err) => {
                self.release(user_id).await;
                return Err(err);
            }
        };

        // 4. Period usage on the subscription is best effort
        if let Err(e) = self.subscriptions.increment_period_usage(user_id).await {
            tracing::error!(
                user_id = %user_id,
                audit_id = %result.id,
                error = %e,
                "Failed to increment subscription period usage"
            );
        }

        tracing::info!(
            audit_id = %result.id,
            user_id = %user_id,
            overall_score = result.overall_score,
            "Audit stored"
        );
        Ok(result)
    }

    async fn execute_and_save(&self, request: &AuditRequest) -> Result<AuditResult, AuditError> {
        let scores = self.engine.analyze(request.store_url()).await?;
        let result = AuditResult::completed(request, scores, self.clock.now());
        self.audits
            .save(&result)
            .await
            .map_err(|e| AuditError::storage(e.message))?;
        Ok(result)
    }

    async fn release(&self, user_id: &UserId) {
        if let Err(e) = self.profiles.release_audit(user_id, self.clock.now()).await {
            tracing::error!(user_id = %user_id, error = %e, "Failed to release audit reservation");
        }
    }
}

/// Decides who the run is for.
///
/// A claimed id must match the token subject. A token without a claim is
/// enough on its own.
fn resolve_identity(
    claimed: Option<String>,
    authenticated: Option<UserId>,
) -> Result<Option<UserId>, AuditError> {
    let claimed = claimed.filter(|c| !c.trim().is_empty());
    match (claimed, authenticated) {
        (None, authenticated) => Ok(authenticated),
        (Some(claimed), Some(authenticated)) if claimed.trim() == authenticated.as_str() => {
            Ok(Some(authenticated))
        }
        (Some(_), _) => Err(AuditError::IdentityMismatch),
    }
}
