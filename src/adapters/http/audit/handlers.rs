//! HTTP handlers for audit endpoints.
//!
//! These handlers connect axum routes to the audit command and query handlers.

use std::str::FromStr;
use std::sync::Arc;

use axum::extract::{Json, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::application::handlers::audit::{
    GetAuditHandler, GetAuditQuery, ListAuditsHandler, ListAuditsQuery, RunAuditCommand,
    RunAuditHandler,
};
use crate::domain::audit::AuditError;
use crate::domain::foundation::AuditId;
use crate::ports::{
    AuditEngine, AuditRepository, Clock, ProfileRepository, ResultCache, SubscriptionRepository,
};

use super::super::error::ErrorResponse;
use super::super::middleware::{OptionalAuth, RequireAuth};
use super::dto::{
    AuditHistoryParams, AuditHistoryResponse, AuditResponse, GetAuditParams, RunAuditRequest,
};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Dependencies of the audit endpoints.
#[derive(Clone)]
pub struct AuditAppState {
    pub engine: Arc<dyn AuditEngine>,
    pub audits: Arc<dyn AuditRepository>,
    pub cache: Arc<dyn ResultCache>,
    pub profiles: Arc<dyn ProfileRepository>,
    pub subscriptions: Arc<dyn SubscriptionRepository>,
    pub clock: Arc<dyn Clock>,
}

impl AuditAppState {
    pub fn run_audit_handler(&self) -> RunAuditHandler {
        RunAuditHandler::new(
            self.engine.clone(),
            self.audits.clone(),
            self.cache.clone(),
            self.profiles.clone(),
            self.subscriptions.clone(),
            self.clock.clone(),
        )
    }

    pub fn get_audit_handler(&self) -> GetAuditHandler {
        GetAuditHandler::new(self.cache.clone(), self.audits.clone())
    }

    pub fn list_audits_handler(&self) -> ListAuditsHandler {
        ListAuditsHandler::new(self.audits.clone())
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/audits - Run an audit, anonymously or against the caller's quota
pub async fn run_audit(
    State(state): State<AuditAppState>,
    OptionalAuth(user): OptionalAuth,
    Json(request): Json<RunAuditRequest>,
) -> Result<impl IntoResponse, AuditApiError> {
    let cmd = RunAuditCommand {
        store_url: request.store_url,
        claimed_user_id: request.user_id,
        authenticated_user: user.map(|u| u.id),
    };

    let audit = state.run_audit_handler().handle(cmd).await?;
    Ok(Json(AuditResponse::from(audit)))
}

/// GET /api/audits?id= - Fetch a result by id
pub async fn get_audit(
    State(state): State<AuditAppState>,
    Query(params): Query<GetAuditParams>,
) -> Result<impl IntoResponse, AuditApiError> {
    let raw = params
        .id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AuditError::invalid_request("id", "Audit id is required"))?;
    let id = AuditId::from_str(raw)
        .map_err(|_| AuditError::invalid_request("id", "Audit id must be a UUID"))?;

    let audit = state.get_audit_handler().handle(GetAuditQuery { id }).await?;
    Ok(Json(AuditResponse::from(audit)))
}

/// GET /api/audits/history?limit= - The caller's stored results
pub async fn list_audits(
    State(state): State<AuditAppState>,
    RequireAuth(user): RequireAuth,
    Query(params): Query<AuditHistoryParams>,
) -> Result<impl IntoResponse, AuditApiError> {
    let query = ListAuditsQuery {
        user_id: user.id,
        limit: params.limit,
    };

    let audits = state.list_audits_handler().handle(query).await?;
    Ok(Json(AuditHistoryResponse::from(audits)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts audit errors to HTTP responses.
#[derive(Debug)]
pub struct AuditApiError(AuditError);

impl From<AuditError> for AuditApiError {
    fn from(err: AuditError) -> Self {
        Self(err)
    }
}

impl IntoResponse for AuditApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            AuditError::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
            AuditError::IdentityMismatch => StatusCode::UNAUTHORIZED,
            AuditError::QuotaExceeded { .. } => StatusCode::FORBIDDEN,
            AuditError::NotFound(_) => StatusCode::NOT_FOUND,
            AuditError::EngineFailed(_) | AuditError::Storage(_) => {
                tracing::error!(error = %self.0, "Audit request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let mut body = ErrorResponse::new(self.0.code().to_string(), self.0.message());
        if self.0.requires_upgrade() {
            body = body.with_upgrade_prompt();
        }
        body.into_response_with(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::analysis::MockAuditEngine;
    use crate::adapters::cache::InMemoryResultCache;
    use crate::adapters::clock::ManualClock;
    use crate::adapters::memory::{
        InMemoryAuditRepository, InMemoryProfileRepository, InMemorySubscriptionRepository,
    };
    use crate::domain::foundation::{AuthenticatedUser, UserId};

    fn test_state() -> AuditAppState {
        let clock = Arc::new(ManualClock::default());
        AuditAppState {
            engine: Arc::new(MockAuditEngine::default()),
            audits: Arc::new(InMemoryAuditRepository::new()),
            cache: Arc::new(InMemoryResultCache::with_default_ttl(clock.clone(), 100)),
            profiles: Arc::new(InMemoryProfileRepository::new()),
            subscriptions: Arc::new(InMemorySubscriptionRepository::new()),
            clock,
        }
    }

    fn caller(id: &str) -> AuthenticatedUser {
        AuthenticatedUser::new(UserId::new(id).unwrap(), None)
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Error Mapping Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn audit_errors_map_to_statuses() {
        let cases = [
            (AuditError::invalid_request("storeUrl", "empty"), StatusCode::BAD_REQUEST),
            (AuditError::IdentityMismatch, StatusCode::UNAUTHORIZED),
            (AuditError::quota_exceeded(3, 3), StatusCode::FORBIDDEN),
            (AuditError::not_found(AuditId::new()), StatusCode::NOT_FOUND),
            (AuditError::engine_failed("timeout"), StatusCode::INTERNAL_SERVER_ERROR),
            (AuditError::storage("db"), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(AuditApiError(err).into_response().status(), status);
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Handler Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn run_then_get_returns_same_result() {
        let state = test_state();
        let request = RunAuditRequest {
            store_url: "https://example.myshopify.com".to_string(),
            user_id: None,
        };

        let response = run_audit(State(state.clone()), OptionalAuth(None), Json(request))
            .await
            .unwrap()
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);
        let created = body_json(response).await;
        assert_eq!(created["audit"]["auditType"], "public");

        let params = GetAuditParams {
            id: created["audit"]["id"].as_str().map(str::to_string),
        };
        let fetched = get_audit(State(state), Query(params))
            .await
            .unwrap()
            .into_response();
        assert_eq!(fetched.status(), StatusCode::OK);
        assert_eq!(body_json(fetched).await["audit"], created["audit"]);
    }

    #[tokio::test]
    async fn get_audit_rejects_missing_and_malformed_ids() {
        let state = test_state();

        let missing = get_audit(State(state.clone()), Query(GetAuditParams::default()))
            .await
            .err()
            .unwrap();
        assert_eq!(missing.into_response().status(), StatusCode::BAD_REQUEST);

        let malformed = get_audit(
            State(state),
            Query(GetAuditParams {
                id: Some("not-a-uuid".to_string()),
            }),
        )
        .await
        .err()
        .unwrap();
        assert_eq!(malformed.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn get_audit_unknown_id_is_404() {
        let params = GetAuditParams {
            id: Some(AuditId::new().to_string()),
        };
        let err = get_audit(State(test_state()), Query(params)).await.err().unwrap();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn mismatched_claim_is_401() {
        let request = RunAuditRequest {
            store_url: "https://example.myshopify.com".to_string(),
            user_id: Some("someone-else".to_string()),
        };
        let err = run_audit(State(test_state()), OptionalAuth(Some(caller("owner"))), Json(request))
            .await
            .err()
            .unwrap();
        assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn history_lists_identified_runs() {
        let state = test_state();
        for _ in 0..2 {
            let request = RunAuditRequest {
                store_url: "https://example.myshopify.com".to_string(),
                user_id: None,
            };
            run_audit(State(state.clone()), OptionalAuth(Some(caller("owner"))), Json(request))
                .await
                .unwrap();
        }

        let response = list_audits(
            State(state),
            RequireAuth(caller("owner")),
            Query(AuditHistoryParams { limit: Some(1) }),
        )
        .await
        .unwrap()
        .into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["count"], 1);
        assert_eq!(json["audits"][0]["auditType"], "authenticated");
    }
}
