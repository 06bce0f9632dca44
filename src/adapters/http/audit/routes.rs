//! Axum router configuration for audit endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{get_audit, list_audits, run_audit, AuditAppState};

/// Create the audit API router, mounted at `/api/audits`.
///
/// # Routes
///
/// - `POST /` - Run an audit (anonymous or authenticated)
/// - `GET /?id=` - Fetch a result by id (no authentication)
/// - `GET /history?limit=` - The caller's stored results (authenticated)
pub fn audit_routes() -> Router<AuditAppState> {
    Router::new()
        .route("/", post(run_audit).get(get_audit))
        .route("/history", get(list_audits))
}
