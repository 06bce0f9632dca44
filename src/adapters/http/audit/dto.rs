//! Request and response bodies for the audit endpoints.

use serde::{Deserialize, Serialize};

use crate::domain::audit::AuditResult;

/// Body of `POST /api/audits`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunAuditRequest {
    /// Missing URLs fail validation rather than deserialization.
    #[serde(default)]
    pub store_url: String,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Query string of `GET /api/audits`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GetAuditParams {
    pub id: Option<String>,
}

/// Query string of `GET /api/audits/history`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditHistoryParams {
    pub limit: Option<u32>,
}

/// A single audit result.
#[derive(Debug, Clone, Serialize)]
pub struct AuditResponse {
    pub success: bool,
    pub audit: AuditResult,
}

impl From<AuditResult> for AuditResponse {
    fn from(audit: AuditResult) -> Self {
        Self {
            success: true,
            audit,
        }
    }
}

/// The caller's stored results, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct AuditHistoryResponse {
    pub success: bool,
    pub count: usize,
    pub audits: Vec<AuditResult>,
}

impl From<Vec<AuditResult>> for AuditHistoryResponse {
    fn from(audits: Vec<AuditResult>) -> Self {
        Self {
            success: true,
            count: audits.len(),
            audits,
        }
    }
}
