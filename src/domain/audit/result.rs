//! Audit result value types.
//!
//! An `AuditResult` is created once per run and never mutated afterwards.
//! Its JSON shape (camelCase, nested `score` objects) is the wire format
//! returned to clients and the payload stored for identified callers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{AuditId, Timestamp, UserId, ValidationError};

use super::{AuditRequest, AuditType, StoreUrl};

/// Letter band summarizing a 0-100 score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    /// Maps a score onto its band: A >= 90, B >= 80, C >= 70, D >= 60, else F.
    pub fn from_score(score: u8) -> Self {
        match score {
            90..=u8::MAX => Grade::A,
            80..=89 => Grade::B,
            70..=79 => Grade::C,
            60..=69 => Grade::D,
            _ => Grade::F,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Grade {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(Grade::A),
            "B" => Ok(Grade::B),
            "C" => Ok(Grade::C),
            "D" => Ok(Grade::D),
            "F" => Ok(Grade::F),
            other => Err(ValidationError::invalid_format(
                "overallGrade",
                format!("unknown grade '{}'", other),
            )),
        }
    }
}

/// Terminal status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditStatus {
    Completed,
    Failed,
}

impl AuditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditStatus::Completed => "completed",
            AuditStatus::Failed => "failed",
        }
    }
}

impl FromStr for AuditStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completed" => Ok(AuditStatus::Completed),
            "failed" => Ok(AuditStatus::Failed),
            other => Err(ValidationError::invalid_format(
                "status",
                format!("unknown audit status '{}'", other),
            )),
        }
    }
}

/// Raw output of the scoring engine, before it becomes a result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditScores {
    pub performance: u8,
    pub conversion: u8,
    /// Whole currency units lost per month to the detected issues.
    pub estimated_monthly_loss: u64,
    pub performance_findings: Vec<String>,
    pub conversion_findings: Vec<String>,
}

impl AuditScores {
    /// Builds scores, clamping both sub-scores into 0..=100.
    pub fn new(performance: u8, conversion: u8, estimated_monthly_loss: u64) -> Self {
        Self {
            performance: performance.min(100),
            conversion: conversion.min(100),
            estimated_monthly_loss,
            performance_findings: Vec::new(),
            conversion_findings: Vec::new(),
        }
    }

    pub fn with_findings(mut self, performance: Vec<String>, conversion: Vec<String>) -> Self {
        self.performance_findings = performance;
        self.conversion_findings = conversion;
        self
    }

    /// Rounded mean of the two sub-scores.
    pub fn overall(&self) -> u8 {
        let sum = u16::from(self.performance.min(100)) + u16::from(self.conversion.min(100));
        ((sum + 1) / 2) as u8
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryScore {
    pub score: u8,
    #[serde(default)]
    pub findings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueImpact {
    pub estimated_monthly_loss: u64,
}

/// A finished audit.
///
/// # Invariants
///
/// - `id` is generated at creation and globally unique
/// - `overall_score` and both sub-scores lie in 0..=100
/// - `overall_grade` is `Grade::from_score(overall_score)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditResult {
    pub id: AuditId,
    pub store_url: StoreUrl,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    pub audit_type: AuditType,
    pub overall_score: u8,
    pub overall_grade: Grade,
    pub performance_score: CategoryScore,
    pub conversion_score: CategoryScore,
    pub revenue_impact: RevenueImpact,
    pub status: AuditStatus,
    pub created_at: Timestamp,
}

impl AuditResult {
    /// Creates a completed result for the given request.
    pub fn completed(request: &AuditRequest, scores: AuditScores, created_at: Timestamp) -> Self {
        let overall = scores.overall();
        Self {
            id: AuditId::new(),
            store_url: request.store_url().clone(),
            user_id: request.user_id().cloned(),
            audit_type: request.audit_type(),
            overall_score: overall,
            overall_grade: Grade::from_score(overall),
            performance_score: CategoryScore {
                score: scores.performance,
                findings: scores.performance_findings,
            },
            conversion_score: CategoryScore {
                score: scores.conversion,
                findings: scores.conversion_findings,
            },
            revenue_impact: RevenueImpact {
                estimated_monthly_loss: scores.estimated_monthly_loss,
            },
            status: AuditStatus::Completed,
            created_at,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.user_id.is_none()
    }
}
