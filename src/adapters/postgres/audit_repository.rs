//! PostgreSQL implementation of AuditRepository.
//!
//! The full result is stored as JSONB; score, grade and status are copied
//! into columns for querying.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::domain::audit::AuditResult;
use crate::domain::foundation::{AuditId, DomainError, UserId};
use crate::ports::AuditRepository;

use super::db_error;

pub struct PostgresAuditRepository {
    pool: PgPool,
}

impl PostgresAuditRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditRepository for PostgresAuditRepository {
    async fn save(&self, result: &AuditResult) -> Result<(), DomainError> {
        let user_id = result
            .user_id
            .as_ref()
            .ok_or_else(|| DomainError::validation("userId", "Anonymous results are not stored"))?;

        sqlx::query(
            r#"
            INSERT INTO audits (
                id, user_id, store_url, overall_score, overall_grade,
                performance_score, conversion_score, estimated_monthly_loss,
                status, result, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(result.id.as_uuid())
        .bind(user_id.as_str())
        .bind(result.store_url.as_str())
        .bind(i16::from(result.overall_score))
        .bind(result.overall_grade.as_str())
        .bind(i16::from(result.performance_score.score))
        .bind(i16::from(result.conversion_score.score))
        .bind(i64::try_from(result.revenue_impact.estimated_monthly_loss).unwrap_or(i64::MAX))
        .bind(result.status.as_str())
        .bind(Json(result))
        .bind(result.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("save audit", e))?;

        Ok(())
    }

    async fn find_by_id(&self, id: &AuditId) -> Result<Option<AuditResult>, DomainError> {
        let row: Option<(Json<AuditResult>,)> =
            sqlx::query_as("SELECT result FROM audits WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_error("load audit", e))?;

        Ok(row.map(|(Json(result),)| result))
    }

    async fn list_for_user(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<AuditResult>, DomainError> {
        let rows: Vec<(Json<AuditResult>,)> = sqlx::query_as(
            r#"
            SELECT result FROM audits
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id.as_str())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("list audits", e))?;

        Ok(rows.into_iter().map(|(Json(result),)| result).collect())
    }
}
