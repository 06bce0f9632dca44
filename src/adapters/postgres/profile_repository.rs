//! PostgreSQL implementation of ProfileRepository.
//!
//! Quota reservation is one conditional `UPDATE ... WHERE audits_used <
//! audits_limit`, so the row lock taken by Postgres serializes concurrent
//! requests for the same identity. Subscription transitions are single
//! `UPDATE`s naming only the columns they own; none of them writes a value
//! of `audits_used` read earlier.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::billing::{
    Plan, Profile, ProfileStatus, QuotaDecision, FREE_AUDITS_LIMIT, FREE_TIER,
};
use crate::domain::foundation::{DomainError, Timestamp, UserId};
use crate::ports::ProfileRepository;

use super::{corrupt, db_error, parse_user_id};

pub struct PostgresProfileRepository {
    pool: PgPool,
}

impl PostgresProfileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert_free_if_missing(&self, user_id: &UserId, now: Timestamp) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO profiles (user_id, updated_at)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(user_id.as_str())
        .bind(now.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("create profile", e))?;
        Ok(())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProfileRow {
    user_id: String,
    subscription_tier: String,
    subscription_status: String,
    audits_used: i32,
    audits_limit: i32,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProfileRow> for Profile {
    type Error = DomainError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        Ok(Profile {
            user_id: parse_user_id(row.user_id)?,
            subscription_tier: row.subscription_tier,
            subscription_status: row
                .subscription_status
                .parse::<ProfileStatus>()
                .map_err(|e| corrupt("subscription_status", e))?,
            audits_used: row.audits_used,
            audits_limit: row.audits_limit,
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

#[async_trait]
impl ProfileRepository for PostgresProfileRepository {
    async fn find(&self, user_id: &UserId) -> Result<Option<Profile>, DomainError> {
        let row: Option<ProfileRow> = sqlx::query_as(
            r#"
            SELECT user_id, subscription_tier, subscription_status,
                   audits_used, audits_limit, updated_at
            FROM profiles
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("load profile", e))?;

        row.map(Profile::try_from).transpose()
    }

    async fn ensure(&self, user_id: &UserId, now: Timestamp) -> Result<Profile, DomainError> {
        self.insert_free_if_missing(user_id, now).await?;
        self.find(user_id).await?.ok_or_else(|| {
            DomainError::database(format!("Profile for {} vanished after insert", user_id))
        })
    }

    async fn try_reserve_audit(
        &self,
        user_id: &UserId,
        now: Timestamp,
    ) -> Result<QuotaDecision, DomainError> {
        self.insert_free_if_missing(user_id, now).await?;

        let reserved: Option<(i32, i32)> = sqlx::query_as(
            r#"
            UPDATE profiles
            SET audits_used = audits_used + 1, updated_at = $2
            WHERE user_id = $1 AND audits_used < audits_limit
            RETURNING audits_used, audits_limit
            "#,
        )
        .bind(user_id.as_str())
        .bind(now.as_datetime())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("reserve audit", e))?;

        if let Some((used, limit)) = reserved {
            return Ok(QuotaDecision::Granted { used, limit });
        }

        let (used, limit): (i32, i32) =
            sqlx::query_as("SELECT audits_used, audits_limit FROM profiles WHERE user_id = $1")
                .bind(user_id.as_str())
                .fetch_one(&self.pool)
                .await
                .map_err(|e| db_error("read quota", e))?;

        Ok(QuotaDecision::Exhausted { used, limit })
    }

    async fn release_audit(&self, user_id: &UserId, now: Timestamp) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            UPDATE profiles
            SET audits_used = GREATEST(audits_used - 1, 0), updated_at = $2
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_str())
        .bind(now.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("release audit", e))?;
        Ok(())
    }

    async fn activate_plan(
        &self,
        user_id: &UserId,
        plan: &Plan,
        now: Timestamp,
    ) -> Result<(), DomainError> {
        self.insert_free_if_missing(user_id, now).await?;

        sqlx::query(
            r#"
            UPDATE profiles
            SET subscription_tier = $2,
                subscription_status = $3,
                audits_used = 0,
                audits_limit = $4,
                updated_at = $5
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_str())
        .bind(plan.key.as_str())
        .bind(ProfileStatus::Active.as_str())
        .bind(plan.audits_per_month)
        .bind(now.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("activate plan", e))?;
        Ok(())
    }

    async fn set_status(
        &self,
        user_id: &UserId,
        status: ProfileStatus,
        now: Timestamp,
    ) -> Result<(), DomainError> {
        self.insert_free_if_missing(user_id, now).await?;

        sqlx::query(
            r#"
            UPDATE profiles
            SET subscription_status = $2, updated_at = $3
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_str())
        .bind(status.as_str())
        .bind(now.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("update profile status", e))?;
        Ok(())
    }

    async fn revert_to_free(&self, user_id: &UserId, now: Timestamp) -> Result<(), DomainError> {
        self.insert_free_if_missing(user_id, now).await?;

        sqlx::query(
            r#"
            UPDATE profiles
            SET subscription_tier = $2,
                subscription_status = $3,
                audits_limit = $4,
                updated_at = $5
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_str())
        .bind(FREE_TIER)
        .bind(ProfileStatus::Cancelled.as_str())
        .bind(FREE_AUDITS_LIMIT)
        .bind(now.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("revert profile to free", e))?;
        Ok(())
    }

    async fn save(&self, profile: &Profile) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO profiles (
                user_id, subscription_tier, subscription_status,
                audits_used, audits_limit, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_id) DO UPDATE SET
                subscription_tier = EXCLUDED.subscription_tier,
                subscription_status = EXCLUDED.subscription_status,
                audits_used = EXCLUDED.audits_used,
                audits_limit = EXCLUDED.audits_limit,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(profile.user_id.as_str())
        .bind(&profile.subscription_tier)
        .bind(profile.subscription_status.as_str())
        .bind(profile.audits_used)
        .bind(profile.audits_limit)
        .bind(profile.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("save profile", e))?;
        Ok(())
    }
}
