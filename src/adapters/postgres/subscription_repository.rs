//! PostgreSQL implementation of SubscriptionRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::billing::{PlanKey, Subscription, SubscriptionStatus};
use crate::domain::foundation::{DomainError, ErrorCode, SubscriptionId, Timestamp, UserId};
use crate::ports::SubscriptionRepository;

use super::{corrupt, db_error, parse_user_id};

const SELECT_COLUMNS: &str = r#"
    SELECT id, user_id, plan_key, plan_name, status,
           provider_order_id, provider_subscription_id,
           current_start, current_end, audits_per_month, audits_used_this_period,
           cancel_at_period_end, cancelled_at, created_at, updated_at
    FROM subscriptions
"#;

pub struct PostgresSubscriptionRepository {
    pool: PgPool,
}

impl PostgresSubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_one_where(
        &self,
        clause: &str,
        value: &str,
    ) -> Result<Option<Subscription>, DomainError> {
        let sql = format!("{} WHERE {} ORDER BY created_at DESC LIMIT 1", SELECT_COLUMNS, clause);
        let row: Option<SubscriptionRow> = sqlx::query_as(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("load subscription", e))?;

        row.map(Subscription::try_from).transpose()
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    id: Uuid,
    user_id: String,
    plan_key: String,
    plan_name: String,
    status: String,
    provider_order_id: Option<String>,
    provider_subscription_id: Option<String>,
    current_start: DateTime<Utc>,
    current_end: DateTime<Utc>,
    audits_per_month: i32,
    audits_used_this_period: i32,
    cancel_at_period_end: bool,
    cancelled_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = DomainError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        Ok(Subscription {
            id: SubscriptionId::from_uuid(row.id),
            user_id: parse_user_id(row.user_id)?,
            plan_key: PlanKey::new(row.plan_key).map_err(|e| corrupt("plan_key", e))?,
            plan_name: row.plan_name,
            status: row
                .status
                .parse::<SubscriptionStatus>()
                .map_err(|e| corrupt("status", e))?,
            provider_order_id: row.provider_order_id,
            provider_subscription_id: row.provider_subscription_id,
            current_start: Timestamp::from_datetime(row.current_start),
            current_end: Timestamp::from_datetime(row.current_end),
            audits_per_month: row.audits_per_month,
            audits_used_this_period: row.audits_used_this_period,
            cancel_at_period_end: row.cancel_at_period_end,
            cancelled_at: row.cancelled_at.map(Timestamp::from_datetime),
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

#[async_trait]
impl SubscriptionRepository for PostgresSubscriptionRepository {
    async fn insert(&self, subscription: &Subscription) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO subscriptions (
                id, user_id, plan_key, plan_name, status,
                provider_order_id, provider_subscription_id,
                current_start, current_end, audits_per_month, audits_used_this_period,
                cancel_at_period_end, cancelled_at, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(subscription.id.as_uuid())
        .bind(subscription.user_id.as_str())
        .bind(subscription.plan_key.as_str())
        .bind(&subscription.plan_name)
        .bind(subscription.status.as_str())
        .bind(&subscription.provider_order_id)
        .bind(&subscription.provider_subscription_id)
        .bind(subscription.current_start.as_datetime())
        .bind(subscription.current_end.as_datetime())
        .bind(subscription.audits_per_month)
        .bind(subscription.audits_used_this_period)
        .bind(subscription.cancel_at_period_end)
        .bind(subscription.cancelled_at.map(|t| *t.as_datetime()))
        .bind(subscription.created_at.as_datetime())
        .bind(subscription.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.constraint() == Some("subscriptions_one_active_per_user") {
                    return DomainError::new(
                        ErrorCode::InvalidStateTransition,
                        format!("User {} already has an active subscription", subscription.user_id),
                    );
                }
            }
            db_error("insert subscription", e)
        })?;

        Ok(())
    }

    async fn update(&self, subscription: &Subscription) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE subscriptions SET
                status = $2,
                provider_subscription_id = $3,
                current_start = $4,
                current_end = $5,
                audits_used_this_period = $6,
                cancel_at_period_end = $7,
                cancelled_at = $8,
                updated_at = $9
            WHERE id = $1
            "#,
        )
        .bind(subscription.id.as_uuid())
        .bind(subscription.status.as_str())
        .bind(&subscription.provider_subscription_id)
        .bind(subscription.current_start.as_datetime())
        .bind(subscription.current_end.as_datetime())
        .bind(subscription.audits_used_this_period)
        .bind(subscription.cancel_at_period_end)
        .bind(subscription.cancelled_at.map(|t| *t.as_datetime()))
        .bind(subscription.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("update subscription", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::SubscriptionNotFound,
                format!("Subscription not found: {}", subscription.id),
            ));
        }

        Ok(())
    }

    async fn find_current(&self, user_id: &UserId) -> Result<Option<Subscription>, DomainError> {
        self.fetch_one_where("user_id = $1", user_id.as_str()).await
    }

    async fn find_active(&self, user_id: &UserId) -> Result<Vec<Subscription>, DomainError> {
        let sql = format!(
            "{} WHERE user_id = $1 AND status = 'active' ORDER BY created_at DESC",
            SELECT_COLUMNS
        );
        let rows: Vec<SubscriptionRow> = sqlx::query_as(&sql)
            .bind(user_id.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("list active subscriptions", e))?;

        rows.into_iter().map(Subscription::try_from).collect()
    }

    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<Subscription>, DomainError> {
        self.fetch_one_where("provider_order_id = $1", order_id).await
    }

    async fn find_by_provider_subscription_id(
        &self,
        provider_subscription_id: &str,
    ) -> Result<Option<Subscription>, DomainError> {
        self.fetch_one_where("provider_subscription_id = $1", provider_subscription_id)
            .await
    }

    async fn increment_period_usage(&self, user_id: &UserId) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            UPDATE subscriptions
            SET audits_used_this_period = audits_used_this_period + 1
            WHERE user_id = $1 AND status = 'active'
            "#,
        )
        .bind(user_id.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("increment subscription usage", e))?;
        Ok(())
    }
}
