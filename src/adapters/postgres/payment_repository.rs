//! PostgreSQL implementation of PaymentRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::billing::{Payment, PaymentStatus, PlanKey};
use crate::domain::foundation::{DomainError, ErrorCode, PaymentId, Timestamp};
use crate::ports::PaymentRepository;

use super::{corrupt, db_error, parse_user_id};

pub struct PostgresPaymentRepository {
    pool: PgPool,
}

impl PostgresPaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: Uuid,
    user_id: String,
    plan_key: String,
    provider_order_id: String,
    provider_payment_id: Option<String>,
    amount: i64,
    currency: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = DomainError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        Ok(Payment {
            id: PaymentId::from_uuid(row.id),
            user_id: parse_user_id(row.user_id)?,
            plan_key: PlanKey::new(row.plan_key).map_err(|e| corrupt("plan_key", e))?,
            provider_order_id: row.provider_order_id,
            provider_payment_id: row.provider_payment_id,
            amount: row.amount,
            currency: row.currency,
            status: row
                .status
                .parse::<PaymentStatus>()
                .map_err(|e| corrupt("status", e))?,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

#[async_trait]
impl PaymentRepository for PostgresPaymentRepository {
    async fn insert(&self, payment: &Payment) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO payments (
                id, user_id, plan_key, provider_order_id, provider_payment_id,
                amount, currency, status, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(payment.id.as_uuid())
        .bind(payment.user_id.as_str())
        .bind(payment.plan_key.as_str())
        .bind(&payment.provider_order_id)
        .bind(&payment.provider_payment_id)
        .bind(payment.amount)
        .bind(&payment.currency)
        .bind(payment.status.as_str())
        .bind(payment.created_at.as_datetime())
        .bind(payment.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.is_unique_violation() {
                    return DomainError::new(
                        ErrorCode::ValidationFailed,
                        format!("Payment already recorded for order {}", payment.provider_order_id),
                    );
                }
            }
            db_error("insert payment", e)
        })?;

        Ok(())
    }

    async fn update(&self, payment: &Payment) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE payments SET
                provider_payment_id = $2,
                status = $3,
                updated_at = $4
            WHERE provider_order_id = $1
            "#,
        )
        .bind(&payment.provider_order_id)
        .bind(&payment.provider_payment_id)
        .bind(payment.status.as_str())
        .bind(payment.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("update payment", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::PaymentNotFound,
                format!("Payment not found for order {}", payment.provider_order_id),
            ));
        }

        Ok(())
    }

    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<Payment>, DomainError> {
        let row: Option<PaymentRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, plan_key, provider_order_id, provider_payment_id,
                   amount, currency, status, created_at, updated_at
            FROM payments
            WHERE provider_order_id = $1
            "#,
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("load payment", e))?;

        row.map(Payment::try_from).transpose()
    }
}
