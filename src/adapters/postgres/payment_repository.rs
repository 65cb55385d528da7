//! PostgreSQL implementation of PaymentRepository.
//!
//! The completion and failure paths are single guarded UPDATEs:
//! `WHERE correlation_id = $1 AND status = 'pending'`. Whichever
//! concurrent confirmation lands first performs the transition; the
//! others fall through to a SELECT and observe the final row. The
//! unique index on `correlation_id` keeps references one-to-one.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{
    CorrelationId, Currency, DomainError, ErrorCode, Money, PaymentId, ServiceId, SubscriptionId,
    Timestamp, UserId,
};
use crate::domain::payment::{Gateway, Payment, PaymentStatus};
use crate::ports::{CompletionOutcome, FailureOutcome, PaymentRepository};

/// sqlx-backed payment store.
pub struct PostgresPaymentRepository {
    pool: PgPool,
}

impl PostgresPaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a payment.
#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: Uuid,
    user_id: Uuid,
    service_id: Uuid,
    subscription_id: Option<Uuid>,
    gateway: String,
    correlation_id: Option<String>,
    amount: Decimal,
    currency: String,
    status: String,
    provider_metadata: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = DomainError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        let gateway: Gateway = row
            .gateway
            .parse()
            .map_err(|e| DomainError::database(format!("bad gateway column: {}", e)))?;
        let currency: Currency = row
            .currency
            .parse()
            .map_err(|e| DomainError::database(format!("bad currency column: {}", e)))?;
        let status = parse_status(&row.status)?;
        let correlation_id = row
            .correlation_id
            .map(CorrelationId::new)
            .transpose()
            .map_err(|e| DomainError::database(format!("bad correlation column: {}", e)))?;

        Ok(Payment {
            id: PaymentId::from_uuid(row.id),
            user_id: UserId::from_uuid(row.user_id),
            service_id: ServiceId::from_uuid(row.service_id),
            subscription_id: row.subscription_id.map(SubscriptionId::from_uuid),
            gateway,
            correlation_id,
            amount: Money::new(row.amount, currency),
            status,
            provider_metadata: row.provider_metadata,
            created_at: Timestamp::from_datetime(row.created_at),
            completed_at: row.completed_at.map(Timestamp::from_datetime),
        })
    }
}

fn parse_status(s: &str) -> Result<PaymentStatus, DomainError> {
    match s {
        "pending" => Ok(PaymentStatus::Pending),
        "completed" => Ok(PaymentStatus::Completed),
        "failed" => Ok(PaymentStatus::Failed),
        "refunded" => Ok(PaymentStatus::Refunded),
        other => Err(DomainError::database(format!(
            "bad payment status column: {}",
            other
        ))),
    }
}

#[async_trait]
impl PaymentRepository for PostgresPaymentRepository {
    async fn save(&self, payment: &Payment) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO payments (
                id, user_id, service_id, subscription_id, gateway, correlation_id,
                amount, currency, status, provider_metadata, created_at, completed_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(payment.id.as_uuid())
        .bind(payment.user_id.as_uuid())
        .bind(payment.service_id.as_uuid())
        .bind(payment.subscription_id.as_ref().map(|s| *s.as_uuid()))
        .bind(payment.gateway.as_str())
        .bind(payment.correlation_id.as_ref().map(|c| c.as_str()))
        .bind(payment.amount.amount())
        .bind(payment.amount.currency().code())
        .bind(payment.status.as_str())
        .bind(payment.provider_metadata.clone())
        .bind(payment.created_at.as_datetime())
        .bind(payment.completed_at.as_ref().map(|t| *t.as_datetime()))
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("insert payment: {}", e)))?;

        Ok(())
    }

    async fn update(&self, payment: &Payment) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE payments SET
                subscription_id = $2,
                correlation_id = $3,
                status = $4,
                provider_metadata = $5,
                completed_at = $6
            WHERE id = $1
            "#,
        )
        .bind(payment.id.as_uuid())
        .bind(payment.subscription_id.as_ref().map(|s| *s.as_uuid()))
        .bind(payment.correlation_id.as_ref().map(|c| c.as_str()))
        .bind(payment.status.as_str())
        .bind(payment.provider_metadata.clone())
        .bind(payment.completed_at.as_ref().map(|t| *t.as_datetime()))
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("update payment: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::PaymentNotFound,
                format!("payment {} does not exist", payment.id),
            ));
        }
        Ok(())
    }

    async fn find_by_id(&self, id: &PaymentId) -> Result<Option<Payment>, DomainError> {
        let row: Option<PaymentRow> =
            sqlx::query_as(r#"SELECT * FROM payments WHERE id = $1"#)
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| DomainError::database(format!("select payment: {}", e)))?;

        row.map(Payment::try_from).transpose()
    }

    async fn find_by_correlation_id(
        &self,
        correlation_id: &CorrelationId,
    ) -> Result<Option<Payment>, DomainError> {
        let row: Option<PaymentRow> =
            sqlx::query_as(r#"SELECT * FROM payments WHERE correlation_id = $1"#)
                .bind(correlation_id.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| DomainError::database(format!("select payment: {}", e)))?;

        row.map(Payment::try_from).transpose()
    }

    async fn complete(
        &self,
        correlation_id: &CorrelationId,
        metadata: serde_json::Value,
    ) -> Result<CompletionOutcome, DomainError> {
        // Guarded UPDATE: only the first confirmation flips the row.
        let updated: Option<PaymentRow> = sqlx::query_as(
            r#"
            UPDATE payments
            SET status = 'completed', provider_metadata = $2, completed_at = now()
            WHERE correlation_id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(correlation_id.as_str())
        .bind(metadata)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("complete payment: {}", e)))?;

        if let Some(row) = updated {
            return Ok(CompletionOutcome::Completed(row.try_into()?));
        }

        // Lost the race or the reference is unknown; look at the row.
        match self.find_by_correlation_id(correlation_id).await? {
            Some(payment) if payment.status == PaymentStatus::Completed => {
                Ok(CompletionOutcome::AlreadyCompleted(payment))
            }
            Some(payment) => Err(DomainError::new(
                ErrorCode::InvalidTransition,
                format!("cannot complete payment in status {:?}", payment.status),
            )),
            None => Err(DomainError::new(
                ErrorCode::UnknownCorrelationId,
                format!("no payment for correlation id {}", correlation_id),
            )),
        }
    }

    async fn fail(
        &self,
        correlation_id: &CorrelationId,
        metadata: serde_json::Value,
    ) -> Result<FailureOutcome, DomainError> {
        let updated: Option<PaymentRow> = sqlx::query_as(
            r#"
            UPDATE payments
            SET status = 'failed', provider_metadata = $2
            WHERE correlation_id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(correlation_id.as_str())
        .bind(metadata)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("fail payment: {}", e)))?;

        if let Some(row) = updated {
            return Ok(FailureOutcome::Failed(row.try_into()?));
        }

        match self.find_by_correlation_id(correlation_id).await? {
            Some(payment) => Ok(FailureOutcome::AlreadyFinal(payment)),
            None => Err(DomainError::new(
                ErrorCode::UnknownCorrelationId,
                format!("no payment for correlation id {}", correlation_id),
            )),
        }
    }
}
