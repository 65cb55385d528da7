//! PostgreSQL implementation of SubscriptionRepository.
//!
//! The single-active-per-(user, service) invariant rides the partial
//! unique index `ux_subscriptions_active_pair`. `insert_active` uses
//! `ON CONFLICT DO NOTHING` against it, so racing activations collapse
//! to one row without advisory locks.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{
    DomainError, ErrorCode, PaymentId, ServiceId, SubscriptionId, Timestamp, UserId,
};
use crate::domain::subscription::{Subscription, SubscriptionStatus};
use crate::ports::{InsertOutcome, SubscriptionRepository};

/// sqlx-backed subscription store.
pub struct PostgresSubscriptionRepository {
    pool: PgPool,
}

impl PostgresSubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a subscription.
#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    id: Uuid,
    user_id: Uuid,
    service_id: Uuid,
    payment_id: Option<Uuid>,
    status: String,
    started_at: DateTime<Utc>,
    trial_ends_at: Option<DateTime<Utc>>,
    next_billing_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = DomainError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        let status = match row.status.as_str() {
            "active" => SubscriptionStatus::Active,
            "cancelled" => SubscriptionStatus::Cancelled,
            other => {
                return Err(DomainError::database(format!(
                    "bad subscription status column: {}",
                    other
                )))
            }
        };

        Ok(Subscription {
            id: SubscriptionId::from_uuid(row.id),
            user_id: UserId::from_uuid(row.user_id),
            service_id: ServiceId::from_uuid(row.service_id),
            payment_id: row.payment_id.map(PaymentId::from_uuid),
            status,
            started_at: Timestamp::from_datetime(row.started_at),
            trial_ends_at: row.trial_ends_at.map(Timestamp::from_datetime),
            next_billing_at: row.next_billing_at.map(Timestamp::from_datetime),
            ended_at: row.ended_at.map(Timestamp::from_datetime),
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

#[async_trait]
impl SubscriptionRepository for PostgresSubscriptionRepository {
    async fn insert_active(
        &self,
        subscription: &Subscription,
    ) -> Result<InsertOutcome, DomainError> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO subscriptions (
                id, user_id, service_id, payment_id, status, started_at,
                trial_ends_at, next_billing_at, ended_at, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (user_id, service_id) WHERE status = 'active' DO NOTHING
            "#,
        )
        .bind(subscription.id.as_uuid())
        .bind(subscription.user_id.as_uuid())
        .bind(subscription.service_id.as_uuid())
        .bind(subscription.payment_id.as_ref().map(|p| *p.as_uuid()))
        .bind(subscription.status.as_str())
        .bind(subscription.started_at.as_datetime())
        .bind(subscription.trial_ends_at.as_ref().map(|t| *t.as_datetime()))
        .bind(subscription.next_billing_at.as_ref().map(|t| *t.as_datetime()))
        .bind(subscription.ended_at.as_ref().map(|t| *t.as_datetime()))
        .bind(subscription.created_at.as_datetime())
        .bind(subscription.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("insert subscription: {}", e)))?;

        if inserted.rows_affected() == 1 {
            return Ok(InsertOutcome::Inserted);
        }

        // Conflict: someone else holds the active slot for the pair.
        let existing = self
            .find_active(&subscription.user_id, &subscription.service_id)
            .await?
            .ok_or_else(|| {
                DomainError::database("active subscription vanished during insert race")
            })?;
        Ok(InsertOutcome::AlreadyActive(existing))
    }

    async fn update(&self, subscription: &Subscription) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE subscriptions SET
                status = $2,
                next_billing_at = $3,
                ended_at = $4,
                updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(subscription.id.as_uuid())
        .bind(subscription.status.as_str())
        .bind(subscription.next_billing_at.as_ref().map(|t| *t.as_datetime()))
        .bind(subscription.ended_at.as_ref().map(|t| *t.as_datetime()))
        .bind(subscription.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            // The partial unique index also guards reactivation.
            if e.as_database_error()
                .map(|db| db.is_unique_violation())
                .unwrap_or(false)
            {
                DomainError::new(
                    ErrorCode::InvalidTransition,
                    "another active subscription already exists for this user and service",
                )
            } else {
                DomainError::database(format!("update subscription: {}", e))
            }
        })?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::SubscriptionNotFound,
                format!("subscription {} does not exist", subscription.id),
            ));
        }
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: &SubscriptionId,
    ) -> Result<Option<Subscription>, DomainError> {
        let row: Option<SubscriptionRow> =
            sqlx::query_as(r#"SELECT * FROM subscriptions WHERE id = $1"#)
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| DomainError::database(format!("select subscription: {}", e)))?;

        row.map(Subscription::try_from).transpose()
    }

    async fn find_active(
        &self,
        user_id: &UserId,
        service_id: &ServiceId,
    ) -> Result<Option<Subscription>, DomainError> {
        let row: Option<SubscriptionRow> = sqlx::query_as(
            r#"
            SELECT * FROM subscriptions
            WHERE user_id = $1 AND service_id = $2 AND status = 'active'
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(service_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("select subscription: {}", e)))?;

        row.map(Subscription::try_from).transpose()
    }

    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Subscription>, DomainError> {
        let rows: Vec<SubscriptionRow> = sqlx::query_as(
            r#"
            SELECT * FROM subscriptions
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("select subscriptions: {}", e)))?;

        rows.into_iter().map(Subscription::try_from).collect()
    }
}
