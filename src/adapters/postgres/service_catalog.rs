//! PostgreSQL implementation of ServiceCatalog (read side).

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::catalog::{BillingKind, Service};
use crate::domain::foundation::{Currency, DomainError, Money, ServiceId};
use crate::ports::ServiceCatalog;

/// sqlx-backed catalog reader.
pub struct PostgresServiceCatalog {
    pool: PgPool,
}

impl PostgresServiceCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a service.
#[derive(Debug, sqlx::FromRow)]
struct ServiceRow {
    id: Uuid,
    slug: String,
    name: String,
    price: Decimal,
    trial_days: i32,
    recurring: bool,
    active: bool,
}

impl TryFrom<ServiceRow> for Service {
    type Error = DomainError;

    fn try_from(row: ServiceRow) -> Result<Self, Self::Error> {
        Ok(Service {
            id: ServiceId::from_uuid(row.id),
            slug: row.slug,
            name: row.name,
            price: Money::new(row.price, Currency::Pyg),
            trial_days: row.trial_days.max(0) as u32,
            billing: if row.recurring {
                BillingKind::Recurring
            } else {
                BillingKind::OneTime
            },
            active: row.active,
        })
    }
}

#[async_trait]
impl ServiceCatalog for PostgresServiceCatalog {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Service>, DomainError> {
        let row: Option<ServiceRow> =
            sqlx::query_as(r#"SELECT * FROM services WHERE slug = $1"#)
                .bind(slug)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| DomainError::database(format!("select service: {}", e)))?;

        row.map(Service::try_from).transpose()
    }

    async fn find_by_id(&self, id: &ServiceId) -> Result<Option<Service>, DomainError> {
        let row: Option<ServiceRow> =
            sqlx::query_as(r#"SELECT * FROM services WHERE id = $1"#)
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| DomainError::database(format!("select service: {}", e)))?;

        row.map(Service::try_from).transpose()
    }
}
