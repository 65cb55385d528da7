//! In-memory implementation of ServiceCatalog.
//!
//! Seeded at construction; doubles as the catalog for tests and for
//! local runs without a database.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::catalog::Service;
use crate::domain::foundation::{DomainError, ServiceId};
use crate::ports::ServiceCatalog;

/// Immutable slug-keyed catalog.
pub struct MemoryServiceCatalog {
    by_slug: HashMap<String, Service>,
}

impl MemoryServiceCatalog {
    pub fn new(services: Vec<Service>) -> Self {
        Self {
            by_slug: services
                .into_iter()
                .map(|s| (s.slug.clone(), s))
                .collect(),
        }
    }
}

#[async_trait]
impl ServiceCatalog for MemoryServiceCatalog {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Service>, DomainError> {
        Ok(self.by_slug.get(slug).cloned())
    }

    async fn find_by_id(&self, id: &ServiceId) -> Result<Option<Service>, DomainError> {
        Ok(self.by_slug.values().find(|s| s.id == *id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::BillingKind;
    use crate::domain::foundation::{Currency, Money};
    use rust_decimal::Decimal;

    fn catalog() -> MemoryServiceCatalog {
        MemoryServiceCatalog::new(vec![Service {
            id: ServiceId::new(),
            slug: "ocr-runner".to_string(),
            name: "OCR Runner".to_string(),
            price: Money::new(Decimal::from(400_000), Currency::Pyg),
            trial_days: 7,
            billing: BillingKind::Recurring,
            active: true,
        }])
    }

    #[tokio::test]
    async fn finds_by_slug_and_id() {
        let catalog = catalog();
        let by_slug = catalog.find_by_slug("ocr-runner").await.unwrap().unwrap();
        let by_id = catalog.find_by_id(&by_slug.id).await.unwrap().unwrap();
        assert_eq!(by_slug, by_id);
    }

    #[tokio::test]
    async fn unknown_slug_is_none() {
        let catalog = catalog();
        assert!(catalog.find_by_slug("nope").await.unwrap().is_none());
    }
}
