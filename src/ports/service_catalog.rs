//! Service catalog port (read side).
//!
//! The catalog is owned elsewhere; settlement only resolves services
//! by slug at checkout time.

use async_trait::async_trait;

use crate::domain::catalog::Service;
use crate::domain::foundation::{DomainError, ServiceId};

/// Read-only lookup into the service catalog.
#[async_trait]
pub trait ServiceCatalog: Send + Sync {
    /// Finds a service by its URL slug.
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Service>, DomainError>;

    /// Finds a service by id.
    async fn find_by_id(&self, id: &ServiceId) -> Result<Option<Service>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_catalog_is_object_safe() {
        fn _accepts_dyn(_catalog: &dyn ServiceCatalog) {}
    }
}
