//! PostgreSQL adapters (sqlx, runtime queries).

mod payment_repository;
mod service_catalog;
mod subscription_repository;

pub use payment_repository::PostgresPaymentRepository;
pub use service_catalog::PostgresServiceCatalog;
pub use subscription_repository::PostgresSubscriptionRepository;
