//! Ports (interfaces) for external dependencies.
//!
//! Each port is an async trait implemented by one or more adapters.
//! Application code depends on these traits only.

mod gateway_adapter;
mod payment_repository;
mod service_catalog;
mod subscription_repository;

pub use gateway_adapter::{
    CheckoutInstructions, CryptoProof, GatewayAdapter, GatewayError, GatewayErrorCode,
    GatewayIntent, GatewayRegistry, SettlementOutcome, SettlementResult,
};
pub use payment_repository::{CompletionOutcome, FailureOutcome, PaymentRepository};
pub use service_catalog::ServiceCatalog;
pub use subscription_repository::{InsertOutcome, SubscriptionRepository};
