//! HTTP surface of the settlement engine (axum).

mod dto;
mod handlers;
mod routes;

pub use dto::{
    CheckoutAction, CheckoutRequest, CheckoutResponse, ErrorResponse, SettlementAck,
    StartTrialRequest, SubscriptionResponse, VerifyCryptoRequest,
};
pub use handlers::{ApiError, AuthenticatedUser, SettlementAppState};
pub use routes::{payment_routes, settlement_router, subscription_routes, webhook_routes};
