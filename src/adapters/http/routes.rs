//! Axum router for the settlement API.
//!
//! # Routes
//!
//! ## User endpoints (require the authenticated user header)
//! - `POST /payments/checkout` - Start a payment
//! - `POST /payments/:id/verify-crypto` - Submit crypto transfer proof
//! - `GET  /subscriptions` - List own subscriptions
//! - `POST /subscriptions/trial` - Trial-only sign-up
//! - `POST /subscriptions/:id/cancel` - Cancel own subscription
//! - `POST /subscriptions/:id/resume` - Resume own subscription
//!
//! ## Gateway callbacks (no user auth; authenticity checked per provider)
//! - `POST /webhooks/stripe`
//! - `POST /webhooks/pagopar`
//! - `POST /webhooks/bancard`

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    bancard_webhook, cancel_subscription, create_checkout, list_subscriptions, pagopar_webhook,
    resume_subscription, start_trial, stripe_webhook, verify_crypto, SettlementAppState,
};

/// User-facing payment routes.
pub fn payment_routes() -> Router<SettlementAppState> {
    Router::new()
        .route("/checkout", post(create_checkout))
        .route("/:id/verify-crypto", post(verify_crypto))
}

/// User-facing subscription routes.
pub fn subscription_routes() -> Router<SettlementAppState> {
    Router::new()
        .route("/", get(list_subscriptions))
        .route("/trial", post(start_trial))
        .route("/:id/cancel", post(cancel_subscription))
        .route("/:id/resume", post(resume_subscription))
}

/// Gateway confirmation routes, separate because they carry no user
/// authentication; each adapter verifies its provider's authenticity
/// scheme instead.
pub fn webhook_routes() -> Router<SettlementAppState> {
    Router::new()
        .route("/stripe", post(stripe_webhook))
        .route("/pagopar", post(pagopar_webhook))
        .route("/bancard", post(bancard_webhook))
}

/// Complete settlement API, suitable for mounting at `/api`.
pub fn settlement_router() -> Router<SettlementAppState> {
    Router::new()
        .nest("/payments", payment_routes())
        .nest("/subscriptions", subscription_routes())
        .nest("/webhooks", webhook_routes())
}
