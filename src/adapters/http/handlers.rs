//! HTTP handlers for the settlement API.
//!
//! Thin glue between axum and the orchestrator: parse, delegate, map
//! errors to the documented status codes. Webhook payloads are passed
//! through verbatim; the adapters own every byte of provider protocol.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use uuid::Uuid;

use crate::application::{SettlementError, SettlementOrchestrator};
use crate::domain::foundation::{Currency, PaymentId, SubscriptionId, UserId};
use crate::domain::payment::Gateway;

use super::dto::{
    status_for, CheckoutRequest, CheckoutResponse, ErrorResponse, SettlementAck,
    StartTrialRequest, SubscriptionResponse, VerifyCryptoRequest,
};

/// Shared application state.
#[derive(Clone)]
pub struct SettlementAppState {
    pub orchestrator: Arc<SettlementOrchestrator>,
}

/// Authenticated user context extracted from the request.
///
/// Identity is owned by the upstream auth layer, which injects the
/// user id header after verifying the session. The engine never sees
/// credentials.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
}

/// Rejection for requests without a verified user id.
pub struct AuthenticationRequired;

impl IntoResponse for AuthenticationRequired {
    fn into_response(self) -> Response {
        let error = ErrorResponse::new("AUTHENTICATION_REQUIRED", "Authentication is required");
        (StatusCode::UNAUTHORIZED, Json(error)).into_response()
    }
}

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AuthenticationRequired;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<Uuid>().ok())
            .ok_or(AuthenticationRequired)?;

        Ok(AuthenticatedUser {
            user_id: UserId::from_uuid(user_id),
        })
    }
}

/// Settlement errors as HTTP responses.
pub struct ApiError(SettlementError);

impl From<SettlementError> for ApiError {
    fn from(err: SettlementError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            tracing::error!(error = %self.0, "settlement request failed");
        }
        let body = ErrorResponse::new(self.0.code().to_string(), self.0.message());
        (status, Json(body)).into_response()
    }
}

// ════════════════════════════════════════════════════════════════════
// Payments
// ════════════════════════════════════════════════════════════════════

/// `POST /payments/checkout` — start a payment, returning a redirect
/// URL or wallet instructions.
pub async fn create_checkout(
    State(state): State<SettlementAppState>,
    user: AuthenticatedUser,
    Json(request): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>, ApiError> {
    let gateway: Gateway = request
        .gateway
        .parse()
        .map_err(|_| SettlementError::invalid_gateway(request.gateway.clone()))?;
    let currency: Currency = request
        .currency
        .parse()
        .map_err(|_| SettlementError::validation("currency", "unknown currency code"))?;

    let created = state
        .orchestrator
        .initiate(user.user_id, &request.service_slug, gateway, currency)
        .await?;

    Ok(Json(created.into()))
}

/// `POST /payments/{id}/verify-crypto` — submit a transfer reference
/// for a crypto payment.
pub async fn verify_crypto(
    State(state): State<SettlementAppState>,
    user: AuthenticatedUser,
    Path(payment_id): Path<Uuid>,
    Json(request): Json<VerifyCryptoRequest>,
) -> Result<Json<SettlementAck>, ApiError> {
    let outcome = state
        .orchestrator
        .verify_crypto(
            user.user_id,
            PaymentId::from_uuid(payment_id),
            &request.tx_reference,
        )
        .await?;

    Ok(Json(outcome.into()))
}

// ════════════════════════════════════════════════════════════════════
// Gateway callbacks (no user auth; adapters verify authenticity)
// ════════════════════════════════════════════════════════════════════

/// `POST /webhooks/stripe`
pub async fn stripe_webhook(
    State(state): State<SettlementAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<SettlementAck>, ApiError> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let outcome = state
        .orchestrator
        .resume(Gateway::Card, &body, signature.as_deref())
        .await?;
    Ok(Json(outcome.into()))
}

/// `POST /webhooks/pagopar`
pub async fn pagopar_webhook(
    State(state): State<SettlementAppState>,
    body: Bytes,
) -> Result<Json<SettlementAck>, ApiError> {
    let outcome = state.orchestrator.resume(Gateway::Pagopar, &body, None).await?;
    Ok(Json(outcome.into()))
}

/// `POST /webhooks/bancard`
pub async fn bancard_webhook(
    State(state): State<SettlementAppState>,
    body: Bytes,
) -> Result<Json<SettlementAck>, ApiError> {
    let outcome = state.orchestrator.resume(Gateway::Bancard, &body, None).await?;
    Ok(Json(outcome.into()))
}

// ════════════════════════════════════════════════════════════════════
// Subscriptions
// ════════════════════════════════════════════════════════════════════

/// `GET /subscriptions` — current user's subscriptions.
pub async fn list_subscriptions(
    State(state): State<SettlementAppState>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<SubscriptionResponse>>, ApiError> {
    let subscriptions = state
        .orchestrator
        .subscriptions()
        .list_for_user(&user.user_id)
        .await?;

    Ok(Json(subscriptions.into_iter().map(Into::into).collect()))
}

/// `POST /subscriptions/trial` — trial-only sign-up, no payment.
pub async fn start_trial(
    State(state): State<SettlementAppState>,
    user: AuthenticatedUser,
    Json(request): Json<StartTrialRequest>,
) -> Result<Json<SubscriptionResponse>, ApiError> {
    let subscription = state
        .orchestrator
        .subscriptions()
        .start_trial(user.user_id, &request.service_slug)
        .await?;

    Ok(Json(subscription.into()))
}

/// `POST /subscriptions/{id}/cancel`
pub async fn cancel_subscription(
    State(state): State<SettlementAppState>,
    user: AuthenticatedUser,
    Path(subscription_id): Path<Uuid>,
) -> Result<Json<SubscriptionResponse>, ApiError> {
    let subscription = state
        .orchestrator
        .subscriptions()
        .cancel(&SubscriptionId::from_uuid(subscription_id), &user.user_id)
        .await?;

    Ok(Json(subscription.into()))
}

/// `POST /subscriptions/{id}/resume`
pub async fn resume_subscription(
    State(state): State<SettlementAppState>,
    user: AuthenticatedUser,
    Path(subscription_id): Path<Uuid>,
) -> Result<Json<SubscriptionResponse>, ApiError> {
    let subscription = state
        .orchestrator
        .subscriptions()
        .resume(&SubscriptionId::from_uuid(subscription_id), &user.user_id)
        .await?;

    Ok(Json(subscription.into()))
}
