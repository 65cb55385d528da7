//! Request/response DTOs for the settlement API.

use serde::{Deserialize, Serialize};

use crate::application::{CheckoutCreated, ResumeOutcome, SettlementError};
use crate::domain::foundation::ErrorCode;
use crate::domain::subscription::Subscription;
use crate::ports::CheckoutInstructions;

/// Body of `POST /payments/checkout`.
#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub service_slug: String,
    pub gateway: String,
    pub currency: String,
}

/// Body of `POST /payments/{id}/verify-crypto`.
#[derive(Debug, Deserialize)]
pub struct VerifyCryptoRequest {
    pub tx_reference: String,
}

/// Body of `POST /subscriptions/trial`.
#[derive(Debug, Deserialize)]
pub struct StartTrialRequest {
    pub service_slug: String,
}

/// Result of a started checkout: the payment id (needed for crypto
/// proof submission) plus the next step.
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub payment_id: String,
    #[serde(flatten)]
    pub action: CheckoutAction,
}

/// What the caller does next to complete the charge.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CheckoutAction {
    Redirect {
        url: String,
    },
    CryptoTransfer {
        wallet_address: String,
        amount: String,
        currency: String,
    },
}

impl From<CheckoutCreated> for CheckoutResponse {
    fn from(created: CheckoutCreated) -> Self {
        let action = match created.instructions {
            CheckoutInstructions::Redirect { url } => CheckoutAction::Redirect { url },
            CheckoutInstructions::CryptoTransfer {
                wallet_address,
                amount,
            } => CheckoutAction::CryptoTransfer {
                wallet_address,
                amount: amount.amount().to_string(),
                currency: amount.currency().code().to_string(),
            },
        };
        Self {
            payment_id: created.payment_id.to_string(),
            action,
        }
    }
}

/// Acknowledgement returned to gateway callbacks and proof submissions.
#[derive(Debug, Serialize)]
pub struct SettlementAck {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<String>,
}

impl From<ResumeOutcome> for SettlementAck {
    fn from(outcome: ResumeOutcome) -> Self {
        match outcome {
            ResumeOutcome::Completed {
                payment,
                subscription,
            } => SettlementAck {
                status: "completed",
                payment_id: Some(payment.id.to_string()),
                subscription_id: Some(subscription.id.to_string()),
            },
            ResumeOutcome::AlreadyProcessed { payment } => SettlementAck {
                status: "already_processed",
                payment_id: Some(payment.id.to_string()),
                subscription_id: payment.subscription_id.map(|s| s.to_string()),
            },
            ResumeOutcome::Failed { payment } => SettlementAck {
                status: "failed",
                payment_id: Some(payment.id.to_string()),
                subscription_id: None,
            },
            ResumeOutcome::Ignored => SettlementAck {
                status: "ignored",
                payment_id: None,
                subscription_id: None,
            },
        }
    }
}

/// Subscription as returned by the API.
#[derive(Debug, Serialize)]
pub struct SubscriptionResponse {
    pub id: String,
    pub service_id: String,
    pub status: String,
    pub started_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trial_ends_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_billing_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<String>,
}

impl From<Subscription> for SubscriptionResponse {
    fn from(sub: Subscription) -> Self {
        Self {
            id: sub.id.to_string(),
            service_id: sub.service_id.to_string(),
            status: sub.status.as_str().to_string(),
            started_at: sub.started_at.to_string(),
            trial_ends_at: sub.trial_ends_at.map(|t| t.to_string()),
            next_billing_at: sub.next_billing_at.map(|t| t.to_string()),
            ended_at: sub.ended_at.map(|t| t.to_string()),
        }
    }
}

/// Error envelope: machine-readable code plus a human message.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}

/// HTTP status for each settlement error category.
pub fn status_for(error: &SettlementError) -> axum::http::StatusCode {
    use axum::http::StatusCode;

    match error.code() {
        ErrorCode::ValidationFailed
        | ErrorCode::InvalidAmount
        | ErrorCode::InvalidGateway
        | ErrorCode::UnsupportedCurrency
        | ErrorCode::InvalidCallback => StatusCode::BAD_REQUEST,
        ErrorCode::ServiceNotFound
        | ErrorCode::PaymentNotFound
        | ErrorCode::SubscriptionNotFound
        | ErrorCode::UnknownCorrelationId => StatusCode::NOT_FOUND,
        ErrorCode::ServiceInactive
        | ErrorCode::InvalidTransition
        | ErrorCode::AlreadyCancelled
        | ErrorCode::NotCancelled
        | ErrorCode::TrialNotAvailable => StatusCode::CONFLICT,
        ErrorCode::NotOwner => StatusCode::FORBIDDEN,
        ErrorCode::ProviderDeclined => StatusCode::PAYMENT_REQUIRED,
        ErrorCode::ProviderTransient => StatusCode::BAD_GATEWAY,
        ErrorCode::DatabaseError | ErrorCode::InternalError => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn ownership_violations_are_forbidden_not_server_errors() {
        let err = SettlementError::not_owner("subscription x");
        assert_eq!(status_for(&err), StatusCode::FORBIDDEN);
    }

    #[test]
    fn transition_violations_are_conflicts() {
        let err = SettlementError::InvalidTransition {
            message: "completed payments cannot fail".to_string(),
        };
        assert_eq!(status_for(&err), StatusCode::CONFLICT);
    }

    #[test]
    fn transient_provider_faults_are_bad_gateway() {
        let err = SettlementError::ProviderTransient {
            gateway: crate::domain::payment::Gateway::Card,
            reason: "timeout".to_string(),
        };
        assert_eq!(status_for(&err), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn validation_failures_are_bad_requests() {
        let err = SettlementError::validation("gateway", "unknown gateway");
        assert_eq!(status_for(&err), StatusCode::BAD_REQUEST);
    }
}
