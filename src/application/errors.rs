//! Settlement-specific error types.
//!
//! Errors surfaced by the ledger, the subscription manager, and the
//! orchestrator.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | InvalidAmount | 400 |
//! | InvalidGateway | 400 |
//! | UnsupportedCurrency | 400 |
//! | ServiceNotFound | 404 |
//! | ServiceInactive | 409 |
//! | PaymentNotFound | 404 |
//! | SubscriptionNotFound | 404 |
//! | UnknownCorrelationId | 404 |
//! | InvalidTransition | 409 |
//! | AlreadyCancelled | 409 |
//! | NotCancelled | 409 |
//! | TrialNotAvailable | 409 |
//! | NotOwner | 403 |
//! | InvalidCallback | 400 |
//! | ProviderDeclined | 402 |
//! | ProviderTransient | 502 |
//! | Validation | 400 |
//! | Infrastructure | 500 |

use crate::domain::foundation::{
    CorrelationId, DomainError, ErrorCode, PaymentId, SubscriptionId,
};
use crate::domain::payment::Gateway;
use crate::ports::{GatewayError, GatewayErrorCode};

/// Errors from settlement operations.
#[derive(Debug, Clone, PartialEq)]
pub enum SettlementError {
    /// Charge amount was not strictly positive, or the base price was
    /// not in the home currency.
    InvalidAmount(String),

    /// Gateway is unknown or has no registered adapter.
    InvalidGateway(String),

    /// Gateway/currency pairing has no configured rate.
    UnsupportedCurrency { gateway: Gateway, currency: String },

    /// No service with this slug.
    ServiceNotFound(String),

    /// Service exists but is not purchasable.
    ServiceInactive(String),

    /// No payment with this id.
    PaymentNotFound(PaymentId),

    /// No subscription with this id.
    SubscriptionNotFound(SubscriptionId),

    /// Confirmation arrived for a reference no pending payment carries.
    /// Either a forged callback or a data-integrity fault.
    UnknownCorrelationId(CorrelationId),

    /// Status edge not permitted by the payment state machine.
    InvalidTransition { message: String },

    /// Cancel requested on a subscription that is not active.
    AlreadyCancelled(SubscriptionId),

    /// Resume requested on a subscription that is not cancelled.
    NotCancelled(SubscriptionId),

    /// Trial requested for a service that offers none, or the pair is
    /// already subscribed.
    TrialNotAvailable { slug: String, reason: String },

    /// Requesting user does not own the resource.
    NotOwner { resource: String },

    /// Callback payload failed parsing or signature verification.
    InvalidCallback { gateway: Gateway, reason: String },

    /// Provider definitively declined the charge.
    ProviderDeclined { gateway: Gateway, reason: String },

    /// Transient provider fault; the payment stays pending and a later
    /// confirmation can still land.
    ProviderTransient { gateway: Gateway, reason: String },

    /// Request-shape validation failure.
    Validation { field: String, message: String },

    /// Infrastructure error.
    Infrastructure(String),
}

impl SettlementError {
    pub fn invalid_amount(message: impl Into<String>) -> Self {
        SettlementError::InvalidAmount(message.into())
    }

    pub fn invalid_gateway(gateway: impl Into<String>) -> Self {
        SettlementError::InvalidGateway(gateway.into())
    }

    pub fn service_not_found(slug: impl Into<String>) -> Self {
        SettlementError::ServiceNotFound(slug.into())
    }

    pub fn service_inactive(slug: impl Into<String>) -> Self {
        SettlementError::ServiceInactive(slug.into())
    }

    pub fn trial_not_available(slug: impl Into<String>, reason: impl Into<String>) -> Self {
        SettlementError::TrialNotAvailable {
            slug: slug.into(),
            reason: reason.into(),
        }
    }

    pub fn not_owner(resource: impl Into<String>) -> Self {
        SettlementError::NotOwner {
            resource: resource.into(),
        }
    }

    pub fn invalid_callback(gateway: Gateway, reason: impl Into<String>) -> Self {
        SettlementError::InvalidCallback {
            gateway,
            reason: reason.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        SettlementError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        SettlementError::Infrastructure(message.into())
    }

    /// Translates an adapter error, keeping the gateway for context.
    pub fn from_gateway(gateway: Gateway, err: GatewayError) -> Self {
        match err.code {
            GatewayErrorCode::Declined => SettlementError::ProviderDeclined {
                gateway,
                reason: err.message,
            },
            GatewayErrorCode::Protocol | GatewayErrorCode::Signature => {
                SettlementError::InvalidCallback {
                    gateway,
                    reason: err.message,
                }
            }
            GatewayErrorCode::Network
            | GatewayErrorCode::RateLimited
            | GatewayErrorCode::Provider => SettlementError::ProviderTransient {
                gateway,
                reason: err.message,
            },
        }
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            SettlementError::InvalidAmount(_) => ErrorCode::InvalidAmount,
            SettlementError::InvalidGateway(_) => ErrorCode::InvalidGateway,
            SettlementError::UnsupportedCurrency { .. } => ErrorCode::UnsupportedCurrency,
            SettlementError::ServiceNotFound(_) => ErrorCode::ServiceNotFound,
            SettlementError::ServiceInactive(_) => ErrorCode::ServiceInactive,
            SettlementError::PaymentNotFound(_) => ErrorCode::PaymentNotFound,
            SettlementError::SubscriptionNotFound(_) => ErrorCode::SubscriptionNotFound,
            SettlementError::UnknownCorrelationId(_) => ErrorCode::UnknownCorrelationId,
            SettlementError::InvalidTransition { .. } => ErrorCode::InvalidTransition,
            SettlementError::AlreadyCancelled(_) => ErrorCode::AlreadyCancelled,
            SettlementError::NotCancelled(_) => ErrorCode::NotCancelled,
            SettlementError::TrialNotAvailable { .. } => ErrorCode::TrialNotAvailable,
            SettlementError::NotOwner { .. } => ErrorCode::NotOwner,
            SettlementError::InvalidCallback { .. } => ErrorCode::InvalidCallback,
            SettlementError::ProviderDeclined { .. } => ErrorCode::ProviderDeclined,
            SettlementError::ProviderTransient { .. } => ErrorCode::ProviderTransient,
            SettlementError::Validation { .. } => ErrorCode::ValidationFailed,
            SettlementError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }

    /// Returns a user-facing error message.
    pub fn message(&self) -> String {
        match self {
            SettlementError::InvalidAmount(msg) => format!("Invalid amount: {}", msg),
            SettlementError::InvalidGateway(gateway) => {
                format!("Unknown or unavailable gateway: {}", gateway)
            }
            SettlementError::UnsupportedCurrency { gateway, currency } => {
                format!("Gateway {} does not settle {}", gateway, currency)
            }
            SettlementError::ServiceNotFound(slug) => format!("No service '{}'", slug),
            SettlementError::ServiceInactive(slug) => {
                format!("Service '{}' is not currently offered", slug)
            }
            SettlementError::PaymentNotFound(id) => format!("Payment not found: {}", id),
            SettlementError::SubscriptionNotFound(id) => {
                format!("Subscription not found: {}", id)
            }
            SettlementError::UnknownCorrelationId(id) => {
                format!("No pending payment for gateway reference '{}'", id)
            }
            SettlementError::InvalidTransition { message } => message.clone(),
            SettlementError::AlreadyCancelled(id) => {
                format!("Subscription {} is not active", id)
            }
            SettlementError::NotCancelled(id) => {
                format!("Subscription {} is not cancelled", id)
            }
            SettlementError::TrialNotAvailable { slug, reason } => {
                format!("No trial available for '{}': {}", slug, reason)
            }
            SettlementError::NotOwner { resource } => {
                format!("Requesting user does not own {}", resource)
            }
            SettlementError::InvalidCallback { gateway, reason } => {
                format!("Rejected {} callback: {}", gateway, reason)
            }
            SettlementError::ProviderDeclined { gateway, reason } => {
                format!("Payment declined by {}: {}", gateway, reason)
            }
            SettlementError::ProviderTransient { gateway, reason } => {
                format!("Gateway {} is temporarily unavailable: {}", gateway, reason)
            }
            SettlementError::Validation { field, message } => {
                format!("Validation failed for '{}': {}", field, message)
            }
            SettlementError::Infrastructure(msg) => format!("Error: {}", msg),
        }
    }

    /// True when retrying the same call later can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SettlementError::ProviderTransient { .. } | SettlementError::Infrastructure(_)
        )
    }
}

impl std::fmt::Display for SettlementError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for SettlementError {}

impl From<DomainError> for SettlementError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::InvalidAmount => SettlementError::InvalidAmount(err.message),
            ErrorCode::InvalidGateway => SettlementError::InvalidGateway(err.message),
            ErrorCode::UnsupportedCurrency => {
                let gateway = err
                    .details
                    .get("gateway")
                    .and_then(|g| g.parse::<Gateway>().ok());
                match (gateway, err.details.get("currency")) {
                    (Some(gateway), Some(currency)) => SettlementError::UnsupportedCurrency {
                        gateway,
                        currency: currency.clone(),
                    },
                    _ => SettlementError::Validation {
                        field: "currency".to_string(),
                        message: err.message,
                    },
                }
            }
            ErrorCode::InvalidTransition => SettlementError::InvalidTransition {
                message: err.message,
            },
            ErrorCode::AlreadyCancelled | ErrorCode::NotCancelled => {
                SettlementError::InvalidTransition {
                    message: err.message,
                }
            }
            ErrorCode::ValidationFailed => SettlementError::Validation {
                field: err
                    .details
                    .get("field")
                    .cloned()
                    .unwrap_or_else(|| "request".to_string()),
                message: err.message,
            },
            _ => SettlementError::Infrastructure(err.message),
        }
    }
}

impl From<SettlementError> for DomainError {
    fn from(err: SettlementError) -> Self {
        DomainError::new(err.code(), err.message())
    }
}
