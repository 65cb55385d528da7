//! Gateway adapter port for external payment providers.
//!
//! One implementation per provider. Adapters translate between the
//! provider's protocol and the engine's settlement types; they never
//! touch the payment or subscription repositories. Gateway-specific
//! quirks stay behind this boundary.
//!
//! # Design
//!
//! - **Two capabilities**: create an intent, parse a confirmation
//! - **No entity mutation**: adapters return data, the orchestrator
//!   drives state
//! - **Registry dispatch**: gateways resolve through a registered map,
//!   so adding a provider never touches the orchestrator

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{CorrelationId, Money};
use crate::domain::payment::{Gateway, Payment};

/// Port for payment gateway integrations.
#[async_trait]
pub trait GatewayAdapter: Send + Sync {
    /// The gateway this adapter speaks for.
    fn gateway(&self) -> Gateway;

    /// Registers a charge with the provider and returns what the
    /// caller must do next, plus the provider's reference for matching
    /// the eventual confirmation.
    async fn create_intent(&self, payment: &Payment) -> Result<GatewayIntent, GatewayError>;

    /// Parses an asynchronous confirmation payload into a settlement
    /// signal. `signature` carries the transport-level signature header
    /// for providers that sign their callbacks; the others ignore it.
    async fn confirm_callback(
        &self,
        payload: &[u8],
        signature: Option<&str>,
    ) -> Result<SettlementResult, GatewayError>;
}

/// A created payment intent: the gateway's reference plus the caller's
/// next step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayIntent {
    /// Provider-assigned reference for this charge.
    pub correlation_id: CorrelationId,

    /// What the paying user must do to complete the charge.
    pub instructions: CheckoutInstructions,
}

/// What the caller is told after initiating a payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CheckoutInstructions {
    /// Send the user to the provider's hosted payment page.
    Redirect { url: String },

    /// Transfer exactly `amount` to `wallet_address`, then submit the
    /// transaction reference for manual confirmation.
    CryptoTransfer {
        wallet_address: String,
        amount: Money,
    },
}

/// What a confirmation payload said about the charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementOutcome {
    /// Provider confirmed the money moved.
    Settled,

    /// Provider definitively declined the charge.
    Declined,

    /// Payload is authentic but carries no settlement decision
    /// (informational provider event). Acknowledge and do nothing.
    Ignored,
}

/// Parsed confirmation, ready for the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementResult {
    /// Reference matching the original intent.
    pub correlation_id: CorrelationId,

    /// Settled, declined, or informational.
    pub outcome: SettlementOutcome,

    /// The provider payload, verbatim, for audit and replay.
    pub metadata: serde_json::Value,
}

/// User-submitted proof of a direct crypto transfer.
///
/// This is the "callback payload" of the crypto gateway: there is no
/// provider push, so the platform user submits the transaction
/// reference themselves. A reference is not cryptographic proof of
/// payment; the adapter marks the settlement for reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CryptoProof {
    /// Payment the transfer pays for.
    pub payment_id: crate::domain::foundation::PaymentId,

    /// On-chain transaction reference, as submitted.
    pub tx_reference: String,
}

/// Errors from gateway operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayError {
    /// Error category.
    pub code: GatewayErrorCode,

    /// Human-readable message.
    pub message: String,

    /// Whether the operation can be retried.
    pub retryable: bool,
}

impl GatewayError {
    /// Create a new gateway error.
    pub fn new(code: GatewayErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            retryable: code.is_retryable(),
        }
    }

    /// Network-level failure reaching the provider.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::Network, message)
    }

    /// Provider definitively declined the charge.
    pub fn declined(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::Declined, message)
    }

    /// Payload did not match the provider's protocol.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::Protocol, message)
    }

    /// Callback signature or token failed verification.
    pub fn signature(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::Signature, message)
    }

    /// Provider returned an unexpected error response.
    pub fn provider(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::Provider, message)
    }
}

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for GatewayError {}

/// Gateway error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayErrorCode {
    /// Connectivity or timeout reaching the provider.
    Network,

    /// Provider rate-limited the call.
    RateLimited,

    /// Definitive decline; never retried.
    Declined,

    /// Malformed or unparseable payload.
    Protocol,

    /// Signature/token verification failed.
    Signature,

    /// Provider-side error response.
    Provider,
}

impl GatewayErrorCode {
    /// Check if this error type is typically retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GatewayErrorCode::Network | GatewayErrorCode::RateLimited)
    }
}

impl std::fmt::Display for GatewayErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            GatewayErrorCode::Network => "network",
            GatewayErrorCode::RateLimited => "rate_limited",
            GatewayErrorCode::Declined => "declined",
            GatewayErrorCode::Protocol => "protocol",
            GatewayErrorCode::Signature => "signature",
            GatewayErrorCode::Provider => "provider",
        };
        write!(f, "{}", s)
    }
}

/// Registered map from gateway to adapter.
///
/// The orchestrator resolves adapters here instead of branching on the
/// gateway enum, so new providers plug in without touching settlement
/// logic.
#[derive(Clone, Default)]
pub struct GatewayRegistry {
    adapters: HashMap<Gateway, Arc<dyn GatewayAdapter>>,
}

impl GatewayRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            adapters: HashMap::new(),
        }
    }

    /// Registers an adapter under its own gateway, replacing any
    /// previous registration.
    pub fn register(mut self, adapter: Arc<dyn GatewayAdapter>) -> Self {
        self.adapters.insert(adapter.gateway(), adapter);
        self
    }

    /// Looks up the adapter for a gateway.
    pub fn get(&self, gateway: Gateway) -> Option<&Arc<dyn GatewayAdapter>> {
        self.adapters.get(&gateway)
    }

    /// Gateways with a registered adapter.
    pub fn registered(&self) -> Vec<Gateway> {
        let mut gateways: Vec<Gateway> = self.adapters.keys().copied().collect();
        gateways.sort_by_key(|g| g.as_str());
        gateways
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_adapter_is_object_safe() {
        fn _accepts_dyn(_adapter: &dyn GatewayAdapter) {}
    }

    #[test]
    fn network_and_rate_limit_are_retryable() {
        assert!(GatewayErrorCode::Network.is_retryable());
        assert!(GatewayErrorCode::RateLimited.is_retryable());

        assert!(!GatewayErrorCode::Declined.is_retryable());
        assert!(!GatewayErrorCode::Signature.is_retryable());
        assert!(!GatewayErrorCode::Protocol.is_retryable());
    }

    #[test]
    fn error_display_includes_code_and_message() {
        let err = GatewayError::declined("insufficient funds");
        assert!(err.to_string().contains("declined"));
        assert!(err.to_string().contains("insufficient funds"));
    }

    #[test]
    fn empty_registry_resolves_nothing() {
        let registry = GatewayRegistry::new();
        assert!(registry.get(Gateway::Card).is_none());
        assert!(registry.registered().is_empty());
    }
}
