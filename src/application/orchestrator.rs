//! Settlement orchestrator - the façade over the whole engine.
//!
//! Validates checkout requests, converts amounts, persists intents,
//! drives the chosen gateway adapter, and on confirmation moves the
//! ledger and the subscription manager in the right order. Adapters
//! are resolved through the registry; the orchestrator itself knows
//! nothing about any provider's protocol.
//!
//! # Idempotency
//!
//! `resume` may be invoked any number of times with the same payload.
//! The ledger's compare-and-set decides exactly one caller performs
//! the completion; everyone else observes `AlreadyProcessed` and skips
//! provisioning.

use std::sync::Arc;

use crate::application::errors::SettlementError;
use crate::application::ledger::{PaymentLedger, Settlement};
use crate::application::retry::RetryPolicy;
use crate::application::subscriptions::SubscriptionManager;
use crate::domain::foundation::{Currency, PaymentId, UserId};
use crate::domain::payment::{Gateway, Payment};
use crate::domain::pricing::RateConverter;
use crate::domain::subscription::Subscription;
use crate::ports::{
    CheckoutInstructions, CryptoProof, FailureOutcome, GatewayErrorCode, GatewayRegistry,
    ServiceCatalog, SettlementOutcome,
};

/// A started checkout: the recorded payment plus the caller's next
/// step, exactly as the adapter returned it.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutCreated {
    /// Payment recorded in `pending`.
    pub payment_id: PaymentId,

    /// The adapter's instructions, passed through unchanged.
    pub instructions: CheckoutInstructions,
}

/// What a confirmation delivery did.
#[derive(Debug, Clone, PartialEq)]
pub enum ResumeOutcome {
    /// Fresh settlement: the payment completed and access was
    /// provisioned by this call.
    Completed {
        payment: Payment,
        subscription: Subscription,
    },

    /// The payment was already in a final state; nothing changed.
    AlreadyProcessed { payment: Payment },

    /// Definitive decline: the payment is now failed.
    Failed { payment: Payment },

    /// Authentic payload with no settlement decision; acknowledged.
    Ignored,
}

/// Façade tying converter, ledger, adapters, and subscriptions
/// together.
pub struct SettlementOrchestrator {
    catalog: Arc<dyn ServiceCatalog>,
    converter: RateConverter,
    ledger: PaymentLedger,
    subscriptions: SubscriptionManager,
    gateways: GatewayRegistry,
    retry: RetryPolicy,
}

impl SettlementOrchestrator {
    pub fn new(
        catalog: Arc<dyn ServiceCatalog>,
        converter: RateConverter,
        ledger: PaymentLedger,
        subscriptions: SubscriptionManager,
        gateways: GatewayRegistry,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            catalog,
            converter,
            ledger,
            subscriptions,
            gateways,
            retry,
        }
    }

    /// Starts a checkout: resolves the service, converts the price,
    /// records the pending payment, and asks the gateway for the
    /// user's next step.
    ///
    /// Validation failures surface before any row or provider call is
    /// made. A transient provider fault after retries leaves the
    /// payment pending so a later confirmation can still land; a
    /// definitive decline fails it immediately.
    pub async fn initiate(
        &self,
        user_id: UserId,
        service_slug: &str,
        gateway: Gateway,
        currency: Currency,
    ) -> Result<CheckoutCreated, SettlementError> {
        let service = self
            .catalog
            .find_by_slug(service_slug)
            .await?
            .ok_or_else(|| SettlementError::service_not_found(service_slug))?;
        if !service.active {
            return Err(SettlementError::service_inactive(service_slug));
        }

        let adapter = self
            .gateways
            .get(gateway)
            .ok_or_else(|| SettlementError::invalid_gateway(gateway.as_str()))?
            .clone();

        let amount = self.converter.convert(&service.price, gateway, currency)?;

        let mut payment = self
            .ledger
            .create_pending(user_id, service.id, gateway, amount)
            .await?;

        let intent = match self.retry.run(|| adapter.create_intent(&payment)).await {
            Ok(intent) => intent,
            Err(err) if err.code == GatewayErrorCode::Declined => {
                self.ledger.fail_intent(payment, &err.message).await?;
                return Err(SettlementError::from_gateway(gateway, err));
            }
            Err(err) => {
                // Payment stays pending; a manual retry or late
                // confirmation remains possible.
                return Err(SettlementError::from_gateway(gateway, err));
            }
        };

        self.ledger
            .record_correlation(&mut payment, intent.correlation_id)
            .await?;

        Ok(CheckoutCreated {
            payment_id: payment.id,
            instructions: intent.instructions,
        })
    }

    /// Feeds a gateway confirmation through the ledger and, on a fresh
    /// settlement, provisions the subscription.
    ///
    /// Safe to call any number of times with the same payload.
    pub async fn resume(
        &self,
        gateway: Gateway,
        payload: &[u8],
        signature: Option<&str>,
    ) -> Result<ResumeOutcome, SettlementError> {
        let adapter = self
            .gateways
            .get(gateway)
            .ok_or_else(|| SettlementError::invalid_gateway(gateway.as_str()))?;

        let result = adapter
            .confirm_callback(payload, signature)
            .await
            .map_err(|err| SettlementError::from_gateway(gateway, err))?;

        match result.outcome {
            SettlementOutcome::Ignored => Ok(ResumeOutcome::Ignored),
            SettlementOutcome::Settled => {
                match self
                    .ledger
                    .mark_completed(&result.correlation_id, result.metadata)
                    .await?
                {
                    Settlement::Fresh(mut payment) => {
                        let subscription =
                            self.subscriptions.activate_or_extend(&payment).await?;
                        self.ledger
                            .link_subscription(&mut payment, subscription.id)
                            .await?;
                        Ok(ResumeOutcome::Completed {
                            payment,
                            subscription,
                        })
                    }
                    Settlement::Replayed(payment) => {
                        Ok(ResumeOutcome::AlreadyProcessed { payment })
                    }
                }
            }
            SettlementOutcome::Declined => {
                match self
                    .ledger
                    .mark_failed(&result.correlation_id, result.metadata)
                    .await?
                {
                    FailureOutcome::Failed(payment) => Ok(ResumeOutcome::Failed { payment }),
                    FailureOutcome::AlreadyFinal(payment) => {
                        Ok(ResumeOutcome::AlreadyProcessed { payment })
                    }
                }
            }
        }
    }

    /// Accepts a user-submitted crypto transfer reference and routes
    /// it through the crypto adapter's confirmation path.
    ///
    /// # Errors
    ///
    /// - `PaymentNotFound` if the id is unknown
    /// - `NotOwner` if the payment belongs to someone else
    /// - `InvalidGateway` if the payment is not a crypto payment
    pub async fn verify_crypto(
        &self,
        requesting_user: UserId,
        payment_id: PaymentId,
        tx_reference: &str,
    ) -> Result<ResumeOutcome, SettlementError> {
        let payment = self
            .ledger
            .find_by_id(&payment_id)
            .await?
            .ok_or(SettlementError::PaymentNotFound(payment_id))?;

        if payment.user_id != requesting_user {
            return Err(SettlementError::not_owner(format!("payment {}", payment_id)));
        }
        if payment.gateway != Gateway::Crypto {
            return Err(SettlementError::invalid_gateway(format!(
                "payment {} was made through {}, not crypto",
                payment_id, payment.gateway
            )));
        }

        let proof = CryptoProof {
            payment_id,
            tx_reference: tx_reference.to_string(),
        };
        let payload = serde_json::to_vec(&proof)
            .map_err(|err| SettlementError::infrastructure(err.to_string()))?;

        self.resume(Gateway::Crypto, &payload, None).await
    }

    /// The subscription manager, for cancel/resume/trial endpoints.
    pub fn subscriptions(&self) -> &SubscriptionManager {
        &self.subscriptions
    }

    /// The payment ledger, for refunds and lookups.
    pub fn ledger(&self) -> &PaymentLedger {
        &self.ledger
    }
}
