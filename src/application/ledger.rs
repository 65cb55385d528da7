//! Payment ledger - single source of truth for "did money move".
//!
//! All payment mutation goes through this service. Completion and
//! failure are keyed by gateway correlation id and ride the
//! repository's atomic compare-and-set, so duplicate or racing
//! confirmations collapse to one transition.

use std::sync::Arc;

use crate::application::errors::SettlementError;
use crate::domain::foundation::{
    CorrelationId, ErrorCode, Money, PaymentId, ServiceId, SubscriptionId, UserId,
};
use crate::domain::payment::{Gateway, Payment};
use crate::ports::{CompletionOutcome, FailureOutcome, PaymentRepository};

/// What a completion attempt did.
#[derive(Debug, Clone, PartialEq)]
pub enum Settlement {
    /// This confirmation performed the transition; downstream
    /// provisioning should run.
    Fresh(Payment),

    /// The payment was already completed; downstream provisioning must
    /// not run again.
    Replayed(Payment),
}

/// Owns the `Payment` entity and its lifecycle.
#[derive(Clone)]
pub struct PaymentLedger {
    payments: Arc<dyn PaymentRepository>,
}

impl PaymentLedger {
    pub fn new(payments: Arc<dyn PaymentRepository>) -> Self {
        Self { payments }
    }

    /// Records a new charge intent with status `pending`.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if the amount is not strictly positive
    pub async fn create_pending(
        &self,
        user_id: UserId,
        service_id: ServiceId,
        gateway: Gateway,
        amount: Money,
    ) -> Result<Payment, SettlementError> {
        let payment =
            Payment::create_pending(PaymentId::new(), user_id, service_id, gateway, amount)?;
        self.payments.save(&payment).await?;

        tracing::info!(
            payment_id = %payment.id,
            user_id = %user_id,
            gateway = %gateway,
            amount = %payment.amount,
            "payment intent recorded"
        );
        Ok(payment)
    }

    /// Stores the gateway's reference on a freshly-created intent.
    pub async fn record_correlation(
        &self,
        payment: &mut Payment,
        correlation_id: CorrelationId,
    ) -> Result<(), SettlementError> {
        payment.assign_correlation(correlation_id)?;
        self.payments.update(payment).await?;
        Ok(())
    }

    /// Settles the payment carrying this correlation id.
    ///
    /// Idempotent: a payment that is already completed is returned as
    /// `Settlement::Replayed` without re-firing anything downstream.
    ///
    /// # Errors
    ///
    /// - `UnknownCorrelationId` for a reference no payment carries —
    ///   either a forged callback or a data-integrity fault, so it is
    ///   logged loudly and rejected
    /// - `InvalidTransition` if the payment already failed or refunded
    pub async fn mark_completed(
        &self,
        correlation_id: &CorrelationId,
        metadata: serde_json::Value,
    ) -> Result<Settlement, SettlementError> {
        match self.payments.complete(correlation_id, metadata).await {
            Ok(CompletionOutcome::Completed(payment)) => {
                tracing::info!(
                    payment_id = %payment.id,
                    correlation_id = %correlation_id,
                    gateway = %payment.gateway,
                    "payment settled"
                );
                Ok(Settlement::Fresh(payment))
            }
            Ok(CompletionOutcome::AlreadyCompleted(payment)) => {
                tracing::info!(
                    payment_id = %payment.id,
                    correlation_id = %correlation_id,
                    "duplicate confirmation ignored, payment already settled"
                );
                Ok(Settlement::Replayed(payment))
            }
            Err(err) if err.code == ErrorCode::UnknownCorrelationId => {
                tracing::warn!(
                    correlation_id = %correlation_id,
                    "confirmation for unknown gateway reference rejected"
                );
                Err(SettlementError::UnknownCorrelationId(correlation_id.clone()))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Fails the payment carrying this correlation id.
    ///
    /// A payment already out of `pending` is left untouched; the
    /// attempt is logged and the current row returned.
    ///
    /// # Errors
    ///
    /// - `UnknownCorrelationId` for a reference no payment carries
    pub async fn mark_failed(
        &self,
        correlation_id: &CorrelationId,
        metadata: serde_json::Value,
    ) -> Result<FailureOutcome, SettlementError> {
        match self.payments.fail(correlation_id, metadata).await {
            Ok(FailureOutcome::Failed(payment)) => {
                tracing::warn!(
                    payment_id = %payment.id,
                    correlation_id = %correlation_id,
                    gateway = %payment.gateway,
                    "payment failed"
                );
                Ok(FailureOutcome::Failed(payment))
            }
            Ok(FailureOutcome::AlreadyFinal(payment)) => {
                tracing::info!(
                    payment_id = %payment.id,
                    correlation_id = %correlation_id,
                    status = ?payment.status,
                    "failure confirmation ignored, payment no longer pending"
                );
                Ok(FailureOutcome::AlreadyFinal(payment))
            }
            Err(err) if err.code == ErrorCode::UnknownCorrelationId => {
                tracing::warn!(
                    correlation_id = %correlation_id,
                    "failure confirmation for unknown gateway reference rejected"
                );
                Err(SettlementError::UnknownCorrelationId(correlation_id.clone()))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Fails an intent that never reached the provider (definitive
    /// decline during creation, before any correlation id existed).
    pub async fn fail_intent(
        &self,
        mut payment: Payment,
        reason: &str,
    ) -> Result<Payment, SettlementError> {
        payment.fail(serde_json::json!({ "reason": reason }))?;
        self.payments.update(&payment).await?;

        tracing::warn!(
            payment_id = %payment.id,
            gateway = %payment.gateway,
            reason,
            "payment intent declined at creation"
        );
        Ok(payment)
    }

    /// Reverses a completed payment. Administrative action; the
    /// associated subscription is deliberately left alone.
    ///
    /// # Errors
    ///
    /// - `PaymentNotFound` if the id is unknown
    /// - `InvalidTransition` unless the payment is completed
    pub async fn refund(&self, payment_id: &PaymentId) -> Result<Payment, SettlementError> {
        let mut payment = self
            .payments
            .find_by_id(payment_id)
            .await?
            .ok_or(SettlementError::PaymentNotFound(*payment_id))?;

        payment.refund()?;
        self.payments.update(&payment).await?;

        tracing::info!(payment_id = %payment.id, "payment refunded");
        Ok(payment)
    }

    /// Links the subscription a completed payment provisioned.
    pub async fn link_subscription(
        &self,
        payment: &mut Payment,
        subscription_id: SubscriptionId,
    ) -> Result<(), SettlementError> {
        payment.link_subscription(subscription_id);
        self.payments.update(payment).await?;
        Ok(())
    }

    /// Fetches a payment by id.
    pub async fn find_by_id(
        &self,
        payment_id: &PaymentId,
    ) -> Result<Option<Payment>, SettlementError> {
        Ok(self.payments.find_by_id(payment_id).await?)
    }
}
