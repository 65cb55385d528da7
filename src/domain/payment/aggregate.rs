//! Payment aggregate entity.
//!
//! A Payment records one attempted transfer of value: who is paying,
//! for which service, through which gateway, how much, and what the
//! gateway ultimately said about it.
//!
//! # Invariants
//!
//! - `amount > 0`, enforced at construction
//! - `status` follows the `PaymentStatus` machine (pending→completed,
//!   pending→failed, completed→refunded)
//! - `correlation_id` is set at most once, when the gateway assigns it
//! - `completed_at` is stamped exactly when the payment completes
//! - gateway metadata is stored verbatim, never reshaped

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    CorrelationId, DomainError, ErrorCode, Money, PaymentId, ServiceId, StateMachine,
    SubscriptionId, Timestamp, UserId, ValidationError,
};

use super::{Gateway, PaymentStatus};

/// A record of one attempted transfer of value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    /// Unique identifier for this payment.
    pub id: PaymentId,

    /// User the charge belongs to.
    pub user_id: UserId,

    /// Service the charge pays for.
    pub service_id: ServiceId,

    /// Subscription provisioned by this payment, once one exists.
    pub subscription_id: Option<SubscriptionId>,

    /// Gateway chosen for the charge.
    pub gateway: Gateway,

    /// Gateway-assigned reference used to match asynchronous
    /// confirmations. Unset until the gateway issues one.
    pub correlation_id: Option<CorrelationId>,

    /// Exact amount charged, in the gateway's settlement currency.
    pub amount: Money,

    /// Current lifecycle status.
    pub status: PaymentStatus,

    /// Opaque provider payload from the confirmation, kept verbatim
    /// for audit and replay.
    pub provider_metadata: Option<serde_json::Value>,

    /// When the intent was recorded.
    pub created_at: Timestamp,

    /// When the gateway confirmed settlement. Null until completed.
    pub completed_at: Option<Timestamp>,
}

impl Payment {
    /// Records a new charge intent in `Pending`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` if the amount is not strictly positive.
    pub fn create_pending(
        id: PaymentId,
        user_id: UserId,
        service_id: ServiceId,
        gateway: Gateway,
        amount: Money,
    ) -> Result<Self, DomainError> {
        if !amount.is_positive() {
            return Err(
                ValidationError::non_positive("amount", amount.amount()).into(),
            );
        }

        Ok(Self {
            id,
            user_id,
            service_id,
            subscription_id: None,
            gateway,
            correlation_id: None,
            amount,
            status: PaymentStatus::Pending,
            provider_metadata: None,
            created_at: Timestamp::now(),
            completed_at: None,
        })
    }

    /// Attaches the gateway's reference once the intent is created
    /// with the provider.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` if a reference was already assigned.
    pub fn assign_correlation(&mut self, correlation_id: CorrelationId) -> Result<(), DomainError> {
        if self.correlation_id.is_some() {
            return Err(DomainError::new(
                ErrorCode::InvalidTransition,
                format!("Payment {} already has a gateway reference", self.id),
            ));
        }
        self.correlation_id = Some(correlation_id);
        Ok(())
    }

    /// Marks the payment settled, stamping the completion time and
    /// storing the provider payload.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` unless the payment is pending.
    pub fn complete(&mut self, metadata: serde_json::Value) -> Result<(), DomainError> {
        self.transition_to(PaymentStatus::Completed)?;
        self.provider_metadata = Some(metadata);
        self.completed_at = Some(Timestamp::now());
        Ok(())
    }

    /// Marks the payment failed after a definitive decline.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` unless the payment is pending.
    pub fn fail(&mut self, metadata: serde_json::Value) -> Result<(), DomainError> {
        self.transition_to(PaymentStatus::Failed)?;
        self.provider_metadata = Some(metadata);
        Ok(())
    }

    /// Reverses a completed payment. Administrative action only; does
    /// not touch the associated subscription.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` unless the payment is completed.
    pub fn refund(&mut self) -> Result<(), DomainError> {
        self.transition_to(PaymentStatus::Refunded)
    }

    /// Links the subscription this payment provisioned.
    pub fn link_subscription(&mut self, subscription_id: SubscriptionId) {
        self.subscription_id = Some(subscription_id);
    }

    fn transition_to(&mut self, target: PaymentStatus) -> Result<(), DomainError> {
        self.status = self.status.transition_to(target).map_err(|_| {
            DomainError::new(
                ErrorCode::InvalidTransition,
                format!(
                    "Cannot transition payment {} from {:?} to {:?}",
                    self.id, self.status, target
                ),
            )
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::Currency;
    use rust_decimal::Decimal;

    fn pyg(amount: i64) -> Money {
        Money::new(Decimal::from(amount), Currency::Pyg)
    }

    fn pending_payment() -> Payment {
        Payment::create_pending(
            PaymentId::new(),
            UserId::new(),
            ServiceId::new(),
            Gateway::Pagopar,
            pyg(150_000),
        )
        .unwrap()
    }

    #[test]
    fn create_pending_starts_pending_without_correlation() {
        let payment = pending_payment();
        assert_eq!(payment.status, PaymentStatus::Pending);
        assert!(payment.correlation_id.is_none());
        assert!(payment.completed_at.is_none());
        assert!(payment.subscription_id.is_none());
    }

    #[test]
    fn zero_amount_is_rejected() {
        let result = Payment::create_pending(
            PaymentId::new(),
            UserId::new(),
            ServiceId::new(),
            Gateway::Card,
            pyg(0),
        );
        assert!(matches!(result, Err(e) if e.code == ErrorCode::InvalidAmount));
    }

    #[test]
    fn negative_amount_is_rejected() {
        let result = Payment::create_pending(
            PaymentId::new(),
            UserId::new(),
            ServiceId::new(),
            Gateway::Card,
            pyg(-500),
        );
        assert!(matches!(result, Err(e) if e.code == ErrorCode::InvalidAmount));
    }

    #[test]
    fn correlation_is_assigned_once() {
        let mut payment = pending_payment();
        payment
            .assign_correlation(CorrelationId::new("7233445").unwrap())
            .unwrap();

        let second = payment.assign_correlation(CorrelationId::new("other").unwrap());
        assert!(matches!(second, Err(e) if e.code == ErrorCode::InvalidTransition));
    }

    #[test]
    fn complete_stamps_time_and_stores_metadata() {
        let mut payment = pending_payment();
        payment
            .complete(serde_json::json!({"respuesta": "S", "pagado": true}))
            .unwrap();

        assert_eq!(payment.status, PaymentStatus::Completed);
        assert!(payment.completed_at.is_some());
        assert_eq!(
            payment.provider_metadata.as_ref().unwrap()["pagado"],
            serde_json::json!(true)
        );
    }

    #[test]
    fn complete_twice_is_an_invalid_transition() {
        let mut payment = pending_payment();
        payment.complete(serde_json::json!({})).unwrap();

        let again = payment.complete(serde_json::json!({}));
        assert!(matches!(again, Err(e) if e.code == ErrorCode::InvalidTransition));
    }

    #[test]
    fn failed_payment_cannot_complete() {
        let mut payment = pending_payment();
        payment.fail(serde_json::json!({"code": "51"})).unwrap();

        let result = payment.complete(serde_json::json!({}));
        assert!(matches!(result, Err(e) if e.code == ErrorCode::InvalidTransition));
    }

    #[test]
    fn refund_requires_completed() {
        let mut payment = pending_payment();
        assert!(payment.refund().is_err());

        payment.complete(serde_json::json!({})).unwrap();
        assert!(payment.refund().is_ok());
        assert_eq!(payment.status, PaymentStatus::Refunded);
    }
}
