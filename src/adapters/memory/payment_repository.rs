//! In-memory implementation of PaymentRepository.
//!
//! Backs the test suite and local runs. The write lock around each
//! mutation gives the same serialization guarantee the PostgreSQL
//! adapter gets from its guarded UPDATE.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::{CorrelationId, DomainError, ErrorCode, PaymentId};
use crate::domain::payment::{Payment, PaymentStatus};
use crate::ports::{CompletionOutcome, FailureOutcome, PaymentRepository};

/// Map-backed payment store.
#[derive(Default)]
pub struct MemoryPaymentRepository {
    payments: RwLock<HashMap<PaymentId, Payment>>,
}

impl MemoryPaymentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn correlation_collides(
        payments: &HashMap<PaymentId, Payment>,
        payment: &Payment,
    ) -> bool {
        match &payment.correlation_id {
            None => false,
            Some(correlation) => payments.values().any(|other| {
                other.id != payment.id && other.correlation_id.as_ref() == Some(correlation)
            }),
        }
    }
}

#[async_trait]
impl PaymentRepository for MemoryPaymentRepository {
    async fn save(&self, payment: &Payment) -> Result<(), DomainError> {
        let mut payments = self.payments.write().await;
        if payments.contains_key(&payment.id) {
            return Err(DomainError::database(format!(
                "payment {} already exists",
                payment.id
            )));
        }
        if Self::correlation_collides(&payments, payment) {
            return Err(DomainError::database("duplicate gateway correlation id"));
        }
        payments.insert(payment.id, payment.clone());
        Ok(())
    }

    async fn update(&self, payment: &Payment) -> Result<(), DomainError> {
        let mut payments = self.payments.write().await;
        if !payments.contains_key(&payment.id) {
            return Err(DomainError::new(
                ErrorCode::PaymentNotFound,
                format!("payment {} does not exist", payment.id),
            ));
        }
        if Self::correlation_collides(&payments, payment) {
            return Err(DomainError::database("duplicate gateway correlation id"));
        }
        payments.insert(payment.id, payment.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &PaymentId) -> Result<Option<Payment>, DomainError> {
        Ok(self.payments.read().await.get(id).cloned())
    }

    async fn find_by_correlation_id(
        &self,
        correlation_id: &CorrelationId,
    ) -> Result<Option<Payment>, DomainError> {
        Ok(self
            .payments
            .read()
            .await
            .values()
            .find(|p| p.correlation_id.as_ref() == Some(correlation_id))
            .cloned())
    }

    async fn complete(
        &self,
        correlation_id: &CorrelationId,
        metadata: serde_json::Value,
    ) -> Result<CompletionOutcome, DomainError> {
        let mut payments = self.payments.write().await;
        let payment = payments
            .values_mut()
            .find(|p| p.correlation_id.as_ref() == Some(correlation_id))
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::UnknownCorrelationId,
                    format!("no payment for correlation id {}", correlation_id),
                )
            })?;

        match payment.status {
            PaymentStatus::Pending => {
                payment.complete(metadata)?;
                Ok(CompletionOutcome::Completed(payment.clone()))
            }
            PaymentStatus::Completed => Ok(CompletionOutcome::AlreadyCompleted(payment.clone())),
            other => Err(DomainError::new(
                ErrorCode::InvalidTransition,
                format!("cannot complete payment in status {:?}", other),
            )),
        }
    }

    async fn fail(
        &self,
        correlation_id: &CorrelationId,
        metadata: serde_json::Value,
    ) -> Result<FailureOutcome, DomainError> {
        let mut payments = self.payments.write().await;
        let payment = payments
            .values_mut()
            .find(|p| p.correlation_id.as_ref() == Some(correlation_id))
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::UnknownCorrelationId,
                    format!("no payment for correlation id {}", correlation_id),
                )
            })?;

        if payment.status == PaymentStatus::Pending {
            payment.fail(metadata)?;
            Ok(FailureOutcome::Failed(payment.clone()))
        } else {
            Ok(FailureOutcome::AlreadyFinal(payment.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{Currency, Money, ServiceId, UserId};
    use crate::domain::payment::Gateway;
    use rust_decimal::Decimal;

    fn pending_with_correlation(correlation: &str) -> Payment {
        let mut payment = Payment::create_pending(
            PaymentId::new(),
            UserId::new(),
            ServiceId::new(),
            Gateway::Bancard,
            Money::new(Decimal::from(150_000), Currency::Pyg),
        )
        .unwrap();
        payment
            .assign_correlation(CorrelationId::new(correlation).unwrap())
            .unwrap();
        payment
    }

    #[tokio::test]
    async fn complete_is_idempotent() {
        let repo = MemoryPaymentRepository::new();
        let payment = pending_with_correlation("bc-1001");
        repo.save(&payment).await.unwrap();

        let correlation = CorrelationId::new("bc-1001").unwrap();
        let first = repo
            .complete(&correlation, serde_json::json!({"code": "00"}))
            .await
            .unwrap();
        assert!(matches!(first, CompletionOutcome::Completed(_)));

        let second = repo
            .complete(&correlation, serde_json::json!({"code": "00"}))
            .await
            .unwrap();
        assert!(matches!(second, CompletionOutcome::AlreadyCompleted(_)));
    }

    #[tokio::test]
    async fn complete_unknown_correlation_errors() {
        let repo = MemoryPaymentRepository::new();
        let correlation = CorrelationId::new("forged").unwrap();
        let result = repo.complete(&correlation, serde_json::json!({})).await;
        assert!(matches!(result, Err(e) if e.code == ErrorCode::UnknownCorrelationId));
    }

    #[tokio::test]
    async fn fail_after_complete_leaves_payment_untouched() {
        let repo = MemoryPaymentRepository::new();
        let payment = pending_with_correlation("bc-1002");
        repo.save(&payment).await.unwrap();

        let correlation = CorrelationId::new("bc-1002").unwrap();
        repo.complete(&correlation, serde_json::json!({}))
            .await
            .unwrap();

        let outcome = repo.fail(&correlation, serde_json::json!({})).await.unwrap();
        match outcome {
            FailureOutcome::AlreadyFinal(p) => assert_eq!(p.status, PaymentStatus::Completed),
            other => panic!("expected AlreadyFinal, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn duplicate_correlation_id_is_rejected() {
        let repo = MemoryPaymentRepository::new();
        let first = pending_with_correlation("dup-1");
        repo.save(&first).await.unwrap();

        let second = pending_with_correlation("dup-1");
        let result = repo.save(&second).await;
        assert!(matches!(result, Err(e) if e.code == ErrorCode::DatabaseError));
    }
}
