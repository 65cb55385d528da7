//! Payment repository port.
//!
//! Persistence contract for the payment ledger. The status-changing
//! operations are compare-and-set by design: two near-simultaneous
//! confirmations for the same correlation id must resolve to exactly
//! one transition, with the loser observing the already-final row.
//!
//! # Design
//!
//! - **Atomic transitions**: `complete`/`fail` are guarded by current
//!   status (SQL `UPDATE ... WHERE status = 'pending'`, or an
//!   equivalent lock in memory)
//! - **Unique correlation id**: enforced by the store, so a duplicate
//!   confirmation can never attach to a second row

use async_trait::async_trait;

use crate::domain::foundation::{CorrelationId, DomainError, PaymentId};
use crate::domain::payment::Payment;

/// Result of an atomic completion attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionOutcome {
    /// This call performed the pending→completed transition.
    Completed(Payment),

    /// The payment was already completed; returned unchanged so the
    /// caller can skip downstream provisioning.
    AlreadyCompleted(Payment),
}

/// Result of an atomic failure attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum FailureOutcome {
    /// This call performed the pending→failed transition.
    Failed(Payment),

    /// The payment was already in a non-pending state; left untouched.
    AlreadyFinal(Payment),
}

/// Repository port for Payment persistence.
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Persists a new payment row.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure or duplicate id
    async fn save(&self, payment: &Payment) -> Result<(), DomainError>;

    /// Updates an existing payment (correlation assignment,
    /// subscription link, refund).
    ///
    /// # Errors
    ///
    /// - `PaymentNotFound` if the row does not exist
    /// - `DatabaseError` on persistence failure, including a
    ///   correlation id collision
    async fn update(&self, payment: &Payment) -> Result<(), DomainError>;

    /// Finds a payment by its internal id.
    async fn find_by_id(&self, id: &PaymentId) -> Result<Option<Payment>, DomainError>;

    /// Finds a payment by its gateway correlation id.
    async fn find_by_correlation_id(
        &self,
        correlation_id: &CorrelationId,
    ) -> Result<Option<Payment>, DomainError>;

    /// Atomically transitions pending→completed for the payment with
    /// this correlation id, stamping `completed_at` and storing the
    /// provider payload.
    ///
    /// # Errors
    ///
    /// - `UnknownCorrelationId` if no payment carries this reference
    /// - `InvalidTransition` if the payment is failed or refunded
    async fn complete(
        &self,
        correlation_id: &CorrelationId,
        metadata: serde_json::Value,
    ) -> Result<CompletionOutcome, DomainError>;

    /// Atomically transitions pending→failed for the payment with this
    /// correlation id, storing the provider payload.
    ///
    /// # Errors
    ///
    /// - `UnknownCorrelationId` if no payment carries this reference
    async fn fail(
        &self,
        correlation_id: &CorrelationId,
        metadata: serde_json::Value,
    ) -> Result<FailureOutcome, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn PaymentRepository) {}
    }
}
