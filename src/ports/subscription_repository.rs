//! Subscription repository port.
//!
//! Persistence contract for subscriptions. The single-active-per-pair
//! invariant lives here: `insert_active` is find-or-create against a
//! uniqueness guard on (user, service, active), so two racing
//! confirmations can never both insert.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, ServiceId, SubscriptionId, UserId};
use crate::domain::subscription::Subscription;

/// Result of an atomic active-subscription insert.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
    /// The row was inserted; this caller created the entitlement.
    Inserted,

    /// An active subscription for the (user, service) pair already
    /// existed; the existing row is returned untouched.
    AlreadyActive(Subscription),
}

/// Repository port for Subscription persistence.
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Inserts a new active subscription unless the (user, service)
    /// pair already has one.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure
    async fn insert_active(&self, subscription: &Subscription) -> Result<InsertOutcome, DomainError>;

    /// Updates an existing subscription (cancel/resume).
    ///
    /// # Errors
    ///
    /// - `SubscriptionNotFound` if the row does not exist
    /// - `InvalidTransition` if reactivating would create a second
    ///   active subscription for the pair
    async fn update(&self, subscription: &Subscription) -> Result<(), DomainError>;

    /// Finds a subscription by id.
    async fn find_by_id(&self, id: &SubscriptionId) -> Result<Option<Subscription>, DomainError>;

    /// Finds the active subscription for a (user, service) pair.
    async fn find_active(
        &self,
        user_id: &UserId,
        service_id: &ServiceId,
    ) -> Result<Option<Subscription>, DomainError>;

    /// All subscriptions belonging to a user, newest first.
    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Subscription>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscription_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn SubscriptionRepository) {}
    }
}
