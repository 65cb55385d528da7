//! In-memory implementation of SubscriptionRepository.
//!
//! The write lock makes `insert_active` an atomic find-or-create,
//! matching the partial unique index the PostgreSQL adapter relies on.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, ServiceId, SubscriptionId, UserId};
use crate::domain::subscription::{Subscription, SubscriptionStatus};
use crate::ports::{InsertOutcome, SubscriptionRepository};

/// Map-backed subscription store.
#[derive(Default)]
pub struct MemorySubscriptionRepository {
    subscriptions: RwLock<HashMap<SubscriptionId, Subscription>>,
}

impl MemorySubscriptionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn active_for_pair(
        subscriptions: &HashMap<SubscriptionId, Subscription>,
        user_id: &UserId,
        service_id: &ServiceId,
        excluding: Option<&SubscriptionId>,
    ) -> Option<Subscription> {
        subscriptions
            .values()
            .find(|s| {
                s.status == SubscriptionStatus::Active
                    && s.user_id == *user_id
                    && s.service_id == *service_id
                    && excluding != Some(&s.id)
            })
            .cloned()
    }
}

#[async_trait]
impl SubscriptionRepository for MemorySubscriptionRepository {
    async fn insert_active(
        &self,
        subscription: &Subscription,
    ) -> Result<InsertOutcome, DomainError> {
        let mut subscriptions = self.subscriptions.write().await;

        if let Some(existing) = Self::active_for_pair(
            &subscriptions,
            &subscription.user_id,
            &subscription.service_id,
            None,
        ) {
            return Ok(InsertOutcome::AlreadyActive(existing));
        }

        subscriptions.insert(subscription.id, subscription.clone());
        Ok(InsertOutcome::Inserted)
    }

    async fn update(&self, subscription: &Subscription) -> Result<(), DomainError> {
        let mut subscriptions = self.subscriptions.write().await;
        if !subscriptions.contains_key(&subscription.id) {
            return Err(DomainError::new(
                ErrorCode::SubscriptionNotFound,
                format!("subscription {} does not exist", subscription.id),
            ));
        }

        // Reactivation must not create a second active row for the pair.
        if subscription.status == SubscriptionStatus::Active
            && Self::active_for_pair(
                &subscriptions,
                &subscription.user_id,
                &subscription.service_id,
                Some(&subscription.id),
            )
            .is_some()
        {
            return Err(DomainError::new(
                ErrorCode::InvalidTransition,
                "another active subscription already exists for this user and service",
            ));
        }

        subscriptions.insert(subscription.id, subscription.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: &SubscriptionId,
    ) -> Result<Option<Subscription>, DomainError> {
        Ok(self.subscriptions.read().await.get(id).cloned())
    }

    async fn find_active(
        &self,
        user_id: &UserId,
        service_id: &ServiceId,
    ) -> Result<Option<Subscription>, DomainError> {
        let subscriptions = self.subscriptions.read().await;
        Ok(Self::active_for_pair(&subscriptions, user_id, service_id, None))
    }

    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Subscription>, DomainError> {
        let subscriptions = self.subscriptions.read().await;
        let mut rows: Vec<Subscription> = subscriptions
            .values()
            .filter(|s| s.user_id == *user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::PaymentId;

    fn active_subscription(user_id: UserId, service_id: ServiceId) -> Subscription {
        Subscription::create_paid(
            SubscriptionId::new(),
            user_id,
            service_id,
            PaymentId::new(),
            true,
        )
    }

    #[tokio::test]
    async fn second_active_insert_returns_existing_row() {
        let repo = MemorySubscriptionRepository::new();
        let user = UserId::new();
        let service = ServiceId::new();

        let first = active_subscription(user, service);
        assert!(matches!(
            repo.insert_active(&first).await.unwrap(),
            InsertOutcome::Inserted
        ));

        let second = active_subscription(user, service);
        match repo.insert_active(&second).await.unwrap() {
            InsertOutcome::AlreadyActive(existing) => assert_eq!(existing.id, first.id),
            other => panic!("expected AlreadyActive, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn cancelled_row_does_not_block_new_active_insert() {
        let repo = MemorySubscriptionRepository::new();
        let user = UserId::new();
        let service = ServiceId::new();

        let mut first = active_subscription(user, service);
        repo.insert_active(&first).await.unwrap();
        first.cancel().unwrap();
        repo.update(&first).await.unwrap();

        let second = active_subscription(user, service);
        assert!(matches!(
            repo.insert_active(&second).await.unwrap(),
            InsertOutcome::Inserted
        ));
    }

    #[tokio::test]
    async fn resume_is_blocked_when_pair_gained_another_active_row() {
        let repo = MemorySubscriptionRepository::new();
        let user = UserId::new();
        let service = ServiceId::new();

        let mut first = active_subscription(user, service);
        repo.insert_active(&first).await.unwrap();
        first.cancel().unwrap();
        repo.update(&first).await.unwrap();

        let second = active_subscription(user, service);
        repo.insert_active(&second).await.unwrap();

        first.resume().unwrap();
        let result = repo.update(&first).await;
        assert!(matches!(result, Err(e) if e.code == ErrorCode::InvalidTransition));
    }

    #[tokio::test]
    async fn list_for_user_is_newest_first() {
        let repo = MemorySubscriptionRepository::new();
        let user = UserId::new();

        let older = active_subscription(user, ServiceId::new());
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        let newer = active_subscription(user, ServiceId::new());

        repo.insert_active(&older).await.unwrap();
        repo.insert_active(&newer).await.unwrap();

        let rows = repo.list_for_user(&user).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, newer.id);
    }
}
