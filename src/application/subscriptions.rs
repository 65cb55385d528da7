//! Subscription manager - owns the `Subscription` entity.
//!
//! Reacts to completed payments by provisioning access, grants
//! catalog trials, and handles the cancel/resume round trip. The
//! one-active-per-(user, service) invariant is enforced through the
//! repository's atomic insert, never by check-then-act.

use std::sync::Arc;

use crate::application::errors::SettlementError;
use crate::domain::foundation::{SubscriptionId, UserId};
use crate::domain::payment::Payment;
use crate::domain::subscription::Subscription;
use crate::ports::{InsertOutcome, ServiceCatalog, SubscriptionRepository};

/// Owns subscription lifecycle and the single-active invariant.
#[derive(Clone)]
pub struct SubscriptionManager {
    subscriptions: Arc<dyn SubscriptionRepository>,
    catalog: Arc<dyn ServiceCatalog>,
}

impl SubscriptionManager {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepository>,
        catalog: Arc<dyn ServiceCatalog>,
    ) -> Self {
        Self {
            subscriptions,
            catalog,
        }
    }

    /// Provisions access for a completed payment.
    ///
    /// If the (user, service) pair already has an active subscription
    /// this is a no-op returning the existing row — the path duplicate
    /// payment confirmations land on. Paid activation never grants or
    /// extends a trial window.
    pub async fn activate_or_extend(
        &self,
        payment: &Payment,
    ) -> Result<Subscription, SettlementError> {
        if let Some(existing) = self
            .subscriptions
            .find_active(&payment.user_id, &payment.service_id)
            .await?
        {
            tracing::info!(
                subscription_id = %existing.id,
                payment_id = %payment.id,
                "active subscription already present, activation skipped"
            );
            return Ok(existing);
        }

        let service = self
            .catalog
            .find_by_id(&payment.service_id)
            .await?
            .ok_or_else(|| {
                SettlementError::infrastructure(format!(
                    "payment {} references unknown service {}",
                    payment.id, payment.service_id
                ))
            })?;

        let subscription = Subscription::create_paid(
            SubscriptionId::new(),
            payment.user_id,
            payment.service_id,
            payment.id,
            service.is_recurring(),
        );

        match self.subscriptions.insert_active(&subscription).await? {
            InsertOutcome::Inserted => {
                tracing::info!(
                    subscription_id = %subscription.id,
                    user_id = %subscription.user_id,
                    service = %service.slug,
                    "subscription activated"
                );
                Ok(subscription)
            }
            InsertOutcome::AlreadyActive(existing) => {
                // Lost the race against a concurrent confirmation.
                tracing::info!(
                    subscription_id = %existing.id,
                    payment_id = %payment.id,
                    "concurrent activation detected, keeping existing subscription"
                );
                Ok(existing)
            }
        }
    }

    /// Grants a catalog trial with no payment behind it.
    ///
    /// # Errors
    ///
    /// - `ServiceNotFound` / `ServiceInactive` on catalog misses
    /// - `TrialNotAvailable` if the service offers no trial or the
    ///   pair is already subscribed
    pub async fn start_trial(
        &self,
        user_id: UserId,
        service_slug: &str,
    ) -> Result<Subscription, SettlementError> {
        let service = self
            .catalog
            .find_by_slug(service_slug)
            .await?
            .ok_or_else(|| SettlementError::service_not_found(service_slug))?;

        if !service.active {
            return Err(SettlementError::service_inactive(service_slug));
        }
        if !service.offers_trial() {
            return Err(SettlementError::trial_not_available(
                service_slug,
                "service has no trial period",
            ));
        }
        if self
            .subscriptions
            .find_active(&user_id, &service.id)
            .await?
            .is_some()
        {
            return Err(SettlementError::trial_not_available(
                service_slug,
                "an active subscription already exists",
            ));
        }

        let subscription = Subscription::create_trial(
            SubscriptionId::new(),
            user_id,
            service.id,
            service.trial_days,
        )?;

        match self.subscriptions.insert_active(&subscription).await? {
            InsertOutcome::Inserted => {
                tracing::info!(
                    subscription_id = %subscription.id,
                    user_id = %user_id,
                    service = %service.slug,
                    trial_days = service.trial_days,
                    "trial started"
                );
                Ok(subscription)
            }
            InsertOutcome::AlreadyActive(_) => Err(SettlementError::trial_not_available(
                service_slug,
                "an active subscription already exists",
            )),
        }
    }

    /// Cancels a subscription the requesting user owns.
    ///
    /// # Errors
    ///
    /// - `SubscriptionNotFound` if the id is unknown
    /// - `NotOwner` if someone else owns it — checked before any state
    ///   check, and the row is left untouched
    /// - `AlreadyCancelled` if it is not active
    pub async fn cancel(
        &self,
        subscription_id: &SubscriptionId,
        requesting_user: &UserId,
    ) -> Result<Subscription, SettlementError> {
        let mut subscription = self.load(subscription_id).await?;

        if subscription.user_id != *requesting_user {
            return Err(SettlementError::not_owner(format!(
                "subscription {}",
                subscription_id
            )));
        }

        subscription.cancel().map_err(|err| {
            if err.code == crate::domain::foundation::ErrorCode::AlreadyCancelled {
                SettlementError::AlreadyCancelled(*subscription_id)
            } else {
                err.into()
            }
        })?;
        self.subscriptions.update(&subscription).await?;

        tracing::info!(
            subscription_id = %subscription.id,
            user_id = %requesting_user,
            "subscription cancelled"
        );
        Ok(subscription)
    }

    /// Resumes a cancelled subscription, billing from now.
    ///
    /// # Errors
    ///
    /// - `SubscriptionNotFound` if the id is unknown
    /// - `NotOwner` if someone else owns it
    /// - `NotCancelled` unless the subscription is cancelled
    pub async fn resume(
        &self,
        subscription_id: &SubscriptionId,
        requesting_user: &UserId,
    ) -> Result<Subscription, SettlementError> {
        let mut subscription = self.load(subscription_id).await?;

        if subscription.user_id != *requesting_user {
            return Err(SettlementError::not_owner(format!(
                "subscription {}",
                subscription_id
            )));
        }

        subscription.resume().map_err(|err| {
            if err.code == crate::domain::foundation::ErrorCode::NotCancelled {
                SettlementError::NotCancelled(*subscription_id)
            } else {
                err.into()
            }
        })?;
        self.subscriptions.update(&subscription).await?;

        tracing::info!(
            subscription_id = %subscription.id,
            user_id = %requesting_user,
            "subscription resumed"
        );
        Ok(subscription)
    }

    /// All subscriptions belonging to a user.
    pub async fn list_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Subscription>, SettlementError> {
        Ok(self.subscriptions.list_for_user(user_id).await?)
    }

    async fn load(
        &self,
        subscription_id: &SubscriptionId,
    ) -> Result<Subscription, SettlementError> {
        self.subscriptions
            .find_by_id(subscription_id)
            .await?
            .ok_or(SettlementError::SubscriptionNotFound(*subscription_id))
    }
}
