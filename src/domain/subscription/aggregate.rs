//! Subscription aggregate entity.
//!
//! A Subscription is a user's entitlement window for one service. At
//! most one active subscription exists per (user, service) pair; the
//! repository enforces that with a uniqueness guard, and the manager
//! treats find-or-create as one atomic operation.
//!
//! # Invariants
//!
//! - `trial_ends_at`, when present, is never before `started_at`
//! - cancelling stamps `ended_at`; resuming clears it and recomputes
//!   the next billing date from the moment of resumption
//! - rows are never deleted, only cancelled

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    DomainError, ErrorCode, PaymentId, ServiceId, StateMachine, SubscriptionId, Timestamp, UserId,
};

use super::SubscriptionStatus;

/// A user's entitlement window for one service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    /// Unique identifier for this subscription.
    pub id: SubscriptionId,

    /// User who owns this subscription.
    pub user_id: UserId,

    /// Service the subscription unlocks.
    pub service_id: ServiceId,

    /// Payment that provisioned it. None for trial-only sign-ups.
    pub payment_id: Option<PaymentId>,

    /// Current lifecycle status.
    pub status: SubscriptionStatus,

    /// When access began.
    pub started_at: Timestamp,

    /// End of the trial window, if one was granted at sign-up.
    pub trial_ends_at: Option<Timestamp>,

    /// Next charge date for recurring services; None for one-time.
    pub next_billing_at: Option<Timestamp>,

    /// When the subscription was cancelled. Cleared on resume.
    pub ended_at: Option<Timestamp>,

    /// When the row was created.
    pub created_at: Timestamp,

    /// When the row was last modified.
    pub updated_at: Timestamp,
}

impl Subscription {
    /// Creates an active subscription from a completed payment.
    ///
    /// Paid activation never grants a trial; trials exist only on the
    /// no-payment sign-up path.
    pub fn create_paid(
        id: SubscriptionId,
        user_id: UserId,
        service_id: ServiceId,
        payment_id: PaymentId,
        recurring: bool,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            id,
            user_id,
            service_id,
            payment_id: Some(payment_id),
            status: SubscriptionStatus::Active,
            started_at: now,
            trial_ends_at: None,
            next_billing_at: recurring.then(|| now.add_months(1)),
            ended_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates an active trial subscription with no payment behind it.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `trial_days` is zero.
    pub fn create_trial(
        id: SubscriptionId,
        user_id: UserId,
        service_id: ServiceId,
        trial_days: u32,
    ) -> Result<Self, DomainError> {
        if trial_days == 0 {
            return Err(DomainError::validation(
                "trial_days",
                "trial subscriptions need a trial window of at least one day",
            ));
        }

        let now = Timestamp::now();
        let trial_end = now.add_days(i64::from(trial_days));
        Ok(Self {
            id,
            user_id,
            service_id,
            payment_id: None,
            status: SubscriptionStatus::Active,
            started_at: now,
            trial_ends_at: Some(trial_end),
            next_billing_at: Some(trial_end),
            ended_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// True while the entitlement window is open.
    pub fn is_active(&self) -> bool {
        self.status == SubscriptionStatus::Active
    }

    /// True while the trial window covers the current moment.
    pub fn in_trial(&self) -> bool {
        self.trial_ends_at
            .map(|end| Timestamp::now() <= end)
            .unwrap_or(false)
    }

    /// Ends the subscription now.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyCancelled` unless the subscription is active.
    pub fn cancel(&mut self) -> Result<(), DomainError> {
        if self.status != SubscriptionStatus::Active {
            return Err(DomainError::new(
                ErrorCode::AlreadyCancelled,
                format!("Subscription {} is not active", self.id),
            ));
        }
        self.transition_to(SubscriptionStatus::Cancelled)?;
        let now = Timestamp::now();
        self.ended_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Reopens a cancelled subscription, billing from now.
    ///
    /// # Errors
    ///
    /// Returns `NotCancelled` unless the subscription is cancelled.
    pub fn resume(&mut self) -> Result<(), DomainError> {
        if self.status != SubscriptionStatus::Cancelled {
            return Err(DomainError::new(
                ErrorCode::NotCancelled,
                format!("Subscription {} is not cancelled", self.id),
            ));
        }
        self.transition_to(SubscriptionStatus::Active)?;
        let now = Timestamp::now();
        self.ended_at = None;
        self.next_billing_at = Some(now.add_months(1));
        self.updated_at = now;
        Ok(())
    }

    fn transition_to(&mut self, target: SubscriptionStatus) -> Result<(), DomainError> {
        self.status = self.status.transition_to(target).map_err(|_| {
            DomainError::new(
                ErrorCode::InvalidTransition,
                format!(
                    "Cannot transition subscription {} from {:?} to {:?}",
                    self.id, self.status, target
                ),
            )
        })?;
        Ok(())
    }
}
