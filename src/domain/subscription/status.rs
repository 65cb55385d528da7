//! Subscription status state machine.
//!
//! A subscription alternates between active and cancelled; nothing is
//! ever hard-deleted.

use crate::domain::foundation::StateMachine;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Entitlement window is open.
    Active,

    /// User ended the subscription; may be resumed.
    Cancelled,
}

impl SubscriptionStatus {
    /// Storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Cancelled => "cancelled",
        }
    }
}

impl StateMachine for SubscriptionStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use SubscriptionStatus::*;
        matches!((self, target), (Active, Cancelled) | (Cancelled, Active))
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use SubscriptionStatus::*;
        match self {
            Active => vec![Cancelled],
            Cancelled => vec![Active],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_and_cancelled_alternate() {
        assert!(SubscriptionStatus::Active.can_transition_to(&SubscriptionStatus::Cancelled));
        assert!(SubscriptionStatus::Cancelled.can_transition_to(&SubscriptionStatus::Active));
    }

    #[test]
    fn no_self_edges() {
        assert!(!SubscriptionStatus::Active.can_transition_to(&SubscriptionStatus::Active));
        assert!(!SubscriptionStatus::Cancelled.can_transition_to(&SubscriptionStatus::Cancelled));
    }

    #[test]
    fn neither_state_is_terminal() {
        assert!(!SubscriptionStatus::Active.is_terminal());
        assert!(!SubscriptionStatus::Cancelled.is_terminal());
    }
}
