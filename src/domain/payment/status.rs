//! Payment status state machine.
//!
//! A payment is created pending, settles or fails exactly once, and a
//! settled payment can later be refunded by an administrative action.
//! No other edge exists.

use crate::domain::foundation::StateMachine;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Intent recorded, awaiting gateway confirmation.
    Pending,

    /// Gateway confirmed the money moved.
    Completed,

    /// Gateway definitively declined or the attempt was abandoned.
    Failed,

    /// Completed payment reversed by an administrator.
    Refunded,
}

impl PaymentStatus {
    /// True while a gateway confirmation may still land.
    pub fn is_confirmable(&self) -> bool {
        matches!(self, PaymentStatus::Pending)
    }

    /// Storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

impl StateMachine for PaymentStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use PaymentStatus::*;
        matches!(
            (self, target),
            (Pending, Completed) | (Pending, Failed) | (Completed, Refunded)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use PaymentStatus::*;
        match self {
            Pending => vec![Completed, Failed],
            Completed => vec![Refunded],
            Failed => vec![],
            Refunded => vec![],
        }
    }
}
