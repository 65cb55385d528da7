//! State machine trait for status enums.
//!
//! Payment and subscription statuses both follow fixed transition
//! graphs; this trait gives each enum validated transitions and keeps
//! the legal-edge definition next to the enum itself.

use super::ValidationError;

/// Trait for status enums that represent state machines.
///
/// Implementors declare the legal edges; `transition_to` refuses
/// everything else.
pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug {
    /// Returns true if transition from self to target is valid.
    fn can_transition_to(&self, target: &Self) -> bool;

    /// Returns all valid target states from current state.
    fn valid_transitions(&self) -> Vec<Self>;

    /// Performs transition with validation, returning error if invalid.
    fn transition_to(&self, target: Self) -> Result<Self, ValidationError> {
        if self.can_transition_to(&target) {
            Ok(target)
        } else {
            Err(ValidationError::invalid_format(
                "state_transition",
                format!("Cannot transition from {:?} to {:?}", self, target),
            ))
        }
    }

    /// Checks if current state is terminal (no valid outgoing transitions).
    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum OrderPhase {
        Open,
        Settling,
        Done,
    }

    impl StateMachine for OrderPhase {
        fn can_transition_to(&self, target: &Self) -> bool {
            use OrderPhase::*;
            matches!((self, target), (Open, Settling) | (Settling, Done))
        }

        fn valid_transitions(&self) -> Vec<Self> {
            use OrderPhase::*;
            match self {
                Open => vec![Settling],
                Settling => vec![Done],
                Done => vec![],
            }
        }
    }

    #[test]
    fn legal_edge_is_accepted() {
        assert_eq!(
            OrderPhase::Open.transition_to(OrderPhase::Settling),
            Ok(OrderPhase::Settling)
        );
    }

    #[test]
    fn illegal_edge_is_rejected() {
        assert!(OrderPhase::Open.transition_to(OrderPhase::Done).is_err());
        assert!(OrderPhase::Done.transition_to(OrderPhase::Open).is_err());
    }

    #[test]
    fn terminal_state_has_no_outgoing_edges() {
        assert!(OrderPhase::Done.is_terminal());
        assert!(!OrderPhase::Open.is_terminal());
    }

    #[test]
    fn declared_edges_agree_with_predicate() {
        for phase in [OrderPhase::Open, OrderPhase::Settling, OrderPhase::Done] {
            for target in phase.valid_transitions() {
                assert!(phase.can_transition_to(&target));
            }
        }
    }
}
