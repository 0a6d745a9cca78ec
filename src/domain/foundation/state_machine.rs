//! State machine trait for lifecycle enums.
//!
//! Gives status enums (such as the broker connection state) a single way
//! to validate and perform transitions.

use super::ValidationError;

/// Trait for status enums that represent state machines.
///
/// Implementors define the legal edges; `transition_to` rejects the rest.
///
/// # Example
///
/// ```ignore
/// let next = ConnectionState::Disconnected.transition_to(ConnectionState::Connecting)?;
/// ```
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
            Err(ValidationError::invalid_transition(
                format!("{:?}", self),
                format!("{:?}", target),
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
    enum Socket {
        Accepting,
        Open,
        Closed,
    }

    impl StateMachine for Socket {
        fn can_transition_to(&self, target: &Self) -> bool {
            self.valid_transitions().contains(target)
        }

        fn valid_transitions(&self) -> Vec<Self> {
            match self {
                Socket::Accepting => vec![Socket::Open, Socket::Closed],
                Socket::Open => vec![Socket::Closed],
                Socket::Closed => vec![],
            }
        }
    }

    #[test]
    fn legal_edge_is_accepted() {
        assert_eq!(Socket::Accepting.transition_to(Socket::Open), Ok(Socket::Open));
    }

    #[test]
    fn illegal_edge_reports_both_states() {
        let err = Socket::Closed.transition_to(Socket::Open).unwrap_err();
        assert_eq!(
            err,
            ValidationError::invalid_transition("Closed", "Open")
        );
    }

    #[test]
    fn state_without_exits_is_terminal() {
        assert!(Socket::Closed.is_terminal());
        assert!(!Socket::Open.is_terminal());
    }
}
