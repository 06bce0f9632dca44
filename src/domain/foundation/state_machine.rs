//! State machine trait for status enums.
//!
//! Gives every lifecycle status (subscription, payment) the same interface
//! for validating transitions, plus an idempotent variant for event-driven
//! updates that may be replayed.

use super::ValidationError;

/// Trait for status enums that represent state machines.
///
/// Implementors define the valid edges; validated transitions come for free.
///
/// ```ignore
/// let next = SubscriptionStatus::Active.transition_to(SubscriptionStatus::Paused)?;
/// // Replayed webhook: already paused, nothing to do.
/// let same = next.settle_to(SubscriptionStatus::Paused)?;
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
            Err(ValidationError::invalid_format(
                "state_transition",
                format!("Cannot transition from {:?} to {:?}", self, target),
            ))
        }
    }

    /// Like `transition_to`, but arriving at the current state is a no-op.
    ///
    /// Used for externally delivered events where the same target state can
    /// be applied more than once.
    fn settle_to(&self, target: Self) -> Result<Self, ValidationError> {
        if *self == target {
            return Ok(target);
        }
        self.transition_to(target)
    }

    /// Checks if current state is terminal (no valid outgoing transitions).
    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}
