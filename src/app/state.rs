//! Pile state management
//!
//! Defines the rotation state machine. A tilt is issued to the extreme card
//! and the order only changes once that card reports its animation finished.

use std::time::{Duration, Instant};

use crate::domain::error::UnmatchedReason;
use crate::domain::order::{Direction, SlotId};

/// Pile state - either idle or waiting for a card to finish its tilt
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PileState {
    /// No rotation in flight
    #[default]
    Idle,
    /// A tilt was issued and its completion has not arrived yet
    RotationPending(PendingRotation),
}

impl PileState {
    pub fn is_idle(&self) -> bool {
        matches!(self, PileState::Idle)
    }

    pub fn pending(&self) -> Option<&PendingRotation> {
        match self {
            PileState::RotationPending(pending) => Some(pending),
            PileState::Idle => None,
        }
    }
}

/// An issued tilt awaiting its completion notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRotation {
    pub direction: Direction,
    /// Slot whose card received the tilt
    pub target: SlotId,
    /// When the tilt was issued (for the liveness timeout)
    pub issued_at: Instant,
}

impl PendingRotation {
    pub fn new(direction: Direction, target: SlotId, issued_at: Instant) -> Self {
        Self {
            direction,
            target,
            issued_at,
        }
    }

    /// Time spent waiting as seen at `now`
    pub fn elapsed_at(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.issued_at)
    }

    pub fn is_timed_out_at(&self, now: Instant, timeout: Duration) -> bool {
        self.elapsed_at(now) >= timeout
    }
}

/// Events fed to the state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateEvent {
    /// A tilt command was sent to a card
    TiltIssued(PendingRotation),
    /// A card reported its tilt animation finished
    TiltFinished {
        direction: Direction,
        /// Reporting slot, when the host knows it
        slot: Option<SlotId>,
    },
    /// The pending rotation was abandoned by the caller
    Cancelled,
    /// The pending rotation exceeded its timeout
    TimedOut,
}

/// What the controller must do after a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    None,
    /// Finalize the rotation described by the closed request
    Commit(PendingRotation),
    /// The notification did not match; nothing changes
    Ignored(UnmatchedReason),
    /// The pending rotation was dropped without touching the order
    Abandoned(PendingRotation),
}

/// State machine for pile state transitions
pub struct StateMachine;

impl StateMachine {
    /// Processes a state event and returns the new state with its effect
    ///
    /// # Arguments
    /// * `current_state` - Current pile state
    /// * `event` - Event to process
    ///
    /// # Returns
    /// New pile state and what the controller must do about it
    pub fn process_event(current_state: PileState, event: StateEvent) -> (PileState, Effect) {
        match (current_state, event) {
            (PileState::Idle, StateEvent::TiltIssued(pending)) => {
                (PileState::RotationPending(pending), Effect::None)
            }

            (PileState::Idle, StateEvent::TiltFinished { direction, .. }) => (
                PileState::Idle,
                Effect::Ignored(UnmatchedReason::NotPending { got: direction }),
            ),

            (PileState::RotationPending(pending), StateEvent::TiltFinished { direction, slot }) => {
                if direction != pending.direction {
                    let reason = UnmatchedReason::DirectionMismatch {
                        expected: pending.direction,
                        got: direction,
                    };
                    return (PileState::RotationPending(pending), Effect::Ignored(reason));
                }
                if let Some(slot) = slot.filter(|slot| *slot != pending.target) {
                    let reason = UnmatchedReason::ForeignSlot {
                        expected: pending.target,
                        got: slot,
                    };
                    return (PileState::RotationPending(pending), Effect::Ignored(reason));
                }
                (PileState::Idle, Effect::Commit(pending))
            }

            (PileState::RotationPending(pending), StateEvent::Cancelled)
            | (PileState::RotationPending(pending), StateEvent::TimedOut) => {
                (PileState::Idle, Effect::Abandoned(pending))
            }

            // A second issue while pending is resolved by the controller's
            // overlap policy before it ever reaches here.
            (state, _) => (state, Effect::None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending(direction: Direction, slot: usize) -> PendingRotation {
        PendingRotation::new(direction, SlotId::new(slot), Instant::now())
    }

    #[test]
    fn default_state_is_idle() {
        assert!(PileState::default().is_idle());
    }

    #[test]
    fn issue_moves_to_pending() {
        let request = pending(Direction::Forward, 0);
        let (state, effect) =
            StateMachine::process_event(PileState::Idle, StateEvent::TiltIssued(request.clone()));
        assert_eq!(state, PileState::RotationPending(request));
        assert_eq!(effect, Effect::None);
    }

    #[test]
    fn matching_completion_commits() {
        let request = pending(Direction::Backward, 2);
        let (state, effect) = StateMachine::process_event(
            PileState::RotationPending(request.clone()),
            StateEvent::TiltFinished {
                direction: Direction::Backward,
                slot: Some(SlotId::new(2)),
            },
        );
        assert!(state.is_idle());
        assert_eq!(effect, Effect::Commit(request));
    }

    #[test]
    fn completion_while_idle_is_ignored() {
        let (state, effect) = StateMachine::process_event(
            PileState::Idle,
            StateEvent::TiltFinished {
                direction: Direction::Backward,
                slot: None,
            },
        );
        assert!(state.is_idle());
        assert_eq!(
            effect,
            Effect::Ignored(UnmatchedReason::NotPending {
                got: Direction::Backward
            })
        );
    }

    #[test]
    fn wrong_direction_keeps_pending() {
        let request = pending(Direction::Forward, 0);
        let (state, effect) = StateMachine::process_event(
            PileState::RotationPending(request.clone()),
            StateEvent::TiltFinished {
                direction: Direction::Backward,
                slot: None,
            },
        );
        assert_eq!(state, PileState::RotationPending(request));
        assert!(matches!(
            effect,
            Effect::Ignored(UnmatchedReason::DirectionMismatch { .. })
        ));
    }

    #[test]
    fn foreign_slot_keeps_pending() {
        let request = pending(Direction::Forward, 0);
        let (state, effect) = StateMachine::process_event(
            PileState::RotationPending(request),
            StateEvent::TiltFinished {
                direction: Direction::Forward,
                slot: Some(SlotId::new(1)),
            },
        );
        assert!(state.pending().is_some());
        assert!(matches!(
            effect,
            Effect::Ignored(UnmatchedReason::ForeignSlot { .. })
        ));
    }

    #[test]
    fn cancel_and_timeout_abandon() {
        for event in [StateEvent::Cancelled, StateEvent::TimedOut] {
            let request = pending(Direction::Forward, 0);
            let (state, effect) =
                StateMachine::process_event(PileState::RotationPending(request.clone()), event);
            assert!(state.is_idle());
            assert_eq!(effect, Effect::Abandoned(request));
        }
    }

    #[test]
    fn cancel_while_idle_does_nothing() {
        let (state, effect) = StateMachine::process_event(PileState::Idle, StateEvent::Cancelled);
        assert!(state.is_idle());
        assert_eq!(effect, Effect::None);
    }

    #[test]
    fn timeout_is_measured_from_issue() {
        let start = Instant::now();
        let request = PendingRotation::new(Direction::Forward, SlotId::new(0), start);
        let timeout = Duration::from_millis(500);
        assert!(!request.is_timed_out_at(start + Duration::from_millis(499), timeout));
        assert!(request.is_timed_out_at(start + timeout, timeout));
    }
}
