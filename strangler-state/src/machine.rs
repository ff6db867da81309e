use strangler_types::{AdjustmentKind, PositionStateName};

use crate::condition::Condition;
use crate::error::TransitionError;

const MAX_STRIKE_ADJUSTMENTS: u8 = 3;
const MAX_TIME_ROLLS: u8 = 1;

/// Behavioral object logically attached to a [`strangler_types::Position`].
/// It owns no position data beyond the counters needed to
/// enforce the adjustment budget; everything else lives on the position and
/// is handed back to the caller to persist.
///
/// Only `state` is ever persisted (as `PositionStateName`); a machine is
/// always reconstructed fresh from that name plus the position's own
/// adjustment history, so `strike_adjustments`/`time_rolls` are recomputed
/// from `Position::strike_adjustment_count`/`time_roll_count` rather than
/// stored independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionStateMachine {
    state: PositionStateName,
    strike_adjustments: u8,
    time_rolls: u8,
}

impl PositionStateMachine {
    pub fn new() -> Self {
        Self {
            state: PositionStateName::Idle,
            strike_adjustments: 0,
            time_rolls: 0,
        }
    }

    /// Lazily reconstructs a machine from persisted state: the state name plus
    /// the adjustment counts derived from the position's own history. Transition
    /// history itself is never persisted and starts empty.
    pub fn from_persisted(state: PositionStateName, strike_adjustments: usize, time_rolls: usize) -> Self {
        Self {
            state,
            strike_adjustments: strike_adjustments.min(u8::MAX as usize) as u8,
            time_rolls: time_rolls.min(u8::MAX as usize) as u8,
        }
    }

    pub fn state(&self) -> PositionStateName {
        self.state
    }

    pub fn strike_adjustment_count(&self) -> u8 {
        self.strike_adjustments
    }

    pub fn time_roll_count(&self) -> u8 {
        self.time_rolls
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, PositionStateName::Closed)
    }

    /// Applies `condition`, returning the new state or the typed reason the
    /// machine refused. On any `Err`, `self` is left unchanged.
    pub fn transition(&mut self, condition: Condition) -> Result<PositionStateName, TransitionError> {
        use Condition::*;
        use PositionStateName::*;

        // The wildcard applies regardless of current state, even to `closed`
        // itself (idempotent), per "any -> force_close -> closed".
        if condition == ForceClose {
            self.state = Closed;
            return Ok(Closed);
        }

        let next = match (self.state, condition) {
            (Idle, OrderPlaced) => Submitted,
            (Submitted, OrderFilled) => Open,
            (Submitted, OrderRejected) => Error,
            (Submitted, OrderTimeout) => Error,
            (Open, ExitConditions) => FirstDown,
            (Open, PositionClosed) => Closed,
            (Open, HardStop) => ThirdDown,
            (Open, StrikeTested) => FirstDown,
            (FirstDown, StrikeBreached) => SecondDown,
            (SecondDown, AdjustmentOpportunity) => {
                self.consume_budget(AdjustmentKind::StrikeAdjustment)?;
                Adjusting
            }
            (Adjusting, AdjustmentComplete) => FirstDown,
            (SecondDown, RollOpportunity) => {
                self.consume_budget(AdjustmentKind::TimeRoll)?;
                Rolling
            }
            (Rolling, RollComplete) => FirstDown,
            (ThirdDown, EmergencyExit) => FourthDown,
            (FourthDown, PositionClosed) => Closed,
            _ => {
                return Err(TransitionError::IllegalTransition {
                    from: self.state,
                    condition,
                })
            }
        };

        self.state = next;
        Ok(next)
    }

    fn consume_budget(&mut self, kind: AdjustmentKind) -> Result<(), TransitionError> {
        match kind {
            AdjustmentKind::StrikeAdjustment if self.strike_adjustments < MAX_STRIKE_ADJUSTMENTS => {
                self.strike_adjustments += 1;
                Ok(())
            }
            AdjustmentKind::TimeRoll if self.time_rolls < MAX_TIME_ROLLS => {
                self.time_rolls += 1;
                Ok(())
            }
            kind => Err(TransitionError::BudgetExceeded { kind }),
        }
    }
}

impl Default for PositionStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walks_the_happy_path_to_closed() {
        let mut m = PositionStateMachine::new();
        assert_eq!(m.transition(Condition::OrderPlaced).unwrap(), PositionStateName::Submitted);
        assert_eq!(m.transition(Condition::OrderFilled).unwrap(), PositionStateName::Open);
        assert_eq!(m.transition(Condition::ExitConditions).unwrap(), PositionStateName::FirstDown);
        assert_eq!(m.transition(Condition::StrikeBreached).unwrap(), PositionStateName::SecondDown);
        assert_eq!(m.transition(Condition::AdjustmentOpportunity).unwrap(), PositionStateName::Adjusting);
        assert_eq!(m.transition(Condition::AdjustmentComplete).unwrap(), PositionStateName::FirstDown);
        assert_eq!(m.strike_adjustment_count(), 1);
    }

    #[test]
    fn short_circuits_open_to_closed_on_position_closed() {
        let mut m = PositionStateMachine::from_persisted(PositionStateName::Open, 0, 0);
        assert_eq!(m.transition(Condition::PositionClosed).unwrap(), PositionStateName::Closed);
    }

    #[test]
    fn rejects_illegal_transition_and_leaves_state_unchanged() {
        let mut m = PositionStateMachine::new();
        let err = m.transition(Condition::OrderFilled).unwrap_err();
        assert!(matches!(err, TransitionError::IllegalTransition { .. }));
        assert_eq!(m.state(), PositionStateName::Idle);
    }

    #[test]
    fn force_close_works_from_any_state_including_error() {
        let mut m = PositionStateMachine::from_persisted(PositionStateName::Error, 0, 0);
        assert_eq!(m.transition(Condition::ForceClose).unwrap(), PositionStateName::Closed);
    }

    #[test]
    fn strike_adjustment_budget_is_enforced() {
        let mut m = PositionStateMachine::from_persisted(PositionStateName::SecondDown, 3, 0);
        let err = m.transition(Condition::AdjustmentOpportunity).unwrap_err();
        assert_eq!(
            err,
            TransitionError::BudgetExceeded {
                kind: AdjustmentKind::StrikeAdjustment
            }
        );
        // Budget rejection does not move the position into `adjusting`.
        assert_eq!(m.state(), PositionStateName::SecondDown);
    }

    #[test]
    fn time_roll_budget_is_enforced_at_one() {
        let mut m = PositionStateMachine::from_persisted(PositionStateName::SecondDown, 0, 1);
        let err = m.transition(Condition::RollOpportunity).unwrap_err();
        assert_eq!(
            err,
            TransitionError::BudgetExceeded {
                kind: AdjustmentKind::TimeRoll
            }
        );
    }

    #[test]
    fn third_down_emergency_path_to_closed() {
        let mut m = PositionStateMachine::from_persisted(PositionStateName::ThirdDown, 0, 0);
        assert_eq!(m.transition(Condition::EmergencyExit).unwrap(), PositionStateName::FourthDown);
        assert_eq!(m.transition(Condition::PositionClosed).unwrap(), PositionStateName::Closed);
    }
}
