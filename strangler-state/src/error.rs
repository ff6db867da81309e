use serde::{Deserialize, Serialize};
use strangler_types::{AdjustmentKind, PositionStateName};
use thiserror::Error;

use crate::condition::Condition;

/// Typed failures a [`crate::machine::PositionStateMachine`] can return. The
/// machine never bypasses these: every illegal call is surfaced, never
/// swallowed.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Error)]
pub enum TransitionError {
    #[error("unknown condition: {0}")]
    UnknownCondition(String),

    #[error("cannot apply {condition} from state {from}")]
    IllegalTransition {
        from: PositionStateName,
        condition: Condition,
    },

    #[error("{kind} budget exhausted")]
    BudgetExceeded { kind: AdjustmentKind },
}
