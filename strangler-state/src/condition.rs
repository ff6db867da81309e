use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::error::TransitionError;

/// Named transition triggers, per the machine's transition table. The name is
/// the contract: components never compare states directly, they
/// fire a condition and let the machine decide what follows.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Deserialize, Serialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    OrderPlaced,
    OrderFilled,
    OrderRejected,
    OrderTimeout,
    ForceClose,
    ExitConditions,
    HardStop,
    StrikeTested,
    StrikeBreached,
    AdjustmentOpportunity,
    AdjustmentComplete,
    RollOpportunity,
    RollComplete,
    EmergencyExit,
    PositionClosed,
}

impl Condition {
    /// Parses the wire/log form of a condition name. Callers that source a
    /// condition from outside the type system (config-driven tests, replayed
    /// event logs) go through here; an unrecognized name is `unknown_condition`,
    /// never a panic.
    pub fn parse(raw: &str) -> Result<Self, TransitionError> {
        Ok(match raw {
            "order_placed" => Condition::OrderPlaced,
            "order_filled" => Condition::OrderFilled,
            "order_rejected" => Condition::OrderRejected,
            "order_timeout" => Condition::OrderTimeout,
            "force_close" => Condition::ForceClose,
            "exit_conditions" => Condition::ExitConditions,
            "hard_stop" => Condition::HardStop,
            "strike_tested" => Condition::StrikeTested,
            "strike_breached" => Condition::StrikeBreached,
            "adjustment_opportunity" => Condition::AdjustmentOpportunity,
            "adjustment_complete" => Condition::AdjustmentComplete,
            "roll_opportunity" => Condition::RollOpportunity,
            "roll_complete" => Condition::RollComplete,
            "emergency_exit" => Condition::EmergencyExit,
            "position_closed" => Condition::PositionClosed,
            other => return Err(TransitionError::UnknownCondition(other.to_string())),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_declared_condition() {
        for name in [
            "order_placed",
            "order_filled",
            "order_rejected",
            "order_timeout",
            "force_close",
            "exit_conditions",
            "hard_stop",
            "strike_tested",
            "strike_breached",
            "adjustment_opportunity",
            "adjustment_complete",
            "roll_opportunity",
            "roll_complete",
            "emergency_exit",
            "position_closed",
        ] {
            assert!(Condition::parse(name).is_ok(), "failed to parse {name}");
        }
    }

    #[test]
    fn rejects_unknown_condition() {
        let err = Condition::parse("strike_rolled_backwards").unwrap_err();
        assert!(matches!(err, TransitionError::UnknownCondition(_)));
    }
}
