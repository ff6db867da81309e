use proptest::prelude::*;
use strangler_state::{Condition, PositionStateMachine};

const CONDITIONS: &[Condition] = &[
    Condition::OrderPlaced,
    Condition::OrderFilled,
    Condition::OrderRejected,
    Condition::OrderTimeout,
    Condition::ForceClose,
    Condition::ExitConditions,
    Condition::HardStop,
    Condition::StrikeTested,
    Condition::StrikeBreached,
    Condition::AdjustmentOpportunity,
    Condition::AdjustmentComplete,
    Condition::RollOpportunity,
    Condition::RollComplete,
    Condition::EmergencyExit,
    Condition::PositionClosed,
];

fn condition_strategy() -> impl Strategy<Value = Condition> {
    (0..CONDITIONS.len()).prop_map(|i| CONDITIONS[i])
}

proptest! {
    /// No sequence of conditions can leave `closed` (it is terminal: the only
    /// condition accepted there is the idempotent `force_close`, which
    /// re-closes it).
    #[test]
    fn closed_is_terminal(conditions in proptest::collection::vec(condition_strategy(), 0..30)) {
        let mut machine = PositionStateMachine::new();
        for condition in conditions {
            let was_closed = machine.is_closed();
            let _ = machine.transition(condition);
            if was_closed {
                prop_assert!(machine.is_closed());
            }
        }
    }

    /// A failed transition never mutates machine state.
    #[test]
    fn errors_are_side_effect_free(conditions in proptest::collection::vec(condition_strategy(), 0..30)) {
        let mut machine = PositionStateMachine::new();
        for condition in conditions {
            let before = machine;
            if machine.transition(condition).is_err() {
                prop_assert_eq!(before, machine);
            }
        }
    }

    /// The strike-adjustment counter never exceeds the configured budget no
    /// matter how many times `adjustment_opportunity` is offered.
    #[test]
    fn strike_adjustment_budget_never_overruns(attempts in 0..20usize) {
        let mut machine = PositionStateMachine::from_persisted(
            strangler_types::PositionStateName::SecondDown,
            0,
            0,
        );
        for _ in 0..attempts {
            let _ = machine.transition(Condition::AdjustmentOpportunity);
            let _ = machine.transition(Condition::AdjustmentComplete);
            // Re-enter `second_down` deterministically between attempts so
            // the next `adjustment_opportunity` is a legal transition again.
            machine = PositionStateMachine::from_persisted(
                strangler_types::PositionStateName::SecondDown,
                machine.strike_adjustment_count(),
                machine.time_roll_count(),
            );
        }
        prop_assert!(machine.strike_adjustment_count() <= 3);
    }
}
