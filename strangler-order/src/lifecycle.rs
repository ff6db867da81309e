use strangler_state::Condition;
use strangler_types::OrderIntent;

use crate::outcome::PollOutcome;

/// Maps a poll outcome onto the state-machine condition it should raise.
/// `None` means the position's state is left untouched — the reconciler is
/// responsible for resolving it on a later cycle.
pub fn condition_for(intent: OrderIntent, outcome: &PollOutcome) -> Option<Condition> {
    match (intent, outcome) {
        // A partial fill still sitting open at the poll deadline is treated
        // as filled with the adjusted quantity: the caller reads
        // `filled_qty`/`fill_price` off the outcome itself.
        (OrderIntent::Open, PollOutcome::Filled { .. } | PollOutcome::PartiallyFilled { .. }) => {
            Some(Condition::OrderFilled)
        }
        (OrderIntent::Open, PollOutcome::Rejected(_) | PollOutcome::Canceled) => {
            Some(Condition::OrderRejected)
        }
        (OrderIntent::Open, PollOutcome::Expired) => Some(Condition::OrderTimeout),
        (OrderIntent::Open, PollOutcome::Unknown) => None,

        (OrderIntent::Close, PollOutcome::Filled { .. }) => Some(Condition::PositionClosed),
        (OrderIntent::Close, _) => None,
    }
}
