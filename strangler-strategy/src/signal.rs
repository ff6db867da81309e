use chrono::NaiveDate;
use rust_decimal::Decimal;
use smol_str::SmolStr;

use strangler_types::{ExitReason, PositionId};

/// An entry candidate: a specific put/call pair on a specific expiration,
/// ready to hand to the order manager.
#[derive(Debug, Clone, PartialEq)]
pub struct EntrySignal {
    pub symbol: SmolStr,
    pub expiration: NaiveDate,
    pub put_strike: Decimal,
    pub call_strike: Decimal,
    pub quantity: u32,
    pub credit: Decimal,
}

/// A request to close an existing position, with the limit-debit cap the
/// order manager should not exceed.
#[derive(Debug, Clone, PartialEq)]
pub struct ExitSignal {
    pub position_id: PositionId,
    pub reason: ExitReason,
    pub max_debit: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    Enter(EntrySignal),
    Exit(ExitSignal),
}
