use crate::ids::{OrderId, PositionId};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Why a position's close was initiated.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Deserialize, Serialize, derive_more::Display)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    ProfitTarget,
    TimeExit,
    StopLoss,
    EmergencyExit,
    ForceClose,
    ExternalClose,
}

/// A single adjustment (strike roll or time roll) applied to an open position.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Adjustment {
    pub kind: AdjustmentKind,
    pub put_strike_delta: Decimal,
    pub call_strike_delta: Decimal,
    pub credit_delta: Decimal,
    pub note: SmolStr,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Deserialize, Serialize, derive_more::Display)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentKind {
    StrikeAdjustment,
    TimeRoll,
}

/// One short strangle: a short put and a short call, same underlying, expiration and quantity.
///
/// This type only carries data; the legality of its lifecycle is owned by
/// `strangler-state`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct Position {
    pub id: PositionId,
    pub symbol: SmolStr,
    pub put_strike: Decimal,
    pub call_strike: Decimal,
    pub expiration: NaiveDate,
    pub quantity: u32,
    pub credit_received: Decimal,
    pub entry_limit_price: Decimal,
    pub entry_date: DateTime<Utc>,
    pub exit_date: Option<DateTime<Utc>>,
    pub entry_iv: i32,
    pub entry_spot: Decimal,
    pub current_pnl: Decimal,
    pub dte: i64,
    pub entry_order_id: Option<OrderId>,
    pub exit_order_id: Option<OrderId>,
    pub exit_reason: Option<ExitReason>,
    pub adjustments: Vec<Adjustment>,
    pub state: PositionStateName,
}

/// The current [`strangler_state::PositionMachine`] state, persisted by name only
/// ("The State Machine ... is reconstructed from the position's persisted
/// state name and never itself persisted independently").
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Deserialize, Serialize, derive_more::Display,
)]
#[serde(rename_all = "snake_case")]
pub enum PositionStateName {
    Idle,
    Submitted,
    Open,
    FirstDown,
    SecondDown,
    ThirdDown,
    FourthDown,
    Adjusting,
    Rolling,
    Error,
    Closed,
}

impl Position {
    pub fn strike_adjustment_count(&self) -> usize {
        self.adjustments
            .iter()
            .filter(|a| a.kind == AdjustmentKind::StrikeAdjustment)
            .count()
    }

    pub fn time_roll_count(&self) -> usize {
        self.adjustments
            .iter()
            .filter(|a| a.kind == AdjustmentKind::TimeRoll)
            .count()
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, PositionStateName::Closed)
    }

    /// Allocated capital contributed by this position: the sum of
    /// `credit_received × quantity × 100` across non-closed positions.
    pub fn allocated_capital(&self) -> Decimal {
        if self.is_closed() {
            Decimal::ZERO
        } else {
            self.credit_received * Decimal::from(self.quantity) * Decimal::from(100)
        }
    }
}
