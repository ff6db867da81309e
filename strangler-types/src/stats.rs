use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Running aggregates over all closed positions, updated as a write-only delta
/// on every close.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Statistics {
    pub total_trades: u64,
    pub winning_trades: u64,
    pub losing_trades: u64,
    pub breakeven_trades: u64,
    pub total_pnl: Decimal,
    pub average_win: Decimal,
    pub average_loss: Decimal,
    pub max_single_trade_loss: Decimal,
    pub current_streak: i64,
    pub win_rate: Decimal,
}

impl Default for Statistics {
    fn default() -> Self {
        Self {
            total_trades: 0,
            winning_trades: 0,
            losing_trades: 0,
            breakeven_trades: 0,
            total_pnl: Decimal::ZERO,
            average_win: Decimal::ZERO,
            average_loss: Decimal::ZERO,
            max_single_trade_loss: Decimal::ZERO,
            current_streak: 0,
            win_rate: Decimal::ZERO,
        }
    }
}

impl Statistics {
    /// Apply the realized P&L of one freshly-closed position.
    pub fn record_close(&mut self, pnl: Decimal) {
        self.total_trades += 1;
        self.total_pnl += pnl;

        if pnl > Decimal::ZERO {
            self.winning_trades += 1;
            self.current_streak = if self.current_streak > 0 {
                self.current_streak + 1
            } else {
                1
            };
            let prior_total = self.average_win * Decimal::from(self.winning_trades - 1);
            self.average_win = (prior_total + pnl) / Decimal::from(self.winning_trades);
        } else if pnl < Decimal::ZERO {
            self.losing_trades += 1;
            self.current_streak = if self.current_streak < 0 {
                self.current_streak - 1
            } else {
                -1
            };
            let magnitude = -pnl;
            let prior_total = self.average_loss * Decimal::from(self.losing_trades - 1);
            self.average_loss = (prior_total + magnitude) / Decimal::from(self.losing_trades);
            if pnl < self.max_single_trade_loss {
                self.max_single_trade_loss = pnl;
            }
        } else {
            self.breakeven_trades += 1;
            self.current_streak = 0;
        }

        let decided = self.winning_trades + self.losing_trades;
        self.win_rate = if decided == 0 {
            Decimal::ZERO
        } else {
            Decimal::from(self.winning_trades) / Decimal::from(decided)
        };
    }
}
