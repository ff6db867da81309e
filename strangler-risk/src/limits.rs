use rust_decimal::Decimal;

/// Account-level circuit breaker from `risk.max_daily_loss`: once
/// today's realized P&L has fallen to or past `-max_daily_loss`, the
/// orchestrator stops opening new positions for the rest of the day. Not a
/// per-position rule — see [`exceeds_position_loss_limit`] for that.
pub fn exceeds_daily_loss_limit(realized_today: Decimal, max_daily_loss: Decimal) -> bool {
    realized_today <= -max_daily_loss
}

/// Per-position overlay from `risk.max_position_loss`: an absolute
/// dollar floor enforced alongside (not instead of) the strategy's
/// percentage-of-credit stop-loss and emergency-exit thresholds.
pub fn exceeds_position_loss_limit(current_pnl: Decimal, max_position_loss: Decimal) -> bool {
    current_pnl <= -max_position_loss
}

/// Caps an entry candidate's contract count at `risk.max_contracts`.
pub fn clamp_quantity(quantity: u32, max_contracts: u32) -> u32 {
    quantity.min(max_contracts)
}
