use rust_decimal::Decimal;
use strangler_broker::OptionQuote;
use strangler_risk::{margin_ceiling, otm_distance_call, otm_distance_put, reg_t_margin, within_allocation_cap};
use strangler_types::{ExitReason, Position};

use crate::config::{StrategyConfig, EMERGENCY_EXIT_MULTIPLIER};
use crate::signal::{EntrySignal, ExitSignal, Signal};
use crate::snapshot::{AccountSnapshot, ExpirationChain, MarketSnapshot};

/// Pure decision function: given the current market, account and
/// position state, returns the signals the orchestrator should act on. Exits
/// are evaluated before entries, and at most one entry signal is produced per
/// cycle (one new position per trading cycle, matching the "no existing
/// position on the same expiration" entry precondition).
pub fn evaluate(
    market: &MarketSnapshot,
    account: &AccountSnapshot,
    positions: &[Position],
    config: &StrategyConfig,
) -> Vec<Signal> {
    let mut signals: Vec<Signal> = active_positions(positions)
        .filter_map(|position| evaluate_exit(position, &config.exit))
        .map(Signal::Exit)
        .collect();

    if let Some(entry) = evaluate_entry(market, account, positions, &config.entry) {
        signals.push(Signal::Enter(entry));
    }

    signals
}

fn active_positions(positions: &[Position]) -> impl Iterator<Item = &Position> {
    positions.iter().filter(|p| !p.is_closed())
}

/// A position's credit base for percentage thresholds: `credit_received ×
/// quantity × 100`, the same figure used by every profit/loss threshold
/// below.
fn credit_base(position: &Position) -> Decimal {
    position.credit_received * Decimal::from(position.quantity) * Decimal::from(100)
}

fn evaluate_exit(position: &Position, exit: &crate::config::ExitConfig) -> Option<ExitSignal> {
    let base = credit_base(position);
    let pnl = position.current_pnl;

    let emergency_triggered = pnl <= -EMERGENCY_EXIT_MULTIPLIER * base;
    let stop_loss_triggered = pnl <= -exit.stop_loss_multiplier * base;

    let reason = if emergency_triggered && stop_loss_triggered {
        // Both blown through: the tighter (numerically smaller) multiplier
        // wins, not whichever is checked first.
        if exit.stop_loss_multiplier < EMERGENCY_EXIT_MULTIPLIER {
            ExitReason::StopLoss
        } else {
            ExitReason::EmergencyExit
        }
    } else if emergency_triggered {
        ExitReason::EmergencyExit
    } else if stop_loss_triggered {
        ExitReason::StopLoss
    } else if pnl >= exit.profit_target * base {
        ExitReason::ProfitTarget
    } else if position.dte <= exit.max_dte {
        ExitReason::TimeExit
    } else {
        return None;
    };

    Some(ExitSignal {
        position_id: position.id,
        reason,
        max_debit: close_cost_cap(position),
    })
}

/// The limit-debit cap handed to the order manager: the credit originally
/// received, a conservative worst case that never pays more to close than was
/// collected to open.
fn close_cost_cap(position: &Position) -> Decimal {
    position.credit_received
}

fn evaluate_entry(
    market: &MarketSnapshot,
    account: &AccountSnapshot,
    positions: &[Position],
    entry: &crate::config::EntryConfig,
) -> Option<EntrySignal> {
    if active_positions(positions).count() >= entry.max_positions {
        return None;
    }

    if market.iv_percent < entry.min_iv_percent {
        return None;
    }

    let occupied_expirations: Vec<_> = active_positions(positions)
        .filter(|p| p.symbol == market.symbol)
        .map(|p| p.expiration)
        .collect();

    let chain = select_expiration(market, entry, &occupied_expirations)?;

    let put = select_leg(chain.puts(), market.spot, entry, Side::Put)?;
    let call = select_leg(chain.calls(), market.spot, entry, Side::Call)?;

    let credit = put.mid() + call.mid();
    if credit < entry.min_credit {
        return None;
    }

    let put_otm = otm_distance_put(market.spot, put.strike);
    let call_otm = otm_distance_call(market.spot, call.strike);
    let quantity = 1u32;
    let margin = reg_t_margin(credit, market.spot, put_otm, call_otm, quantity);

    let ceiling = margin_ceiling(account.option_buying_power, account.account_balance, entry.allocation_cap);
    if margin > ceiling {
        return None;
    }
    if !within_allocation_cap(positions, margin, account.account_balance, entry.allocation_cap) {
        return None;
    }

    Some(EntrySignal {
        symbol: market.symbol.clone(),
        expiration: chain.expiration,
        put_strike: put.strike,
        call_strike: call.strike,
        quantity,
        credit,
    })
}

/// Smallest `|dte - target|`, ties broken by the earlier expiration date.
fn select_expiration<'a>(
    market: &'a MarketSnapshot,
    entry: &crate::config::EntryConfig,
    occupied: &[chrono::NaiveDate],
) -> Option<&'a ExpirationChain> {
    market
        .expirations
        .iter()
        .filter(|chain| !occupied.contains(&chain.expiration))
        .filter(|chain| (chain.dte - entry.target_dte).abs() <= entry.dte_tolerance)
        .min_by(|a, b| {
            let a_distance = (a.dte - entry.target_dte).abs();
            let b_distance = (b.dte - entry.target_dte).abs();
            a_distance.cmp(&b_distance).then_with(|| a.expiration.cmp(&b.expiration))
        })
}

#[derive(Clone, Copy)]
enum Side {
    Put,
    Call,
}

/// Among out-of-the-money candidates meeting the liquidity floor, the one
/// whose `|delta - target|` is smallest, ties broken by the wider OTM
/// distance (the more conservative strike).
fn select_leg<'a>(
    candidates: impl Iterator<Item = &'a OptionQuote>,
    spot: Decimal,
    entry: &crate::config::EntryConfig,
    side: Side,
) -> Option<&'a OptionQuote> {
    candidates
        .filter(|q| q.volume >= entry.min_volume && q.open_interest >= entry.min_open_interest)
        .filter(|q| is_otm(q, spot, side))
        .min_by(|a, b| {
            let a_distance = (a.delta.abs() - entry.delta_target).abs();
            let b_distance = (b.delta.abs() - entry.delta_target).abs();
            a_distance
                .cmp(&b_distance)
                .then_with(|| otm_amount(b, spot, side).cmp(&otm_amount(a, spot, side)))
        })
}

fn is_otm(quote: &OptionQuote, spot: Decimal, side: Side) -> bool {
    match side {
        Side::Put => quote.strike < spot,
        Side::Call => quote.strike > spot,
    }
}

fn otm_amount(quote: &OptionQuote, spot: Decimal, side: Side) -> Decimal {
    match side {
        Side::Put => otm_distance_put(spot, quote.strike),
        Side::Call => otm_distance_call(spot, quote.strike),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use rust_decimal_macros::dec;
    use strangler_broker::{MarketClock, MarketState, OptionSide};
    use strangler_types::PositionId;

    fn quote(strike: Decimal, side: OptionSide, delta: Decimal, bid: Decimal, ask: Decimal) -> OptionQuote {
        OptionQuote {
            strike,
            side,
            bid,
            ask,
            delta,
            iv: dec!(0.20),
            volume: 500,
            open_interest: 1000,
        }
    }

    fn position(credit: Decimal, quantity: u32, pnl: Decimal, dte: i64) -> Position {
        Position {
            id: PositionId::random(),
            symbol: "SPY".into(),
            put_strike: dec!(480),
            call_strike: dec!(520),
            expiration: NaiveDate::from_ymd_opt(2026, 9, 18).unwrap(),
            quantity,
            credit_received: credit,
            entry_limit_price: credit,
            entry_date: Utc::now(),
            exit_date: None,
            entry_iv: 25,
            entry_spot: dec!(500),
            current_pnl: pnl,
            dte,
            entry_order_id: None,
            exit_order_id: None,
            exit_reason: None,
            adjustments: Vec::new(),
            state: strangler_types::PositionStateName::Open,
        }
    }

    fn exit_config() -> crate::config::ExitConfig {
        crate::config::ExitConfig::default()
    }

    #[test]
    fn emergency_exit_wins_over_stop_loss_when_both_fire() {
        // credit_base = 2.00 * 1 * 100 = 200; -2.5x = -500 (stop loss), -2.0x = -400 (emergency)
        let p = position(dec!(2.00), 1, dec!(-600), 40);
        let signal = evaluate_exit(&p, &exit_config()).unwrap();
        assert_eq!(signal.reason, ExitReason::EmergencyExit);
    }

    #[test]
    fn stop_loss_fires_when_its_threshold_is_tighter_than_the_hardcoded_emergency_floor() {
        // base = 1.00 * 1 * 100 = 100; a stop_loss_multiplier of 1.0 makes -100 the
        // trigger, well short of the hardcoded emergency floor at -200.
        let mut config = exit_config();
        config.stop_loss_multiplier = dec!(1.0);
        let p = position(dec!(1.00), 1, dec!(-150), 40);
        let signal = evaluate_exit(&p, &config).unwrap();
        assert_eq!(signal.reason, ExitReason::StopLoss);
    }

    #[test]
    fn stop_loss_wins_when_it_is_tighter_and_both_thresholds_are_blown_through() {
        // base = 100; stop_loss_multiplier 1.0 triggers at -100, the hardcoded
        // emergency floor at -200. pnl -250 blows through both, so the
        // tighter (stop-loss) threshold must be the reported reason.
        let mut config = exit_config();
        config.stop_loss_multiplier = dec!(1.0);
        let p = position(dec!(1.00), 1, dec!(-250), 40);
        let signal = evaluate_exit(&p, &config).unwrap();
        assert_eq!(signal.reason, ExitReason::StopLoss);
    }

    #[test]
    fn profit_target_fires_at_fifty_percent_of_credit() {
        let p = position(dec!(2.00), 1, dec!(100), 40);
        let signal = evaluate_exit(&p, &exit_config()).unwrap();
        assert_eq!(signal.reason, ExitReason::ProfitTarget);
    }

    #[test]
    fn time_exit_fires_at_or_below_max_dte() {
        let p = position(dec!(2.00), 1, dec!(0), 21);
        let signal = evaluate_exit(&p, &exit_config()).unwrap();
        assert_eq!(signal.reason, ExitReason::TimeExit);
    }

    #[test]
    fn no_exit_signal_when_nothing_has_triggered() {
        let p = position(dec!(2.00), 1, dec!(10), 40);
        assert!(evaluate_exit(&p, &exit_config()).is_none());
    }

    fn market_with_single_expiration(dte: i64, puts: Vec<OptionQuote>, calls: Vec<OptionQuote>) -> MarketSnapshot {
        let mut options = puts;
        options.extend(calls);
        MarketSnapshot {
            symbol: "SPY".into(),
            spot: dec!(500),
            iv_percent: 40,
            clock: MarketClock {
                state: MarketState::Open,
                next_change: Utc::now(),
            },
            expirations: vec![ExpirationChain {
                expiration: NaiveDate::from_ymd_opt(2026, 11, 2).unwrap(),
                dte,
                options,
            }],
        }
    }

    fn account() -> AccountSnapshot {
        AccountSnapshot {
            account_balance: dec!(100000),
            option_buying_power: dec!(50000),
        }
    }

    #[test]
    fn entry_selects_strikes_closest_to_target_delta() {
        let market = market_with_single_expiration(
            45,
            vec![
                quote(dec!(470), OptionSide::Put, dec!(-0.10), dec!(0.90), dec!(1.00)),
                quote(dec!(480), OptionSide::Put, dec!(-0.16), dec!(1.90), dec!(2.00)),
            ],
            vec![
                quote(dec!(520), OptionSide::Call, dec!(0.16), dec!(1.85), dec!(1.95)),
                quote(dec!(530), OptionSide::Call, dec!(0.08), dec!(0.80), dec!(0.90)),
            ],
        );
        let entry = evaluate_entry(&market, &account(), &[], &crate::config::EntryConfig::default()).unwrap();
        assert_eq!(entry.put_strike, dec!(480));
        assert_eq!(entry.call_strike, dec!(520));
    }

    #[test]
    fn entry_is_skipped_when_no_expiration_is_within_the_dte_window() {
        let market = market_with_single_expiration(
            10,
            vec![quote(dec!(480), OptionSide::Put, dec!(-0.16), dec!(1.90), dec!(2.00))],
            vec![quote(dec!(520), OptionSide::Call, dec!(0.16), dec!(1.85), dec!(1.95))],
        );
        assert!(evaluate_entry(&market, &account(), &[], &crate::config::EntryConfig::default()).is_none());
    }

    #[test]
    fn entry_is_skipped_when_iv_is_below_threshold() {
        let mut market = market_with_single_expiration(
            45,
            vec![quote(dec!(480), OptionSide::Put, dec!(-0.16), dec!(1.90), dec!(2.00))],
            vec![quote(dec!(520), OptionSide::Call, dec!(0.16), dec!(1.85), dec!(1.95))],
        );
        market.iv_percent = 5;
        assert!(evaluate_entry(&market, &account(), &[], &crate::config::EntryConfig::default()).is_none());
    }

    #[test]
    fn entry_is_skipped_when_an_active_position_already_holds_that_expiration() {
        let market = market_with_single_expiration(
            45,
            vec![quote(dec!(480), OptionSide::Put, dec!(-0.16), dec!(1.90), dec!(2.00))],
            vec![quote(dec!(520), OptionSide::Call, dec!(0.16), dec!(1.85), dec!(1.95))],
        );
        let mut existing = position(dec!(2.00), 1, dec!(0), 45);
        existing.expiration = market.expirations[0].expiration;
        assert!(evaluate_entry(&market, &account(), &[existing], &crate::config::EntryConfig::default()).is_none());
    }

    #[test]
    fn entry_is_skipped_when_margin_exceeds_the_buying_power_ceiling() {
        let market = market_with_single_expiration(
            45,
            vec![quote(dec!(480), OptionSide::Put, dec!(-0.16), dec!(1.90), dec!(2.00))],
            vec![quote(dec!(520), OptionSide::Call, dec!(0.16), dec!(1.85), dec!(1.95))],
        );
        let tiny_account = AccountSnapshot {
            account_balance: dec!(1000),
            option_buying_power: dec!(500),
        };
        assert!(evaluate_entry(&market, &tiny_account, &[], &crate::config::EntryConfig::default()).is_none());
    }

    #[test]
    fn evaluate_produces_exits_before_the_entry_signal() {
        let market = market_with_single_expiration(
            45,
            vec![quote(dec!(480), OptionSide::Put, dec!(-0.16), dec!(1.90), dec!(2.00))],
            vec![quote(dec!(520), OptionSide::Call, dec!(0.16), dec!(1.85), dec!(1.95))],
        );
        let closing = position(dec!(2.00), 1, dec!(100), 40);
        let signals = evaluate(&market, &account(), &[closing], &StrategyConfig::default());
        assert!(matches!(signals[0], Signal::Exit(_)));
        assert!(matches!(signals[1], Signal::Enter(_)));
    }
}
