use rust_decimal::Decimal;
use strangler_types::Position;

/// Sum of `credit_received × quantity × 100` across all non-closed positions
/// — the "allocated capital" invariant.
pub fn sum_allocated_capital(positions: &[Position]) -> Decimal {
    positions.iter().map(Position::allocated_capital).sum()
}

/// Whether adding `additional_margin` on top of the currently allocated
/// capital stays within `allocation_cap × account_balance`.
pub fn within_allocation_cap(
    positions: &[Position],
    additional_margin: Decimal,
    account_balance: Decimal,
    allocation_cap: Decimal,
) -> bool {
    let projected = sum_allocated_capital(positions) + additional_margin;
    projected <= allocation_cap * account_balance
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use rust_decimal_macros::dec;
    use strangler_types::{PositionId, PositionStateName};

    fn position(credit: Decimal, quantity: u32, state: PositionStateName) -> Position {
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
            current_pnl: Decimal::ZERO,
            dte: 45,
            entry_order_id: None,
            exit_order_id: None,
            exit_reason: None,
            adjustments: Vec::new(),
            state,
        }
    }

    #[test]
    fn closed_positions_do_not_count_toward_allocated_capital() {
        let positions = vec![
            position(dec!(2.00), 1, PositionStateName::Open),
            position(dec!(3.00), 2, PositionStateName::Closed),
        ];
        assert_eq!(sum_allocated_capital(&positions), dec!(200));
    }

    #[test]
    fn rejects_when_projected_allocation_exceeds_the_cap() {
        let positions = vec![position(dec!(2.00), 1, PositionStateName::Open)];
        // allocated = 200; cap = 10% of 5000 = 500; adding 400 => 600 > 500
        assert!(!within_allocation_cap(&positions, dec!(400), dec!(5000), dec!(0.10)));
        assert!(within_allocation_cap(&positions, dec!(250), dec!(5000), dec!(0.10)));
    }
}
