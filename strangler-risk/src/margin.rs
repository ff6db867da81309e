use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Reg-T margin requirement for one naked option side:
/// `net_credit + max(0.20 × underlying − OTM_amount, 0.10 × underlying)`.
///
/// `otm_amount` is the distance the strike sits out of the money (always
/// non-negative by construction — a strike that is ITM contributes `0`, the
/// maximally conservative case for this formula).
fn side_requirement(net_credit_per_contract: Decimal, underlying: Decimal, otm_amount: Decimal) -> Decimal {
    let otm_amount = otm_amount.max(Decimal::ZERO);
    let aggressive = dec!(0.20) * underlying - otm_amount;
    let floor = dec!(0.10) * underlying;
    net_credit_per_contract + aggressive.max(floor)
}

/// Full strangle Reg-T requirement: the worse (higher) of the put-side and
/// call-side requirements, since both legs cannot be tested simultaneously at
/// expiration, times quantity and the 100-share contract multiplier.
pub fn reg_t_margin(
    net_credit_per_contract: Decimal,
    underlying: Decimal,
    put_otm_amount: Decimal,
    call_otm_amount: Decimal,
    quantity: u32,
) -> Decimal {
    let put_requirement = side_requirement(net_credit_per_contract, underlying, put_otm_amount);
    let call_requirement = side_requirement(net_credit_per_contract, underlying, call_otm_amount);
    let worse = put_requirement.max(call_requirement);
    worse * Decimal::from(quantity) * Decimal::from(100)
}

/// Distance a strike sits out of the money: positive for OTM, `0` if the
/// strike has moved in the money (at which point Reg-T applies the floor,
/// not a negative "benefit").
pub fn otm_distance_put(underlying: Decimal, put_strike: Decimal) -> Decimal {
    (underlying - put_strike).max(Decimal::ZERO)
}

pub fn otm_distance_call(underlying: Decimal, call_strike: Decimal) -> Decimal {
    (call_strike - underlying).max(Decimal::ZERO)
}

/// The margin ceiling a new position must not exceed: `min(buying_power,
/// allocation_cap × account_balance)`.
pub fn margin_ceiling(buying_power: Decimal, account_balance: Decimal, allocation_cap: Decimal) -> Decimal {
    buying_power.min(allocation_cap * account_balance)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn otm_strikes_use_the_twenty_percent_rule_when_it_exceeds_the_floor() {
        // underlying 500, put strike 480 => otm_amount 20
        // aggressive = 0.20*500 - 20 = 80; floor = 0.10*500 = 50 -> 80 wins
        let requirement = side_requirement(dec!(2.10), dec!(500), dec!(20));
        assert_eq!(requirement, dec!(82.10));
    }

    #[test]
    fn deep_otm_strikes_fall_back_to_the_ten_percent_floor() {
        // otm_amount large enough that aggressive < floor
        let requirement = side_requirement(dec!(2.10), dec!(500), dec!(90));
        // aggressive = 100 - 90 = 10; floor = 50 -> floor wins
        assert_eq!(requirement, dec!(52.10));
    }

    #[test]
    fn reg_t_margin_takes_the_worse_side_and_scales_by_quantity_and_multiplier() {
        let margin = reg_t_margin(dec!(2.10), dec!(500), dec!(20), dec!(20), 2);
        // both sides symmetric here: 82.10 * 2 * 100
        assert_eq!(margin, dec!(16420));
    }

    #[test]
    fn margin_ceiling_is_the_tighter_of_buying_power_and_allocation_cap() {
        assert_eq!(margin_ceiling(dec!(10000), dec!(50000), dec!(0.10)), dec!(5000));
        assert_eq!(margin_ceiling(dec!(3000), dec!(50000), dec!(0.10)), dec!(3000));
    }
}
