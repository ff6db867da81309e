use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use strangler_broker::OptionSide;

/// Encodes an OSI-style option symbol, the format assumed when reading
/// broker position listings: `ROOT` padded to 6 chars, `YYMMDD`, `C`/`P`,
/// strike in thousandths padded to 8 digits.
pub fn osi_symbol(root: &str, expiration: NaiveDate, side: OptionSide, strike: Decimal) -> String {
    let right = match side {
        OptionSide::Call => 'C',
        OptionSide::Put => 'P',
    };
    let strike_thousandths = (strike * Decimal::from(1000)).round().to_i64().unwrap_or(0);
    format!(
        "{root:<6}{date}{right}{strike:08}",
        root = root,
        date = expiration.format("%y%m%d"),
        strike = strike_thousandths,
    )
}
