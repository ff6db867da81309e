use chrono::NaiveDate;
use rust_decimal::Decimal;
use smol_str::SmolStr;

use strangler_broker::{MarketClock, OptionQuote};

/// One expiration's worth of chain data, already filtered to the underlying
/// and expiration the evaluator is considering.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpirationChain {
    pub expiration: NaiveDate,
    pub dte: i64,
    pub options: Vec<OptionQuote>,
}

impl ExpirationChain {
    pub fn puts(&self) -> impl Iterator<Item = &OptionQuote> {
        self.options.iter().filter(|o| o.side == strangler_broker::OptionSide::Put)
    }

    pub fn calls(&self) -> impl Iterator<Item = &OptionQuote> {
        self.options.iter().filter(|o| o.side == strangler_broker::OptionSide::Call)
    }
}

/// Market-side inputs to [`crate::evaluate::evaluate`]: a spot quote, the
/// day's IV reading, the market clock, and the set of candidate expirations
/// with their chains (`get_option_chain`/`get_expirations`,
/// collapsed into one immutable snapshot so the evaluator stays pure).
#[derive(Debug, Clone, PartialEq)]
pub struct MarketSnapshot {
    pub symbol: SmolStr,
    pub spot: Decimal,
    pub iv_percent: i32,
    pub clock: MarketClock,
    pub expirations: Vec<ExpirationChain>,
}

/// Account-side inputs: the two numbers the margin check needs
/// (`get_account_balance`/`get_option_buying_power`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccountSnapshot {
    pub account_balance: Decimal,
    pub option_buying_power: Decimal,
}
