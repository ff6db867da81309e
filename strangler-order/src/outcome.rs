use rust_decimal::Decimal;

/// Result of polling an order to a terminal status or a poll deadline.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Filled { fill_price: Decimal, filled_qty: u32 },
    PartiallyFilled { fill_price: Decimal, filled_qty: u32 },
    Rejected(String),
    Canceled,
    Expired,
    /// The overall poll deadline elapsed with no terminal status observed.
    /// Not a failure: the reconciler resolves it on the next cycle.
    Unknown,
}

impl PollOutcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PollOutcome::Unknown)
    }
}
