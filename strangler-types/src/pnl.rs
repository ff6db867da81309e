use chrono::NaiveDate;
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Map from exchange-local calendar date to realized P&L for that date.
///
/// Backed by an [`IndexMap`] so that serialized order matches insertion order,
/// keeping the on-disk JSON stable for the byte-for-byte round-trip property.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct DailyPnlLedger(IndexMap<NaiveDate, Decimal>);

impl DailyPnlLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, date: NaiveDate, pnl: Decimal) {
        *self.0.entry(date).or_insert(Decimal::ZERO) += pnl;
    }

    pub fn get(&self, date: NaiveDate) -> Decimal {
        self.0.get(&date).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NaiveDate, &Decimal)> {
        self.0.iter()
    }

    pub fn total(&self) -> Decimal {
        self.0.values().sum()
    }
}
