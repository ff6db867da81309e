use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// One point in the rolling per-symbol implied-volatility history.
///
/// `iv_value` is stored as an integer 0-100 per resolution of the
/// "absolute IV vs IV rank" ambiguity: the core treats it as an opaque
/// percentile-like unit and never interprets it further.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct IvReading {
    pub symbol: SmolStr,
    pub date: NaiveDate,
    pub iv_value: i32,
    pub timestamp: DateTime<Utc>,
}

impl IvReading {
    pub fn new(symbol: impl Into<SmolStr>, date: NaiveDate, iv_value: i32, timestamp: DateTime<Utc>) -> Self {
        Self {
            symbol: symbol.into(),
            date,
            iv_value,
            timestamp,
        }
    }
}
