use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use strangler_types::OrderId;

/// Put or call, matching `strangler_types::position` but scoped to the
/// broker's quoting surface (an option chain entry, not a held leg).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Deserialize, Serialize, derive_more::Display)]
#[serde(rename_all = "snake_case")]
pub enum OptionSide {
    Put,
    Call,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Quote {
    pub last: Decimal,
    pub bid: Decimal,
    pub ask: Decimal,
    pub timestamp: DateTime<Utc>,
}

impl Quote {
    pub fn mid(&self) -> Decimal {
        (self.bid + self.ask) / Decimal::TWO
    }
}

/// One entry in an option chain, per `get_option_chain` output.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OptionQuote {
    pub strike: Decimal,
    pub side: OptionSide,
    pub bid: Decimal,
    pub ask: Decimal,
    pub delta: Decimal,
    pub iv: Decimal,
    pub volume: u64,
    pub open_interest: u64,
}

impl OptionQuote {
    pub fn mid(&self) -> Decimal {
        (self.bid + self.ask) / Decimal::TWO
    }
}

/// A single leg of a multi-leg order: which side, strike and expiration, and
/// whether it's a buy-to-close or sell-to-open action.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OrderLeg {
    pub side: OptionSide,
    pub strike: Decimal,
    pub expiration: NaiveDate,
    pub action: LegAction,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Deserialize, Serialize, derive_more::Display)]
#[serde(rename_all = "snake_case")]
pub enum LegAction {
    SellToOpen,
    BuyToClose,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Deserialize, Serialize, derive_more::Display)]
#[serde(rename_all = "snake_case")]
pub enum OrderDuration {
    Day,
    Gtc,
}

/// Broker-side handle returned on order placement.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OrderHandle {
    pub order_id: OrderId,
    pub status: OrderStatus,
}

/// Terminal/non-terminal order lifecycle status.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Deserialize, Serialize, derive_more::Display)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Open,
    PartiallyFilled,
    Filled,
    Rejected,
    Canceled,
    Expired,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Rejected | OrderStatus::Canceled | OrderStatus::Expired
        )
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OrderStatusReport {
    pub status: OrderStatus,
    pub filled_qty: u32,
    pub avg_fill_price: Option<Decimal>,
    pub legs: Vec<OrderLeg>,
}

/// A broker-reported open position, in OSI-like symbol format.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BrokerPosition {
    pub symbol: SmolStr,
    pub quantity: i64,
    pub avg_price: Decimal,
}

#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash, Deserialize, Serialize, derive_more::Display)]
#[serde(rename_all = "snake_case")]
pub enum MarketState {
    #[default]
    Open,
    Closed,
    Pre,
    Post,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MarketClock {
    pub state: MarketState,
    pub next_change: DateTime<Utc>,
}
