//! Tradier-shaped wire requests/responses. Broker HTTP transport details are
//! specified only at the operation level; these types model Tradier's
//! documented JSON envelopes closely enough to be realistic without chasing
//! every field.

use crate::types::{OrderDuration, OrderLeg, OrderStatus};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use strangler_integration::RestRequest;
use strangler_types::ClientOrderId;

#[derive(Debug, Serialize)]
pub struct EmptyBody;

#[derive(Debug, Serialize)]
pub struct EmptyQuery;

pub struct GetQuotes {
    pub params: GetQuotesParams,
}

#[derive(Debug, Serialize)]
pub struct GetQuotesParams {
    pub symbols: String,
    pub greeks: bool,
}

#[derive(Debug, Deserialize)]
pub struct QuotesResponse {
    pub quotes: QuotesEnvelope,
}

#[derive(Debug, Deserialize)]
pub struct QuotesEnvelope {
    #[serde(default)]
    pub quote: OneOrMany<TradierQuote>,
}

#[derive(Debug, Deserialize)]
pub struct TradierQuote {
    pub symbol: String,
    pub last: Decimal,
    pub bid: Decimal,
    pub ask: Decimal,
    #[serde(default)]
    pub trade_date: Option<i64>,
}

impl RestRequest for GetQuotes {
    type Response = QuotesResponse;
    type QueryParams = GetQuotesParams;
    type Body = EmptyBody;

    fn path(&self) -> Cow<'static, str> {
        Cow::Borrowed("v1/markets/quotes")
    }

    fn method(&self) -> reqwest::Method {
        reqwest::Method::GET
    }

    fn query_params(&self) -> Option<&Self::QueryParams> {
        Some(&self.params)
    }
}

pub struct GetOptionChain {
    pub params: GetOptionChainParams,
}

#[derive(Debug, Serialize)]
pub struct GetOptionChainParams {
    pub symbol: String,
    pub expiration: NaiveDate,
    pub greeks: bool,
}

#[derive(Debug, Deserialize)]
pub struct OptionChainResponse {
    pub options: OptionsEnvelope,
}

#[derive(Debug, Deserialize)]
pub struct OptionsEnvelope {
    #[serde(default)]
    pub option: OneOrMany<TradierOption>,
}

#[derive(Debug, Deserialize)]
pub struct TradierOption {
    pub strike: Decimal,
    pub option_type: String,
    pub bid: Decimal,
    pub ask: Decimal,
    pub volume: u64,
    pub open_interest: u64,
    #[serde(default)]
    pub greeks: Option<TradierGreeks>,
}

#[derive(Debug, Deserialize)]
pub struct TradierGreeks {
    pub delta: Decimal,
    pub mid_iv: Decimal,
}

impl RestRequest for GetOptionChain {
    type Response = OptionChainResponse;
    type QueryParams = GetOptionChainParams;
    type Body = EmptyBody;

    fn path(&self) -> Cow<'static, str> {
        Cow::Borrowed("v1/markets/options/chains")
    }

    fn method(&self) -> reqwest::Method {
        reqwest::Method::GET
    }

    fn query_params(&self) -> Option<&Self::QueryParams> {
        Some(&self.params)
    }
}

pub struct GetExpirations {
    pub params: GetExpirationsParams,
}

#[derive(Debug, Serialize)]
pub struct GetExpirationsParams {
    pub symbol: String,
}

#[derive(Debug, Deserialize)]
pub struct ExpirationsResponse {
    pub expirations: ExpirationsEnvelope,
}

#[derive(Debug, Deserialize)]
pub struct ExpirationsEnvelope {
    #[serde(default)]
    pub date: OneOrMany<NaiveDate>,
}

impl RestRequest for GetExpirations {
    type Response = ExpirationsResponse;
    type QueryParams = GetExpirationsParams;
    type Body = EmptyBody;

    fn path(&self) -> Cow<'static, str> {
        Cow::Borrowed("v1/markets/options/expirations")
    }

    fn method(&self) -> reqwest::Method {
        reqwest::Method::GET
    }

    fn query_params(&self) -> Option<&Self::QueryParams> {
        Some(&self.params)
    }
}

pub struct GetBalances {
    pub account_id: String,
}

#[derive(Debug, Deserialize)]
pub struct BalancesResponse {
    pub balances: BalancesBody,
}

#[derive(Debug, Deserialize)]
pub struct BalancesBody {
    pub total_equity: Decimal,
    pub option_short_value: Decimal,
    pub margin: Option<MarginBody>,
}

#[derive(Debug, Deserialize)]
pub struct MarginBody {
    pub option_buying_power: Decimal,
}

impl RestRequest for GetBalances {
    type Response = BalancesResponse;
    type QueryParams = EmptyQuery;
    type Body = EmptyBody;

    fn path(&self) -> Cow<'static, str> {
        Cow::Owned(format!("v1/accounts/{}/balances", self.account_id))
    }

    fn method(&self) -> reqwest::Method {
        reqwest::Method::GET
    }
}

pub struct GetPositions {
    pub account_id: String,
}

#[derive(Debug, Deserialize)]
pub struct PositionsResponse {
    pub positions: PositionsEnvelope,
}

#[derive(Debug, Deserialize)]
pub struct PositionsEnvelope {
    #[serde(default)]
    pub position: OneOrMany<TradierPosition>,
}

#[derive(Debug, Deserialize)]
pub struct TradierPosition {
    pub symbol: String,
    pub quantity: Decimal,
    pub cost_basis: Decimal,
}

impl RestRequest for GetPositions {
    type Response = PositionsResponse;
    type QueryParams = EmptyQuery;
    type Body = EmptyBody;

    fn path(&self) -> Cow<'static, str> {
        Cow::Owned(format!("v1/accounts/{}/positions", self.account_id))
    }

    fn method(&self) -> reqwest::Method {
        reqwest::Method::GET
    }
}

pub struct PlaceMultiLegOrder {
    pub account_id: String,
    pub body: MultiLegOrderBody,
}

#[derive(Debug, Serialize)]
pub struct MultiLegOrderBody {
    pub class: &'static str,
    pub symbol: String,
    pub duration: OrderDuration,
    pub price: Decimal,
    #[serde(rename = "type")]
    pub order_type: &'static str,
    pub quantity: u32,
    pub legs: Vec<OrderLeg>,
    pub tag: ClientOrderId,
    pub preview: bool,
    pub otoco_profit_target: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
pub struct OrderResponse {
    pub order: OrderResponseBody,
}

#[derive(Debug, Deserialize)]
pub struct OrderResponseBody {
    pub id: u64,
    pub status: String,
}

impl RestRequest for PlaceMultiLegOrder {
    type Response = OrderResponse;
    type QueryParams = EmptyQuery;
    type Body = MultiLegOrderBody;

    fn path(&self) -> Cow<'static, str> {
        Cow::Owned(format!("v1/accounts/{}/orders", self.account_id))
    }

    fn method(&self) -> reqwest::Method {
        reqwest::Method::POST
    }

    fn body(&self) -> Option<&Self::Body> {
        Some(&self.body)
    }

    fn idempotent(&self) -> bool {
        // Idempotent because every submission carries a stable client_order_id
        // (the `tag` field) that the broker deduplicates on.
        true
    }

    fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(30)
    }
}

pub struct GetOrderStatus {
    pub account_id: String,
    pub order_id: String,
}

#[derive(Debug, Deserialize)]
pub struct OrderStatusResponse {
    pub order: OrderStatusBody,
}

#[derive(Debug, Deserialize)]
pub struct OrderStatusBody {
    pub status: String,
    pub exec_quantity: Decimal,
    pub avg_fill_price: Option<Decimal>,
    #[serde(default)]
    pub leg: Vec<OrderLegStatus>,
}

#[derive(Debug, Deserialize)]
pub struct OrderLegStatus {
    pub option_symbol: String,
    pub side: String,
}

impl RestRequest for GetOrderStatus {
    type Response = OrderStatusResponse;
    type QueryParams = EmptyQuery;
    type Body = EmptyBody;

    fn path(&self) -> Cow<'static, str> {
        Cow::Owned(format!(
            "v1/accounts/{}/orders/{}",
            self.account_id, self.order_id
        ))
    }

    fn method(&self) -> reqwest::Method {
        reqwest::Method::GET
    }
}

pub struct CancelOrder {
    pub account_id: String,
    pub order_id: String,
}

#[derive(Debug, Deserialize)]
pub struct CancelOrderResponse {
    pub order: CancelOrderBody,
}

#[derive(Debug, Deserialize)]
pub struct CancelOrderBody {
    pub status: String,
}

impl RestRequest for CancelOrder {
    type Response = CancelOrderResponse;
    type QueryParams = EmptyQuery;
    type Body = EmptyBody;

    fn path(&self) -> Cow<'static, str> {
        Cow::Owned(format!(
            "v1/accounts/{}/orders/{}",
            self.account_id, self.order_id
        ))
    }

    fn method(&self) -> reqwest::Method {
        reqwest::Method::DELETE
    }

    fn idempotent(&self) -> bool {
        true
    }
}

pub struct GetMarketClock;

#[derive(Debug, Deserialize)]
pub struct MarketClockResponse {
    pub clock: MarketClockBody,
}

#[derive(Debug, Deserialize)]
pub struct MarketClockBody {
    pub state: String,
    pub next_change: String,
}

impl RestRequest for GetMarketClock {
    type Response = MarketClockResponse;
    type QueryParams = EmptyQuery;
    type Body = EmptyBody;

    fn path(&self) -> Cow<'static, str> {
        Cow::Borrowed("v1/markets/clock")
    }

    fn method(&self) -> reqwest::Method {
        reqwest::Method::GET
    }
}

/// Tradier collapses a single-element array into a bare object; this adapter
/// deserializes either shape into a `Vec`.
#[derive(Debug)]
pub struct OneOrMany<T>(pub Vec<T>);

impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        OneOrMany(Vec::new())
    }
}

impl<'de, T> Deserialize<'de> for OneOrMany<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        match value {
            serde_json::Value::Null => Ok(OneOrMany(Vec::new())),
            serde_json::Value::Array(_) => {
                let items = serde_json::from_value(value).map_err(serde::de::Error::custom)?;
                Ok(OneOrMany(items))
            }
            other => {
                let item = serde_json::from_value(other).map_err(serde::de::Error::custom)?;
                Ok(OneOrMany(vec![item]))
            }
        }
    }
}
