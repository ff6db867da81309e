use crate::error::BrokerError;
use crate::gateway::BrokerGateway;
use crate::requests::{
    CancelOrder, GetBalances, GetExpirations, GetExpirationsParams, GetMarketClock,
    GetOptionChain, GetOptionChainParams, GetOrderStatus, GetPositions, GetQuotes,
    GetQuotesParams, MultiLegOrderBody, PlaceMultiLegOrder,
};
use crate::types::{
    BrokerPosition, LegAction, MarketClock, MarketState, OptionQuote, OptionSide, OrderDuration,
    OrderHandle, OrderLeg, OrderStatus, OrderStatusReport, Quote,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal::prelude::{ToPrimitive};
use rust_decimal::Decimal;
use strangler_integration::{CancellationToken, Priority, RestClient};
use strangler_types::{ClientOrderId, OrderId};

/// Live gateway speaking Tradier's REST API through [`RestClient`].
#[derive(Clone)]
pub struct TradierGateway {
    client: RestClient,
    account_id: String,
}

impl TradierGateway {
    pub fn new(client: RestClient, account_id: impl Into<String>) -> Self {
        Self {
            client,
            account_id: account_id.into(),
        }
    }
}

fn parse_status(raw: &str) -> OrderStatus {
    match raw {
        "filled" => OrderStatus::Filled,
        "partially_filled" => OrderStatus::PartiallyFilled,
        "open" | "pending" => OrderStatus::Open,
        "rejected" => OrderStatus::Rejected,
        "canceled" | "cancelled" => OrderStatus::Canceled,
        "expired" => OrderStatus::Expired,
        _ => OrderStatus::Pending,
    }
}

fn parse_market_state(raw: &str) -> MarketState {
    match raw {
        "open" => MarketState::Open,
        "premarket" | "pre" => MarketState::Pre,
        "postmarket" | "post" => MarketState::Post,
        _ => MarketState::Closed,
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, BrokerError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| BrokerError::Validation(format!("unparseable timestamp {raw}: {err}")))
}

#[async_trait]
impl BrokerGateway for TradierGateway {
    async fn get_quote(&self, symbol: &str, cancel: &CancellationToken) -> Result<Quote, BrokerError> {
        let request = GetQuotes {
            params: GetQuotesParams {
                symbols: symbol.to_string(),
                greeks: false,
            },
        };
        let response = self.client.execute(&request, Priority::Normal, cancel).await?;
        let quote = response
            .quotes
            .quote
            .0
            .into_iter()
            .next()
            .ok_or_else(|| BrokerError::Validation(format!("no quote for {symbol}")))?;
        Ok(Quote {
            last: quote.last,
            bid: quote.bid,
            ask: quote.ask,
            timestamp: quote
                .trade_date
                .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
                .unwrap_or_else(Utc::now),
        })
    }

    async fn get_option_chain(
        &self,
        symbol: &str,
        expiration: NaiveDate,
        include_greeks: bool,
        cancel: &CancellationToken,
    ) -> Result<Vec<OptionQuote>, BrokerError> {
        let request = GetOptionChain {
            params: GetOptionChainParams {
                symbol: symbol.to_string(),
                expiration,
                greeks: include_greeks,
            },
        };
        let response = self.client.execute(&request, Priority::Normal, cancel).await?;
        Ok(response
            .options
            .option
            .0
            .into_iter()
            .filter_map(|opt| {
                let side = match opt.option_type.as_str() {
                    "call" => OptionSide::Call,
                    "put" => OptionSide::Put,
                    _ => return None,
                };
                let (delta, iv) = opt
                    .greeks
                    .map(|g| (g.delta, g.mid_iv))
                    .unwrap_or((Decimal::ZERO, Decimal::ZERO));
                Some(OptionQuote {
                    strike: opt.strike,
                    side,
                    bid: opt.bid,
                    ask: opt.ask,
                    delta,
                    iv,
                    volume: opt.volume,
                    open_interest: opt.open_interest,
                })
            })
            .collect())
    }

    async fn get_expirations(
        &self,
        symbol: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<NaiveDate>, BrokerError> {
        let request = GetExpirations {
            params: GetExpirationsParams {
                symbol: symbol.to_string(),
            },
        };
        let response = self.client.execute(&request, Priority::Normal, cancel).await?;
        Ok(response.expirations.date.0)
    }

    async fn get_account_balance(&self, cancel: &CancellationToken) -> Result<Decimal, BrokerError> {
        let request = GetBalances {
            account_id: self.account_id.clone(),
        };
        let response = self.client.execute(&request, Priority::Normal, cancel).await?;
        Ok(response.balances.total_equity)
    }

    async fn get_option_buying_power(&self, cancel: &CancellationToken) -> Result<Decimal, BrokerError> {
        let request = GetBalances {
            account_id: self.account_id.clone(),
        };
        let response = self.client.execute(&request, Priority::Normal, cancel).await?;
        response
            .balances
            .margin
            .map(|m| m.option_buying_power)
            .ok_or_else(|| BrokerError::Validation("account has no margin/option buying power".into()))
    }

    async fn get_positions(&self, cancel: &CancellationToken) -> Result<Vec<BrokerPosition>, BrokerError> {
        let request = GetPositions {
            account_id: self.account_id.clone(),
        };
        let response = self.client.execute(&request, Priority::Normal, cancel).await?;
        Ok(response
            .positions
            .position
            .0
            .into_iter()
            .map(|p| BrokerPosition {
                symbol: p.symbol.into(),
                quantity: p.quantity.to_i64().unwrap_or(0),
                avg_price: p.cost_basis,
            })
            .collect())
    }

    #[allow(clippy::too_many_arguments)]
    async fn place_multi_leg_order(
        &self,
        symbol: &str,
        legs: Vec<OrderLeg>,
        quantity: u32,
        limit_price: Decimal,
        duration: OrderDuration,
        client_order_id: ClientOrderId,
        preview: bool,
        otoco_profit_target: Option<Decimal>,
        cancel: &CancellationToken,
    ) -> Result<OrderHandle, BrokerError> {
        let request = PlaceMultiLegOrder {
            account_id: self.account_id.clone(),
            body: MultiLegOrderBody {
                class: "multileg",
                symbol: symbol.to_string(),
                duration,
                price: limit_price,
                order_type: "credit",
                quantity,
                legs,
                tag: client_order_id,
                preview,
                otoco_profit_target,
            },
        };
        let response = self.client.execute(&request, Priority::High, cancel).await?;
        Ok(OrderHandle {
            order_id: OrderId::new(response.order.id.to_string()),
            status: parse_status(&response.order.status),
        })
    }

    async fn get_order_status(
        &self,
        order_id: &OrderId,
        cancel: &CancellationToken,
    ) -> Result<OrderStatusReport, BrokerError> {
        let request = GetOrderStatus {
            account_id: self.account_id.clone(),
            order_id: order_id.0.to_string(),
        };
        let response = self.client.execute(&request, Priority::High, cancel).await?;
        let legs = response
            .order
            .leg
            .into_iter()
            .filter_map(|leg| parse_leg_symbol(&leg.option_symbol, &leg.side))
            .collect();
        Ok(OrderStatusReport {
            status: parse_status(&response.order.status),
            filled_qty: response.order.exec_quantity.to_u32().unwrap_or(0),
            avg_fill_price: response.order.avg_fill_price,
            legs,
        })
    }

    async fn cancel_order(&self, order_id: &OrderId, cancel: &CancellationToken) -> Result<(), BrokerError> {
        let request = CancelOrder {
            account_id: self.account_id.clone(),
            order_id: order_id.0.to_string(),
        };
        let response = self.client.execute(&request, Priority::High, cancel).await?;
        if response.order.status == "ok" || response.order.status == "pending" {
            Ok(())
        } else {
            Err(BrokerError::NotCancelable(response.order.status))
        }
    }

    async fn close_multi_leg(
        &self,
        symbol: &str,
        legs: Vec<OrderLeg>,
        quantity: u32,
        max_debit: Decimal,
        client_order_id: ClientOrderId,
        cancel: &CancellationToken,
    ) -> Result<OrderHandle, BrokerError> {
        self.place_multi_leg_order(
            symbol,
            legs,
            quantity,
            max_debit,
            OrderDuration::Day,
            client_order_id,
            false,
            None,
            cancel,
        )
        .await
    }

    async fn get_market_clock(&self, cancel: &CancellationToken) -> Result<MarketClock, BrokerError> {
        let request = GetMarketClock;
        let response = self.client.execute(&request, Priority::Low, cancel).await?;
        Ok(MarketClock {
            state: parse_market_state(&response.clock.state),
            next_change: parse_timestamp(&response.clock.next_change)?,
        })
    }
}

/// Parses an OSI-style option symbol (`ROOT` left-padded to 6 chars, `YYMMDD`,
/// `C`/`P`, strike in thousandths padded to 8 digits — the inverse of
/// `strangler_reconcile::osi::osi_symbol`) plus Tradier's own `side` string
/// into the fields [`OrderLeg`] needs. Returns `None` for a malformed symbol
/// or an unrecognized side rather than guessing.
fn parse_leg_symbol(osi_symbol: &str, side: &str) -> Option<OrderLeg> {
    let suffix_len = 15; // YYMMDD (6) + C/P (1) + strike thousandths (8)
    if osi_symbol.len() < suffix_len {
        return None;
    }
    let suffix = &osi_symbol[osi_symbol.len() - suffix_len..];
    let date_str = &suffix[0..6];
    let right = suffix.as_bytes()[6];
    let strike_str = &suffix[7..15];

    let expiration = NaiveDate::parse_from_str(date_str, "%y%m%d").ok()?;
    let option_side = match right {
        b'C' => OptionSide::Call,
        b'P' => OptionSide::Put,
        _ => return None,
    };
    let strike_thousandths: i64 = strike_str.parse().ok()?;
    let strike = Decimal::from(strike_thousandths) / Decimal::from(1000);
    let action = match side {
        "sell_to_open" => LegAction::SellToOpen,
        "buy_to_close" => LegAction::BuyToClose,
        _ => return None,
    };

    Some(OrderLeg { side: option_side, strike, expiration, action })
}

#[cfg(test)]
mod leg_symbol_tests {
    use super::*;

    #[test]
    fn parses_a_put_leg_being_sold_to_open() {
        let leg = parse_leg_symbol("SPY   260918P00480000", "sell_to_open").unwrap();
        assert_eq!(leg.side, OptionSide::Put);
        assert_eq!(leg.strike, Decimal::from(480));
        assert_eq!(leg.expiration, NaiveDate::from_ymd_opt(2026, 9, 18).unwrap());
        assert_eq!(leg.action, LegAction::SellToOpen);
    }

    #[test]
    fn parses_a_call_leg_being_bought_to_close() {
        let leg = parse_leg_symbol("SPY   260918C00452500", "buy_to_close").unwrap();
        assert_eq!(leg.side, OptionSide::Call);
        assert_eq!(leg.strike, Decimal::new(4525, 1));
        assert_eq!(leg.action, LegAction::BuyToClose);
    }

    #[test]
    fn rejects_a_symbol_shorter_than_the_fixed_suffix() {
        assert!(parse_leg_symbol("SPY", "sell_to_open").is_none());
    }

    #[test]
    fn rejects_an_unrecognized_side_string() {
        assert!(parse_leg_symbol("SPY   260918P00480000", "something_else").is_none());
    }
}
