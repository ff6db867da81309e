use crate::error::BrokerError;
use crate::types::{
    BrokerPosition, MarketClock, OptionQuote, OrderDuration, OrderHandle, OrderLeg,
    OrderStatusReport, Quote,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use smol_str::SmolStr;
use strangler_integration::CancellationToken;
use strangler_types::{ClientOrderId, OrderId};

/// Thin, typed façade over the brokerage. Every operation
/// accepts a [`CancellationToken`] honored at every suspension point (spec
/// §5). Implementors are process-wide singletons — safe to share
/// behind an `Arc`.
#[async_trait]
pub trait BrokerGateway: Send + Sync {
    async fn get_quote(&self, symbol: &str, cancel: &CancellationToken) -> Result<Quote, BrokerError>;

    async fn get_option_chain(
        &self,
        symbol: &str,
        expiration: NaiveDate,
        include_greeks: bool,
        cancel: &CancellationToken,
    ) -> Result<Vec<OptionQuote>, BrokerError>;

    async fn get_expirations(
        &self,
        symbol: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<NaiveDate>, BrokerError>;

    async fn get_account_balance(&self, cancel: &CancellationToken) -> Result<Decimal, BrokerError>;

    async fn get_option_buying_power(&self, cancel: &CancellationToken) -> Result<Decimal, BrokerError>;

    async fn get_positions(&self, cancel: &CancellationToken) -> Result<Vec<BrokerPosition>, BrokerError>;

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
    ) -> Result<OrderHandle, BrokerError>;

    async fn get_order_status(
        &self,
        order_id: &OrderId,
        cancel: &CancellationToken,
    ) -> Result<OrderStatusReport, BrokerError>;

    async fn cancel_order(&self, order_id: &OrderId, cancel: &CancellationToken) -> Result<(), BrokerError>;

    async fn close_multi_leg(
        &self,
        symbol: &str,
        legs: Vec<OrderLeg>,
        quantity: u32,
        max_debit: Decimal,
        client_order_id: ClientOrderId,
        cancel: &CancellationToken,
    ) -> Result<OrderHandle, BrokerError>;

    async fn get_market_clock(&self, cancel: &CancellationToken) -> Result<MarketClock, BrokerError>;
}

/// Convenience alias: the symbol type broker operations key their request on.
pub type Symbol = SmolStr;
