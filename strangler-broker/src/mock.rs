//! In-memory [`BrokerGateway`] for tests, grounded on
//! `barter-execution::client::mock`'s pattern of a config-seeded fake that
//! implements the real execution trait directly (no network).

use crate::error::BrokerError;
use crate::gateway::BrokerGateway;
use crate::types::{
    BrokerPosition, MarketClock, MarketState, OptionQuote, OrderDuration, OrderHandle, OrderLeg,
    OrderStatus, OrderStatusReport, Quote,
};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::collections::HashMap;
use strangler_integration::CancellationToken;
use strangler_types::{ClientOrderId, OrderId};

#[derive(Debug, Default)]
pub struct MockState {
    pub quotes: HashMap<String, Quote>,
    pub chains: HashMap<NaiveDate, Vec<OptionQuote>>,
    pub expirations: Vec<NaiveDate>,
    pub account_balance: Decimal,
    pub option_buying_power: Decimal,
    pub positions: Vec<BrokerPosition>,
    pub orders: HashMap<String, OrderStatusReport>,
    pub market_state: MarketState,
    pub next_order_id: u64,
    pub placed_client_order_ids: Vec<ClientOrderId>,
}

/// A fully in-memory broker used across `strangler-order`, `strangler-reconcile`
/// and `strangler-engine` test suites. Every method locks the shared
/// [`MockState`], so scenarios are scripted by mutating the state directly.
#[derive(Clone, Default)]
pub struct MockBrokerGateway {
    pub state: std::sync::Arc<Mutex<MockState>>,
}

impl MockBrokerGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: MockState) -> Self {
        Self {
            state: std::sync::Arc::new(Mutex::new(state)),
        }
    }
}

#[async_trait]
impl BrokerGateway for MockBrokerGateway {
    async fn get_quote(&self, symbol: &str, _cancel: &CancellationToken) -> Result<Quote, BrokerError> {
        self.state
            .lock()
            .quotes
            .get(symbol)
            .cloned()
            .ok_or_else(|| BrokerError::Validation(format!("no mock quote for {symbol}")))
    }

    async fn get_option_chain(
        &self,
        _symbol: &str,
        expiration: NaiveDate,
        _include_greeks: bool,
        _cancel: &CancellationToken,
    ) -> Result<Vec<OptionQuote>, BrokerError> {
        Ok(self.state.lock().chains.get(&expiration).cloned().unwrap_or_default())
    }

    async fn get_expirations(
        &self,
        _symbol: &str,
        _cancel: &CancellationToken,
    ) -> Result<Vec<NaiveDate>, BrokerError> {
        Ok(self.state.lock().expirations.clone())
    }

    async fn get_account_balance(&self, _cancel: &CancellationToken) -> Result<Decimal, BrokerError> {
        Ok(self.state.lock().account_balance)
    }

    async fn get_option_buying_power(&self, _cancel: &CancellationToken) -> Result<Decimal, BrokerError> {
        Ok(self.state.lock().option_buying_power)
    }

    async fn get_positions(&self, _cancel: &CancellationToken) -> Result<Vec<BrokerPosition>, BrokerError> {
        Ok(self.state.lock().positions.clone())
    }

    #[allow(clippy::too_many_arguments)]
    async fn place_multi_leg_order(
        &self,
        _symbol: &str,
        legs: Vec<OrderLeg>,
        _quantity: u32,
        limit_price: Decimal,
        _duration: OrderDuration,
        client_order_id: ClientOrderId,
        _preview: bool,
        _otoco_profit_target: Option<Decimal>,
        _cancel: &CancellationToken,
    ) -> Result<OrderHandle, BrokerError> {
        let mut state = self.state.lock();

        let already_placed = state.placed_client_order_ids.contains(&client_order_id);
        if already_placed {
            // Idempotent replay: surface the same order rather than creating a new one.
            if let Some((order_id, report)) = state
                .orders
                .iter()
                .find(|(_, r)| r.legs == legs)
                .map(|(k, v)| (k.clone(), v.clone()))
            {
                return Ok(OrderHandle {
                    order_id: OrderId::new(order_id),
                    status: report.status,
                });
            }
        }

        state.next_order_id += 1;
        let order_id = state.next_order_id.to_string();
        state.placed_client_order_ids.push(client_order_id);
        state.orders.insert(
            order_id.clone(),
            OrderStatusReport {
                status: OrderStatus::Open,
                filled_qty: 0,
                avg_fill_price: Some(limit_price),
                legs,
            },
        );
        Ok(OrderHandle {
            order_id: OrderId::new(order_id),
            status: OrderStatus::Open,
        })
    }

    async fn get_order_status(
        &self,
        order_id: &OrderId,
        _cancel: &CancellationToken,
    ) -> Result<OrderStatusReport, BrokerError> {
        self.state
            .lock()
            .orders
            .get(order_id.0.as_str())
            .cloned()
            .ok_or_else(|| BrokerError::Validation(format!("no mock order {order_id}")))
    }

    async fn cancel_order(&self, order_id: &OrderId, _cancel: &CancellationToken) -> Result<(), BrokerError> {
        let mut state = self.state.lock();
        match state.orders.get_mut(order_id.0.as_str()) {
            Some(order) if !order.status.is_terminal() => {
                order.status = OrderStatus::Canceled;
                Ok(())
            }
            Some(_) => Err(BrokerError::NotCancelable("already terminal".into())),
            None => Err(BrokerError::Validation(format!("no mock order {order_id}"))),
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

    async fn get_market_clock(&self, _cancel: &CancellationToken) -> Result<MarketClock, BrokerError> {
        let state = self.state.lock();
        Ok(MarketClock {
            state: state.market_state,
            next_change: Utc::now(),
        })
    }
}
