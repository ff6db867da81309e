use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use rust_decimal_macros::dec;

use strangler_broker::{
    MarketState, MockBrokerGateway, OptionQuote, OptionSide, OrderStatus, Quote,
};
use strangler_engine::config::RiskConfig;
use strangler_engine::cycle::Cycle;
use strangler_integration::CancellationToken;
use strangler_order::PollConfig;
use strangler_strategy::StrategyConfig;
use strangler_store::DurableStore;
use strangler_types::{Position, PositionId, PositionStateName};

fn fast_poll() -> PollConfig {
    PollConfig {
        initial_delay: Duration::from_millis(2),
        interval: Duration::from_millis(2),
        deadline: Duration::from_millis(60),
    }
}

fn generous_risk() -> RiskConfig {
    RiskConfig {
        max_daily_loss: dec!(100000),
        max_position_loss: dec!(100000),
        max_contracts: 10,
    }
}

fn open_all_day_schedule() -> strangler_engine::config::ScheduleConfig {
    toml::from_str(
        r#"
        market_open = "00:00"
        market_close = "23:59"
        trading_start = "00:00"
        trading_end = "23:59"
        "#,
    )
    .unwrap()
}

async fn fresh_store() -> DurableStore {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");
    std::mem::forget(dir);
    DurableStore::load(path).await.unwrap()
}

/// 45 days out from whenever the suite runs, landing squarely inside the
/// default entry window (target 45, tolerance 5) regardless of the date.
fn expiration() -> NaiveDate {
    Utc::now().date_naive() + chrono::Duration::days(45)
}

fn quote(option_quote_strike: rust_decimal::Decimal, side: OptionSide, delta: rust_decimal::Decimal) -> OptionQuote {
    OptionQuote {
        strike: option_quote_strike,
        side,
        bid: dec!(1.20),
        ask: dec!(1.40),
        delta,
        iv: dec!(0.32),
        volume: 500,
        open_interest: 1000,
    }
}

fn seed_clean_entry_market(gateway: &MockBrokerGateway) {
    let mut state = gateway.state.lock();
    state.account_balance = dec!(100000);
    state.option_buying_power = dec!(50000);
    state.market_state = MarketState::Open;
    state.expirations = vec![expiration()];
    state.quotes.insert(
        "SPY".to_string(),
        Quote { last: dec!(450), bid: dec!(449.9), ask: dec!(450.1), timestamp: Utc::now() },
    );
    state.chains.insert(
        expiration(),
        vec![
            quote(dec!(440), OptionSide::Put, dec!(-0.16)),
            quote(dec!(460), OptionSide::Call, dec!(0.16)),
        ],
    );
}

/// Flips every newly-placed order to `filled` shortly after it appears,
/// standing in for the brokerage actually executing it. Aborted by the
/// caller once the cycle under test has returned.
fn spawn_autofill(gateway: Arc<MockBrokerGateway>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            {
                let mut state = gateway.state.lock();
                let open_ids: Vec<String> = state
                    .orders
                    .iter()
                    .filter(|(_, report)| report.status == OrderStatus::Open)
                    .map(|(id, _)| id.clone())
                    .collect();
                for id in open_ids {
                    if let Some(report) = state.orders.get_mut(&id) {
                        report.status = OrderStatus::Filled;
                        report.filled_qty = 1;
                    }
                }
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
}

fn open_position(credit: rust_decimal::Decimal, pnl: rust_decimal::Decimal) -> Position {
    Position {
        id: PositionId::random(),
        symbol: "SPY".into(),
        put_strike: dec!(440),
        call_strike: dec!(460),
        expiration: expiration(),
        quantity: 1,
        credit_received: credit,
        entry_limit_price: credit,
        entry_date: Utc::now(),
        exit_date: None,
        entry_iv: 32,
        entry_spot: dec!(450),
        current_pnl: pnl,
        dte: 45,
        entry_order_id: None,
        exit_order_id: None,
        exit_reason: None,
        adjustments: Vec::new(),
        state: PositionStateName::Open,
    }
}

#[tokio::test]
async fn a_clean_entry_is_submitted_filled_and_persisted_open() {
    let gateway = Arc::new(MockBrokerGateway::new());
    seed_clean_entry_market(&gateway);
    let store = fresh_store().await;
    let cancel = CancellationToken::new();

    let cycle = Cycle::with_poll_config(
        gateway.clone(),
        store.clone(),
        "SPY".into(),
        StrategyConfig::default(),
        generous_risk(),
        open_all_day_schedule(),
        false,
        fast_poll(),
    );

    let autofill = spawn_autofill(gateway.clone());
    let report = cycle.run(&cancel).await.unwrap();
    autofill.abort();

    assert!(report.market_open);
    assert!(report.entry_submitted);

    let positions = store.active_positions().await;
    assert_eq!(positions.len(), 1);
    assert_eq!(positions[0].state, PositionStateName::Open);
    assert_eq!(positions[0].put_strike, dec!(440));
    assert_eq!(positions[0].call_strike, dec!(460));
}

#[tokio::test]
async fn market_closed_suppresses_new_entries_but_still_closes_a_stop_loss_position() {
    let gateway = Arc::new(MockBrokerGateway::new());
    seed_clean_entry_market(&gateway);
    gateway.state.lock().market_state = MarketState::Closed;

    let store = fresh_store().await;
    // credit 2.00 * 1 * 100 = 200 base; a tightened 1.0x stop-loss trips at
    // -200, well short of the hardcoded -2.0x (-400) emergency floor, so this
    // exercises the stop-loss path specifically rather than emergency-exit.
    store.upsert_active(open_position(dec!(2.00), dec!(-250))).await.unwrap();

    let mut strategy = StrategyConfig::default();
    strategy.exit.stop_loss_multiplier = dec!(1.0);

    let cancel = CancellationToken::new();
    let cycle = Cycle::with_poll_config(
        gateway.clone(),
        store.clone(),
        "SPY".into(),
        strategy,
        generous_risk(),
        open_all_day_schedule(),
        false,
        fast_poll(),
    );

    let autofill = spawn_autofill(gateway.clone());
    let report = cycle.run(&cancel).await.unwrap();
    autofill.abort();

    assert!(!report.market_open);
    assert!(!report.entry_submitted);
    assert_eq!(report.exits_submitted, 1);

    let snapshot = store.snapshot().await;
    assert!(snapshot.current_positions.is_empty());
    assert_eq!(snapshot.history.len(), 1);
    assert_eq!(snapshot.history[0].exit_reason, Some(strangler_types::ExitReason::StopLoss));
}

#[tokio::test]
async fn an_absolute_position_loss_floor_forces_an_emergency_exit_even_under_the_percentage_thresholds() {
    let gateway = Arc::new(MockBrokerGateway::new());
    seed_clean_entry_market(&gateway);

    let store = fresh_store().await;
    // pnl of -50 never trips the percentage-based exits (credit 2.00 base 200),
    // but a max_position_loss of 40 should force a close regardless.
    store.upsert_active(open_position(dec!(2.00), dec!(-50))).await.unwrap();

    let mut risk = generous_risk();
    risk.max_position_loss = dec!(40);

    let cancel = CancellationToken::new();
    let cycle = Cycle::with_poll_config(
        gateway.clone(),
        store.clone(),
        "SPY".into(),
        StrategyConfig::default(),
        risk,
        open_all_day_schedule(),
        false,
        fast_poll(),
    );

    let autofill = spawn_autofill(gateway.clone());
    let report = cycle.run(&cancel).await.unwrap();
    autofill.abort();

    assert_eq!(report.exits_submitted, 1);
    let snapshot = store.snapshot().await;
    assert_eq!(snapshot.history.len(), 1);
    assert_eq!(snapshot.history[0].exit_reason, Some(strangler_types::ExitReason::EmergencyExit));
}

#[tokio::test]
async fn orphan_recovery_transitions_a_stale_submitted_position_through_the_reconciler() {
    let gateway = Arc::new(MockBrokerGateway::new());
    seed_clean_entry_market(&gateway);

    let store = fresh_store().await;
    let mut stale = open_position(dec!(2.00), dec!(0));
    stale.state = PositionStateName::Submitted;
    stale.entry_date = Utc::now() - chrono::Duration::minutes(10);
    stale.entry_order_id = Some(strangler_types::OrderId::new("orphan-1"));
    store.upsert_active(stale.clone()).await.unwrap();

    {
        let mut state = gateway.state.lock();
        state.orders.insert(
            "orphan-1".to_string(),
            strangler_broker::OrderStatusReport {
                status: OrderStatus::Filled,
                filled_qty: 1,
                avg_fill_price: Some(dec!(2.05)),
                legs: Vec::new(),
            },
        );
    }

    let cancel = CancellationToken::new();
    let cycle = Cycle::with_poll_config(
        gateway.clone(),
        store.clone(),
        "SPY".into(),
        StrategyConfig::default(),
        generous_risk(),
        open_all_day_schedule(),
        false,
        fast_poll(),
    );

    cycle.run(&cancel).await.unwrap();

    let positions = store.active_positions().await;
    assert_eq!(positions.len(), 1);
    assert_eq!(positions[0].state, PositionStateName::Open);
    assert_eq!(positions[0].credit_received, dec!(2.05));
}
