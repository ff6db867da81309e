use std::sync::Arc;
use std::time::Duration;

use rust_decimal_macros::dec;
use strangler_broker::{MockBrokerGateway, OrderDuration, OrderLeg, LegAction, OptionSide, OrderStatus};
use strangler_integration::CancellationToken;
use strangler_order::{OrderManager, PollConfig, PollOutcome};
use strangler_types::ClientOrderId;

fn fast_poll_config() -> PollConfig {
    PollConfig {
        initial_delay: Duration::from_millis(5),
        interval: Duration::from_millis(5),
        deadline: Duration::from_millis(200),
    }
}

fn legs() -> Vec<OrderLeg> {
    vec![
        OrderLeg {
            side: OptionSide::Put,
            strike: dec!(480),
            expiration: chrono::NaiveDate::from_ymd_opt(2026, 9, 18).unwrap(),
            action: LegAction::SellToOpen,
        },
        OrderLeg {
            side: OptionSide::Call,
            strike: dec!(520),
            expiration: chrono::NaiveDate::from_ymd_opt(2026, 9, 18).unwrap(),
            action: LegAction::SellToOpen,
        },
    ]
}

#[tokio::test]
async fn poll_reports_filled_once_the_broker_marks_the_order_filled() {
    let gateway = Arc::new(MockBrokerGateway::new());
    let manager = OrderManager::with_poll_config(gateway.clone(), fast_poll_config());
    let cancel = CancellationToken::new();

    let handle = manager
        .place("SPY", legs(), 1, dec!(3.85), OrderDuration::Day, ClientOrderId::new("entry-1"), &cancel)
        .await
        .unwrap();

    {
        let mut state = gateway.state.lock();
        let order = state.orders.get_mut(handle.order_id.0.as_str()).unwrap();
        order.status = OrderStatus::Filled;
        order.filled_qty = 1;
    }

    let outcome = manager.poll(&handle.order_id, &cancel).await.unwrap();
    assert_eq!(outcome, PollOutcome::Filled { fill_price: dec!(3.85), filled_qty: 1 });
}

#[tokio::test]
async fn poll_reports_unknown_when_the_order_never_reaches_a_terminal_status() {
    let gateway = Arc::new(MockBrokerGateway::new());
    let manager = OrderManager::with_poll_config(gateway.clone(), fast_poll_config());
    let cancel = CancellationToken::new();

    let handle = manager
        .place("SPY", legs(), 1, dec!(3.85), OrderDuration::Day, ClientOrderId::new("entry-2"), &cancel)
        .await
        .unwrap();

    let outcome = manager.poll(&handle.order_id, &cancel).await.unwrap();
    assert_eq!(outcome, PollOutcome::Unknown);
}

#[tokio::test]
async fn cancel_with_grace_reports_canceled_once_the_broker_confirms_it() {
    let gateway = Arc::new(MockBrokerGateway::new());
    let manager = OrderManager::with_poll_config(gateway.clone(), fast_poll_config());
    let cancel = CancellationToken::new();

    let handle = manager
        .place("SPY", legs(), 1, dec!(3.85), OrderDuration::Day, ClientOrderId::new("entry-3"), &cancel)
        .await
        .unwrap();

    let outcome = manager.cancel_with_grace(&handle.order_id, &cancel).await.unwrap();
    assert_eq!(outcome, PollOutcome::Canceled);
}

#[tokio::test]
async fn close_reuses_the_client_order_id_so_a_retried_submission_does_not_duplicate() {
    let gateway = Arc::new(MockBrokerGateway::new());
    let manager = OrderManager::with_poll_config(gateway.clone(), fast_poll_config());
    let cancel = CancellationToken::new();
    let client_order_id = ClientOrderId::new("close-1");

    let first = manager
        .close("SPY", legs(), 1, dec!(1.00), client_order_id.clone(), &cancel)
        .await
        .unwrap();
    let second = manager
        .close("SPY", legs(), 1, dec!(1.00), client_order_id, &cancel)
        .await
        .unwrap();

    assert_eq!(first.order_id, second.order_id);
}
