use chrono::{NaiveDate, Utc};
use rust_decimal_macros::dec;
use strangler_store::DurableStore;
use strangler_types::{ExitReason, IvReading, Position, PositionId, PositionStateName};

fn sample_position(id: PositionId, expiration: NaiveDate) -> Position {
    Position {
        id,
        symbol: "SPY".into(),
        put_strike: dec!(480),
        call_strike: dec!(520),
        expiration,
        quantity: 1,
        credit_received: dec!(2.10),
        entry_limit_price: dec!(2.10),
        entry_date: Utc::now(),
        exit_date: None,
        entry_iv: 28,
        entry_spot: dec!(500),
        current_pnl: dec!(0),
        dte: 45,
        entry_order_id: None,
        exit_order_id: None,
        exit_reason: None,
        adjustments: Vec::new(),
        state: PositionStateName::Open,
    }
}

#[tokio::test]
async fn persists_and_reloads_an_active_position() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");
    let expiration = NaiveDate::from_ymd_opt(2026, 9, 18).unwrap();
    let id = PositionId::random();

    {
        let store = DurableStore::load(&path).await.unwrap();
        store.upsert_active(sample_position(id, expiration)).await.unwrap();
    }

    let reloaded = DurableStore::load(&path).await.unwrap();
    let positions = reloaded.active_positions().await;
    assert_eq!(positions.len(), 1);
    assert_eq!(positions[0].id, id);
    assert_eq!(positions[0].symbol.as_str(), "SPY");
}

#[tokio::test]
async fn close_position_moves_it_to_history_and_updates_statistics() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");
    let expiration = NaiveDate::from_ymd_opt(2026, 9, 18).unwrap();
    let id = PositionId::random();
    let store = DurableStore::load(&path).await.unwrap();

    let mut position = sample_position(id, expiration);
    store.upsert_active(position.clone()).await.unwrap();

    position.current_pnl = dec!(105);
    position.exit_date = Some(Utc::now());
    position.exit_reason = Some(ExitReason::ProfitTarget);
    position.state = PositionStateName::Closed;
    store.close_position(position).await.unwrap();

    assert!(store.find_active(id).await.is_none());
    let snapshot = store.snapshot().await;
    assert_eq!(snapshot.history.len(), 1);
    assert_eq!(snapshot.statistics.total_trades, 1);
    assert_eq!(snapshot.statistics.winning_trades, 1);
    assert_eq!(snapshot.daily_pnl.total(), dec!(105));
}

#[tokio::test]
async fn iv_reading_dedups_same_symbol_and_day() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");
    let store = DurableStore::load(&path).await.unwrap();
    let date = NaiveDate::from_ymd_opt(2026, 7, 28).unwrap();

    store
        .record_iv_reading(IvReading::new("SPY", date, 22, Utc::now()))
        .await
        .unwrap();
    store
        .record_iv_reading(IvReading::new("SPY", date, 31, Utc::now()))
        .await
        .unwrap();

    let snapshot = store.snapshot().await;
    assert_eq!(snapshot.iv_readings.len(), 1);
    assert_eq!(snapshot.iv_readings[0].iv_value, 31);
}

#[tokio::test]
async fn remove_active_drops_a_phantom_local_position() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");
    let expiration = NaiveDate::from_ymd_opt(2026, 9, 18).unwrap();
    let id = PositionId::random();
    let store = DurableStore::load(&path).await.unwrap();

    store.upsert_active(sample_position(id, expiration)).await.unwrap();
    let removed = store.remove_active(id).await.unwrap();
    assert_eq!(removed.id, id);

    let snapshot = store.snapshot().await;
    assert!(snapshot.current_positions.is_empty());
    assert!(snapshot.history.is_empty());
}
