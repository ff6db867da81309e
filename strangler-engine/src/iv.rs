use chrono::Utc;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use strangler_broker::OptionQuote;
use strangler_store::DurableStore;
use strangler_store::StoreError;
use strangler_types::IvReading;

/// Resolves open question pragmatically: the broker surface (spec
/// §4.1) exposes no standalone "IV rank" endpoint, only per-contract implied
/// volatility on chain entries. We take the nearest-the-money leg's `iv`
/// (a fraction, e.g. `0.32`) and store it as the integer 0-100 the rest of
/// the core already treats as opaque (`IvReading`, §9).
pub fn iv_percent_from_chain(spot: Decimal, chain: &[OptionQuote]) -> Option<i32> {
    let nearest = chain.iter().min_by_key(|q| (q.strike - spot).abs())?;
    let hundred = Decimal::from(100);
    let scaled = (nearest.iv * hundred).round_dp(0).clamp(Decimal::ZERO, hundred);
    scaled.to_i32()
}

/// Records today's IV reading exactly once per exchange-day ("the
/// latest reading per day wins" — [`DurableStore::record_iv_reading`]
/// already de-dupes per `(symbol, date)`, so this is safe to call every
/// cycle).
pub async fn record_daily_iv(
    store: &DurableStore,
    symbol: &str,
    iv_percent: i32,
) -> Result<(), StoreError> {
    let now = Utc::now();
    let reading = IvReading::new(symbol, strangler_types::exchange_local_date(now), iv_percent, now);
    store.record_iv_reading(reading).await
}
