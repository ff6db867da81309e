use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::America::New_York;

/// The exchange's own calendar day for `timestamp`, not the UTC day.
///
/// SPY trades on US equity hours, so anything keyed "per day" (IV dedup, the
/// daily P&L ledger) must turn over at US/Eastern midnight rather than UTC
/// midnight — a cycle ticking in the small hours of the UTC day is still
/// inside the *previous* exchange day.
pub fn exchange_local_date(timestamp: DateTime<Utc>) -> NaiveDate {
    timestamp.with_timezone(&New_York).date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn a_utc_timestamp_just_after_midnight_is_still_the_previous_exchange_day() {
        // 02:30 UTC on Jan 2 is 21:30 ET on Jan 1.
        let timestamp = Utc.with_ymd_and_hms(2026, 1, 2, 2, 30, 0).unwrap();
        assert_eq!(exchange_local_date(timestamp), NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
    }

    #[test]
    fn a_utc_timestamp_in_the_afternoon_matches_the_same_exchange_day() {
        let timestamp = Utc.with_ymd_and_hms(2026, 1, 2, 18, 0, 0).unwrap();
        assert_eq!(exchange_local_date(timestamp), NaiveDate::from_ymd_opt(2026, 1, 2).unwrap());
    }
}
