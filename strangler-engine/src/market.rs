use chrono::{DateTime, Local, NaiveTime, Utc};

use strangler_broker::{MarketClock, MarketState};

/// Thin wrapper over the broker's own market clock (`get_market_clock`), kept
/// as a type so [`Cycle`](crate::cycle::Cycle) reads one predicate rather
/// than matching on [`MarketState`] inline.
pub struct MarketClockView(MarketClock);

impl From<MarketClock> for MarketClockView {
    fn from(clock: MarketClock) -> Self {
        Self(clock)
    }
}

impl MarketClockView {
    /// `after_hours_check` (`schedule.after_hours_check`) extends "open" to
    /// the broker's pre/post-market sessions, not just the regular session;
    /// with it off (the default) only [`MarketState::Open`] counts.
    pub fn is_open(&self, after_hours_check: bool) -> bool {
        match self.0.state {
            MarketState::Open => true,
            MarketState::Pre | MarketState::Post => after_hours_check,
            MarketState::Closed => false,
        }
    }
}

/// Local-time fallback for the market-open gate, used
/// only when the broker's own clock endpoint is unreachable. Compares the
/// wall-clock time in the process's local timezone against
/// `schedule.market_open`/`market_close`; this assumes the host runs in the
/// exchange's timezone, a simplifying assumption acceptable for a fallback
/// path that is never the primary source of truth (see DESIGN.md).
pub fn is_market_open(now: DateTime<Utc>, market_open: &str, market_close: &str) -> bool {
    within_window(now, market_open, market_close)
}

/// Narrower window some deployments use to avoid acting in the first/last
/// minutes of the session (`schedule.trading_start`/`trading_end`,
/// distinct from the exchange's full `market_open`/`market_close` hours).
pub fn is_within_trading_window(now: DateTime<Utc>, trading_start: &str, trading_end: &str) -> bool {
    within_window(now, trading_start, trading_end)
}

fn within_window(now: DateTime<Utc>, start: &str, end: &str) -> bool {
    let (Some(start), Some(end)) = (parse_hhmm(start), parse_hhmm(end)) else {
        return false;
    };
    let local_time = now.with_timezone(&Local).time();
    if start <= end {
        local_time >= start && local_time <= end
    } else {
        // Wraps past midnight; not expected for equities hours, but handled
        // so a misconfigured pair fails closed rather than panicking.
        local_time >= start || local_time <= end
    }
}

fn parse_hhmm(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        // Pins the comparison to UTC=local by using `Utc` throughout the
        // test; the production path converts through `Local`, which is a
        // no-op when the test process's TZ is UTC.
        Utc.with_ymd_and_hms(2026, 7, 28, hour, minute, 0).unwrap()
    }

    #[test]
    fn rejects_an_unparseable_window() {
        assert!(!is_market_open(at(12, 0), "nope", "16:00"));
    }

    #[test]
    fn an_inverted_window_wraps_past_midnight() {
        assert!(within_window(at(23, 30), "22:00", "02:00"));
        assert!(!within_window(at(12, 0), "22:00", "02:00"));
    }

    fn clock(state: MarketState) -> MarketClockView {
        MarketClockView::from(MarketClock { state, next_change: at(16, 0) })
    }

    #[test]
    fn pre_and_post_market_only_count_as_open_when_after_hours_check_is_enabled() {
        assert!(!clock(MarketState::Pre).is_open(false));
        assert!(clock(MarketState::Pre).is_open(true));
        assert!(!clock(MarketState::Post).is_open(false));
        assert!(clock(MarketState::Post).is_open(true));
    }

    #[test]
    fn the_regular_session_is_always_open_regardless_of_after_hours_check() {
        assert!(clock(MarketState::Open).is_open(false));
        assert!(clock(MarketState::Open).is_open(true));
    }

    #[test]
    fn closed_is_never_open() {
        assert!(!clock(MarketState::Closed).is_open(false));
        assert!(!clock(MarketState::Closed).is_open(true));
    }
}
