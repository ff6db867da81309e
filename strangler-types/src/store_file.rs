use crate::iv::IvReading;
use crate::pnl::DailyPnlLedger;
use crate::position::Position;
use crate::stats::Statistics;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The single-file persisted layout:
/// `{last_updated, current_positions[], history[], daily_pnl{}, statistics{}, iv_readings[]}`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct StoreFile {
    pub last_updated: Option<DateTime<Utc>>,
    pub current_positions: Vec<Position>,
    pub history: Vec<Position>,
    pub daily_pnl: DailyPnlLedger,
    pub statistics: Statistics,
    pub iv_readings: Vec<IvReading>,
}
