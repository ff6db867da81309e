//! Shared data model for the strangle-trading core: positions, IV history,
//! running statistics, the daily P&L ledger and the on-disk store envelope.
//!
//! Grounded on `jackbot-instrument::instrument::kind::option` for the
//! contract-field style (`Decimal` strikes, `chrono` dates, derive-heavy
//! newtypes) and on `barter-execution::order::id` for the id newtype idiom.

pub mod ids;
pub mod iv;
pub mod pnl;
pub mod position;
pub mod stats;
pub mod store_file;
pub mod time;

pub use ids::{ClientOrderId, OrderId, OrderIntent, PositionId};
pub use iv::IvReading;
pub use pnl::DailyPnlLedger;
pub use position::{Adjustment, AdjustmentKind, ExitReason, Position, PositionStateName};
pub use stats::Statistics;
pub use store_file::StoreFile;
pub use time::exchange_local_date;
