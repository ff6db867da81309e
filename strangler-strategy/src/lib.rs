//! The pure decision layer: `evaluate` takes a market snapshot,
//! an account snapshot and the current positions, and returns the signals
//! the orchestrator should act on. No broker or store access happens here.
//!
//! Grounded on `barter::v2::risk::default`'s synchronous, snapshot-in /
//! decisions-out `RiskManager::check`, generalized from order-approval to
//! strangle entry/exit selection.

pub mod config;
pub mod evaluate;
pub mod signal;
pub mod snapshot;

pub use config::{EntryConfig, ExitConfig, StrategyConfig, EMERGENCY_EXIT_MULTIPLIER};
pub use evaluate::evaluate;
pub use signal::{EntrySignal, ExitSignal, Signal};
pub use snapshot::{AccountSnapshot, ExpirationChain, MarketSnapshot};
