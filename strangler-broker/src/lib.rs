//! Broker Gateway façade: a typed `BrokerGateway` trait, the
//! Tradier wire encoding behind it, and an in-memory mock for downstream
//! test suites.
//!
//! Grounded on `barter-execution::client` for the trait/implementation split
//! and `barter-execution::client::mock` for the in-memory test double.

pub mod error;
pub mod gateway;
pub mod mock;
pub mod requests;
pub mod tradier;
pub mod types;

pub use error::BrokerError;
pub use gateway::{BrokerGateway, Symbol};
pub use mock::{MockBrokerGateway, MockState};
pub use tradier::TradierGateway;
pub use types::{
    BrokerPosition, LegAction, MarketClock, MarketState, OptionQuote, OptionSide, OrderDuration,
    OrderHandle, OrderLeg, OrderStatus, OrderStatusReport, Quote,
};
