//! Order Lifecycle Manager: places and closes multi-leg orders
//! against a [`strangler_broker::BrokerGateway`], polls them to a terminal
//! status, and maps the outcome onto the state-machine condition it implies.
//!
//! Grounded on `strangler-integration`'s retry/backoff and deadline
//! primitives (themselves adapted from `jackbot-integration`), reused here
//! at the order-polling layer rather than the transport layer.

pub mod lifecycle;
pub mod manager;
pub mod outcome;

pub use lifecycle::condition_for;
pub use manager::{OrderManager, PollConfig};
pub use outcome::PollOutcome;
