//! Transport plumbing shared by every broker call: a typed REST request
//! trait, a reqwest-backed client wired to a process-wide rate limiter and
//! circuit breaker, exponential backoff with jitter, and cancellation.
//!
//! Grounded on `jackbot-integration::protocol::http::rest` (the `RestRequest`
//! trait), `jackbot-integration::rate_limit` (the token-bucket limiter) and
//! `bog-core::resilience::circuit_breaker` (the three-state breaker).

pub mod circuit_breaker;
pub mod client;
pub mod error;
pub mod rate_limit;
pub mod rest;
pub mod retry;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use client::{with_deadline, RestClient};
pub use error::{is_transient, IntegrationError};
pub use rate_limit::{Priority, RateLimiter};
pub use rest::RestRequest;
pub use retry::{retry_with_backoff, Backoff};

pub use tokio_util::sync::CancellationToken;
