use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Transport-level error classification surfaced to every component that
/// speaks to the brokerage.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize, Error)]
pub enum IntegrationError {
    #[error("transient network error: {0}")]
    Transient(String),

    #[error("rate limited")]
    RateLimited,

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("invalid request: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("broker unavailable: circuit open")]
    BrokerUnavailable,

    #[error("deadline exceeded")]
    DeadlineExceeded,

    #[error("canceled")]
    Canceled,
}

/// Canonical substring set used to classify a raw transport failure as
/// transient, per retry contract. Matched case-insensitively.
const TRANSIENT_MARKERS: &[&str] = &[
    "timed out",
    "timeout",
    "connection reset",
    "connection refused",
    "429",
    "502",
    "503",
    "504",
    "dns error",
    "failed to lookup address",
    "tls handshake",
    "unexpected eof",
    "eof",
];

/// Classify a raw error message as transient (network/5xx/rate-limit/DNS/TLS/EOF)
/// or not, per the canonical substring set.
pub fn is_transient(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    TRANSIENT_MARKERS.iter().any(|marker| lower.contains(marker))
}

impl IntegrationError {
    /// Build an [`IntegrationError`] from a raw transport message, classifying
    /// it as [`IntegrationError::Transient`] or [`IntegrationError::Validation`]
    /// using [`is_transient`].
    pub fn classify(message: impl Into<String>) -> Self {
        let message = message.into();
        if is_transient(&message) {
            IntegrationError::Transient(message)
        } else {
            IntegrationError::Validation(message)
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            IntegrationError::Transient(_) | IntegrationError::RateLimited
        )
    }
}

impl From<reqwest::Error> for IntegrationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return IntegrationError::Transient(err.to_string());
        }
        if let Some(status) = err.status() {
            if status.as_u16() == 429 {
                return IntegrationError::RateLimited;
            }
            if status.is_server_error() {
                return IntegrationError::Transient(err.to_string());
            }
            if status.as_u16() == 401 || status.as_u16() == 403 {
                return IntegrationError::Auth(err.to_string());
            }
            if status.as_u16() == 404 {
                return IntegrationError::NotFound(err.to_string());
            }
        }
        IntegrationError::classify(err.to_string())
    }
}
