use serde::{Deserialize, Serialize};
use strangler_integration::IntegrationError;
use thiserror::Error;

/// Broker-domain error kinds. Wraps [`IntegrationError`] for the
/// transport-level cases and adds the domain-specific ones the gateway is
/// responsible for classifying (validation, insufficient buying power,
/// rejection).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Error)]
pub enum BrokerError {
    #[error(transparent)]
    Transport(#[from] IntegrationError),

    #[error("order validation failed: {0}")]
    Validation(String),

    #[error("insufficient option buying power")]
    InsufficientBuyingPower,

    #[error("order rejected: {0}")]
    Rejected(String),

    #[error("order not cancelable: {0}")]
    NotCancelable(String),
}

impl BrokerError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, BrokerError::Transport(inner) if inner.is_retryable())
    }
}
