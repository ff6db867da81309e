use std::path::PathBuf;

use strangler_broker::BrokerError;
use strangler_integration::IntegrationError;
use strangler_reconcile::ReconcileError;
use strangler_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },

    #[error("failed to parse config file {path}: {source}")]
    Parse { path: PathBuf, source: toml::de::Error },

    #[error("invalid config: {0}")]
    Validation(String),
}

/// Top-level cycle failure: domain errors propagate to the
/// orchestrator, which records them and aborts the *cycle* — never the
/// process — with one exception: a broker-reported authentication failure
/// ("credentials invalid; fatal, process exits after logging"), which
/// [`EngineError::is_fatal`] flags so the CLI can exit instead of scheduling
/// another tick.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    #[error(transparent)]
    Broker(#[from] BrokerError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

fn broker_error_is_auth(err: &BrokerError) -> bool {
    matches!(err, BrokerError::Transport(IntegrationError::Auth(_)))
}

impl EngineError {
    pub fn is_fatal(&self) -> bool {
        match self {
            EngineError::Broker(err) => broker_error_is_auth(err),
            EngineError::Reconcile(ReconcileError::Broker(err)) => broker_error_is_auth(err),
            EngineError::Reconcile(ReconcileError::Store(_)) | EngineError::Store(_) => false,
        }
    }
}
