use thiserror::Error;

/// Durable Store failure modes (`validation`/IO propagate as fatal here —
/// a store that can't persist must not pretend it did).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read store file at {path}: {source}")]
    Read {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse store file at {path}: {source}")]
    Parse {
        path: std::path::PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to atomically write store file at {path}: {source}")]
    Write {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no position with id {0}")]
    PositionNotFound(String),
}
