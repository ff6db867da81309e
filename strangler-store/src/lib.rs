//! Durable Store: single-writer, atomic-replace persistence of the whole
//! trading state, with every reader getting a deep copy.
//!
//! The atomic-replace idiom (temp file + fsync + rename + directory fsync,
//! `0600` mode) is grounded in the write-then-rename pattern used by
//! `bog-core::execution::journal`'s test harness and `bog-core`'s snapshot
//! machinery, generalized here from an append-only journal to a whole-file
//! replace since this store persists one JSON document, not a log.

pub mod atomic;
pub mod error;
pub mod store;

pub use error::StoreError;
pub use store::DurableStore;
