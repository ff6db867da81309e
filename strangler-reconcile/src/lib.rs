//! Reconciler: bidirectional convergence between the durable
//! local position set and the broker's authoritative position list, resolved
//! every cycle before any entry/exit decision is made.
//!
//! Grounded on `strangler-store`'s single-writer `DurableStore` for the
//! mutation side and `strangler-state`'s transition table for the state
//! updates reconciliation implies.

pub mod error;
pub mod osi;
pub mod reconcile;
pub mod report;

pub use error::ReconcileError;
pub use osi::osi_symbol;
pub use reconcile::{Reconciler, ORDER_SUBMIT_TIMEOUT};
pub use report::ReconcileReport;
