use derive_more::{Display, From};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use uuid::Uuid;

/// Opaque, unique, process-independent identifier for a [`crate::position::Position`].
///
/// Assigned once at creation and never reused, matching the "stable for life"
/// invariant in the position data model.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Display,
)]
pub struct PositionId(pub Uuid);

impl PositionId {
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Broker-assigned order identifier, returned once an order has been accepted.
#[derive(
    Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Display, From,
)]
pub struct OrderId(pub SmolStr);

impl OrderId {
    pub fn new<S: AsRef<str>>(id: S) -> Self {
        Self(SmolStr::new(id.as_ref()))
    }
}

/// Caller-supplied idempotency key threaded through order placement and its retries.
///
/// Derived deterministically from `(position_id, intent, expiration, creation timestamp)`
/// so that a retried submission reuses the same id and the broker can deduplicate.
#[derive(
    Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Display, From,
)]
pub struct ClientOrderId(pub SmolStr);

impl ClientOrderId {
    pub fn new<S: AsRef<str>>(id: S) -> Self {
        Self(SmolStr::new(id.as_ref()))
    }

    /// Deterministic derivation: `(position_id, intent, expiration, created_at)`.
    pub fn derive(
        position_id: PositionId,
        intent: OrderIntent,
        expiration: chrono::NaiveDate,
        created_at: chrono::DateTime<chrono::Utc>,
    ) -> Self {
        Self::new(format!(
            "{position_id}-{intent}-{expiration}-{}",
            created_at.timestamp_millis()
        ))
    }
}

/// Why an order is being placed: opening or closing a position's legs.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Deserialize, Serialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum OrderIntent {
    Open,
    Close,
}
