use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

use strangler_types::{exchange_local_date, IvReading, Position, PositionId, StoreFile};

use crate::atomic::write_atomic;
use crate::error::StoreError;

/// Single-writer, deep-copy-on-read persistence for the whole trading state,
/// enforcing single-writer discipline on every mutation. Every mutation method
/// takes the write half of an internal [`RwLock`] and persists before
/// releasing it, so a successful return means the new state is durable.
///
/// `Arc`-wrapped because the orchestrator, reconciler and order manager all
/// hold a reference to the same store instance ("process-wide
/// singletons").
#[derive(Clone)]
pub struct DurableStore {
    path: Arc<PathBuf>,
    inner: Arc<RwLock<StoreFile>>,
}

impl DurableStore {
    /// Loads the store from `path`, or starts from an empty [`StoreFile`] if
    /// the file does not exist yet (first run).
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let file = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| StoreError::Parse {
                path: path.clone(),
                source,
            })?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => StoreFile::default(),
            Err(source) => {
                return Err(StoreError::Read {
                    path: path.clone(),
                    source,
                })
            }
        };

        Ok(Self {
            path: Arc::new(path),
            inner: Arc::new(RwLock::new(file)),
        })
    }

    /// A deep copy of the full persisted layout. Every reader outside the
    /// store gets a copy, never a reference into the live state.
    pub async fn snapshot(&self) -> StoreFile {
        self.inner.read().await.clone()
    }

    pub async fn active_positions(&self) -> Vec<Position> {
        self.inner.read().await.current_positions.clone()
    }

    pub async fn find_active(&self, id: PositionId) -> Option<Position> {
        self.inner
            .read()
            .await
            .current_positions
            .iter()
            .find(|p| p.id == id)
            .cloned()
    }

    /// Inserts a new active position, or replaces the existing one with the
    /// same id (the state machine's normal in-place progression).
    pub async fn upsert_active(&self, position: Position) -> Result<(), StoreError> {
        let mut guard = self.inner.write().await;
        let position_id = position.id;
        match guard.current_positions.iter_mut().find(|p| p.id == position.id) {
            Some(slot) => *slot = position,
            None => guard.current_positions.push(position),
        }
        self.persist(&mut guard).await?;
        debug!(%position_id, "upserted active position");
        Ok(())
    }

    /// Removes an active position without moving it to history: used by the
    /// reconciler for phantom-local cleanup, where the position
    /// never actually existed at the broker.
    pub async fn remove_active(&self, id: PositionId) -> Result<Position, StoreError> {
        let mut guard = self.inner.write().await;
        let idx = guard
            .current_positions
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| StoreError::PositionNotFound(id.to_string()))?;
        let removed = guard.current_positions.remove(idx);
        self.persist(&mut guard).await?;
        debug!(position_id = %id, "removed phantom-local position");
        Ok(removed)
    }

    /// Moves `closed` from the active set to history, and applies its
    /// realized P&L to the statistics and daily ledger. `closed` must already
    /// carry `exit_date`/`exit_reason`.
    pub async fn close_position(&self, closed: Position) -> Result<(), StoreError> {
        let mut guard = self.inner.write().await;
        let position_id = closed.id;
        guard.current_positions.retain(|p| p.id != closed.id);

        let exit_date = closed.exit_date.unwrap_or_else(Utc::now);
        guard.statistics.record_close(closed.current_pnl);
        guard.daily_pnl.record(exchange_local_date(exit_date), closed.current_pnl);
        guard.history.push(closed);

        self.persist(&mut guard).await?;
        debug!(%position_id, "closed position moved to history");
        Ok(())
    }

    /// Appends an IV reading, overwriting same-day readings for the same
    /// symbol ("latest reading per day wins").
    pub async fn record_iv_reading(&self, reading: IvReading) -> Result<(), StoreError> {
        let mut guard = self.inner.write().await;
        guard
            .iv_readings
            .retain(|r| !(r.symbol == reading.symbol && r.date == reading.date));
        guard.iv_readings.push(reading);
        self.persist(&mut guard).await
    }

    /// Stamps `last_updated` on the in-memory state before writing, so a
    /// `snapshot()` taken later in the same process reflects the same value
    /// that lands on disk.
    async fn persist(&self, file: &mut StoreFile) -> Result<(), StoreError> {
        file.last_updated = Some(Utc::now());
        let bytes = serde_json::to_vec_pretty(file).expect("StoreFile always serializes");

        let path = Arc::clone(&self.path);
        tokio::task::spawn_blocking(move || write_atomic(&path, &bytes))
            .await
            .expect("atomic write task panicked")
            .map_err(|source| StoreError::Write {
                path: (*self.path).clone(),
                source,
            })?;

        debug!(path = %self.path.display(), "store persisted");
        Ok(())
    }
}
