//! Persistence adapter: mirrors the playthrough store into a key-value store.
//!
//! Layout under the configured prefix (default `nuzlocke`):
//!
//! | Key | Value |
//! |-----|-------|
//! | `<prefix>:index` | `{ "playthroughIds": [...], "activePlaythroughId": ... }` |
//! | `<prefix>:playthrough:<id>` | one playthrough record |
//!
//! Structural changes (create, delete, rename, switching the active
//! playthrough) are written immediately. Encounter edits are debounced. The
//! in-memory store is always authoritative: a flush writes whatever the store
//! holds at the moment it runs.

mod scheduler;

pub use scheduler::FlushScheduler;

use std::sync::Arc;
use std::time::Duration;

use nuzlocke_domain::{GameMode, Playthrough, PlaythroughId, PlaythroughName};
use serde::{Deserialize, Serialize};

use crate::infrastructure::ports::{ClockPort, KeyValueStore, StoreError};
use crate::stores::{PlaythroughStore, StoreEvent};

/// Persistence errors. Public entry points log these and carry on.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    /// A stored value exists but is not a valid record.
    #[error("Corrupt record under {key}: {message}")]
    Corrupt { key: String, message: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl PersistenceError {
    pub fn corrupt(key: impl ToString, message: impl ToString) -> Self {
        Self::Corrupt {
            key: key.to_string(),
            message: message.to_string(),
        }
    }

    pub fn is_corrupt(&self) -> bool {
        matches!(self, Self::Corrupt { .. })
    }
}

/// Key naming for one storage namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    prefix: String,
}

impl StorageKeys {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn index(&self) -> String {
        format!("{}:index", self.prefix)
    }

    pub fn playthrough(&self, id: PlaythroughId) -> String {
        format!("{}:playthrough:{}", self.prefix, id)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IndexRecord {
    #[serde(default)]
    playthrough_ids: Vec<PlaythroughId>,
    #[serde(default)]
    active_playthrough_id: Option<PlaythroughId>,
}

/// What `load_all` found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: usize,
    /// Ids listed in the index whose record was missing or corrupt.
    pub skipped: Vec<PlaythroughId>,
    /// Nothing could be loaded, so a fresh playthrough was created.
    pub created_default: bool,
}

/// Store-to-storage writer. Cheap to clone into the flush task.
#[derive(Clone)]
struct Writer {
    kv: Arc<dyn KeyValueStore>,
    store: Arc<PlaythroughStore>,
    keys: StorageKeys,
}

impl Writer {
    async fn write_record(&self, id: PlaythroughId) -> Result<(), PersistenceError> {
        // Snapshot under the read lock, serialize and write without it.
        let Some(snapshot) = self.store.get(id) else {
            tracing::debug!(playthrough_id = %id, "Playthrough gone before flush, skipping");
            return Ok(());
        };
        let bytes = serde_json::to_vec(&snapshot)
            .map_err(|e| PersistenceError::Serialization(e.to_string()))?;
        self.kv.set(&self.keys.playthrough(id), bytes).await?;
        Ok(())
    }

    async fn write_index(&self) -> Result<(), PersistenceError> {
        let index = IndexRecord {
            playthrough_ids: self.store.ids(),
            active_playthrough_id: self.store.active_id(),
        };
        let bytes =
            serde_json::to_vec(&index).map_err(|e| PersistenceError::Serialization(e.to_string()))?;
        self.kv.set(&self.keys.index(), bytes).await?;
        Ok(())
    }

    async fn flush_ids(&self, ids: Vec<PlaythroughId>) {
        for id in ids {
            if let Err(e) = self.write_record(id).await {
                tracing::warn!(playthrough_id = %id, error = %e, "Failed to save playthrough");
            }
        }
    }
}

/// Mirrors a [`PlaythroughStore`] into a [`KeyValueStore`].
pub struct PlaythroughPersistence {
    writer: Writer,
    scheduler: FlushScheduler,
    clock: Arc<dyn ClockPort>,
}

impl PlaythroughPersistence {
    pub fn new(
        kv: Arc<dyn KeyValueStore>,
        store: Arc<PlaythroughStore>,
        keys: StorageKeys,
        debounce: Duration,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            writer: Writer { kv, store, keys },
            scheduler: FlushScheduler::new(debounce),
            clock,
        }
    }

    pub fn keys(&self) -> &StorageKeys {
        &self.writer.keys
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Write one record (if given) and the index right away.
    pub async fn flush_now(&self, id: Option<PlaythroughId>) {
        if let Err(e) = self.try_flush_now(id).await {
            tracing::warn!(playthrough_id = ?id, error = %e, "Immediate save failed");
        }
    }

    pub(crate) async fn try_flush_now(&self, id: Option<PlaythroughId>) -> Result<(), PersistenceError> {
        if let Some(id) = id {
            self.writer.write_record(id).await?;
        }
        self.writer.write_index().await
    }

    /// Debounced save of one playthrough's record.
    pub fn schedule_deferred(&self, id: PlaythroughId) {
        let writer = self.writer.clone();
        self.scheduler
            .schedule(id, move |ids| async move { writer.flush_ids(ids).await });
        tracing::trace!(playthrough_id = %id, "Save scheduled");
    }

    /// Write everything still waiting for the debounce timer. Call on shutdown.
    pub async fn flush_pending(&self) {
        let ids = self.scheduler.take_pending();
        if !ids.is_empty() {
            tracing::debug!(count = ids.len(), "Flushing pending saves");
            self.writer.flush_ids(ids).await;
        }
    }

    /// Drop a playthrough's record and rewrite the index. The playthrough must
    /// already be gone from the store.
    pub async fn delete_record(&self, id: PlaythroughId) {
        self.scheduler.discard(id);
        let key = self.writer.keys.playthrough(id);
        if let Err(e) = self.writer.kv.delete(&key).await {
            tracing::warn!(playthrough_id = %id, error = %e, "Failed to delete playthrough record");
        }
        self.flush_now(None).await;
    }

    // =========================================================================
    // Load
    // =========================================================================

    /// Replace the store's contents with what durable storage holds.
    ///
    /// Corrupt or missing records are logged and skipped. If nothing loads, a
    /// fresh default playthrough is created, made active and saved.
    pub async fn load_all(&self) -> LoadReport {
        let index = self.read_index().await;
        let mut report = LoadReport::default();
        let mut loaded = Vec::with_capacity(index.playthrough_ids.len());

        for id in &index.playthrough_ids {
            match self.read_record(*id).await {
                Ok(Some(run)) => loaded.push(run),
                Ok(None) => {
                    tracing::warn!(playthrough_id = %id, "Indexed playthrough has no record, skipping");
                    report.skipped.push(*id);
                }
                Err(e) => {
                    tracing::error!(playthrough_id = %id, error = %e, "Skipping unreadable playthrough");
                    report.skipped.push(*id);
                }
            }
        }
        report.loaded = loaded.len();

        if loaded.is_empty() {
            let fresh = Playthrough::new(
                PlaythroughName::default_name(),
                GameMode::default(),
                self.clock.now(),
            );
            let id = fresh.id();
            self.writer.store.replace_all(vec![fresh], Some(id));
            self.writer.store.emit(StoreEvent::Loaded);
            report.created_default = true;
            tracing::info!(playthrough_id = %id, "No saved playthroughs, created a new one");
            self.flush_now(Some(id)).await;
            return report;
        }

        self.writer
            .store
            .replace_all(loaded, index.active_playthrough_id);
        self.writer.store.emit(StoreEvent::Loaded);
        tracing::info!(
            loaded = report.loaded,
            skipped = report.skipped.len(),
            "Playthroughs loaded"
        );
        report
    }

    async fn read_index(&self) -> IndexRecord {
        let key = self.writer.keys.index();
        match self.writer.kv.get(&key).await {
            Ok(Some(bytes)) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                tracing::error!(key = %key, error = %e, "Corrupt playthrough index, starting empty");
                IndexRecord::default()
            }),
            Ok(None) => IndexRecord::default(),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Failed to read playthrough index");
                IndexRecord::default()
            }
        }
    }

    pub(crate) async fn read_record(
        &self,
        id: PlaythroughId,
    ) -> Result<Option<Playthrough>, PersistenceError> {
        let key = self.writer.keys.playthrough(id);
        let Some(bytes) = self.writer.kv.get(&key).await? else {
            return Ok(None);
        };
        let run: Playthrough =
            serde_json::from_slice(&bytes).map_err(|e| PersistenceError::corrupt(&key, e))?;
        if run.id() != id {
            return Err(PersistenceError::corrupt(
                &key,
                format!("record holds playthrough {}", run.id()),
            ));
        }
        Ok(Some(run))
    }
}
