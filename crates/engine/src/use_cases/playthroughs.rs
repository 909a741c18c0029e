//! Playthrough management use cases.
//!
//! Creating, deleting, renaming and switching playthroughs are saved
//! immediately. Game mode and custom location edits go through the debounced
//! save like encounter edits, so every mutating method here is async and
//! runs on the tokio runtime.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use nuzlocke_domain::{
    DomainError, GameMode, LocationId, LocationName, Playthrough, PlaythroughId, PlaythroughName,
    PlaythroughUpdate,
};

use crate::infrastructure::ports::ClockPort;
use crate::persistence::{LoadReport, PlaythroughPersistence};
use crate::stores::{PlaythroughStore, StoreEvent};

/// Listing entry for the playthrough picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaythroughSummary {
    pub id: PlaythroughId,
    pub name: String,
    pub game_mode: GameMode,
    pub encounter_count: usize,
    pub is_active: bool,
    pub updated_at: DateTime<Utc>,
}

pub struct PlaythroughUseCases {
    store: Arc<PlaythroughStore>,
    persistence: Arc<PlaythroughPersistence>,
    clock: Arc<dyn ClockPort>,
}

impl PlaythroughUseCases {
    pub fn new(
        store: Arc<PlaythroughStore>,
        persistence: Arc<PlaythroughPersistence>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            store,
            persistence,
            clock,
        }
    }

    /// Replace in-memory state with what durable storage holds.
    pub async fn load(&self) -> LoadReport {
        self.persistence.load_all().await
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn list(&self) -> Vec<PlaythroughSummary> {
        let active = self.store.active_id();
        self.store
            .list()
            .iter()
            .map(|run| PlaythroughSummary {
                id: run.id(),
                name: run.name().to_string(),
                game_mode: run.game_mode(),
                encounter_count: run.creatures().count(),
                is_active: Some(run.id()) == active,
                updated_at: run.updated_at(),
            })
            .collect()
    }

    pub fn active(&self) -> Option<Playthrough> {
        self.store.active()
    }

    /// Locations of the active playthrough in display order: `base` with the
    /// custom locations spliced in.
    pub fn ordered_locations(&self, base: &[LocationId]) -> Vec<LocationId> {
        self.store
            .read_active(|run| run.ordered_locations(base))
            .unwrap_or_else(|| base.to_vec())
    }

    // =========================================================================
    // Structural Changes (saved immediately)
    // =========================================================================

    /// Create a playthrough and make it active. A blank name falls back to
    /// the default name.
    pub async fn create(&self, name: &str, game_mode: GameMode) -> Result<PlaythroughId, DomainError> {
        let name = if name.trim().is_empty() {
            PlaythroughName::default_name()
        } else {
            PlaythroughName::new(name)?
        };
        let run = Playthrough::new(name, game_mode, self.clock.now());
        let id = run.id();

        self.store.insert(run);
        self.store.set_active(Some(id));
        tracing::info!(playthrough_id = %id, game_mode = %game_mode, "Playthrough created");

        self.store.emit(StoreEvent::PlaythroughAdded { playthrough_id: id });
        self.store.emit(StoreEvent::ActiveChanged {
            playthrough_id: Some(id),
        });
        self.persistence.flush_now(Some(id)).await;
        Ok(id)
    }

    /// Delete a playthrough and its record. Returns `false` for an unknown id.
    pub async fn delete(&self, id: PlaythroughId) -> bool {
        let was_active = self.store.active_id() == Some(id);
        if self.store.remove(id).is_none() {
            return false;
        }
        tracing::info!(playthrough_id = %id, "Playthrough deleted");

        self.store.emit(StoreEvent::PlaythroughRemoved { playthrough_id: id });
        if was_active {
            self.store.emit(StoreEvent::ActiveChanged {
                playthrough_id: self.store.active_id(),
            });
        }
        self.persistence.delete_record(id).await;
        true
    }

    pub async fn rename(&self, id: PlaythroughId, name: &str) -> Result<bool, DomainError> {
        let name = PlaythroughName::new(name)?;
        let now = self.clock.now();
        let Some(update) = self.store.update(id, |run| run.rename(name, now)) else {
            return Ok(false);
        };
        if update.is_unchanged() {
            return Ok(false);
        }
        if let PlaythroughUpdate::Renamed { from, to } = &update {
            tracing::debug!(playthrough_id = %id, from = %from, to = %to, "Playthrough renamed");
        }

        self.store.emit(StoreEvent::PlaythroughChanged { playthrough_id: id });
        self.persistence.flush_now(Some(id)).await;
        Ok(true)
    }

    pub async fn set_active(&self, id: Option<PlaythroughId>) -> bool {
        if !self.store.set_active(id) {
            return false;
        }
        tracing::debug!(playthrough_id = ?id, "Active playthrough changed");

        self.store.emit(StoreEvent::ActiveChanged { playthrough_id: id });
        self.persistence.flush_now(None).await;
        true
    }

    // =========================================================================
    // Edits (debounced)
    // =========================================================================

    pub async fn set_game_mode(&self, id: PlaythroughId, mode: GameMode) -> bool {
        let now = self.clock.now();
        let changed = self
            .store
            .update(id, |run| run.set_game_mode(mode, now))
            .is_some_and(|update| !update.is_unchanged());
        if changed {
            self.edited(id);
        }
        changed
    }

    /// Add a custom location to the active playthrough after `insert_after`.
    pub async fn add_custom_location(
        &self,
        name: &str,
        insert_after: LocationId,
    ) -> Result<Option<LocationId>, DomainError> {
        let name = LocationName::new(name)?;
        let now = self.clock.now();
        let Some((id, update)) = self
            .store
            .update_active(|run| run.add_custom_location(name, insert_after, now))
        else {
            return Ok(None);
        };

        let PlaythroughUpdate::CustomLocationAdded { id: location } = update else {
            return Ok(None);
        };
        self.edited(id);
        Ok(Some(location))
    }

    pub async fn rename_custom_location(&self, location: &LocationId, name: &str) -> Result<bool, DomainError> {
        let name = LocationName::new(name)?;
        let now = self.clock.now();
        let changed = self
            .store
            .update_active(|run| run.rename_custom_location(location, name, now))
            .filter(|(_, update)| !update.is_unchanged());
        match changed {
            Some((id, _)) => {
                self.edited(id);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Remove a custom location. Its encounter, if any, goes with it.
    pub async fn remove_custom_location(&self, location: &LocationId) -> bool {
        let now = self.clock.now();
        let Some((id, update)) = self
            .store
            .update_active(|run| run.remove_custom_location(location, now))
        else {
            return false;
        };
        let PlaythroughUpdate::CustomLocationRemoved { had_encounter, .. } = update else {
            return false;
        };

        if had_encounter {
            self.store.emit(StoreEvent::EncountersChanged {
                playthrough_id: id,
                locations: vec![location.clone()],
            });
        }
        self.edited(id);
        true
    }

    fn edited(&self, id: PlaythroughId) {
        self.store.emit(StoreEvent::PlaythroughChanged { playthrough_id: id });
        self.persistence.schedule_deferred(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::FixedClock;
    use crate::infrastructure::ports::{KeyValueStore, MockKeyValueStore};
    use crate::infrastructure::storage::InMemoryStore;
    use crate::persistence::StorageKeys;
    use std::time::Duration;

    fn use_cases(kv: Arc<dyn KeyValueStore>) -> (Arc<PlaythroughStore>, PlaythroughUseCases) {
        let store = Arc::new(PlaythroughStore::new());
        let clock: Arc<dyn ClockPort> = Arc::new(FixedClock(Utc::now()));
        let persistence = Arc::new(PlaythroughPersistence::new(
            kv,
            Arc::clone(&store),
            StorageKeys::new("nuzlocke"),
            Duration::from_millis(500),
            Arc::clone(&clock),
        ));
        (
            Arc::clone(&store),
            PlaythroughUseCases::new(store, persistence, clock),
        )
    }

    mod structural {
        use super::*;

        #[tokio::test]
        async fn create_saves_immediately_and_activates() {
            let mut kv = MockKeyValueStore::new();
            kv.expect_set()
                .withf(|key, _| key.contains(":playthrough:"))
                .times(1)
                .returning(|_, _| Ok(()));
            kv.expect_set()
                .withf(|key, _| key.ends_with(":index"))
                .times(1)
                .returning(|_, _| Ok(()));
            let (store, uc) = use_cases(Arc::new(kv));

            let id = uc.create("Emerald Nuzlocke", GameMode::Remix).await.unwrap();

            assert_eq!(store.active_id(), Some(id));
            assert_eq!(uc.list()[0].game_mode, GameMode::Remix);
        }

        #[tokio::test]
        async fn blank_name_uses_default() {
            let (_, uc) = use_cases(Arc::new(InMemoryStore::new()));
            uc.create("   ", GameMode::Classic).await.unwrap();

            assert_eq!(uc.active().unwrap().name().as_str(), "My Nuzlocke");
        }

        #[tokio::test]
        async fn delete_removes_record() {
            let kv = Arc::new(InMemoryStore::new());
            let (store, uc) = use_cases(kv.clone());
            let first = uc.create("First", GameMode::Classic).await.unwrap();
            let second = uc.create("Second", GameMode::Classic).await.unwrap();

            assert!(uc.delete(second).await);

            assert_eq!(store.active_id(), Some(first));
            assert_eq!(
                kv.keys().await,
                vec!["nuzlocke:index".to_string(), format!("nuzlocke:playthrough:{first}")]
            );
            assert!(!uc.delete(second).await);
        }

        #[tokio::test]
        async fn rename_validates_and_reports_change() {
            let (_, uc) = use_cases(Arc::new(InMemoryStore::new()));
            let id = uc.create("Old", GameMode::Classic).await.unwrap();

            assert!(uc.rename(id, "New").await.unwrap());
            assert!(!uc.rename(id, "New").await.unwrap());
            assert!(uc.rename(id, "").await.is_err());
            assert!(!uc.rename(PlaythroughId::new(), "Other").await.unwrap());
        }

        #[tokio::test]
        async fn set_active_rejects_unknown_id() {
            let (_, uc) = use_cases(Arc::new(InMemoryStore::new()));
            let first = uc.create("First", GameMode::Classic).await.unwrap();
            uc.create("Second", GameMode::Classic).await.unwrap();

            assert!(uc.set_active(Some(first)).await);
            assert!(!uc.set_active(Some(first)).await);
            assert!(!uc.set_active(Some(PlaythroughId::new())).await);
        }
    }

    mod edits {
        use super::*;

        #[tokio::test]
        async fn custom_locations_are_ordered_and_removable() {
            let (_, uc) = use_cases(Arc::new(InMemoryStore::new()));
            uc.create("Run", GameMode::Classic).await.unwrap();
            let base = vec![LocationId::from("route-1"), LocationId::from("route-2")];

            let safari = uc
                .add_custom_location("Safari Zone", LocationId::from("route-1"))
                .await
                .unwrap()
                .unwrap();
            assert_eq!(
                uc.ordered_locations(&base),
                vec![LocationId::from("route-1"), safari.clone(), LocationId::from("route-2")]
            );

            assert!(uc.rename_custom_location(&safari, "Great Marsh").await.unwrap());
            assert!(uc.remove_custom_location(&safari).await);
            assert_eq!(uc.ordered_locations(&base), base);
        }

        #[tokio::test]
        async fn no_active_playthrough_is_neutral() {
            let (_, uc) = use_cases(Arc::new(InMemoryStore::new()));

            assert_eq!(uc.add_custom_location("Cave", LocationId::from("route-1")).await.unwrap(), None);
            assert!(!uc.remove_custom_location(&LocationId::from("custom-x")).await);
        }

        #[tokio::test]
        async fn game_mode_change_is_reported_once() {
            let (_, uc) = use_cases(Arc::new(InMemoryStore::new()));
            let id = uc.create("Run", GameMode::Classic).await.unwrap();

            assert!(uc.set_game_mode(id, GameMode::Randomized).await);
            assert!(!uc.set_game_mode(id, GameMode::Randomized).await);
        }

        #[tokio::test(start_paused = true)]
        async fn game_mode_edit_is_saved_after_the_debounce() {
            let kv = Arc::new(InMemoryStore::new());
            let (_, uc) = use_cases(kv.clone());
            let id = uc.create("Run", GameMode::Classic).await.unwrap();

            assert!(uc.set_game_mode(id, GameMode::Remix).await);
            tokio::time::sleep(Duration::from_millis(600)).await;

            let key = StorageKeys::new("nuzlocke").playthrough(id);
            let bytes = kv.get(&key).await.unwrap().unwrap();
            let saved: Playthrough = serde_json::from_slice(&bytes).unwrap();
            assert_eq!(saved.game_mode(), GameMode::Remix);
        }
    }
}
