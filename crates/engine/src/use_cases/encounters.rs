//! Encounter use cases.
//!
//! Every operation runs against the active playthrough. The domain mutation
//! is applied under the store's write lock and is complete before anything
//! is awaited; only the variant lookup and the (debounced) save happen
//! afterwards. With no active playthrough every operation returns `false`.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use nuzlocke_domain::{
    CaptureStatus, Creature, CreatureName, CreatureUid, DomainError, EncounterUpdate, LocationId,
    Nickname, Playthrough, SlotPart, SlotState,
};

use super::variants::VariantResolver;
use crate::infrastructure::ports::{ClockPort, SpeciesLookup};
use crate::persistence::PlaythroughPersistence;
use crate::stores::{PlaythroughStore, StoreEvent};

pub struct EncounterUseCases {
    store: Arc<PlaythroughStore>,
    persistence: Arc<PlaythroughPersistence>,
    variants: Arc<VariantResolver>,
    species: Arc<dyn SpeciesLookup>,
    clock: Arc<dyn ClockPort>,
}

impl EncounterUseCases {
    pub fn new(
        store: Arc<PlaythroughStore>,
        persistence: Arc<PlaythroughPersistence>,
        variants: Arc<VariantResolver>,
        species: Arc<dyn SpeciesLookup>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            store,
            persistence,
            variants,
            species,
            clock,
        }
    }

    // =========================================================================
    // Creature Construction
    // =========================================================================

    /// Build a new individual from a species display number, as picked from
    /// the search box. `None` if the number is unknown.
    pub fn new_creature(&self, display_id: u32) -> Option<Creature> {
        let species = self.species.resolve_species(display_id)?;
        let name = self.species.resolve_name(species.species_id)?;
        match CreatureName::new(name) {
            Ok(name) => Some(Creature::new(species.species_id, species.display_id, name)),
            Err(e) => {
                tracing::warn!(display_id, error = %e, "Species table returned an unusable name");
                None
            }
        }
    }

    // =========================================================================
    // Slot Mutations
    // =========================================================================

    pub async fn set_slot(
        &self,
        location: LocationId,
        creature: Option<Creature>,
        part: SlotPart,
        force_fusion: bool,
    ) -> bool {
        self.apply("set_slot", |run, now| {
            run.set_slot(location, creature, part, force_fusion, now)
        })
        .await
    }

    pub async fn clear_slot(&self, location: &LocationId, part: Option<SlotPart>) -> bool {
        self.apply("clear_slot", |run, now| run.clear_slot(location, part, now))
            .await
    }

    pub async fn move_slot(
        &self,
        from: &LocationId,
        to: &LocationId,
        creature: &Creature,
        part: SlotPart,
    ) -> bool {
        self.apply("move_slot", |run, now| {
            run.move_slot(from, to, creature, part, now)
        })
        .await
    }

    pub async fn swap_slots(
        &self,
        a: &LocationId,
        b: &LocationId,
        part_a: SlotPart,
        part_b: SlotPart,
    ) -> bool {
        self.apply("swap_slots", |run, now| {
            run.swap_slots(a, b, part_a, part_b, now)
        })
        .await
    }

    pub async fn toggle_fusion(&self, location: &LocationId) -> bool {
        self.apply("toggle_fusion", |run, now| run.toggle_fusion(location, now))
            .await
    }

    pub async fn flip_fusion(&self, location: &LocationId) -> bool {
        self.apply("flip_fusion", |run, now| run.flip_fusion(location, now))
            .await
    }

    pub async fn create_fusion(&self, location: LocationId, head: Creature, body: Creature) -> bool {
        self.apply("create_fusion", |run, now| {
            run.create_fusion(location, head, body, now)
        })
        .await
    }

    /// Set or clear (blank input) the nickname of one half.
    pub async fn update_nickname(
        &self,
        location: &LocationId,
        part: SlotPart,
        nickname: &str,
    ) -> Result<bool, DomainError> {
        let nickname = Nickname::parse_optional(nickname)?;
        Ok(self
            .apply("update_nickname", |run, now| {
                run.update_creature(location, part, now, |creature| {
                    creature.set_nickname(nickname)
                })
            })
            .await)
    }

    pub async fn update_status(
        &self,
        location: &LocationId,
        part: SlotPart,
        status: Option<CaptureStatus>,
    ) -> bool {
        self.apply("update_status", |run, now| {
            run.update_creature(location, part, now, |creature| creature.set_status(status))
        })
        .await
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn find_creature(&self, uid: &CreatureUid) -> Option<(LocationId, SlotPart, Creature)> {
        self.store
            .read_active(|run| {
                run.find_creature(uid)
                    .map(|(location, part, creature)| (location.clone(), part, creature.clone()))
            })
            .flatten()
    }

    /// Shape of a slot in the active playthrough, for drop-target decisions.
    /// `Absent` when there is no active playthrough.
    pub fn slot_state(&self, location: &LocationId) -> SlotState {
        self.store
            .read_active(|run| run.slot_state(location))
            .unwrap_or(SlotState::Absent)
    }

    pub fn status_counts(&self) -> BTreeMap<CaptureStatus, usize> {
        self.store
            .read_active(Playthrough::status_counts)
            .unwrap_or_default()
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn apply(
        &self,
        operation: &'static str,
        mutation: impl FnOnce(&mut Playthrough, DateTime<Utc>) -> EncounterUpdate,
    ) -> bool {
        let now = self.clock.now();
        let Some((playthrough_id, update)) = self.store.update_active(|run| mutation(run, now))
        else {
            tracing::debug!(operation, "No active playthrough, ignoring");
            return false;
        };

        if update.is_noop() {
            tracing::debug!(operation, playthrough_id = %playthrough_id, "No-op");
            return false;
        }

        let locations: Vec<LocationId> = update.locations().cloned().collect();
        tracing::debug!(
            operation,
            playthrough_id = %playthrough_id,
            locations = ?locations,
            "Encounters updated"
        );
        self.store.emit(StoreEvent::EncountersChanged {
            playthrough_id,
            locations,
        });
        self.persistence.schedule_deferred(playthrough_id);
        self.variants.resolve(playthrough_id, &update).await;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::FixedClock;
    use crate::infrastructure::ports::{MockSpeciesLookup, MockVariantCatalog, SpeciesRef};
    use crate::infrastructure::storage::InMemoryStore;
    use crate::persistence::StorageKeys;
    use nuzlocke_domain::{GameMode, PlaythroughName, SpeciesId};
    use std::sync::Mutex;
    use std::time::Duration;

    fn species(id: u32) -> SpeciesId {
        SpeciesId::new(id).unwrap()
    }

    fn creature(id: u32, name: &str) -> Creature {
        Creature::new(species(id), id, CreatureName::new(name).unwrap())
    }

    fn loc(id: &str) -> LocationId {
        LocationId::from(id)
    }

    fn quiet_catalog() -> MockVariantCatalog {
        let mut catalog = MockVariantCatalog::new();
        catalog.expect_preferred_variant().returning(|_, _| Ok(None));
        catalog
    }

    fn use_cases_with(
        store: Arc<PlaythroughStore>,
        catalog: MockVariantCatalog,
        species: MockSpeciesLookup,
    ) -> EncounterUseCases {
        let clock: Arc<dyn ClockPort> = Arc::new(FixedClock(Utc::now()));
        let persistence = Arc::new(PlaythroughPersistence::new(
            Arc::new(InMemoryStore::new()),
            Arc::clone(&store),
            StorageKeys::new("test"),
            Duration::from_millis(500),
            Arc::clone(&clock),
        ));
        let variants = Arc::new(VariantResolver::new(
            Arc::new(catalog),
            Arc::clone(&store),
            Arc::clone(&persistence),
        ));
        EncounterUseCases::new(store, persistence, variants, Arc::new(species), clock)
    }

    fn active_store() -> Arc<PlaythroughStore> {
        let store = Arc::new(PlaythroughStore::new());
        let run = Playthrough::new(PlaythroughName::new("Run").unwrap(), GameMode::Classic, Utc::now());
        let id = run.id();
        store.insert(run);
        store.set_active(Some(id));
        store
    }

    mod no_active {
        use super::*;

        #[tokio::test]
        async fn every_operation_returns_false() {
            let store = Arc::new(PlaythroughStore::new());
            let mut catalog = MockVariantCatalog::new();
            catalog.expect_preferred_variant().times(0);
            let uc = use_cases_with(store, catalog, MockSpeciesLookup::new());

            assert!(!uc.set_slot(loc("route-1"), Some(creature(25, "Pikachu")), SlotPart::Head, false).await);
            assert!(!uc.toggle_fusion(&loc("route-1")).await);
            assert!(!uc.clear_slot(&loc("route-1"), None).await);
            assert!(uc.status_counts().is_empty());
            assert_eq!(uc.slot_state(&loc("route-1")), SlotState::Absent);
        }
    }

    mod mutations {
        use super::*;

        #[tokio::test]
        async fn set_slot_emits_and_resolves() {
            let store = active_store();
            let events = Arc::new(Mutex::new(Vec::new()));
            let sink = Arc::clone(&events);
            store.subscribe(move |event| sink.lock().unwrap().push(event.clone()));
            let mut catalog = MockVariantCatalog::new();
            catalog
                .expect_preferred_variant()
                .times(1)
                .returning(|_, _| Ok(None));
            let uc = use_cases_with(Arc::clone(&store), catalog, MockSpeciesLookup::new());

            assert!(uc.set_slot(loc("route-1"), Some(creature(25, "Pikachu")), SlotPart::Head, false).await);

            let events = events.lock().unwrap();
            assert!(matches!(
                events.as_slice(),
                [StoreEvent::EncountersChanged { locations, .. }] if locations == &vec![loc("route-1")]
            ));
        }

        #[tokio::test]
        async fn noop_swap_returns_false() {
            let store = active_store();
            let uc = use_cases_with(store, quiet_catalog(), MockSpeciesLookup::new());
            uc.set_slot(loc("route-1"), Some(creature(25, "Pikachu")), SlotPart::Head, false).await;

            assert!(!uc.swap_slots(&loc("route-1"), &loc("route-2"), SlotPart::Head, SlotPart::Head).await);
        }

        #[tokio::test]
        async fn nickname_edit_makes_no_lookup() {
            let store = active_store();
            let mut catalog = MockVariantCatalog::new();
            catalog
                .expect_preferred_variant()
                .times(1)
                .returning(|_, _| Ok(None));
            let uc = use_cases_with(Arc::clone(&store), catalog, MockSpeciesLookup::new());
            uc.set_slot(loc("route-1"), Some(creature(25, "Pikachu")), SlotPart::Head, false).await;

            assert!(uc.update_nickname(&loc("route-1"), SlotPart::Head, "Sparky").await.unwrap());
            assert!(uc.update_nickname(&loc("route-1"), SlotPart::Head, "Sparky").await.is_ok_and(|changed| !changed));
            assert!(uc.update_nickname(&loc("route-1"), SlotPart::Head, "ThirteenChars").await.is_err());

            assert!(uc.update_nickname(&loc("route-1"), SlotPart::Head, "  ").await.unwrap());
            let (_, _, pikachu) = store
                .read_active(|run| {
                    run.creatures()
                        .next()
                        .map(|(l, p, c)| (l.clone(), p, c.clone()))
                })
                .flatten()
                .unwrap();
            assert!(pikachu.nickname().is_none());
        }

        #[tokio::test]
        async fn status_counts_follow_updates() {
            let store = active_store();
            let uc = use_cases_with(store, quiet_catalog(), MockSpeciesLookup::new());
            uc.create_fusion(loc("route-1"), creature(25, "Pikachu"), creature(4, "Charmander"))
                .await;

            assert!(uc.update_status(&loc("route-1"), SlotPart::Head, Some(CaptureStatus::Deceased)).await);

            let counts = uc.status_counts();
            assert_eq!(counts.get(&CaptureStatus::Deceased), Some(&1));
            assert_eq!(counts.values().sum::<usize>(), 1);
        }

        #[tokio::test]
        async fn move_then_find_by_uid() {
            let store = active_store();
            let uc = use_cases_with(store, quiet_catalog(), MockSpeciesLookup::new());
            let pikachu = creature(25, "Pikachu");
            uc.set_slot(loc("route-1"), Some(pikachu.clone()), SlotPart::Head, false).await;

            assert!(uc.move_slot(&loc("route-1"), &loc("route-2"), &pikachu, SlotPart::Body).await);

            let (location, part, found) = uc.find_creature(pikachu.uid()).unwrap();
            assert_eq!(location, loc("route-2"));
            assert_eq!(part, SlotPart::Body);
            assert!(found.is_same_individual(&pikachu));
            assert_eq!(uc.slot_state(&loc("route-1")), SlotState::Absent);
            assert_eq!(uc.slot_state(&loc("route-2")), SlotState::FusionPartial);
        }
    }

    mod new_creature {
        use super::*;

        #[test]
        fn resolves_species_and_name() {
            let mut species_lookup = MockSpeciesLookup::new();
            species_lookup.expect_resolve_species().returning(|display_id| {
                Some(SpeciesRef {
                    species_id: SpeciesId::new(display_id).unwrap(),
                    display_id,
                })
            });
            species_lookup
                .expect_resolve_name()
                .returning(|_| Some("Pikachu".to_string()));
            let uc = use_cases_with(active_store(), quiet_catalog(), species_lookup);

            let creature = uc.new_creature(25).unwrap();
            assert_eq!(creature.name().as_str(), "Pikachu");
            assert_eq!(creature.display_id(), 25);
        }

        #[test]
        fn unknown_species_is_none() {
            let mut species_lookup = MockSpeciesLookup::new();
            species_lookup.expect_resolve_species().returning(|_| None);
            species_lookup.expect_resolve_name().times(0);
            let uc = use_cases_with(active_store(), quiet_catalog(), species_lookup);

            assert!(uc.new_creature(9999).is_none());
        }
    }
}
