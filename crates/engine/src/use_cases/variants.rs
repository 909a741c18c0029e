//! Variant resolution: keeps each slot's artwork key in step with its
//! composition.
//!
//! Domain mutations clear the key whenever a composition changes and report
//! the change. This use case then asks the catalog for the remembered
//! preference of the new composition, once per changed location.

use std::sync::Arc;

use nuzlocke_domain::{
    Composition, CycleDirection, EncounterUpdate, LocationId, PlaythroughId, SpeciesId, VariantKey,
};
use tokio::task::JoinHandle;

use crate::infrastructure::ports::VariantCatalog;
use crate::persistence::PlaythroughPersistence;
use crate::stores::{PlaythroughStore, StoreEvent};

pub struct VariantResolver {
    catalog: Arc<dyn VariantCatalog>,
    store: Arc<PlaythroughStore>,
    persistence: Arc<PlaythroughPersistence>,
}

impl VariantResolver {
    pub fn new(
        catalog: Arc<dyn VariantCatalog>,
        store: Arc<PlaythroughStore>,
        persistence: Arc<PlaythroughPersistence>,
    ) -> Self {
        Self {
            catalog,
            store,
            persistence,
        }
    }

    /// Look up the preferred variant for every location whose composition
    /// changed. Locations whose composition is unchanged cause no catalog
    /// traffic at all.
    ///
    /// A catalog failure puts back the key the slot had before the mutation.
    /// A result that arrives after the slot changed again is dropped.
    pub async fn resolve(&self, playthrough_id: PlaythroughId, update: &EncounterUpdate) {
        let mut touched = Vec::new();

        for change in update.composition_changes() {
            let Some((head, body)) = change.after.lookup_key() else {
                continue;
            };

            let key = match self.catalog.preferred_variant(head, body).await {
                Ok(key) => key,
                Err(e) => {
                    tracing::warn!(
                        playthrough_id = %playthrough_id,
                        location = %change.location,
                        composition = %change.after,
                        error = %e,
                        "Variant lookup failed, keeping previous variant"
                    );
                    change.previous_variant.clone()
                }
            };

            let applied = self
                .store
                .update(playthrough_id, |run| {
                    run.apply_variant(&change.location, change.after, key)
                })
                .unwrap_or(false);
            if applied {
                touched.push(change.location.clone());
            }
        }

        if !touched.is_empty() {
            self.changed(playthrough_id, touched);
        }
    }

    /// Step the active playthrough's slot at `location` to the next or
    /// previous variant of its composition, wrapping at both ends. Returns the
    /// key now shown, or `None` if there is nothing to cycle through.
    pub async fn cycle_variant(
        &self,
        location: &LocationId,
        direction: CycleDirection,
    ) -> Option<VariantKey> {
        let (playthrough_id, composition, current) = self.active_slot(location)?;
        let (head, body) = composition.lookup_key()?;

        let variants = match self.catalog.list_variants(head, body).await {
            Ok(variants) => variants,
            Err(e) => {
                tracing::warn!(location = %location, error = %e, "Failed to list variants");
                return None;
            }
        };
        let position = current
            .as_ref()
            .and_then(|key| variants.iter().position(|v| v == key));
        let next = variants.get(direction.step(position, variants.len())?)?.clone();

        let applied = self
            .store
            .update(playthrough_id, |run| {
                run.apply_variant(location, composition, Some(next.clone()))
            })
            .unwrap_or(false);
        if applied {
            self.changed(playthrough_id, vec![location.clone()]);
        }

        if let Err(e) = self
            .catalog
            .set_preferred_variant(head, body, Some(next.clone()))
            .await
        {
            tracing::warn!(location = %location, error = %e, "Failed to remember preferred variant");
        }

        Some(next)
    }

    /// Warm the catalog for the variants either side of the current one, in
    /// the background. Never blocks and never reports errors.
    pub fn prefetch_neighbors(&self, location: &LocationId) -> Option<JoinHandle<()>> {
        let (_, composition, current) = self.active_slot(location)?;
        let (head, body) = composition.lookup_key()?;
        let catalog = Arc::clone(&self.catalog);

        Some(tokio::spawn(async move {
            prefetch_around(catalog.as_ref(), head, body, current).await;
        }))
    }

    fn active_slot(
        &self,
        location: &LocationId,
    ) -> Option<(PlaythroughId, Composition, Option<VariantKey>)> {
        self.store
            .read_active(|run| {
                run.encounter(location).map(|slot| {
                    (
                        run.id(),
                        slot.composition(),
                        slot.preferred_variant().cloned(),
                    )
                })
            })
            .flatten()
    }

    fn changed(&self, playthrough_id: PlaythroughId, locations: Vec<LocationId>) {
        self.store.emit(StoreEvent::EncountersChanged {
            playthrough_id,
            locations,
        });
        self.persistence.schedule_deferred(playthrough_id);
    }
}

async fn prefetch_around(
    catalog: &dyn VariantCatalog,
    head: SpeciesId,
    body: Option<SpeciesId>,
    current: Option<VariantKey>,
) {
    let variants = match catalog.list_variants(head, body).await {
        Ok(variants) => variants,
        Err(e) => {
            tracing::debug!(error = %e, "Prefetch skipped");
            return;
        }
    };
    let position = current
        .as_ref()
        .and_then(|key| variants.iter().position(|v| v == key));

    let mut neighbors: Vec<&VariantKey> = [CycleDirection::Backward, CycleDirection::Forward]
        .into_iter()
        .filter_map(|direction| direction.step(position, variants.len()))
        .filter_map(|i| variants.get(i))
        .filter(|key| Some(*key) != current.as_ref())
        .collect();
    neighbors.dedup();

    for key in neighbors {
        if let Err(e) = catalog.prefetch_variant(head, body, key.clone()).await {
            tracing::debug!(variant = %key, error = %e, "Prefetch failed");
        }
    }
}
