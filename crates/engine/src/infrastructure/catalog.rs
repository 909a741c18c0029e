//! In-memory catalog adapters: artwork variants and the species table.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use async_trait::async_trait;
use nuzlocke_domain::{SpeciesId, VariantKey};

use crate::infrastructure::ports::{
    CatalogError, SpeciesLookup, SpeciesRef, VariantCatalog,
};

type CompositionKey = (SpeciesId, Option<SpeciesId>);

/// Variant catalog held in memory, with remembered preferences.
#[derive(Default)]
pub struct InMemoryVariantCatalog {
    variants: HashMap<CompositionKey, Vec<VariantKey>>,
    preferred: RwLock<HashMap<CompositionKey, VariantKey>>,
    prefetched: RwLock<HashSet<VariantKey>>,
}

impl InMemoryVariantCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_variants(
        mut self,
        head: SpeciesId,
        body: Option<SpeciesId>,
        keys: impl IntoIterator<Item = VariantKey>,
    ) -> Self {
        self.variants.insert((head, body), keys.into_iter().collect());
        self
    }

    /// Whether a variant has been warmed through `prefetch_variant`.
    pub fn is_prefetched(&self, key: &VariantKey) -> bool {
        self.prefetched
            .read()
            .map(|set| set.contains(key))
            .unwrap_or(false)
    }
}

#[async_trait]
impl VariantCatalog for InMemoryVariantCatalog {
    async fn list_variants(
        &self,
        head: SpeciesId,
        body: Option<SpeciesId>,
    ) -> Result<Vec<VariantKey>, CatalogError> {
        Ok(self.variants.get(&(head, body)).cloned().unwrap_or_default())
    }

    async fn preferred_variant(
        &self,
        head: SpeciesId,
        body: Option<SpeciesId>,
    ) -> Result<Option<VariantKey>, CatalogError> {
        let preferred = self
            .preferred
            .read()
            .map_err(|e| CatalogError::request_failed(format!("lock poisoned: {e}")))?;
        Ok(preferred.get(&(head, body)).cloned())
    }

    async fn set_preferred_variant(
        &self,
        head: SpeciesId,
        body: Option<SpeciesId>,
        key: Option<VariantKey>,
    ) -> Result<(), CatalogError> {
        let mut preferred = self
            .preferred
            .write()
            .map_err(|e| CatalogError::request_failed(format!("lock poisoned: {e}")))?;
        match key {
            Some(key) => preferred.insert((head, body), key),
            None => preferred.remove(&(head, body)),
        };
        Ok(())
    }

    async fn prefetch_variant(
        &self,
        _head: SpeciesId,
        _body: Option<SpeciesId>,
        key: VariantKey,
    ) -> Result<(), CatalogError> {
        let mut prefetched = self
            .prefetched
            .write()
            .map_err(|e| CatalogError::request_failed(format!("lock poisoned: {e}")))?;
        prefetched.insert(key);
        Ok(())
    }
}

/// Species table keyed by display number.
#[derive(Default)]
pub struct SpeciesTable {
    entries: HashMap<u32, (SpeciesRef, String)>,
}

impl SpeciesTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_species(mut self, species_id: SpeciesId, display_id: u32, name: &str) -> Self {
        self.entries.insert(
            display_id,
            (
                SpeciesRef {
                    species_id,
                    display_id,
                },
                name.to_string(),
            ),
        );
        self
    }
}

impl SpeciesLookup for SpeciesTable {
    fn resolve_name(&self, species: SpeciesId) -> Option<String> {
        self.entries
            .values()
            .find(|(reference, _)| reference.species_id == species)
            .map(|(_, name)| name.clone())
    }

    fn resolve_species(&self, display_id: u32) -> Option<SpeciesRef> {
        self.entries.get(&display_id).map(|(reference, _)| *reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u32) -> SpeciesId {
        SpeciesId::new(n).unwrap()
    }

    #[tokio::test]
    async fn preferences_are_per_composition() {
        let catalog = InMemoryVariantCatalog::new();
        catalog
            .set_preferred_variant(id(25), Some(id(4)), Some(VariantKey::from("25.4a")))
            .await
            .unwrap();

        assert_eq!(
            catalog.preferred_variant(id(25), Some(id(4))).await.unwrap(),
            Some(VariantKey::from("25.4a"))
        );
        assert_eq!(catalog.preferred_variant(id(4), Some(id(25))).await.unwrap(), None);

        catalog.set_preferred_variant(id(25), Some(id(4)), None).await.unwrap();
        assert_eq!(catalog.preferred_variant(id(25), Some(id(4))).await.unwrap(), None);
    }

    #[tokio::test]
    async fn unknown_composition_lists_nothing() {
        let catalog = InMemoryVariantCatalog::new()
            .with_variants(id(25), None, [VariantKey::from("25a")]);

        assert_eq!(catalog.list_variants(id(25), None).await.unwrap().len(), 1);
        assert!(catalog.list_variants(id(26), None).await.unwrap().is_empty());
    }

    #[test]
    fn species_table_resolves_both_ways() {
        let table = SpeciesTable::new().with_species(id(25), 25, "Pikachu");

        assert_eq!(table.resolve_name(id(25)).as_deref(), Some("Pikachu"));
        assert_eq!(table.resolve_species(25).map(|r| r.species_id), Some(id(25)));
        assert!(table.resolve_species(26).is_none());
    }
}
