//! External collaborator ports: durable storage, artwork catalog, species data.

use async_trait::async_trait;
use nuzlocke_domain::{SpeciesId, VariantKey};

use super::error::{CatalogError, StoreError};

// =============================================================================
// Durable Storage Port
// =============================================================================

/// Flat string-keyed byte store.
///
/// Implementations only need last-write-wins semantics per key; the
/// persistence adapter never relies on ordering between keys.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;
    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError>;
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}

// =============================================================================
// Variant Catalog Port
// =============================================================================

/// Alternate artwork index, keyed by composition.
///
/// `body` is `None` for a plain creature. A composition with only a body is
/// looked up with the body passed as `head`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VariantCatalog: Send + Sync {
    /// All variants available for a composition, in display order.
    async fn list_variants(
        &self,
        head: SpeciesId,
        body: Option<SpeciesId>,
    ) -> Result<Vec<VariantKey>, CatalogError>;

    /// The variant the user last chose for this composition, if any.
    async fn preferred_variant(
        &self,
        head: SpeciesId,
        body: Option<SpeciesId>,
    ) -> Result<Option<VariantKey>, CatalogError>;

    /// Remember (or forget, with `None`) the user's choice for a composition.
    async fn set_preferred_variant(
        &self,
        head: SpeciesId,
        body: Option<SpeciesId>,
        key: Option<VariantKey>,
    ) -> Result<(), CatalogError>;

    /// Warm whatever the catalog caches for one variant. Best effort.
    async fn prefetch_variant(
        &self,
        head: SpeciesId,
        body: Option<SpeciesId>,
        key: VariantKey,
    ) -> Result<(), CatalogError>;
}

// =============================================================================
// Species Lookup Port
// =============================================================================

/// Species numbers as the game data table knows them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeciesRef {
    pub species_id: SpeciesId,
    /// National-dex style number shown to the user.
    pub display_id: u32,
}

#[cfg_attr(test, mockall::automock)]
pub trait SpeciesLookup: Send + Sync {
    fn resolve_name(&self, species: SpeciesId) -> Option<String>;
    fn resolve_species(&self, display_id: u32) -> Option<SpeciesRef>;
}
