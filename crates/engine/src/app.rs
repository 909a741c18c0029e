//! Application state and composition.

use std::sync::Arc;

use anyhow::Context;

use crate::infrastructure::{
    clock::SystemClock,
    ports::{ClockPort, KeyValueStore, SpeciesLookup, VariantCatalog},
    settings::EngineSettings,
    storage::JsonFileStore,
};
use crate::persistence::{LoadReport, PlaythroughPersistence, StorageKeys};
use crate::stores::PlaythroughStore;
use crate::use_cases;

/// Main application state.
///
/// Holds the shared store and every use case wired against it. Front ends
/// read through `store` and mutate through the use cases.
pub struct App {
    pub store: Arc<PlaythroughStore>,
    pub persistence: Arc<PlaythroughPersistence>,
    pub use_cases: UseCases,
}

/// Container for all use cases.
pub struct UseCases {
    pub encounters: use_cases::EncounterUseCases,
    pub playthroughs: use_cases::PlaythroughUseCases,
    pub variants: Arc<use_cases::VariantResolver>,
}

impl App {
    /// Wire the engine over the given adapters. Nothing is loaded yet; call
    /// [`App::load`] before use.
    pub fn new(
        kv: Arc<dyn KeyValueStore>,
        catalog: Arc<dyn VariantCatalog>,
        species: Arc<dyn SpeciesLookup>,
        clock: Arc<dyn ClockPort>,
        settings: &EngineSettings,
    ) -> Self {
        let store = Arc::new(PlaythroughStore::new());
        let persistence = Arc::new(PlaythroughPersistence::new(
            kv,
            store.clone(),
            StorageKeys::new(settings.storage_prefix.clone()),
            settings.save_debounce,
            clock.clone(),
        ));

        let variants = Arc::new(use_cases::VariantResolver::new(
            catalog,
            store.clone(),
            persistence.clone(),
        ));
        let encounters = use_cases::EncounterUseCases::new(
            store.clone(),
            persistence.clone(),
            variants.clone(),
            species,
            clock.clone(),
        );
        let playthroughs =
            use_cases::PlaythroughUseCases::new(store.clone(), persistence.clone(), clock);

        Self {
            store,
            persistence,
            use_cases: UseCases {
                encounters,
                playthroughs,
                variants,
            },
        }
    }

    /// Open the JSON file named by `settings`, wire the engine over it and
    /// load all saved playthroughs.
    pub async fn from_settings(
        settings: &EngineSettings,
        catalog: Arc<dyn VariantCatalog>,
        species: Arc<dyn SpeciesLookup>,
    ) -> anyhow::Result<(Self, LoadReport)> {
        if let Some(dir) = settings.storage_path.parent() {
            if !dir.as_os_str().is_empty() {
                tokio::fs::create_dir_all(dir).await.with_context(|| {
                    format!("Failed to create storage directory {}", dir.display())
                })?;
            }
        }

        let kv: Arc<dyn KeyValueStore> = Arc::new(JsonFileStore::open(&settings.storage_path));
        let clock: Arc<dyn ClockPort> = Arc::new(SystemClock::new());
        let app = Self::new(kv, catalog, species, clock, settings);
        let report = app.load().await;
        Ok((app, report))
    }

    pub async fn load(&self) -> LoadReport {
        self.use_cases.playthroughs.load().await
    }

    /// Write every save still waiting for the debounce timer.
    pub async fn shutdown(&self) {
        self.persistence.flush_pending().await;
        tracing::info!("Engine shut down");
    }
}
