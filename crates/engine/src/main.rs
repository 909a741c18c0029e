//! Nuzlocke tracker engine - prints a summary of the saved playthroughs.

use std::sync::Arc;

use nuzlocke_engine::infrastructure::{
    catalog::{InMemoryVariantCatalog, SpeciesTable},
    settings::{env_log_filter, load_env_files, EngineSettings},
    telemetry::init_tracing,
};
use nuzlocke_engine::App;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Env files first so NUZLOCKE_LOG can come from them, then tracing, then
    // everything that may warn.
    let env_file_failures = load_env_files();
    init_tracing(env_log_filter().as_deref());
    for (file, error) in env_file_failures {
        tracing::warn!(file, error = %error, "Failed to load env file");
    }

    let settings = EngineSettings::from_env();
    tracing::info!(
        path = %settings.storage_path.display(),
        debounce_ms = u64::try_from(settings.save_debounce.as_millis()).unwrap_or(u64::MAX),
        "Starting Nuzlocke engine"
    );

    let (app, report) = App::from_settings(
        &settings,
        Arc::new(InMemoryVariantCatalog::new()),
        Arc::new(SpeciesTable::new()),
    )
    .await?;

    if !report.skipped.is_empty() {
        tracing::warn!(skipped = ?report.skipped, "Some playthroughs could not be loaded");
    }

    for run in app.use_cases.playthroughs.list() {
        let counts = app
            .store
            .read(run.id, |p| p.status_counts())
            .unwrap_or_default();
        tracing::info!(
            playthrough_id = %run.id,
            name = %run.name,
            game_mode = %run.game_mode,
            encounters = run.encounter_count,
            active = run.is_active,
            statuses = ?counts,
            "Playthrough"
        );
    }

    app.shutdown().await;
    Ok(())
}
