use anyhow::Context;

use cinematch::{
    builder::{backup_existing, compare_models, log_comparison, SimilarityBuilder, TfidfParams},
    config::BuilderConfig,
    store::{self, ensure_aligned, SimilarityMatrix},
    telemetry,
};

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init();

    let config = BuilderConfig::from_env()?;
    tracing::info!(
        items_path = %config.items_path.display(),
        output_path = %config.output_path.display(),
        "Starting similarity model build"
    );

    let items = store::load_items(&config.items_path)
        .with_context(|| format!("loading {}", config.items_path.display()))?;
    tracing::info!(items = items.len(), "Loaded item table");

    let model = SimilarityBuilder::new(TfidfParams::from(&config)).build(&items)?;

    // Compare against the model being replaced, when there is a usable one
    match SimilarityMatrix::load(&config.output_path) {
        Ok(previous) if ensure_aligned(&items, &previous).is_ok() => {
            let comparisons =
                compare_models(&items, &previous, &model.matrix, &config.probe_titles);
            log_comparison(&comparisons);
        }
        Ok(previous) => tracing::warn!(
            previous_dimension = previous.dimension(),
            items = items.len(),
            "Previous similarity matrix does not match the item table, skipping comparison"
        ),
        Err(e) => tracing::info!(error = %e, "No previous similarity matrix to compare against"),
    }

    if config.backup {
        backup_existing(&config.output_path)?;
    }

    model
        .matrix
        .save(&config.output_path)
        .with_context(|| format!("writing {}", config.output_path.display()))?;

    let size_mb = std::fs::metadata(&config.output_path)?.len() as f64 / (1024.0 * 1024.0);
    tracing::info!(
        output_path = %config.output_path.display(),
        size_mb = %format!("{:.1}", size_mb),
        "Similarity matrix saved"
    );

    Ok(())
}
