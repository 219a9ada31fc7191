use std::env;
use std::path::Path;
use std::time::Instant;

use anyhow::Context;
use log::{info, warn};

use cohort_metrics::utils::logging::{create_main_progress_bar, finish_progress_bar};
use cohort_metrics::{CohortEngine, EngineConfig, StudyCatalog};

/// Environment variable overriding the population seed
const SEED_VAR: &str = "COHORT_SEED";

fn main() -> anyhow::Result<()> {
    // Setup logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let catalog = match env::args().nth(1) {
        Some(path) => {
            info!("Loading study catalog from: {path}");
            StudyCatalog::from_path(Path::new(&path))
                .with_context(|| format!("failed to load study catalog {path}"))?
        }
        None => StudyCatalog::builtin().context("builtin study catalog is invalid")?,
    };

    let mut builder = EngineConfig::builder();
    if let Ok(raw) = env::var(SEED_VAR) {
        match raw.parse::<u64>() {
            Ok(seed) => builder = builder.seed(seed),
            Err(_) => warn!("Ignoring {SEED_VAR}={raw}: not an unsigned integer"),
        }
    }
    let config = builder.build();
    info!("{config}");

    let engine = CohortEngine::new(catalog, config);
    let studies: Vec<String> = engine
        .catalog()
        .studies()
        .iter()
        .map(|s| s.id.clone())
        .collect();

    let start = Instant::now();
    let progress = create_main_progress_bar(studies.len() as u64, Some("Building study reports"));
    let mut reports = Vec::with_capacity(studies.len());
    for study_id in &studies {
        progress.set_message(study_id.clone());
        reports.push(engine.study_report(study_id)?);
        progress.inc(1);
    }
    finish_progress_bar(&progress, Some(&format!("Built {} study reports", reports.len())));

    info!(
        "Generated reports for {} studies in {:?}",
        reports.len(),
        start.elapsed()
    );
    println!("{}", serde_json::to_string_pretty(&reports)?);

    Ok(())
}
