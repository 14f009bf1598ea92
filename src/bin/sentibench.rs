//! Batch inference over the test set, persisted as one run.

use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use tracing::info;

use sentibench::api::ReviewInput;
use sentibench::batch::{BatchOptions, Batcher};
use sentibench::cli::{self, PredictArgs};
use sentibench::config::AppConfig;
use sentibench::dataset::TestSet;
use sentibench::recorder::{RunMetadata, RunRecorder};

fn main() -> anyhow::Result<()> {
    cli::init_tracing();
    let args = PredictArgs::parse();
    let config = AppConfig::load(Some(&args.config_path)).with_context(|| {
        format!(
            "failed to load configuration from {}",
            args.config_path.display()
        )
    })?;
    anyhow::ensure!(
        !config.run.model_name.is_empty(),
        "run.model_name must be set to name the run directory"
    );

    let test_set = TestSet::load(&config.data.input_csv).with_context(|| {
        format!(
            "failed to load test set from {}",
            config.data.input_csv.display()
        )
    })?;
    info!(reviews = test_set.len(), "loaded test set");

    let classifier = config.provider.build_classifier(config.api_token.as_deref());
    let options = BatchOptions {
        truncate_chars: config.inference.truncate_chars,
        pause: config.inference.pause_secs.map(Duration::from_secs),
    };
    let batcher = Batcher::new(classifier, config.provider.label_scheme(), options);

    let input = ReviewInput::from(test_set.texts());
    let started = Instant::now();
    let predictions = batcher
        .predict(&input)
        .context("batch inference failed; run not persisted")?;
    let inference_time = started.elapsed().as_secs_f64();
    info!(inference_time, "finished batch inference");

    let metadata = RunMetadata {
        model: config.run.model_name.clone(),
        adaptations: config.run.adaptations.clone(),
        inference_time,
        other_comments: config.run.other_comments.clone(),
    };
    let recorder = RunRecorder::new(&config.data.runs_root, config.data.retention);
    let dir = recorder
        .persist(&test_set, &predictions, &metadata)
        .context("failed to persist run")?;
    info!(dir = %dir.display(), "run persisted");
    Ok(())
}
