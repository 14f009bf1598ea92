//! Computes metrics for one persisted run and logs them to the tracker.

use anyhow::Context;
use clap::Parser;

use sentibench::cli::{self, ReportArgs};
use sentibench::config::ReportConfig;
use sentibench::reporter;
use sentibench::tracker::MlflowTracker;

fn main() -> anyhow::Result<()> {
    cli::init_tracing();
    let args = ReportArgs::parse();
    let config = ReportConfig::load(Some(&args.config_path)).with_context(|| {
        format!(
            "failed to load configuration from {}",
            args.config_path.display()
        )
    })?;

    let dir = config.data.runs_root.join(&args.model_name_folder);
    let tracker = MlflowTracker::new(
        config.tracker.base_url.clone(),
        config.tracker.experiment.clone(),
    );
    reporter::report_run(&dir, &tracker)
        .with_context(|| format!("failed to report run {}", dir.display()))?;
    Ok(())
}
