//! Offline metrics reporting for persisted runs.
//!
//! Re-reads a run directory, computes the classification report and error
//! metrics, and pushes everything to the tracker as one tagged run named
//! `model/adaptations`. This is an analysis tool, not a service: a missing
//! artifact, a malformed metadata record, or an empty prediction set
//! aborts the report.

use std::path::Path;

use thiserror::Error;
use tracing::info;

use crate::api::Sentiment;
use crate::metrics::{self, MetricsError, ScoreHistogram, HISTOGRAM_BINS};
use crate::recorder::{self, RecorderError};
use crate::tracker::{Artifact, RunLog, TrackerSink};

/// Errors raised while reporting a run.
#[derive(Debug, Error)]
pub enum ReportError<E: std::error::Error + Send + Sync + 'static> {
    #[error(transparent)]
    Run(#[from] RecorderError),
    #[error(transparent)]
    Metrics(#[from] MetricsError),
    #[error("failed to encode histogram artifact: {0}")]
    Artifact(#[from] serde_json::Error),
    #[error("tracker rejected run: {0}")]
    Tracker(#[source] E),
}

/// Load a run directory, compute its metrics, and log one tracker run.
///
/// # Errors
///
/// Returns an error if the run cannot be loaded, the prediction set is
/// empty, or the tracker rejects the run.
pub fn report_run<T: TrackerSink>(dir: &Path, tracker: &T) -> Result<(), ReportError<T::Error>> {
    let (records, metadata) = recorder::load_run(dir)?;

    let report = metrics::classification_report(&records)?;
    let mut scalars = metrics::flatten_report(&report);
    scalars.push(("inference_time".to_owned(), metadata.inference_time));
    scalars.push(("MAE".to_owned(), metrics::mean_absolute_error(&records)?));
    if let Some(value) = metrics::mae_for_class(&records, Sentiment::Positive) {
        scalars.push(("MAE_positive".to_owned(), value));
    }
    if let Some(value) = metrics::mae_for_class(&records, Sentiment::Negative) {
        scalars.push(("MAE_negative".to_owned(), value));
    }

    let histogram = ScoreHistogram::from_records(&records, HISTOGRAM_BINS)?;
    let artifact = Artifact {
        file_name: "scores_distribution.json".to_owned(),
        content: serde_json::to_vec_pretty(&histogram)?,
    };

    let run = RunLog {
        name: format!("{}/{}", metadata.model, metadata.adaptations),
        metrics: scalars,
        tags: vec![
            ("model".to_owned(), metadata.model.clone()),
            ("adaptations".to_owned(), metadata.adaptations.clone()),
            ("other_comments".to_owned(), metadata.other_comments.clone()),
        ],
        artifact: Some(artifact),
    };
    tracker.log_run(&run).map_err(ReportError::Tracker)?;
    info!(run = %run.name, records = records.len(), "logged run to tracker");
    Ok(())
}
