//! Run persistence.
//!
//! A run is one complete batch pass by one model configuration: the joined
//! predictions as a `;`-delimited CSV plus a metadata JSON record, written
//! once into a model-named directory and never mutated afterwards. The two
//! artifacts are advisory benchmarking output, so no atomicity is
//! attempted.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use csv::{ReaderBuilder, WriterBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::api::{Prediction, Sentiment};
use crate::dataset::TestSet;

/// Metadata captured alongside a run's predictions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    /// Model identifier; also names the run directory.
    pub model: String,
    /// Free-text note on adaptations applied for this pass.
    pub adaptations: String,
    /// Wall-clock inference duration in seconds.
    pub inference_time: f64,
    /// Free-text commentary.
    pub other_comments: String,
}

/// One joined row of `predictions.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub review: String,
    #[serde(rename = "Target")]
    pub target: Sentiment,
    pub positive_score: f64,
    #[serde(rename = "Prediction")]
    pub prediction: Sentiment,
}

/// Retention policy for run directories.
///
/// The harness originally clobbered a model's directory on every rerun;
/// that stays available as `Overwrite` for always-compare-against-latest
/// workflows, but the default keeps every pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunRetention {
    /// One directory per model, overwritten on rerun.
    Overwrite,
    /// A fresh timestamped subdirectory per pass, never clobbering prior
    /// results.
    #[default]
    Timestamped,
}

/// Errors raised while persisting or re-reading a run.
#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("no prediction recorded for review {index}")]
    MissingPrediction { index: usize },
    #[error("more than one prediction recorded for review {index}")]
    DuplicatePrediction { index: usize },
    #[error("run has no reviews to persist")]
    EmptyRun,
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode or decode {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("failed to encode or decode metadata: {0}")]
    Json(#[from] serde_json::Error),
}

/// Writes runs beneath a root directory according to a retention policy.
#[derive(Debug, Clone)]
pub struct RunRecorder {
    root: PathBuf,
    retention: RunRetention,
}

impl RunRecorder {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, retention: RunRetention) -> Self {
        Self {
            root: root.into(),
            retention,
        }
    }

    /// Join ground truth with predictions on the review index and persist
    /// `predictions.csv` plus `metadata.json`. Returns the run directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the test set is empty, any review lacks exactly
    /// one prediction, or either artifact cannot be written.
    pub fn persist(
        &self,
        test_set: &TestSet,
        predictions: &[Prediction],
        metadata: &RunMetadata,
    ) -> Result<PathBuf, RecorderError> {
        let records = join_records(test_set, predictions)?;
        let dir = self.run_dir(&metadata.model);
        fs::create_dir_all(&dir).map_err(|source| RecorderError::Io {
            path: dir.clone(),
            source,
        })?;

        let csv_path = dir.join("predictions.csv");
        write_records(&csv_path, &records)?;

        let metadata_path = dir.join("metadata.json");
        let json = serde_json::to_string_pretty(metadata)?;
        fs::write(&metadata_path, json).map_err(|source| RecorderError::Io {
            path: metadata_path,
            source,
        })?;

        info!(dir = %dir.display(), records = records.len(), "persisted run");
        Ok(dir)
    }

    fn run_dir(&self, model: &str) -> PathBuf {
        let base = self.root.join(model);
        match self.retention {
            RunRetention::Overwrite => base,
            RunRetention::Timestamped => {
                base.join(Local::now().format("%Y%m%d-%H%M%S").to_string())
            }
        }
    }
}

/// Left join on review index. Every review must carry exactly one
/// prediction; the join key and the duplicated raw text are dropped from
/// the persisted rows.
fn join_records(
    test_set: &TestSet,
    predictions: &[Prediction],
) -> Result<Vec<RunRecord>, RecorderError> {
    if test_set.is_empty() {
        return Err(RecorderError::EmptyRun);
    }
    let mut by_index = std::collections::BTreeMap::new();
    for prediction in predictions {
        if by_index.insert(prediction.review_index, prediction).is_some() {
            return Err(RecorderError::DuplicatePrediction {
                index: prediction.review_index,
            });
        }
    }
    test_set
        .reviews()
        .iter()
        .map(|review| {
            let prediction =
                by_index
                    .get(&review.index)
                    .ok_or(RecorderError::MissingPrediction {
                        index: review.index,
                    })?;
            Ok(RunRecord {
                review: review.review.clone(),
                target: review.target,
                positive_score: prediction.positive_score,
                prediction: prediction.label,
            })
        })
        .collect()
}

fn write_records(path: &Path, records: &[RunRecord]) -> Result<(), RecorderError> {
    let mut writer = WriterBuilder::new()
        .delimiter(b';')
        .from_path(path)
        .map_err(|source| RecorderError::Csv {
            path: path.to_owned(),
            source,
        })?;
    for record in records {
        writer.serialize(record).map_err(|source| RecorderError::Csv {
            path: path.to_owned(),
            source,
        })?;
    }
    writer.flush().map_err(|source| RecorderError::Io {
        path: path.to_owned(),
        source,
    })?;
    Ok(())
}

/// Re-read a persisted run directory.
///
/// # Errors
///
/// Returns an error if either artifact is missing or malformed, including
/// a metadata record with missing fields.
pub fn load_run(dir: &Path) -> Result<(Vec<RunRecord>, RunMetadata), RecorderError> {
    let csv_path = dir.join("predictions.csv");
    let mut reader = ReaderBuilder::new()
        .delimiter(b';')
        .from_path(&csv_path)
        .map_err(|source| RecorderError::Csv {
            path: csv_path.clone(),
            source,
        })?;
    let mut records = Vec::new();
    for row in reader.deserialize::<RunRecord>() {
        records.push(row.map_err(|source| RecorderError::Csv {
            path: csv_path.clone(),
            source,
        })?);
    }

    let metadata_path = dir.join("metadata.json");
    let raw = fs::read_to_string(&metadata_path).map_err(|source| RecorderError::Io {
        path: metadata_path,
        source,
    })?;
    let metadata = serde_json::from_str(&raw)?;
    Ok((records, metadata))
}
