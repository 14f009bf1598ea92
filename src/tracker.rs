//! Experiment tracker sink.
//!
//! The harness treats the tracker as an opaque sink: one call logs a named
//! run with scalar metrics, tags, and an optional artifact. The bundled
//! implementation talks to an MLflow-compatible REST server.

use chrono::Utc;
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// A rendered artifact attached to a tracked run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub file_name: String,
    pub content: Vec<u8>,
}

/// One run's worth of material pushed to the tracker.
#[derive(Debug, Clone, PartialEq)]
pub struct RunLog {
    /// Run name, conventionally `model/adaptations`.
    pub name: String,
    pub metrics: Vec<(String, f64)>,
    pub tags: Vec<(String, String)>,
    pub artifact: Option<Artifact>,
}

/// Opaque sink for benchmark runs.
pub trait TrackerSink {
    /// Error type returned when logging fails.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Record one complete run.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink rejects any part of the run; partial
    /// writes are not rolled back.
    fn log_run(&self, run: &RunLog) -> Result<(), Self::Error>;
}

/// Errors raised by the MLflow REST sink.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("tracker response missing {0}")]
    MalformedResponse(&'static str),
}

/// MLflow-compatible REST sink.
///
/// Resolves the experiment by name (creating it on first use), creates a
/// run, logs metrics and tags in one batch, uploads the artifact through
/// the proxied artifact endpoint, and marks the run finished.
#[derive(Debug, Clone)]
pub struct MlflowTracker {
    client: Client,
    base_url: String,
    experiment: String,
}

#[derive(Deserialize)]
struct ExperimentResponse {
    experiment: Experiment,
}

#[derive(Deserialize)]
struct Experiment {
    experiment_id: String,
}

#[derive(Deserialize)]
struct CreateExperimentResponse {
    experiment_id: String,
}

#[derive(Deserialize)]
struct CreateRunResponse {
    run: CreatedRun,
}

#[derive(Deserialize)]
struct CreatedRun {
    info: RunInfo,
}

#[derive(Deserialize)]
struct RunInfo {
    run_id: String,
}

impl MlflowTracker {
    /// Create a sink for the given tracking server and experiment name.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be constructed with the default
    /// configuration.
    #[must_use]
    pub fn new(base_url: impl Into<String>, experiment: impl Into<String>) -> Self {
        #[expect(
            clippy::expect_used,
            reason = "client builder should not fail with defaults"
        )]
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("client builder failed with default configuration");
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self {
            client,
            base_url,
            experiment: experiment.into(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/2.0/mlflow/{path}", self.base_url)
    }

    /// Resolve the experiment id, creating the experiment on first use.
    fn experiment_id(&self) -> Result<String, TrackerError> {
        let resp = self
            .client
            .get(self.endpoint("experiments/get-by-name"))
            .query(&[("experiment_name", self.experiment.as_str())])
            .send()?;
        if resp.status().is_success() {
            let body: ExperimentResponse = resp
                .json()
                .map_err(|_| TrackerError::MalformedResponse("experiment.experiment_id"))?;
            return Ok(body.experiment.experiment_id);
        }
        debug!(experiment = %self.experiment, "experiment not found, creating it");
        let resp = self
            .client
            .post(self.endpoint("experiments/create"))
            .json(&serde_json::json!({ "name": self.experiment }))
            .send()?
            .error_for_status()?;
        let body: CreateExperimentResponse = resp
            .json()
            .map_err(|_| TrackerError::MalformedResponse("experiment_id"))?;
        Ok(body.experiment_id)
    }
}

impl TrackerSink for MlflowTracker {
    type Error = TrackerError;

    fn log_run(&self, run: &RunLog) -> Result<(), TrackerError> {
        let experiment_id = self.experiment_id()?;
        let started = Utc::now().timestamp_millis();

        let resp = self
            .client
            .post(self.endpoint("runs/create"))
            .json(&serde_json::json!({
                "experiment_id": experiment_id,
                "run_name": run.name,
                "start_time": started,
            }))
            .send()?
            .error_for_status()?;
        let created: CreateRunResponse = resp
            .json()
            .map_err(|_| TrackerError::MalformedResponse("run.info.run_id"))?;
        let run_id = created.run.info.run_id;

        let metrics: Vec<_> = run
            .metrics
            .iter()
            .map(|(key, value)| {
                serde_json::json!({
                    "key": key,
                    "value": value,
                    "timestamp": started,
                    "step": 0,
                })
            })
            .collect();
        let tags: Vec<_> = run
            .tags
            .iter()
            .map(|(key, value)| serde_json::json!({ "key": key, "value": value }))
            .collect();
        self.client
            .post(self.endpoint("runs/log-batch"))
            .json(&serde_json::json!({
                "run_id": run_id,
                "metrics": metrics,
                "tags": tags,
            }))
            .send()?
            .error_for_status()?;

        if let Some(artifact) = &run.artifact {
            let url = format!(
                "{}/api/2.0/mlflow-artifacts/artifacts/{run_id}/{}",
                self.base_url, artifact.file_name
            );
            self.client
                .put(url)
                .body(artifact.content.clone())
                .send()?
                .error_for_status()?;
        }

        self.client
            .post(self.endpoint("runs/update"))
            .json(&serde_json::json!({
                "run_id": run_id,
                "status": "FINISHED",
                "end_time": Utc::now().timestamp_millis(),
            }))
            .send()?
            .error_for_status()?;
        debug!(run = %run.name, %run_id, "logged run");
        Ok(())
    }
}
