//! End-to-end reporting against a mock MLflow server.

use std::fs;
use std::path::PathBuf;

use httpmock::{Method::GET, Method::POST, Method::PUT, MockServer};
use rstest::{fixture, rstest};
use sentibench::reporter::{self, ReportError};
use sentibench::tracker::MlflowTracker;
use tempfile::TempDir;

#[fixture]
fn runs_root() -> TempDir {
    TempDir::new().unwrap_or_else(|e| panic!("create temp dir: {e}"))
}

/// A hand-written run directory with two predictions.
fn write_run(root: &TempDir) -> PathBuf {
    let dir = root.path().join("distilbert");
    fs::create_dir_all(&dir).unwrap_or_else(|e| panic!("create run dir: {e}"));
    fs::write(
        dir.join("predictions.csv"),
        "review;Target;positive_score;Prediction\n\
         Great film;positive;0.9;positive\n\
         Dreadful;negative;0.2;negative\n",
    )
    .unwrap_or_else(|e| panic!("write predictions: {e}"));
    fs::write(
        dir.join("metadata.json"),
        r#"{
            "model": "distilbert",
            "adaptations": "sst-2",
            "inference_time": 42.5,
            "other_comments": "baseline run"
        }"#,
    )
    .unwrap_or_else(|e| panic!("write metadata: {e}"));
    dir
}

#[rstest]
fn reports_one_tagged_run_with_metrics_and_artifact(runs_root: TempDir) {
    let dir = write_run(&runs_root);
    let server = MockServer::start();

    let get_experiment = server.mock(|when, then| {
        when.method(GET)
            .path("/api/2.0/mlflow/experiments/get-by-name")
            .query_param("experiment_name", "sentiment-usecase");
        then.status(200).json_body(serde_json::json!({
            "experiment": { "experiment_id": "7" },
        }));
    });
    let create_run = server.mock(|when, then| {
        when.method(POST)
            .path("/api/2.0/mlflow/runs/create")
            .json_body_partial(r#"{ "experiment_id": "7", "run_name": "distilbert/sst-2" }"#);
        then.status(200).json_body(serde_json::json!({
            "run": { "info": { "run_id": "run-123" } },
        }));
    });
    let log_batch = server.mock(|when, then| {
        when.method(POST)
            .path("/api/2.0/mlflow/runs/log-batch")
            .body_contains("accuracy")
            .body_contains("MAE")
            .body_contains("inference_time")
            .body_contains("other_comments");
        then.status(200).json_body(serde_json::json!({}));
    });
    let upload_artifact = server.mock(|when, then| {
        when.method(PUT)
            .path("/api/2.0/mlflow-artifacts/artifacts/run-123/scores_distribution.json")
            .body_contains("bin_edges");
        then.status(200);
    });
    let finish_run = server.mock(|when, then| {
        when.method(POST)
            .path("/api/2.0/mlflow/runs/update")
            .body_contains("FINISHED");
        then.status(200).json_body(serde_json::json!({}));
    });

    let tracker = MlflowTracker::new(server.base_url(), "sentiment-usecase");
    reporter::report_run(&dir, &tracker).unwrap_or_else(|e| panic!("report run: {e}"));

    get_experiment.assert();
    create_run.assert();
    log_batch.assert();
    upload_artifact.assert();
    finish_run.assert();
}

#[rstest]
fn creates_the_experiment_on_first_use(runs_root: TempDir) {
    let dir = write_run(&runs_root);
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(GET).path("/api/2.0/mlflow/experiments/get-by-name");
        then.status(404).json_body(serde_json::json!({
            "error_code": "RESOURCE_DOES_NOT_EXIST",
        }));
    });
    let create_experiment = server.mock(|when, then| {
        when.method(POST)
            .path("/api/2.0/mlflow/experiments/create")
            .json_body(serde_json::json!({ "name": "sentiment-usecase" }));
        then.status(200)
            .json_body(serde_json::json!({ "experiment_id": "9" }));
    });
    server.mock(|when, then| {
        when.method(POST).path("/api/2.0/mlflow/runs/create");
        then.status(200).json_body(serde_json::json!({
            "run": { "info": { "run_id": "run-9" } },
        }));
    });
    server.mock(|when, then| {
        when.method(POST).path("/api/2.0/mlflow/runs/log-batch");
        then.status(200).json_body(serde_json::json!({}));
    });
    server.mock(|when, then| {
        when.method(PUT).path_contains("/api/2.0/mlflow-artifacts/artifacts/");
        then.status(200);
    });
    server.mock(|when, then| {
        when.method(POST).path("/api/2.0/mlflow/runs/update");
        then.status(200).json_body(serde_json::json!({}));
    });

    let tracker = MlflowTracker::new(server.base_url(), "sentiment-usecase");
    reporter::report_run(&dir, &tracker).unwrap_or_else(|e| panic!("report run: {e}"));

    create_experiment.assert();
}

#[rstest]
fn missing_run_directory_aborts_before_any_tracker_call(runs_root: TempDir) {
    let server = MockServer::start();
    let any_request = server.mock(|when, then| {
        when.path_contains("/");
        then.status(200);
    });

    let tracker = MlflowTracker::new(server.base_url(), "sentiment-usecase");
    let err = reporter::report_run(&runs_root.path().join("absent"), &tracker);

    assert!(matches!(err, Err(ReportError::Run(_))));
    any_request.assert_hits(0);
}

#[rstest]
fn empty_prediction_set_is_an_error(runs_root: TempDir) {
    let dir = runs_root.path().join("empty");
    fs::create_dir_all(&dir).unwrap_or_else(|e| panic!("create run dir: {e}"));
    fs::write(
        dir.join("predictions.csv"),
        "review;Target;positive_score;Prediction\n",
    )
    .unwrap_or_else(|e| panic!("write predictions: {e}"));
    fs::write(
        dir.join("metadata.json"),
        r#"{ "model": "m", "adaptations": "a", "inference_time": 1.0, "other_comments": "" }"#,
    )
    .unwrap_or_else(|e| panic!("write metadata: {e}"));

    let server = MockServer::start();
    let tracker = MlflowTracker::new(server.base_url(), "sentiment-usecase");
    let err = reporter::report_run(&dir, &tracker);

    assert!(matches!(err, Err(ReportError::Metrics(_))));
}
