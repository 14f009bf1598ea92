//! Layered-configuration tests: TOML file under a prefixed environment.

use std::env;
use std::io::Write;
use std::sync::{LazyLock, Mutex, MutexGuard};

use rstest::{fixture, rstest};
use sentibench::config::{AppConfig, ProviderConfig, ReportConfig};
use sentibench::recorder::RunRetention;
use serial_test::serial;
use tempfile::NamedTempFile;

const BASE_CONFIG: &str = r#"
[provider]
kind = "two_class"
endpoint = "http://localhost:9000/classify"
positive_label = "POSITIVE"

[inference]
truncate_chars = 2000

[run]
model_name = "distilbert"
adaptations = "sst-2"

[data]
retention = "overwrite"

[tracker]
base_url = "http://localhost:5000"
"#;

#[fixture]
fn config_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap_or_else(|e| panic!("create temp file: {e}"));
    write!(file, "{BASE_CONFIG}").unwrap_or_else(|e| panic!("write config: {e}"));
    file
}

static ENV_LOCK: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

struct EnvVarGuard {
    key: String,
    _lock: MutexGuard<'static, ()>,
}

impl EnvVarGuard {
    fn new(key: &str, val: &str) -> Self {
        let lock = ENV_LOCK
            .lock()
            .unwrap_or_else(|e| panic!("env lock poisoned: {e}"));
        // Safety: process-wide env mutation is synchronised by ENV_LOCK.
        unsafe { env::set_var(key, val) };
        Self {
            key: key.to_owned(),
            _lock: lock,
        }
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        // Safety: process-wide env mutation is synchronised by ENV_LOCK.
        unsafe { env::remove_var(&self.key) };
    }
}

#[rstest]
#[serial]
fn file_values_load_and_validate(config_file: NamedTempFile) {
    let config = AppConfig::load(Some(config_file.path()))
        .unwrap_or_else(|e| panic!("load config: {e}"));

    assert!(matches!(config.provider, ProviderConfig::TwoClass { .. }));
    assert_eq!(config.inference.truncate_chars, 2000);
    assert_eq!(config.run.model_name, "distilbert");
    assert_eq!(config.data.retention, RunRetention::Overwrite);
    assert_eq!(config.tracker.base_url, "http://localhost:5000");
    // Defaults fill everything the file leaves out.
    assert_eq!(config.tracker.experiment, "sentiment-usecase");
    assert_eq!(config.data.input_csv.to_string_lossy(), "data/inputs/IMDB-movie-reviews.csv");
    assert!(config.api_token.is_none());
}

#[rstest]
#[serial]
fn environment_wins_over_the_file(config_file: NamedTempFile) {
    let _guard = EnvVarGuard::new("SENTIBENCH_INFERENCE__TRUNCATE_CHARS", "8000");
    let config = AppConfig::load(Some(config_file.path()))
        .unwrap_or_else(|e| panic!("load config: {e}"));
    assert_eq!(config.inference.truncate_chars, 8000);
}

#[rstest]
#[serial]
fn api_token_comes_from_the_environment(config_file: NamedTempFile) {
    let _guard = EnvVarGuard::new("SENTIBENCH_API_TOKEN", "hf-secret");
    let config = AppConfig::load(Some(config_file.path()))
        .unwrap_or_else(|e| panic!("load config: {e}"));
    assert_eq!(config.api_token.as_deref(), Some("hf-secret"));
}

#[rstest]
#[serial]
fn invalid_file_values_fail_validation() {
    let mut file = NamedTempFile::new().unwrap_or_else(|e| panic!("create temp file: {e}"));
    let broken = BASE_CONFIG.replace("truncate_chars = 2000", "truncate_chars = 0");
    write!(file, "{broken}").unwrap_or_else(|e| panic!("write config: {e}"));

    let err = AppConfig::load(Some(file.path()));
    assert!(err.is_err());
}

#[rstest]
#[serial]
fn report_config_needs_no_provider(config_file: NamedTempFile) {
    let config = ReportConfig::load(Some(config_file.path()))
        .unwrap_or_else(|e| panic!("load report config: {e}"));
    assert_eq!(config.data.retention, RunRetention::Overwrite);
    assert_eq!(config.tracker.base_url, "http://localhost:5000");
}

#[rstest]
#[serial]
fn report_config_defaults_without_a_file() {
    let config = ReportConfig::load(None).unwrap_or_else(|e| panic!("load report config: {e}"));
    assert_eq!(config.data.runs_root.to_string_lossy(), "data/outputs/runs");
    assert_eq!(config.tracker.experiment, "sentiment-usecase");
}
