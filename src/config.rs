//! Application configuration.
//!
//! Loaded once at process start from an optional TOML file layered under
//! `SENTIBENCH_`-prefixed environment variables, validated, and passed to
//! each component at construction. Immutable thereafter; tests substitute
//! their own instances instead of touching process-wide state.

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::normalize::LabelScheme;
use crate::providers::{DynClassifier, GenerativeClassifier, TextClassifier, ZeroShotClassifier};
use crate::recorder::RunRetention;

/// Environment prefix shared by every binary.
pub const ENV_PREFIX: &str = "SENTIBENCH_";

/// Provider selection, tagged by kind.
///
/// The normalisation scheme is derived from this configuration, never
/// inferred from the labels a response happens to contain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// Two-candidate zero-shot endpoint; the candidate labels travel with
    /// every request.
    ZeroShot {
        endpoint: String,
        positive_label: String,
        negative_label: String,
    },
    /// Fixed two-class taxonomy endpoint.
    TwoClass {
        endpoint: String,
        positive_label: String,
    },
    /// Fixed three-class taxonomy endpoint; the neutral class's mass is
    /// discarded during normalisation.
    ThreeClass {
        endpoint: String,
        positive_label: String,
        neutral_label: String,
        negative_label: String,
    },
    /// Generative chat endpoint answering with a literal numeral.
    Generative { endpoint: String, model: String },
}

impl ProviderConfig {
    /// The normalisation scheme matching this provider's response shape.
    #[must_use]
    pub fn label_scheme(&self) -> LabelScheme {
        match self {
            Self::ZeroShot {
                positive_label,
                negative_label,
                ..
            } => LabelScheme::TwoCandidate {
                positive_label: positive_label.clone(),
                negative_label: negative_label.clone(),
            },
            Self::TwoClass { positive_label, .. } => LabelScheme::TwoClass {
                positive_label: positive_label.clone(),
            },
            Self::ThreeClass {
                positive_label,
                neutral_label,
                negative_label,
                ..
            } => LabelScheme::ThreeClass {
                positive_label: positive_label.clone(),
                neutral_label: neutral_label.clone(),
                negative_label: negative_label.clone(),
            },
            Self::Generative { .. } => LabelScheme::Numeral,
        }
    }

    /// Build the configured classifier behind a single object-safe seam.
    #[must_use]
    pub fn build_classifier(&self, api_token: Option<&str>) -> Box<DynClassifier> {
        let token = api_token.map(str::to_owned);
        match self {
            Self::ZeroShot {
                endpoint,
                positive_label,
                negative_label,
            } => Box::new(ZeroShotClassifier::new(
                endpoint.clone(),
                token,
                positive_label.clone(),
                negative_label.clone(),
            )),
            Self::TwoClass { endpoint, .. } | Self::ThreeClass { endpoint, .. } => {
                Box::new(TextClassifier::new(endpoint.clone(), token))
            }
            Self::Generative { endpoint, model } => Box::new(GenerativeClassifier::new(
                endpoint.clone(),
                token,
                model.clone(),
            )),
        }
    }

    fn labels(&self) -> Vec<&str> {
        match self {
            Self::ZeroShot {
                positive_label,
                negative_label,
                ..
            } => vec![positive_label, negative_label],
            Self::TwoClass { positive_label, .. } => vec![positive_label],
            Self::ThreeClass {
                positive_label,
                neutral_label,
                negative_label,
                ..
            } => vec![positive_label, neutral_label, negative_label],
            Self::Generative { .. } => vec![],
        }
    }
}

/// Batch-call controls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Character budget applied to each review before submission.
    pub truncate_chars: usize,
    /// Seconds to pause between calls, for rate-limited providers.
    #[serde(default)]
    pub pause_secs: Option<u64>,
}

/// Identity and commentary recorded with each persisted run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Model identifier; names the run directory.
    #[serde(default)]
    pub model_name: String,
    #[serde(default)]
    pub adaptations: String,
    #[serde(default)]
    pub other_comments: String,
}

/// Paths and retention for inputs and persisted runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_input_csv")]
    pub input_csv: PathBuf,
    #[serde(default = "default_runs_root")]
    pub runs_root: PathBuf,
    #[serde(default)]
    pub retention: RunRetention,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            input_csv: default_input_csv(),
            runs_root: default_runs_root(),
            retention: RunRetention::default(),
        }
    }
}

fn default_input_csv() -> PathBuf {
    PathBuf::from("data/inputs/IMDB-movie-reviews.csv")
}

fn default_runs_root() -> PathBuf {
    PathBuf::from("data/outputs/runs")
}

/// Tracker endpoint and experiment naming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerConfig {
    #[serde(default = "default_tracking_url")]
    pub base_url: String,
    #[serde(default = "default_experiment")]
    pub experiment: String,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            base_url: default_tracking_url(),
            experiment: default_experiment(),
        }
    }
}

fn default_tracking_url() -> String {
    "http://127.0.0.1:5000".to_owned()
}

fn default_experiment() -> String {
    "sentiment-usecase".to_owned()
}

fn default_listen_addr() -> String {
    "127.0.0.1:8000".to_owned()
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Figment(#[from] Box<figment::Error>),
    #[error("inference.truncate_chars must be greater than 0")]
    ZeroTruncation,
    #[error("provider label strings must not be empty")]
    EmptyLabel,
    #[error("provider.model must not be empty")]
    EmptyProviderModel,
}

/// Top-level configuration for inference-bearing binaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub provider: ProviderConfig,
    pub inference: InferenceConfig,
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub tracker: TrackerConfig,
    /// Bearer token for the hosted provider. Supplied via the environment
    /// layer (`SENTIBENCH_API_TOKEN`), never committed to a config file.
    #[serde(default)]
    pub api_token: Option<String>,
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
}

impl AppConfig {
    /// Load from an optional TOML file layered under the environment.
    ///
    /// Environment keys are prefixed with `SENTIBENCH_` and nested with
    /// `__`, e.g. `SENTIBENCH_TRACKER__BASE_URL`; the environment wins
    /// over the file.
    ///
    /// # Errors
    ///
    /// Returns an error if either source contains invalid values or
    /// validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config: Self = layered(path).extract().map_err(Box::new)?;
        config.validate()
    }

    /// Ensure the configuration values are within acceptable bounds.
    ///
    /// # Errors
    ///
    /// Returns an error if the truncation budget is zero or any configured
    /// label or model identifier is empty.
    #[must_use = "Validation should not be ignored"]
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.inference.truncate_chars == 0 {
            return Err(ConfigError::ZeroTruncation);
        }
        if self.provider.labels().iter().any(|label| label.is_empty()) {
            return Err(ConfigError::EmptyLabel);
        }
        if let ProviderConfig::Generative { model, .. } = &self.provider {
            if model.is_empty() {
                return Err(ConfigError::EmptyProviderModel);
            }
        }
        Ok(self)
    }
}

/// Configuration for the offline reporting binary, which needs only the
/// data paths and the tracker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub tracker: TrackerConfig,
}

impl ReportConfig {
    /// Load from an optional TOML file layered under the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if either source contains invalid values.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Ok(layered(path).extract().map_err(Box::new)?)
    }
}

fn layered(path: Option<&Path>) -> Figment {
    let mut figment = Figment::new();
    if let Some(path) = path {
        figment = figment.merge(Toml::file(path));
    }
    figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn base_config() -> AppConfig {
        AppConfig {
            provider: ProviderConfig::TwoClass {
                endpoint: "http://localhost/classify".into(),
                positive_label: "POSITIVE".into(),
            },
            inference: InferenceConfig {
                truncate_chars: 2000,
                pause_secs: None,
            },
            run: RunConfig::default(),
            data: DataConfig::default(),
            tracker: TrackerConfig::default(),
            api_token: None,
            listen_addr: default_listen_addr(),
        }
    }

    #[test]
    #[expect(clippy::expect_used, reason = "test should fail loudly")]
    fn valid_config_passes_validation() {
        let config = base_config().validate().expect("validate config");
        assert_eq!(config.inference.truncate_chars, 2000);
    }

    #[test]
    fn zero_truncation_is_rejected() {
        let mut config = base_config();
        config.inference.truncate_chars = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroTruncation)
        ));
    }

    #[test]
    fn empty_label_is_rejected() {
        let mut config = base_config();
        config.provider = ProviderConfig::TwoClass {
            endpoint: "http://localhost/classify".into(),
            positive_label: String::new(),
        };
        assert!(matches!(config.validate(), Err(ConfigError::EmptyLabel)));
    }

    #[test]
    fn empty_generative_model_is_rejected() {
        let mut config = base_config();
        config.provider = ProviderConfig::Generative {
            endpoint: "http://localhost/chat".into(),
            model: String::new(),
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::EmptyProviderModel)
        ));
    }

    #[rstest]
    #[case(
        ProviderConfig::ZeroShot {
            endpoint: "http://x".into(),
            positive_label: "pos".into(),
            negative_label: "neg".into(),
        },
        LabelScheme::TwoCandidate {
            positive_label: "pos".into(),
            negative_label: "neg".into(),
        }
    )]
    #[case(
        ProviderConfig::Generative { endpoint: "http://x".into(), model: "m".into() },
        LabelScheme::Numeral
    )]
    fn provider_selects_matching_scheme(
        #[case] provider: ProviderConfig,
        #[case] expected: LabelScheme,
    ) {
        assert_eq!(provider.label_scheme(), expected);
    }

    #[test]
    #[expect(clippy::expect_used, reason = "test should fail loudly")]
    fn provider_config_deserialises_tagged() {
        let json = r#"{
            "kind": "three_class",
            "endpoint": "http://localhost/classify",
            "positive_label": "LABEL_2",
            "neutral_label": "LABEL_1",
            "negative_label": "LABEL_0"
        }"#;
        let provider: ProviderConfig =
            serde_json::from_str(json).expect("deserialise provider");
        assert!(matches!(provider, ProviderConfig::ThreeClass { .. }));
    }

    #[test]
    fn unknown_provider_kind_is_rejected() {
        let json = r#"{ "kind": "mystery", "endpoint": "http://x" }"#;
        let provider: Result<ProviderConfig, _> = serde_json::from_str(json);
        assert!(provider.is_err());
    }
}
