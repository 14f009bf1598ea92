//! Core library entry point.
//! Re-exports public types and traits.

pub mod api;
pub mod batch;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod dataset;
pub mod metrics;
pub mod normalize;
pub mod providers;
pub mod recorder;
pub mod reporter;
#[cfg(feature = "serve")]
pub mod serve;
pub mod tracker;

pub use api::{Prediction, ReviewInput, Sentiment};
pub use batch::{BatchError, BatchOptions, Batcher};
pub use config::{AppConfig, ConfigError, ProviderConfig, ReportConfig};
pub use dataset::TestSet;
pub use normalize::{LabelScheme, NormalizeError};
pub use providers::{
    GenerativeClassifier, ProviderError, RawClassification, ReviewClassifier, TextClassifier,
    ZeroShotClassifier,
};
pub use recorder::{RunMetadata, RunRecorder, RunRetention};
pub use tracker::{MlflowTracker, TrackerSink};
