//! Hosted inference providers.
//!
//! Defines the `ReviewClassifier` trait, the raw response shapes shared by
//! the normalisation layer, and the blocking HTTP clients for the three
//! provider families (zero-shot, fixed-taxonomy, generative chat).

pub mod generative;
pub mod text_class;
pub mod zero_shot;

pub use generative::GenerativeClassifier;
pub use text_class::TextClassifier;
pub use zero_shot::ZeroShotClassifier;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// One `(label, score)` pair from a classification response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelScore {
    pub label: String,
    pub score: f64,
}

impl LabelScore {
    #[must_use]
    pub fn new(label: impl Into<String>, score: f64) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

/// The opaque per-item result of an inference call.
///
/// Classification models return per-label scores whose vocabulary is
/// model-specific and whose scores need not sum to one; generative models
/// return free text.
#[derive(Debug, Clone, PartialEq)]
pub enum RawClassification {
    Scores(Vec<LabelScore>),
    Text(String),
}

/// Error shared by the hosted providers.
///
/// A single error type keeps the providers interchangeable behind one
/// trait object, selected by configuration.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Input was empty; no request is made for blank reviews.
    #[error("empty review text")]
    Empty,
    /// HTTP request failed or returned a non-success status.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// Response body did not match the provider's wire contract.
    #[error("invalid response body")]
    InvalidResponse,
    /// Chat reply carried no content blocks.
    #[error("chat reply carried no content")]
    MissingContent,
}

impl PartialEq for ProviderError {
    fn eq(&self, other: &Self) -> bool {
        matches!(
            (self, other),
            (Self::Empty, Self::Empty)
                | (Self::InvalidResponse, Self::InvalidResponse)
                | (Self::MissingContent, Self::MissingContent)
                | (Self::Request(_), Self::Request(_))
        )
    }
}

impl Eq for ProviderError {}

/// Classifies one review via an opaque hosted model call.
///
/// Implementations issue exactly one blocking request per call and never
/// retry; rate limiting and ordering are the batcher's concern.
pub trait ReviewClassifier {
    /// Error type returned when classification fails.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Classify the supplied review text.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, the request fails, or the
    /// response does not match the provider's wire contract.
    fn classify(&self, review: &str) -> Result<RawClassification, Self::Error>;
}

/// Object-safe alias for configuration-selected providers.
pub type DynClassifier = dyn ReviewClassifier<Error = ProviderError> + Send + Sync + 'static;

impl<C: ReviewClassifier + ?Sized> ReviewClassifier for &C {
    type Error = C::Error;

    fn classify(&self, review: &str) -> Result<RawClassification, Self::Error> {
        (**self).classify(review)
    }
}

impl<C: ReviewClassifier + ?Sized> ReviewClassifier for Box<C> {
    type Error = C::Error;

    fn classify(&self, review: &str) -> Result<RawClassification, Self::Error> {
        (**self).classify(review)
    }
}

/// Request timeout shared by the provider clients. Generative endpoints
/// routinely take several seconds per reply.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Build the blocking client used by every provider.
///
/// # Panics
///
/// Panics if the HTTP client cannot be constructed with the default
/// configuration.
#[must_use]
pub(crate) fn default_client() -> Client {
    #[expect(
        clippy::expect_used,
        reason = "client builder should not fail with defaults"
    )]
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .expect("client builder failed with default configuration")
}

/// Reject blank input before any request is made.
pub(crate) fn require_text(review: &str) -> Result<(), ProviderError> {
    if review.trim().is_empty() {
        Err(ProviderError::Empty)
    } else {
        Ok(())
    }
}
