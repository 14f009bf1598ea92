//! Two-candidate zero-shot classification provider.
//!
//! Sends the review together with the caller-supplied candidate labels and
//! expects a ranked response distributing probability over exactly those
//! candidates. An optional API token is sent as a bearer token.
//!
//! # Examples
//!
//! ```no_run
//! use sentibench::providers::{ReviewClassifier, ZeroShotClassifier};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = ZeroShotClassifier::new(
//!     "http://localhost:8080/classify",
//!     None,
//!     "a very positive movie review",
//!     "a very negative movie review",
//! );
//! let raw = provider.classify("I loved it")?;
//! # Ok(())
//! # }
//! ```

use reqwest::blocking::Client;
use serde::Deserialize;

use super::{LabelScore, ProviderError, RawClassification, ReviewClassifier};

#[derive(Deserialize)]
struct ZeroShotResponse {
    labels: Vec<String>,
    scores: Vec<f64>,
}

/// Zero-shot classifier backed by a hosted HTTP endpoint.
#[derive(Debug, Clone)]
pub struct ZeroShotClassifier {
    client: Client,
    url: String,
    api_token: Option<String>,
    candidate_labels: [String; 2],
}

impl ZeroShotClassifier {
    /// Create a provider for the given endpoint and candidate labels.
    ///
    /// The candidate labels are submitted with every request; the positive
    /// candidate must match the label configured in the normalisation
    /// scheme.
    #[must_use]
    pub fn new(
        url: impl Into<String>,
        api_token: Option<String>,
        positive_label: impl Into<String>,
        negative_label: impl Into<String>,
    ) -> Self {
        Self {
            client: super::default_client(),
            url: url.into(),
            api_token,
            candidate_labels: [positive_label.into(), negative_label.into()],
        }
    }
}

impl ReviewClassifier for ZeroShotClassifier {
    type Error = ProviderError;

    fn classify(&self, review: &str) -> Result<RawClassification, Self::Error> {
        super::require_text(review)?;
        let mut req = self.client.post(&self.url).json(&serde_json::json!({
            "inputs": review,
            "parameters": { "candidate_labels": self.candidate_labels },
        }));
        if let Some(token) = &self.api_token {
            req = req.bearer_auth(token);
        }
        let resp = req.send()?.error_for_status()?;
        let body: ZeroShotResponse = resp.json().map_err(|_| ProviderError::InvalidResponse)?;

        if body.labels.is_empty() || body.labels.len() != body.scores.len() {
            return Err(ProviderError::InvalidResponse);
        }
        if !body.scores.iter().all(|score| score.is_finite()) {
            return Err(ProviderError::InvalidResponse);
        }
        let scores = body
            .labels
            .into_iter()
            .zip(body.scores)
            .map(|(label, score)| LabelScore { label, score })
            .collect();
        Ok(RawClassification::Scores(scores))
    }
}
