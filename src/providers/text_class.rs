//! Fixed-taxonomy text classification provider.
//!
//! Sends only the review text and expects the model's full label
//! vocabulary back as an array of `(label, score)` pairs. Covers both the
//! two-class (POSITIVE/NEGATIVE) and three-class (with a neutral class)
//! hosted models; which labels matter is the normalisation scheme's
//! decision, not the provider's.

use reqwest::blocking::Client;

use super::{LabelScore, ProviderError, RawClassification, ReviewClassifier};

/// Text classifier backed by a hosted HTTP endpoint with a fixed taxonomy.
#[derive(Debug, Clone)]
pub struct TextClassifier {
    client: Client,
    url: String,
    api_token: Option<String>,
}

impl TextClassifier {
    /// Create a provider for the given endpoint.
    #[must_use]
    pub fn new(url: impl Into<String>, api_token: Option<String>) -> Self {
        Self {
            client: super::default_client(),
            url: url.into(),
            api_token,
        }
    }
}

impl ReviewClassifier for TextClassifier {
    type Error = ProviderError;

    fn classify(&self, review: &str) -> Result<RawClassification, Self::Error> {
        super::require_text(review)?;
        let mut req = self
            .client
            .post(&self.url)
            .json(&serde_json::json!({ "inputs": review }));
        if let Some(token) = &self.api_token {
            req = req.bearer_auth(token);
        }
        let resp = req.send()?.error_for_status()?;
        let scores: Vec<LabelScore> = resp.json().map_err(|_| ProviderError::InvalidResponse)?;

        if scores.is_empty() {
            return Err(ProviderError::InvalidResponse);
        }
        if !scores.iter().all(|pair| pair.score.is_finite()) {
            return Err(ProviderError::InvalidResponse);
        }
        Ok(RawClassification::Scores(scores))
    }
}
