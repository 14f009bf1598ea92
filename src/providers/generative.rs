//! Generative chat provider.
//!
//! Wraps the review in a fixed prompt instructing the model to answer with
//! a literal `1` (positive) or `0` (negative) and returns the reply text
//! verbatim. Interpreting the numeral is the normalisation layer's job, so
//! a chatty model that ignores the instruction fails there, loudly, rather
//! than being coerced here.

use reqwest::blocking::Client;
use serde::Deserialize;

use super::{ProviderError, RawClassification, ReviewClassifier};

const SYSTEM_PROMPT: &str = "You are an expert in movie reviews";

const PROMPT_TEMPLATE: &str = "Determine if the following document is a positive or negative movie review:\n[REVIEW]\n\nIf it is positive, return 1, and if it is negative return 0. Do not give any other answers.";

#[derive(Deserialize)]
struct ChatResponse {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    text: String,
}

/// Chat-model classifier backed by a hosted HTTP endpoint.
#[derive(Debug, Clone)]
pub struct GenerativeClassifier {
    client: Client,
    url: String,
    api_token: Option<String>,
    model: String,
}

impl GenerativeClassifier {
    /// Create a provider for the given chat endpoint and model identifier.
    #[must_use]
    pub fn new(url: impl Into<String>, api_token: Option<String>, model: impl Into<String>) -> Self {
        Self {
            client: super::default_client(),
            url: url.into(),
            api_token,
            model: model.into(),
        }
    }
}

impl ReviewClassifier for GenerativeClassifier {
    type Error = ProviderError;

    fn classify(&self, review: &str) -> Result<RawClassification, Self::Error> {
        super::require_text(review)?;
        let prompt = PROMPT_TEMPLATE.replace("[REVIEW]", review);
        let mut req = self.client.post(&self.url).json(&serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": prompt },
            ],
        }));
        if let Some(token) = &self.api_token {
            req = req.bearer_auth(token);
        }
        let resp = req.send()?.error_for_status()?;
        let body: ChatResponse = resp.json().map_err(|_| ProviderError::InvalidResponse)?;

        let Some(block) = body.message.content.into_iter().next() else {
            return Err(ProviderError::MissingContent);
        };
        Ok(RawClassification::Text(block.text))
    }
}
