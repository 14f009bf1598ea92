//! Sequential review batching.
//!
//! One blocking inference call per item, in input order, with a
//! configurable truncation budget and an optional fixed pause between
//! calls for rate-limited providers. No concurrency, no provider-side
//! batching, no retries: the first failing item aborts the batch with an
//! error naming the item.

use std::thread;
use std::time::Duration;

use thiserror::Error;
use tracing::info;

use crate::api::{Prediction, ReviewInput};
use crate::normalize::{LabelScheme, NormalizeError};
use crate::providers::ReviewClassifier;

/// Options controlling how a batch pass talks to its provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOptions {
    /// Character budget applied to each review before submission. A cost
    /// and context-window control, not a semantic decision; different
    /// providers use different budgets.
    pub truncate_chars: usize,
    /// Fixed pause inserted after each call, for providers with a request
    /// rate limit.
    pub pause: Option<Duration>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            truncate_chars: 4010,
            pause: None,
        }
    }
}

/// Error raised by a batch pass, carrying the index of the failing item.
#[derive(Debug, Error)]
pub enum BatchError<E: std::error::Error + Send + Sync + 'static> {
    #[error("classification failed for review {index}: {source}")]
    Provider {
        index: usize,
        #[source]
        source: E,
    },
    #[error("normalisation failed for review {index}: {source}")]
    Normalize {
        index: usize,
        #[source]
        source: NormalizeError,
    },
}

impl<E: std::error::Error + Send + Sync + 'static> BatchError<E> {
    /// Index of the item that failed.
    #[must_use]
    pub fn index(&self) -> usize {
        match self {
            Self::Provider { index, .. } | Self::Normalize { index, .. } => *index,
        }
    }
}

/// Dispatches reviews to a classifier one at a time and normalises each
/// response with the configured scheme.
#[derive(Debug, Clone)]
pub struct Batcher<C> {
    classifier: C,
    scheme: LabelScheme,
    options: BatchOptions,
}

impl<C: ReviewClassifier> Batcher<C> {
    #[must_use]
    pub fn new(classifier: C, scheme: LabelScheme, options: BatchOptions) -> Self {
        Self {
            classifier,
            scheme,
            options,
        }
    }

    /// Classify every review in order, returning one prediction per item.
    ///
    /// A single string input behaves identically to a length-1 list.
    ///
    /// # Errors
    ///
    /// Returns the first per-item failure, carrying the item's index; no
    /// later items are attempted.
    pub fn predict(&self, input: &ReviewInput) -> Result<Vec<Prediction>, BatchError<C::Error>> {
        let reviews = input.items();
        let mut predictions = Vec::with_capacity(reviews.len());
        for (index, review) in reviews.iter().enumerate() {
            let truncated = truncate_chars(review, self.options.truncate_chars);
            let raw = self
                .classifier
                .classify(truncated)
                .map_err(|source| BatchError::Provider { index, source })?;
            let score = self
                .scheme
                .positive_score(&raw)
                .map_err(|source| BatchError::Normalize { index, source })?;
            predictions.push(Prediction::from_score(index, score));
            info!(index, total = reviews.len(), "classified review");
            if let Some(pause) = self.options.pause {
                thread::sleep(pause);
            }
        }
        Ok(predictions)
    }

    /// Classify a single review, collapsing the internal sequence back to
    /// a scalar at the boundary.
    ///
    /// # Errors
    ///
    /// Propagates the same per-item failures as [`Batcher::predict`].
    ///
    /// # Panics
    ///
    /// Never in practice: one input always yields one prediction.
    pub fn predict_one(&self, review: &str) -> Result<Prediction, BatchError<C::Error>> {
        let mut predictions = self.predict(&ReviewInput::from(review))?;
        #[expect(
            clippy::expect_used,
            reason = "a single input always yields exactly one prediction"
        )]
        Ok(predictions.pop().expect("one input yields one prediction"))
    }
}

/// Truncate to at most `budget` characters, respecting UTF-8 boundaries.
///
/// # Examples
///
/// ```
/// use sentibench::batch::truncate_chars;
///
/// assert_eq!(truncate_chars("abcdef", 4), "abcd");
/// assert_eq!(truncate_chars("abc", 4), "abc");
/// ```
#[must_use]
pub fn truncate_chars(text: &str, budget: usize) -> &str {
    match text.char_indices().nth(budget) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("abcdef", 4, "abcd")]
    #[case("abc", 3, "abc")]
    #[case("abc", 10, "abc")]
    #[case("", 5, "")]
    #[case("héllo wörld", 6, "héllo ")]
    fn truncates_on_char_boundaries(
        #[case] text: &str,
        #[case] budget: usize,
        #[case] expected: &str,
    ) {
        assert_eq!(truncate_chars(text, budget), expected);
    }

    #[test]
    fn zero_budget_truncates_to_empty() {
        assert_eq!(truncate_chars("anything", 0), "");
    }
}
