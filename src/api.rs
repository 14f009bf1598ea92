//! Core domain types shared by the batcher, the recorder, and the HTTP
//! front end.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Decision threshold applied to a normalised positive score.
///
/// The comparison is strictly greater-than: a score of exactly `0.5` is
/// classified as negative.
pub const POSITIVE_THRESHOLD: f64 = 0.5;

/// Binary sentiment label.
///
/// Serialises as the lowercase strings `"positive"` and `"negative"`, the
/// vocabulary used by the test set and the run artifacts.
///
/// # Examples
///
/// ```
/// use sentibench::api::Sentiment;
///
/// assert_eq!(Sentiment::from_score(0.9), Sentiment::Positive);
/// assert_eq!(Sentiment::from_score(0.5), Sentiment::Negative);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
}

impl Sentiment {
    /// Threshold a normalised positive score into a label.
    ///
    /// Ties go to negative.
    #[must_use]
    pub fn from_score(positive_score: f64) -> Self {
        if positive_score > POSITIVE_THRESHOLD {
            Self::Positive
        } else {
            Self::Negative
        }
    }

    /// The lowercase label string.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a label string is not a recognised sentiment.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unrecognised sentiment label {0:?}")]
pub struct ParseSentimentError(pub String);

impl FromStr for Sentiment {
    type Err = ParseSentimentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "positive" => Ok(Self::Positive),
            "negative" => Ok(Self::Negative),
            other => Err(ParseSentimentError(other.to_owned())),
        }
    }
}

/// One normalised prediction for a single review.
///
/// Identity is the review index; there is exactly one prediction per review
/// per batch pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Position of the review in the submitted sequence.
    pub review_index: usize,
    /// Normalised probability that the review is positive, in `[0, 1]`.
    pub positive_score: f64,
    /// Thresholded label derived from `positive_score`.
    pub label: Sentiment,
}

impl Prediction {
    /// Build a prediction from a normalised score, applying the threshold.
    ///
    /// # Examples
    ///
    /// ```
    /// use sentibench::api::{Prediction, Sentiment};
    ///
    /// let p = Prediction::from_score(3, 0.7);
    /// assert_eq!(p.review_index, 3);
    /// assert_eq!(p.label, Sentiment::Positive);
    /// ```
    #[must_use]
    pub fn from_score(review_index: usize, positive_score: f64) -> Self {
        Self {
            review_index,
            positive_score,
            label: Sentiment::from_score(positive_score),
        }
    }
}

/// A single review or an explicit list of reviews.
///
/// This is the declared union accepted at every user-facing boundary. A
/// single item must behave identically to a length-1 list; the batcher
/// always iterates internally and collapses to a scalar only at the
/// caller's edge.
///
/// Deserialises untagged, so a JSON body may carry either
/// `"review": "text"` or `"review": ["a", "b"]`.
///
/// # Examples
///
/// ```
/// use sentibench::api::ReviewInput;
///
/// let one = ReviewInput::One("great film".into());
/// assert_eq!(one.items().len(), 1);
///
/// let many: ReviewInput = serde_json::from_str(r#"["a", "b"]"#)?;
/// assert_eq!(many.items().len(), 2);
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReviewInput {
    One(String),
    Many(Vec<String>),
}

impl ReviewInput {
    /// View the input as a sequence regardless of its outer shape.
    #[must_use]
    pub fn items(&self) -> &[String] {
        match self {
            Self::One(review) => std::slice::from_ref(review),
            Self::Many(reviews) => reviews,
        }
    }

    /// Whether the input carries nothing worth classifying: no items, or
    /// any item that is empty after trimming.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        let items = self.items();
        items.is_empty() || items.iter().any(|review| review.trim().is_empty())
    }
}

impl From<&str> for ReviewInput {
    fn from(review: &str) -> Self {
        Self::One(review.to_owned())
    }
}

impl From<Vec<String>> for ReviewInput {
    fn from(reviews: Vec<String>) -> Self {
        Self::Many(reviews)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.0, Sentiment::Negative)]
    #[case(0.5, Sentiment::Negative)]
    #[case(0.500_000_1, Sentiment::Positive)]
    #[case(1.0, Sentiment::Positive)]
    fn thresholds(#[case] score: f64, #[case] expected: Sentiment) {
        assert_eq!(Sentiment::from_score(score), expected);
    }

    #[rstest]
    #[case("positive", Ok(Sentiment::Positive))]
    #[case("negative", Ok(Sentiment::Negative))]
    #[case("Positive", Err(ParseSentimentError("Positive".into())))]
    #[case("neutral", Err(ParseSentimentError("neutral".into())))]
    fn parses_labels(#[case] input: &str, #[case] expected: Result<Sentiment, ParseSentimentError>) {
        assert_eq!(input.parse::<Sentiment>(), expected);
    }

    #[test]
    #[expect(clippy::expect_used, reason = "test should fail loudly")]
    fn review_input_accepts_string_or_list() {
        let one: ReviewInput =
            serde_json::from_str(r#""loved it""#).expect("deserialise single review");
        assert_eq!(one, ReviewInput::One("loved it".into()));

        let many: ReviewInput =
            serde_json::from_str(r#"["loved it", "hated it"]"#).expect("deserialise review list");
        assert_eq!(many.items().len(), 2);
    }

    #[rstest]
    #[case(ReviewInput::One(String::new()), true)]
    #[case(ReviewInput::One("  ".into()), true)]
    #[case(ReviewInput::Many(vec![]), true)]
    #[case(ReviewInput::Many(vec!["ok".into(), String::new()]), true)]
    #[case(ReviewInput::One("fine".into()), false)]
    fn blank_inputs(#[case] input: ReviewInput, #[case] expected: bool) {
        assert_eq!(input.is_blank(), expected);
    }
}
