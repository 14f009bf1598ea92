//! Converts raw, model-specific classification responses into a single
//! comparable positive score.
//!
//! Each hosted model family answers in its own shape; the scheme that maps
//! that shape to a score is explicit configuration, never inferred from
//! label strings at runtime. Malformed responses are errors for that item,
//! not silent defaults.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::providers::{LabelScore, RawClassification};

/// Errors raised while normalising a raw response.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    /// Response lacks the label the scheme was configured with.
    #[error("response does not contain expected label {0:?}")]
    MissingLabel(String),
    /// Generative reply was not a literal `0` or `1`.
    #[error("generative reply {0:?} is not a literal 0 or 1")]
    InvalidNumeral(String),
    /// Positive and negative classes carry no probability mass, so no
    /// renormalised score exists.
    #[error("positive and negative classes carry no probability mass")]
    ZeroMass,
    /// Score-shaped response handed to a text scheme, or vice versa.
    #[error("response shape does not match the configured scheme")]
    ShapeMismatch,
}

/// Normalisation strategy, one per provider response shape.
///
/// Serialises tagged so configuration files select the scheme explicitly:
///
/// ```
/// use sentibench::normalize::LabelScheme;
///
/// let json = r#"{"scheme":"two_class","positive_label":"POSITIVE"}"#;
/// let scheme: LabelScheme = serde_json::from_str(json)?;
/// assert!(matches!(scheme, LabelScheme::TwoClass { .. }));
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scheme", rename_all = "snake_case")]
pub enum LabelScheme {
    /// Ranked response over exactly the two caller-supplied candidate
    /// strings; the positive candidate's score is already normalised.
    TwoCandidate {
        positive_label: String,
        negative_label: String,
    },
    /// Fixed three-class taxonomy; the neutral class's mass is discarded
    /// and the remaining two renormalised before thresholding.
    ThreeClass {
        positive_label: String,
        neutral_label: String,
        negative_label: String,
    },
    /// Fixed two-class taxonomy; the positive class's score is already
    /// normalised.
    TwoClass { positive_label: String },
    /// Generative reply that must be a literal `0` or `1`.
    Numeral,
}

impl LabelScheme {
    /// Normalise a raw response into a positive score in `[0, 1]`.
    ///
    /// For the three-class scheme the result is `pos / (pos + neg)`,
    /// independent of the neutral mass; using the raw positive score
    /// would overstate confidence whenever neutral mass is present.
    ///
    /// # Errors
    ///
    /// Returns an error if the response shape does not match the scheme,
    /// an expected label is missing, a numeral reply is not a literal
    /// `0`/`1`, or the renormalisation denominator is zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use sentibench::normalize::LabelScheme;
    /// use sentibench::providers::{LabelScore, RawClassification};
    ///
    /// let scheme = LabelScheme::ThreeClass {
    ///     positive_label: "LABEL_2".into(),
    ///     neutral_label: "LABEL_1".into(),
    ///     negative_label: "LABEL_0".into(),
    /// };
    /// let raw = RawClassification::Scores(vec![
    ///     LabelScore::new("LABEL_0", 0.2),
    ///     LabelScore::new("LABEL_1", 0.3),
    ///     LabelScore::new("LABEL_2", 0.5),
    /// ]);
    /// let score = scheme.positive_score(&raw)?;
    /// assert!((score - 0.5 / 0.7).abs() < 1e-12);
    /// # Ok::<(), sentibench::normalize::NormalizeError>(())
    /// ```
    pub fn positive_score(&self, raw: &RawClassification) -> Result<f64, NormalizeError> {
        match (self, raw) {
            (
                Self::TwoCandidate { positive_label, .. } | Self::TwoClass { positive_label },
                RawClassification::Scores(scores),
            ) => find_score(scores, positive_label),
            (
                Self::ThreeClass {
                    positive_label,
                    negative_label,
                    ..
                },
                RawClassification::Scores(scores),
            ) => {
                let pos = find_score(scores, positive_label)?;
                let neg = find_score(scores, negative_label)?;
                #[expect(clippy::float_arithmetic, reason = "renormalising class mass")]
                let mass = pos + neg;
                if mass <= 0.0 {
                    return Err(NormalizeError::ZeroMass);
                }
                #[expect(clippy::float_arithmetic, reason = "renormalising class mass")]
                Ok(pos / mass)
            }
            (Self::Numeral, RawClassification::Text(text)) => match text.trim() {
                "1" => Ok(1.0),
                "0" => Ok(0.0),
                other => Err(NormalizeError::InvalidNumeral(other.to_owned())),
            },
            _ => Err(NormalizeError::ShapeMismatch),
        }
    }
}

fn find_score(scores: &[LabelScore], label: &str) -> Result<f64, NormalizeError> {
    scores
        .iter()
        .find(|pair| pair.label == label)
        .map(|pair| pair.score)
        .ok_or_else(|| NormalizeError::MissingLabel(label.to_owned()))
}
