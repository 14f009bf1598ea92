//! Benchmark test-set loading.
//!
//! The input file is `;`-delimited, latin-1 encoded, with `review` and
//! `sentiment` columns; the sentiment column becomes the `Target` ground
//! truth internally and each row is assigned its position as the review
//! index.

use std::fs;
use std::path::{Path, PathBuf};

use csv::ReaderBuilder;
use serde::Deserialize;
use thiserror::Error;

use crate::api::{ParseSentimentError, Sentiment};

/// A ground-truth labelled review from the test set.
///
/// Identity is the index; the text is immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledReview {
    pub index: usize,
    pub review: String,
    pub target: Sentiment,
}

/// Errors raised while loading the test set.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("row {row}: {source}")]
    Label {
        row: usize,
        #[source]
        source: ParseSentimentError,
    },
}

#[derive(Debug, Deserialize)]
struct RawRow {
    review: String,
    sentiment: String,
}

/// The benchmark test set, in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestSet {
    reviews: Vec<LabeledReview>,
}

impl TestSet {
    /// Load the test set from a `;`-delimited, latin-1 encoded CSV file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, a row cannot be
    /// parsed, or a sentiment value is not `positive`/`negative`.
    pub fn load(path: &Path) -> Result<Self, DatasetError> {
        let bytes = fs::read(path).map_err(|source| DatasetError::Io {
            path: path.to_owned(),
            source,
        })?;
        let text = decode_latin1(&bytes);
        Self::from_delimited(&text).map_err(|error| match error {
            DelimitedError::Csv(source) => DatasetError::Csv {
                path: path.to_owned(),
                source,
            },
            DelimitedError::Label { row, source } => DatasetError::Label { row, source },
        })
    }

    fn from_delimited(text: &str) -> Result<Self, DelimitedError> {
        let mut reader = ReaderBuilder::new()
            .delimiter(b';')
            .from_reader(text.as_bytes());
        let mut reviews = Vec::new();
        for (index, row) in reader.deserialize::<RawRow>().enumerate() {
            let row = row.map_err(DelimitedError::Csv)?;
            let target = row
                .sentiment
                .parse()
                .map_err(|source| DelimitedError::Label { row: index, source })?;
            reviews.push(LabeledReview {
                index,
                review: row.review,
                target,
            });
        }
        Ok(Self { reviews })
    }

    /// The labelled reviews, in file order.
    #[must_use]
    pub fn reviews(&self) -> &[LabeledReview] {
        &self.reviews
    }

    /// Clone the review texts for submission as a batch input.
    #[must_use]
    pub fn texts(&self) -> Vec<String> {
        self.reviews.iter().map(|r| r.review.clone()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.reviews.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reviews.is_empty()
    }
}

/// Latin-1 maps every byte to the Unicode code point of the same value, so
/// decoding is a direct widening of each byte.
fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

enum DelimitedError {
    Csv(csv::Error),
    Label {
        row: usize,
        source: ParseSentimentError,
    },
}
