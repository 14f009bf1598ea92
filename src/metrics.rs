//! Classification metrics computed from a persisted run.
//!
//! Everything here derives from the binary confusion matrix and the
//! continuous positive scores: per-class precision/recall/F1 with macro
//! and weighted averages, mean absolute error overall and per true class,
//! and a binned score distribution grouped by true label.

use serde::Serialize;
use thiserror::Error;

use crate::api::Sentiment;
use crate::recorder::RunRecord;

/// Number of bins used for the score-distribution artifact.
pub const HISTOGRAM_BINS: usize = 15;

/// Errors raised while computing metrics.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MetricsError {
    #[error("run contains no predictions")]
    EmptyRun,
    #[error("histogram requires at least one bin")]
    ZeroBins,
}

/// Precision / recall / F1 / support for one class (or an average row).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub support: usize,
}

/// Full per-class report plus accuracy and averages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationReport {
    pub positive: ClassMetrics,
    pub negative: ClassMetrics,
    pub accuracy: f64,
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
}

struct Confusion {
    tp: usize,
    tn: usize,
    fp: usize,
    fn_: usize,
}

impl Confusion {
    fn count(records: &[RunRecord]) -> Self {
        let mut counts = Self {
            tp: 0,
            tn: 0,
            fp: 0,
            fn_: 0,
        };
        for record in records {
            match (record.target, record.prediction) {
                (Sentiment::Positive, Sentiment::Positive) => counts.tp += 1,
                (Sentiment::Negative, Sentiment::Negative) => counts.tn += 1,
                (Sentiment::Negative, Sentiment::Positive) => counts.fp += 1,
                (Sentiment::Positive, Sentiment::Negative) => counts.fn_ += 1,
            }
        }
        counts
    }
}

/// Compute the per-class classification report.
///
/// Undefined ratios (zero denominators) are reported as `0.0`.
///
/// # Errors
///
/// Returns [`MetricsError::EmptyRun`] if `records` is empty.
#[expect(
    clippy::float_arithmetic,
    clippy::cast_precision_loss,
    reason = "metric ratios over record counts"
)]
pub fn classification_report(records: &[RunRecord]) -> Result<ClassificationReport, MetricsError> {
    if records.is_empty() {
        return Err(MetricsError::EmptyRun);
    }
    let c = Confusion::count(records);
    let positive = class_metrics(c.tp, c.fp, c.fn_);
    let negative = class_metrics(c.tn, c.fn_, c.fp);
    let total = records.len();
    let accuracy = (c.tp + c.tn) as f64 / total as f64;

    let macro_avg = ClassMetrics {
        precision: (positive.precision + negative.precision) / 2.0,
        recall: (positive.recall + negative.recall) / 2.0,
        f1_score: (positive.f1_score + negative.f1_score) / 2.0,
        support: total,
    };
    let weight = |pos: f64, neg: f64| {
        (pos * positive.support as f64 + neg * negative.support as f64) / total as f64
    };
    let weighted_avg = ClassMetrics {
        precision: weight(positive.precision, negative.precision),
        recall: weight(positive.recall, negative.recall),
        f1_score: weight(positive.f1_score, negative.f1_score),
        support: total,
    };

    Ok(ClassificationReport {
        positive,
        negative,
        accuracy,
        macro_avg,
        weighted_avg,
    })
}

/// Precision/recall/F1 for one class given its true-positive count and the
/// counts of items wrongly assigned to it (`fp`) and wrongly denied it
/// (`fn_`).
#[expect(
    clippy::float_arithmetic,
    clippy::cast_precision_loss,
    reason = "metric ratios over record counts"
)]
fn class_metrics(tp: usize, fp: usize, fn_: usize) -> ClassMetrics {
    let ratio = |num: usize, denom: usize| {
        if denom == 0 {
            0.0
        } else {
            num as f64 / denom as f64
        }
    };
    let precision = ratio(tp, tp + fp);
    let recall = ratio(tp, tp + fn_);
    let f1_score = if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    };
    ClassMetrics {
        precision,
        recall,
        f1_score,
        support: tp + fn_,
    }
}

/// Binarised ground truth: 1 for a positive target, 0 for a negative one.
fn binarised(target: Sentiment) -> f64 {
    match target {
        Sentiment::Positive => 1.0,
        Sentiment::Negative => 0.0,
    }
}

/// Mean absolute error between the binarised target and the continuous
/// positive score.
///
/// # Errors
///
/// Returns [`MetricsError::EmptyRun`] if `records` is empty.
#[expect(
    clippy::float_arithmetic,
    clippy::cast_precision_loss,
    reason = "error accumulation over record counts"
)]
pub fn mean_absolute_error(records: &[RunRecord]) -> Result<f64, MetricsError> {
    if records.is_empty() {
        return Err(MetricsError::EmptyRun);
    }
    let sum: f64 = records
        .iter()
        .map(|r| (binarised(r.target) - r.positive_score).abs())
        .sum();
    Ok(sum / records.len() as f64)
}

/// Mean absolute error restricted to records whose true class is `target`:
/// distance from 1 for true positives, from 0 for true negatives.
///
/// Returns `None` when the class is absent from the run.
#[must_use]
#[expect(
    clippy::float_arithmetic,
    clippy::cast_precision_loss,
    reason = "error accumulation over record counts"
)]
pub fn mae_for_class(records: &[RunRecord], target: Sentiment) -> Option<f64> {
    let scores: Vec<f64> = records
        .iter()
        .filter(|r| r.target == target)
        .map(|r| (binarised(target) - r.positive_score).abs())
        .collect();
    if scores.is_empty() {
        return None;
    }
    Some(scores.iter().sum::<f64>() / scores.len() as f64)
}

/// Histogram of positive scores over `[0, 1]`, grouped by true label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreHistogram {
    /// `bins + 1` edges spanning `[0, 1]`.
    pub bin_edges: Vec<f64>,
    /// Counts per bin for records with a positive target.
    pub positive: Vec<usize>,
    /// Counts per bin for records with a negative target.
    pub negative: Vec<usize>,
}

impl ScoreHistogram {
    /// Bin the positive scores of a run. Scores outside `[0, 1]` are
    /// clamped into the outermost bins; a score of exactly 1 lands in the
    /// last bin.
    ///
    /// # Errors
    ///
    /// Returns an error if `records` is empty or `bins` is zero.
    #[expect(
        clippy::float_arithmetic,
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "bin arithmetic over a fixed unit interval"
    )]
    pub fn from_records(records: &[RunRecord], bins: usize) -> Result<Self, MetricsError> {
        if records.is_empty() {
            return Err(MetricsError::EmptyRun);
        }
        if bins == 0 {
            return Err(MetricsError::ZeroBins);
        }
        let bin_edges = (0..=bins).map(|i| i as f64 / bins as f64).collect();
        let mut positive = vec![0usize; bins];
        let mut negative = vec![0usize; bins];
        for record in records {
            let scaled = (record.positive_score * bins as f64).floor();
            let bin = if scaled < 0.0 {
                0
            } else {
                (scaled as usize).min(bins - 1)
            };
            match record.target {
                Sentiment::Positive => positive[bin] += 1,
                Sentiment::Negative => negative[bin] += 1,
            }
        }
        Ok(Self {
            bin_edges,
            positive,
            negative,
        })
    }
}

/// Flatten the report into `(key, value)` pairs for the tracker, in the
/// shape `<row>-<metric>` plus a bare `accuracy`.
#[must_use]
#[expect(clippy::cast_precision_loss, reason = "support counts as metric values")]
pub fn flatten_report(report: &ClassificationReport) -> Vec<(String, f64)> {
    let mut flat = Vec::new();
    let mut push_class = |name: &str, metrics: &ClassMetrics| {
        flat.push((format!("{name}-precision"), metrics.precision));
        flat.push((format!("{name}-recall"), metrics.recall));
        flat.push((format!("{name}-f1_score"), metrics.f1_score));
        flat.push((format!("{name}-support"), metrics.support as f64));
    };
    push_class("positive", &report.positive);
    push_class("negative", &report.negative);
    push_class("macro_avg", &report.macro_avg);
    push_class("weighted_avg", &report.weighted_avg);
    flat.push(("accuracy".to_owned(), report.accuracy));
    flat
}
