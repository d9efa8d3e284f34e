//! Binary classification evaluation: area under the ROC curve.

use crate::data::model::{Dataset, Value};
use crate::data::schema::LABEL;
use crate::error::{PipelineError, Result};

/// Column holding the model's continuous score for the positive class.
pub const RAW_PREDICTION: &str = "raw_prediction";
/// Column holding the thresholded 0/1 prediction.
pub const PREDICTION: &str = "prediction";

/// Computes area under ROC from a predictions dataset, reading the true label
/// and the raw score from fixed column names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryClassificationEvaluator {
    label_column: String,
    raw_prediction_column: String,
}

impl Default for BinaryClassificationEvaluator {
    fn default() -> Self {
        Self::with_columns(LABEL, RAW_PREDICTION)
    }
}

impl BinaryClassificationEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_columns(label_column: &str, raw_prediction_column: &str) -> Self {
        BinaryClassificationEvaluator {
            label_column: label_column.to_string(),
            raw_prediction_column: raw_prediction_column.to_string(),
        }
    }

    /// Area under ROC in `[0, 1]`. Missing columns, nulls and labels other
    /// than 0/1 are errors, as is an empty dataset.
    pub fn evaluate(&self, predictions: &Dataset) -> Result<f64> {
        let schema = predictions.schema();
        schema.require_numeric(&self.label_column)?;
        schema.require_numeric(&self.raw_prediction_column)?;

        if predictions.is_empty() {
            return Err(PipelineError::EmptyDataset {
                stage: "area under ROC",
            });
        }

        let labels = predictions
            .column(&self.label_column)?
            .enumerate()
            .map(|(row, v)| match v {
                Value::Integer(0) => Ok(false),
                Value::Integer(1) => Ok(true),
                Value::Null => Err(PipelineError::NullValue {
                    column: self.label_column.clone(),
                    row,
                }),
                other => Err(PipelineError::SchemaMismatch {
                    column: self.label_column.clone(),
                    reason: format!("row {row} holds {other}, expected 0 or 1"),
                }),
            })
            .collect::<Result<Vec<bool>>>()?;

        let scores = predictions
            .column(&self.raw_prediction_column)?
            .enumerate()
            .map(|(row, v)| {
                v.as_f64().ok_or_else(|| PipelineError::NullValue {
                    column: self.raw_prediction_column.clone(),
                    row,
                })
            })
            .collect::<Result<Vec<f64>>>()?;

        Ok(area_under_roc(&scores, &labels))
    }
}

/// Rank-based (Mann-Whitney) area under ROC. Tied scores share their
/// average rank. Returns 0.5 when only one class is present.
pub fn area_under_roc(scores: &[f64], labels: &[bool]) -> f64 {
    let n = scores.len();
    let n_pos = labels.iter().filter(|&&l| l).count();
    let n_neg = n - n_pos;
    if n_pos == 0 || n_neg == 0 {
        log::warn!("Area under ROC undefined for a single class ({n} rows); reporting 0.5");
        return 0.5;
    }

    let mut indices: Vec<usize> = (0..n).collect();
    indices.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut rank_sum_pos = 0.0f64;
    let mut i = 0;
    while i < n {
        let mut j = i + 1;
        while j < n && scores[indices[j]] == scores[indices[i]] {
            j += 1;
        }
        // 1-based ranks i+1 ..= j
        let avg_rank = (i + 1 + j) as f64 / 2.0;
        let tied_pos = indices[i..j].iter().filter(|&&idx| labels[idx]).count();
        rank_sum_pos += avg_rank * tied_pos as f64;
        i = j;
    }

    let n_pos_f = n_pos as f64;
    let n_neg_f = n_neg as f64;
    (rank_sum_pos - n_pos_f * (n_pos_f + 1.0) / 2.0) / (n_pos_f * n_neg_f)
}
