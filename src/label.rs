//! Binary popularity label derived from the continuous score.
//!
//! Two passes: [`PopularityThreshold::fit`] aggregates the mean score over the
//! whole dataset, then [`PopularityThreshold::apply`] labels each row against
//! that fixed threshold.

use crate::data::model::{DataType, Dataset, Field, Value};
use crate::data::schema::{LABEL, SONG_HOTTTNESSS};
use crate::error::{PipelineError, Result};

/// Mean popularity of a cleaned training dataset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PopularityThreshold {
    mean: f64,
}

impl PopularityThreshold {
    /// Mean of the non-null popularity scores.
    ///
    /// Scores are summed in sorted order so the result does not depend on row
    /// order.
    pub fn fit(dataset: &Dataset) -> Result<Self> {
        dataset.schema().require_numeric(SONG_HOTTTNESSS)?;
        let mut scores: Vec<f64> = dataset
            .column(SONG_HOTTTNESSS)?
            .filter_map(Value::as_f64)
            .collect();
        if scores.is_empty() {
            return Err(PipelineError::EmptyDataset {
                stage: "mean popularity",
            });
        }
        scores.sort_by(f64::total_cmp);
        let mean = scores.iter().sum::<f64>() / scores.len() as f64;
        Ok(PopularityThreshold { mean })
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// 1 when `score >= mean`, else 0.
    pub fn label_for(&self, score: f64) -> i64 {
        i64::from(score >= self.mean)
    }

    /// Append the `label` column. Rows with a null score are labelled 0.
    pub fn apply(&self, dataset: &Dataset) -> Result<Dataset> {
        let labels: Vec<Value> = dataset
            .column(SONG_HOTTTNESSS)?
            .map(|score| Value::Integer(score.as_f64().map_or(0, |s| self.label_for(s))))
            .collect();
        let positives = labels.iter().filter(|v| **v == Value::Integer(1)).count();
        log::debug!(
            "Popularity threshold {:.6}: {positives} of {} records labelled popular",
            self.mean,
            labels.len()
        );
        dataset
            .clone()
            .with_column(Field::new(LABEL, DataType::Integer), labels)
    }
}

/// Fit the threshold on `dataset` and label it.
pub fn derive_labels(dataset: &Dataset) -> Result<Dataset> {
    PopularityThreshold::fit(dataset)?.apply(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Schema;

    fn scored(scores: &[Option<f64>]) -> Dataset {
        let schema = Schema::new(vec![
            Field::new("title", DataType::Text),
            Field::new(SONG_HOTTTNESSS, DataType::Float),
        ]);
        let rows = scores
            .iter()
            .map(|s| vec![Value::Text("t".into()), s.map_or(Value::Null, Value::Float)])
            .collect();
        Dataset::new(schema, rows).unwrap()
    }

    fn labels(ds: &Dataset) -> Vec<i64> {
        ds.column(LABEL)
            .unwrap()
            .map(|v| v.as_i64().unwrap())
            .collect()
    }

    #[test]
    fn labels_against_dataset_mean() {
        let ds = scored(&[Some(0.2), Some(0.4), Some(0.6), Some(0.8)]);
        let threshold = PopularityThreshold::fit(&ds).unwrap();
        assert!((threshold.mean() - 0.5).abs() < 1e-12);
        assert_eq!(labels(&threshold.apply(&ds).unwrap()), vec![0, 0, 1, 1]);
    }

    #[test]
    fn score_equal_to_mean_is_positive() {
        let ds = scored(&[Some(0.5), Some(0.5), Some(0.5)]);
        assert_eq!(labels(&derive_labels(&ds).unwrap()), vec![1, 1, 1]);
    }

    #[test]
    fn null_scores_are_excluded_from_mean_and_labelled_zero() {
        let ds = scored(&[Some(0.2), None, Some(0.6)]);
        let threshold = PopularityThreshold::fit(&ds).unwrap();
        assert!((threshold.mean() - 0.4).abs() < 1e-12);
        assert_eq!(labels(&threshold.apply(&ds).unwrap()), vec![0, 0, 1]);
    }

    #[test]
    fn labels_are_monotonic_in_score() {
        let scores: Vec<Option<f64>> =
            (0..50).map(|i| Some(((i * 37) % 50) as f64 / 50.0)).collect();
        let ds = derive_labels(&scored(&scores)).unwrap();
        let pairs: Vec<(f64, i64)> = scores
            .iter()
            .map(|s| s.unwrap())
            .zip(labels(&ds))
            .collect();
        for (s1, l1) in &pairs {
            for (s2, l2) in &pairs {
                if s1 < s2 {
                    assert!(l1 <= l2);
                }
            }
        }
    }

    #[test]
    fn mean_is_independent_of_row_order() {
        let forward: Vec<Option<f64>> = (1..=97).map(|i| Some(1.0 / i as f64)).collect();
        let backward: Vec<Option<f64>> = forward.iter().rev().copied().collect();
        assert_eq!(
            PopularityThreshold::fit(&scored(&forward)).unwrap(),
            PopularityThreshold::fit(&scored(&backward)).unwrap()
        );
    }

    #[test]
    fn empty_dataset_is_an_explicit_error() {
        assert!(matches!(
            PopularityThreshold::fit(&scored(&[])),
            Err(PipelineError::EmptyDataset { .. })
        ));
        assert!(matches!(
            PopularityThreshold::fit(&scored(&[None, None])),
            Err(PipelineError::EmptyDataset { .. })
        ));
    }

    #[test]
    fn missing_score_column_is_a_schema_mismatch() {
        let ds = Dataset::empty(Schema::new(vec![Field::new("title", DataType::Text)]));
        assert!(matches!(
            derive_labels(&ds),
            Err(PipelineError::SchemaMismatch { .. })
        ));
    }
}
