//! Stage composition: Raw → Cleaned → (Labeled) → Featurized → Trained.
//!
//! Every stage takes the previous stage's value by reference and returns a
//! new one; the first failure short-circuits the chain.

use crate::config::PipelineConfig;
use crate::data::filter::clean_songs;
use crate::data::model::Dataset;
use crate::error::Result;
use crate::features::{featurize, FeatureMatrix, FittedScaler};
use crate::label::PopularityThreshold;
use crate::model::ModelKind;
use crate::train::{train_model, TrainingOutcome};

/// Output of the preprocessing stages.
#[derive(Debug, Clone)]
pub struct PreparedData {
    /// Cleaned records, with the `label` column in training mode.
    pub records: Dataset,
    /// Present in training mode.
    pub threshold: Option<PopularityThreshold>,
    /// Standardized feature vectors.
    pub features: FeatureMatrix,
    pub scaler: FittedScaler,
}

impl PreparedData {
    /// Number of records labelled popular, in training mode.
    pub fn positive_count(&self) -> Option<usize> {
        self.features
            .labels()
            .map(|labels| labels.iter().filter(|&&l| l == 1).count())
    }
}

/// Clean, label (training mode only) and featurize raw song records.
pub fn prepare(
    raw: &Dataset,
    is_train_data: bool,
    config: &PipelineConfig,
) -> Result<PreparedData> {
    let cleaned = clean_songs(raw, &config.cleaning)?;

    let (records, threshold) = if is_train_data {
        let threshold = PopularityThreshold::fit(&cleaned)?;
        (threshold.apply(&cleaned)?, Some(threshold))
    } else {
        (cleaned, None)
    };

    let (features, scaler) = featurize(&records)?;
    Ok(PreparedData {
        records,
        threshold,
        features,
        scaler,
    })
}

/// Full training run on raw labelled song records.
pub fn run_training(
    raw: &Dataset,
    kind: ModelKind,
    evaluate: bool,
    config: &PipelineConfig,
) -> Result<(PreparedData, TrainingOutcome)> {
    let prepared = prepare(raw, true, config)?;
    let outcome = train_model(&prepared.features, kind, evaluate, config)?;
    Ok((prepared, outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{DataType, Value};
    use crate::data::schema::{song_schema, SONG_HOTTTNESSS};
    use crate::error::PipelineError;

    fn song(year: i64, score: f64) -> Vec<Value> {
        song_schema(true)
            .fields()
            .iter()
            .map(|f| match (f.name.as_str(), f.dtype) {
                ("year", _) => Value::Integer(year),
                (SONG_HOTTTNESSS, _) => Value::Float(score),
                (_, DataType::Integer) => Value::Integer(year % 12),
                (_, DataType::Float) => Value::Float(score * year as f64),
                (_, DataType::Text) => Value::Text("t".into()),
            })
            .collect()
    }

    #[test]
    fn prepare_labels_and_featurizes_training_data() {
        let raw = Dataset::new(
            song_schema(true),
            vec![song(1990, 0.9), song(1991, 0.1), song(1910, 0.9), song(2000, 0.2)],
        )
        .unwrap();
        let prepared = prepare(&raw, true, &PipelineConfig::default()).unwrap();
        assert_eq!(prepared.records.len(), 3);
        assert_eq!(prepared.positive_count(), Some(1));
        assert_eq!(prepared.features.n_features(), 18);
        assert!((prepared.threshold.unwrap().mean() - 0.4).abs() < 1e-12);
    }

    #[test]
    fn everything_filtered_out_surfaces_as_empty_dataset() {
        let raw = Dataset::new(song_schema(true), vec![song(1900, 0.5)]).unwrap();
        assert!(matches!(
            prepare(&raw, true, &PipelineConfig::default()),
            Err(PipelineError::EmptyDataset { .. })
        ));
    }
}
