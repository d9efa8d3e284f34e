//! Model trainer: seeded split, fit on the train partition, optional
//! evaluation on both partitions.

use crate::config::PipelineConfig;
use crate::data::schema::LABEL;
use crate::error::{PipelineError, Result};
use crate::evaluate::BinaryClassificationEvaluator;
use crate::features::FeatureMatrix;
use crate::model::{FitParams, ModelKind, TrainedModel};
use crate::split::{train_test_split, TrainTestSplit};

/// Area under ROC on each partition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub train_auc: f64,
    pub test_auc: f64,
}

#[derive(Debug)]
pub struct TrainingOutcome {
    pub model: TrainedModel,
    pub split: TrainTestSplit,
    /// Present when evaluation was requested.
    pub evaluation: Option<Evaluation>,
}

/// Split `features`, fit `kind` on the train rows and, if `evaluate` is set,
/// score both partitions. Evaluation only reads the model.
pub fn train_model(
    features: &FeatureMatrix,
    kind: ModelKind,
    evaluate: bool,
    config: &PipelineConfig,
) -> Result<TrainingOutcome> {
    if features.labels().is_none() {
        return Err(PipelineError::missing_column(LABEL));
    }

    let split = train_test_split(features.n_rows(), &config.split);
    let train = features.select_rows(&split.train);
    if train.is_empty() {
        return Err(PipelineError::EmptyDataset {
            stage: "train partition",
        });
    }

    log::info!(
        "Training {kind} on {} rows ({} held out, seed {})",
        split.train.len(),
        split.test.len(),
        config.split.seed
    );
    let params = FitParams {
        logistic_regression: &config.logistic_regression,
        random_forest: &config.random_forest,
        seed: config.split.seed,
    };
    let model = kind.fit(&train, &params)?;
    log::info!("Training {kind} complete");

    let evaluation = if evaluate {
        let test = features.select_rows(&split.test);
        let evaluator = BinaryClassificationEvaluator::new();
        let train_auc = evaluator.evaluate(&model.transform(&train)?)?;
        let test_auc = evaluator.evaluate(&model.transform(&test)?)?;
        log::info!("{kind} area under ROC: train {train_auc:.4}, test {test_auc:.4}");
        Some(Evaluation {
            train_auc,
            test_auc,
        })
    } else {
        None
    };

    Ok(TrainingOutcome {
        model,
        split,
        evaluation,
    })
}

/// [`train_model`] with the family given by name.
pub fn train_model_named(
    features: &FeatureMatrix,
    model_name: &str,
    evaluate: bool,
    config: &PipelineConfig,
) -> Result<TrainingOutcome> {
    let kind: ModelKind = model_name.parse()?;
    train_model(features, kind, evaluate, config)
}
