//! Classifier families and fitted models.
//!
//! The family is picked from a closed [`ModelKind`] enumeration; string names
//! are only accepted at the boundary through [`ModelKind::from_str`].

use std::fmt;
use std::str::FromStr;

use linfa::traits::{Fit, Predict};
use linfa::Dataset as LinfaDataset;
use linfa_logistic::{FittedLogisticRegression, LogisticRegression};
use ndarray::{Array1, Array2};

use crate::config::{LogisticRegressionConfig, RandomForestConfig};
use crate::data::model::{DataType, Dataset, Field, Schema, Value};
use crate::data::schema::LABEL;
use crate::error::{PipelineError, Result};
use crate::evaluate::{PREDICTION, RAW_PREDICTION};
use crate::features::FeatureMatrix;
use crate::forest::RandomForest;

// ---------------------------------------------------------------------------
// ModelKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKind {
    LogisticRegression,
    RandomForest,
}

impl ModelKind {
    pub const ALL: [ModelKind; 2] = [ModelKind::LogisticRegression, ModelKind::RandomForest];

    /// Display name, also accepted by [`ModelKind::from_str`].
    pub fn name(self) -> &'static str {
        match self {
            ModelKind::LogisticRegression => "Logistic Regression",
            ModelKind::RandomForest => "Random Forest classifier",
        }
    }

    fn alias(self) -> &'static str {
        match self {
            ModelKind::LogisticRegression => "logistic-regression",
            ModelKind::RandomForest => "random-forest",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModelKind {
    type Err = PipelineError;

    /// Accepts the display name or the kebab-case alias. Anything else is an
    /// error; there is no fallback family.
    fn from_str(s: &str) -> Result<Self> {
        ModelKind::ALL
            .into_iter()
            .find(|kind| s == kind.name() || s == kind.alias())
            .ok_or_else(|| PipelineError::InvalidModelSelector(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Fitting
// ---------------------------------------------------------------------------

/// Hyper-parameters for both families.
#[derive(Debug, Clone, Copy)]
pub struct FitParams<'a> {
    pub logistic_regression: &'a LogisticRegressionConfig,
    pub random_forest: &'a RandomForestConfig,
    /// Seeds bootstrap and feature sampling of the forest.
    pub seed: u64,
}

enum Classifier {
    Logistic(FittedLogisticRegression<f64, usize>),
    Forest(RandomForest),
}

/// A fitted classifier. Scores are the probability (or mean leaf share) of
/// label 1.
pub struct TrainedModel {
    kind: ModelKind,
    feature_columns: Vec<String>,
    classifier: Classifier,
}

impl fmt::Debug for TrainedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("TrainedModel");
        s.field("kind", &self.kind)
            .field("n_features", &self.feature_columns.len());
        if let Classifier::Forest(forest) = &self.classifier {
            s.field("n_trees", &forest.n_trees())
                .field("n_nodes", &forest.n_nodes());
        }
        s.finish()
    }
}

impl ModelKind {
    /// Fit this family on a labelled feature matrix.
    pub fn fit(self, train: &FeatureMatrix, params: &FitParams<'_>) -> Result<TrainedModel> {
        let labels = train.labels().ok_or_else(|| PipelineError::missing_column(LABEL))?;
        if train.is_empty() {
            return Err(PipelineError::EmptyDataset { stage: "model fit" });
        }
        if train.n_features() == 0 {
            return Err(PipelineError::Training("no feature columns".to_string()));
        }

        let classifier = match self {
            ModelKind::LogisticRegression => Classifier::Logistic(fit_logistic(
                train.values(),
                labels,
                params.logistic_regression,
            )?),
            ModelKind::RandomForest => Classifier::Forest(RandomForest::fit(
                train.values().view(),
                labels.view(),
                params.random_forest,
                params.seed,
            )),
        };

        Ok(TrainedModel {
            kind: self,
            feature_columns: train.columns().to_vec(),
            classifier,
        })
    }
}

fn fit_logistic(
    x: &Array2<f64>,
    y: &Array1<usize>,
    config: &LogisticRegressionConfig,
) -> Result<FittedLogisticRegression<f64, usize>> {
    let dataset = LinfaDataset::new(x.clone(), y.clone());
    LogisticRegression::default()
        .alpha(config.alpha)
        .gradient_tolerance(config.gradient_tolerance)
        .max_iterations(config.max_iterations)
        .fit(&dataset)
        .map_err(|e| PipelineError::Training(format!("logistic regression: {e}")))
}

// ---------------------------------------------------------------------------
// Prediction
// ---------------------------------------------------------------------------

impl TrainedModel {
    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    /// Feature columns the model was fit on, in vector order.
    pub fn feature_columns(&self) -> &[String] {
        &self.feature_columns
    }

    /// Score of label 1 for every row of `features`.
    pub fn predict_scores(&self, features: &FeatureMatrix) -> Result<Array1<f64>> {
        if features.columns() != self.feature_columns.as_slice() {
            return Err(PipelineError::SchemaMismatch {
                column: "features".to_string(),
                reason: format!(
                    "model was fit on {} other feature columns",
                    self.feature_columns.len()
                ),
            });
        }
        let x = features.values();
        let scores = match &self.classifier {
            Classifier::Logistic(model) => {
                let p = model.predict_probabilities(x);
                if model.labels().pos.class == 1 {
                    p
                } else {
                    p.mapv(|v| 1.0 - v)
                }
            }
            Classifier::Forest(forest) => forest.predict_scores(x.view()),
        };
        Ok(scores)
    }

    /// Predictions dataset: `label` (when the input is labelled),
    /// `raw_prediction` and `prediction` (score >= 0.5).
    pub fn transform(&self, features: &FeatureMatrix) -> Result<Dataset> {
        let scores = self.predict_scores(features)?;

        let mut fields = Vec::new();
        if features.labels().is_some() {
            fields.push(Field::new(LABEL, DataType::Integer));
        }
        fields.push(Field::new(RAW_PREDICTION, DataType::Float));
        fields.push(Field::new(PREDICTION, DataType::Integer));

        let rows = scores
            .iter()
            .enumerate()
            .map(|(i, &score)| {
                let mut row = Vec::with_capacity(fields.len());
                if let Some(labels) = features.labels() {
                    row.push(Value::Integer(labels[i] as i64));
                }
                row.push(Value::Float(score));
                row.push(Value::Integer(i64::from(score >= 0.5)));
                row
            })
            .collect();
        Dataset::new(Schema::new(fields), rows)
    }
}
