//! Feature vector assembly and standardization.
//!
//! Assembly is a stateless per-row concatenation of the eligible numeric
//! columns. Standardization is split into [`StandardScaler::fit`], which
//! produces a [`FittedScaler`] owned independently of any dataset, and
//! [`FittedScaler::transform`], so statistics fit on training data can be
//! reused on inference data.

use ndarray::{Array1, Array2, Axis};

use crate::data::model::{Dataset, Schema, Value};
use crate::data::schema::{LABEL, SONG_HOTTTNESSS};
use crate::error::{PipelineError, Result};

// ---------------------------------------------------------------------------
// FeatureMatrix
// ---------------------------------------------------------------------------

/// One feature vector per record (rows) plus the binary label when known.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    columns: Vec<String>,
    values: Array2<f64>,
    labels: Option<Array1<usize>>,
}

impl FeatureMatrix {
    pub fn new(
        columns: Vec<String>,
        values: Array2<f64>,
        labels: Option<Array1<usize>>,
    ) -> Result<Self> {
        if values.ncols() != columns.len() {
            return Err(PipelineError::SchemaMismatch {
                column: "features".to_string(),
                reason: format!(
                    "{} columns named for {} dimensions",
                    columns.len(),
                    values.ncols()
                ),
            });
        }
        if let Some(labels) = &labels {
            if labels.len() != values.nrows() {
                return Err(PipelineError::SchemaMismatch {
                    column: LABEL.to_string(),
                    reason: format!("{} labels for {} rows", labels.len(), values.nrows()),
                });
            }
        }
        Ok(FeatureMatrix {
            columns,
            values,
            labels,
        })
    }

    /// Source column of each dimension, in vector order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn labels(&self) -> Option<&Array1<usize>> {
        self.labels.as_ref()
    }

    pub fn n_rows(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.values.ncols()
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows() == 0
    }

    /// The rows at `indices`, in that order.
    pub fn select_rows(&self, indices: &[usize]) -> FeatureMatrix {
        FeatureMatrix {
            columns: self.columns.clone(),
            values: self.values.select(Axis(0), indices),
            labels: self.labels.as_ref().map(|l| l.select(Axis(0), indices)),
        }
    }
}

// ---------------------------------------------------------------------------
// Vector assembly
// ---------------------------------------------------------------------------

/// Concatenates every numeric column except the popularity score and the
/// label, in schema order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorAssembler {
    input_columns: Vec<String>,
}

impl VectorAssembler {
    pub fn for_schema(schema: &Schema) -> Self {
        let input_columns = schema
            .fields()
            .iter()
            .filter(|f| f.dtype.is_numeric() && f.name != SONG_HOTTTNESSS && f.name != LABEL)
            .map(|f| f.name.clone())
            .collect();
        VectorAssembler { input_columns }
    }

    pub fn input_columns(&self) -> &[String] {
        &self.input_columns
    }

    /// Build the raw (unscaled) feature matrix. A null in any input column is
    /// an error; labels are read when the dataset has a `label` column.
    pub fn assemble(&self, dataset: &Dataset) -> Result<FeatureMatrix> {
        let schema = dataset.schema();
        let indices = self
            .input_columns
            .iter()
            .map(|name| schema.require_numeric(name))
            .collect::<Result<Vec<usize>>>()?;

        let mut values = Array2::<f64>::zeros((dataset.len(), indices.len()));
        for (i, row) in dataset.rows().iter().enumerate() {
            for (j, &idx) in indices.iter().enumerate() {
                values[[i, j]] = row[idx].as_f64().ok_or_else(|| PipelineError::NullValue {
                    column: self.input_columns[j].clone(),
                    row: i,
                })?;
            }
        }

        let labels = match schema.index_of(LABEL) {
            Some(_) => Some(read_labels(dataset)?),
            None => None,
        };

        FeatureMatrix::new(self.input_columns.clone(), values, labels)
    }
}

fn read_labels(dataset: &Dataset) -> Result<Array1<usize>> {
    dataset
        .column(LABEL)?
        .enumerate()
        .map(|(row, value)| match value {
            Value::Integer(0) => Ok(0),
            Value::Integer(1) => Ok(1),
            Value::Null => Err(PipelineError::NullValue {
                column: LABEL.to_string(),
                row,
            }),
            other => Err(PipelineError::SchemaMismatch {
                column: LABEL.to_string(),
                reason: format!("row {row} holds {other}, expected 0 or 1"),
            }),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Standardization
// ---------------------------------------------------------------------------

/// Fits per-dimension mean and sample standard deviation.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardScaler;

/// Standardization statistics. Dimensions with zero variance map to 0.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedScaler {
    columns: Vec<String>,
    mean: Array1<f64>,
    std: Array1<f64>,
}

impl StandardScaler {
    pub fn fit(&self, features: &FeatureMatrix) -> Result<FittedScaler> {
        let values = features.values();
        let n = values.nrows();
        let mean = values
            .mean_axis(Axis(0))
            .ok_or(PipelineError::EmptyDataset {
                stage: "standardization statistics",
            })?;
        let std = if n > 1 {
            values.std_axis(Axis(0), 1.0)
        } else {
            Array1::zeros(values.ncols())
        };
        Ok(FittedScaler {
            columns: features.columns().to_vec(),
            mean,
            std,
        })
    }
}

impl FittedScaler {
    pub fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    pub fn std(&self) -> &Array1<f64> {
        &self.std
    }

    /// `(x - mean) / std` per dimension. The input must have the same
    /// columns, in the same order, as the matrix the scaler was fit on.
    pub fn transform(&self, features: &FeatureMatrix) -> Result<FeatureMatrix> {
        if features.columns() != self.columns.as_slice() {
            return Err(PipelineError::SchemaMismatch {
                column: "features".to_string(),
                reason: "feature columns differ from the ones the scaler was fit on".to_string(),
            });
        }
        let inv_std = self.std.mapv(|s| if s > 0.0 { 1.0 / s } else { 0.0 });
        let scaled = (features.values() - &self.mean) * &inv_std;
        FeatureMatrix::new(self.columns.clone(), scaled, features.labels.clone())
    }
}

/// Assemble, fit a scaler and standardize, all on `dataset`.
///
/// The scaler is returned so callers can keep it next to a trained model;
/// this pipeline itself does not persist it.
pub fn featurize(dataset: &Dataset) -> Result<(FeatureMatrix, FittedScaler)> {
    let raw = VectorAssembler::for_schema(dataset.schema()).assemble(dataset)?;
    let scaler = StandardScaler.fit(&raw)?;
    let scaled = scaler.transform(&raw)?;
    log::debug!(
        "Assembled {} feature vectors of {} dimensions",
        scaled.n_rows(),
        scaled.n_features()
    );
    Ok((scaled, scaler))
}
