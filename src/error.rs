//! Error types for the song popularity pipeline.

use thiserror::Error;

/// Result type shared by every pipeline stage.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Failures a pipeline stage can report. Each stage is all-or-nothing: on
/// error no partial dataset is returned.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The source dataset could not be read or parsed.
    #[error("data access error: {0:#}")]
    DataAccess(#[source] anyhow::Error),

    /// An aggregate was requested over zero rows.
    #[error("empty dataset: cannot compute {stage} over zero rows")]
    EmptyDataset { stage: &'static str },

    /// Model family name outside the supported set.
    #[error("invalid model name: '{0}'")]
    InvalidModelSelector(String),

    /// A column required by a stage is absent or has the wrong type.
    #[error("schema mismatch on column '{column}': {reason}")]
    SchemaMismatch { column: String, reason: String },

    /// A numeric cell required by a stage is null.
    #[error("null value in column '{column}' at row {row}")]
    NullValue { column: String, row: usize },

    /// The classifier backend failed to fit.
    #[error("training failed: {0}")]
    Training(String),

    /// Invalid configuration value.
    #[error("configuration error: {0}")]
    Config(String),
}

impl PipelineError {
    pub(crate) fn missing_column(column: &str) -> Self {
        PipelineError::SchemaMismatch {
            column: column.to_string(),
            reason: "column not present".to_string(),
        }
    }
}
