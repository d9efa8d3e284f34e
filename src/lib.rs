//! Song popularity: cleaning, labelling, feature engineering and binary
//! classification of song metadata records.
//!
//! ```text
//!  raw records ─► data::filter ─► label ─► features ─► train (model + evaluate)
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod evaluate;
pub mod features;
pub mod forest;
pub mod label;
pub mod model;
pub mod pipeline;
pub mod split;
pub mod train;

pub use config::PipelineConfig;
pub use data::model::{Dataset, Value};
pub use error::{PipelineError, Result};
pub use model::{ModelKind, TrainedModel};
