use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use song_popularity::data::loader::load_path;
use song_popularity::pipeline::{prepare, run_training};
use song_popularity::{ModelKind, PipelineConfig};

#[derive(Parser)]
#[command(name = "song-popularity", version, about = "Train song popularity classifiers")]
struct Cli {
    /// TOML configuration file (defaults are used when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Clean, label, featurize and fit a classifier
    Train {
        /// Song file (.csv, .json, .parquet) or a folder of them
        #[arg(long)]
        data: PathBuf,
        /// "Logistic Regression", "Random Forest classifier" or a kebab-case alias
        #[arg(long, default_value = "Logistic Regression")]
        model: String,
        /// Report area under ROC on the train and test partitions
        #[arg(long)]
        evaluate: bool,
    },
    /// Run the preprocessing stages and summarize the result
    Inspect {
        #[arg(long)]
        data: PathBuf,
        /// Data has no popularity score
        #[arg(long)]
        inference: bool,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => PipelineConfig::from_toml_file(path)?,
        None => PipelineConfig::default(),
    };

    match cli.command {
        Command::Train {
            data,
            model,
            evaluate,
        } => {
            let kind: ModelKind = model.parse()?;
            let raw = load_path(&data, true)
                .with_context(|| format!("loading training data from {}", data.display()))?;
            let (prepared, outcome) = run_training(&raw, kind, evaluate, &config)?;

            println!(
                "{kind}: {} raw records, {} after cleaning, {} popular, {} features",
                raw.len(),
                prepared.records.len(),
                prepared.positive_count().unwrap_or(0),
                outcome.model.feature_columns().len()
            );
            if let Some(eval) = outcome.evaluation {
                println!(
                    "area under ROC  train {:.4}  test {:.4}",
                    eval.train_auc, eval.test_auc
                );
            }
        }
        Command::Inspect { data, inference } => {
            let is_train_data = !inference;
            let raw = load_path(&data, is_train_data)
                .with_context(|| format!("loading {}", data.display()))?;
            let prepared = prepare(&raw, is_train_data, &config)?;

            println!("raw records:      {}", raw.len());
            println!("cleaned records:  {}", prepared.records.len());
            if let Some(threshold) = prepared.threshold {
                println!("mean popularity:  {:.6}", threshold.mean());
                println!("popular records:  {}", prepared.positive_count().unwrap_or(0));
            }
            println!("feature columns ({}):", prepared.features.n_features());
            let scaler = &prepared.scaler;
            for ((name, mean), std) in prepared
                .features
                .columns()
                .iter()
                .zip(scaler.mean())
                .zip(scaler.std())
            {
                println!("  {name:<28} mean {mean:>12.4}  std {std:>12.4}");
            }
        }
    }

    Ok(())
}
