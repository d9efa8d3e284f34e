//! Seeded train/test partitioning.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::config::SplitConfig;

/// Row indices of each partition, ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainTestSplit {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Shuffle `0..n_rows` with a generator seeded from `config.seed` and cut at
/// `round(n_rows * train_ratio)`. The same `n_rows` and config always give the
/// same partition.
pub fn train_test_split(n_rows: usize, config: &SplitConfig) -> TrainTestSplit {
    let mut indices: Vec<usize> = (0..n_rows).collect();
    let mut rng = StdRng::seed_from_u64(config.seed);
    indices.shuffle(&mut rng);

    let n_train = ((n_rows as f64) * config.train_ratio).round() as usize;
    let mut test = indices.split_off(n_train.min(n_rows));
    let mut train = indices;
    train.sort_unstable();
    test.sort_unstable();
    TrainTestSplit { train, test }
}
