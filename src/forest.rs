//! Bagged Gini decision trees for binary labels.
//!
//! Trees are stored flat: node 0 is the root and children are addressed by
//! index. Growing is a pure function of the sampled rows and their order, so a
//! forest fit with the same seed on the same data is identical every time.

use ndarray::{Array1, ArrayView1, ArrayView2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::RandomForestConfig;

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Node {
    /// Share of label-1 rows that reached this leaf during fitting.
    Leaf { score: f64 },
    /// Rows with `x[feature] <= threshold` go left.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
struct GiniTree {
    nodes: Vec<Node>,
}

/// Growth limits shared by every node of a tree.
#[derive(Debug, Clone, Copy)]
struct Limits {
    max_depth: usize,
    min_samples_split: f32,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

/// `n * gini` of a binary node with `pos` positives out of `n` rows.
fn weighted_gini(pos: usize, n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let (pos, n) = (pos as f64, n as f64);
    2.0 * pos * (n - pos) / n
}

impl GiniTree {
    /// Grow a tree over `rows` of `x` (duplicates allowed, as in a bootstrap).
    fn fit(
        x: ArrayView2<'_, f64>,
        y: ArrayView1<'_, usize>,
        rows: Vec<usize>,
        limits: Limits,
    ) -> Self {
        let mut tree = GiniTree { nodes: Vec::new() };
        tree.grow(x, y, rows, 0, limits);
        tree
    }

    fn grow(
        &mut self,
        x: ArrayView2<'_, f64>,
        y: ArrayView1<'_, usize>,
        rows: Vec<usize>,
        depth: usize,
        limits: Limits,
    ) -> usize {
        let id = self.nodes.len();
        let pos = rows.iter().filter(|&&r| y[r] == 1).count();
        let score = if rows.is_empty() { 0.0 } else { pos as f64 / rows.len() as f64 };
        self.nodes.push(Node::Leaf { score });

        let pure = pos == 0 || pos == rows.len();
        if pure || depth >= limits.max_depth || (rows.len() as f32) < limits.min_samples_split {
            return id;
        }
        let Some(best) = best_split(x, y, &rows, weighted_gini(pos, rows.len())) else {
            return id;
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .into_iter()
            .partition(|&r| x[[r, best.feature]] <= best.threshold);
        let left = self.grow(x, y, left_rows, depth + 1, limits);
        let right = self.grow(x, y, right_rows, depth + 1, limits);
        self.nodes[id] = Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            left,
            right,
        };
        id
    }

    /// Score of the leaf `sample` falls into.
    fn predict_one(&self, sample: ArrayView1<'_, f64>) -> f64 {
        let mut node = 0;
        loop {
            match self.nodes[node] {
                Node::Leaf { score } => return score,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => node = if sample[feature] <= threshold { left } else { right },
            }
        }
    }

    fn n_nodes(&self) -> usize {
        self.nodes.len()
    }
}

/// Exhaustive search over every feature and every gap between distinct
/// values. Only a split that strictly lowers the impurity is returned; among
/// equal candidates the first in (feature, value) order wins.
fn best_split(
    x: ArrayView2<'_, f64>,
    y: ArrayView1<'_, usize>,
    rows: &[usize],
    parent_impurity: f64,
) -> Option<BestSplit> {
    let n = rows.len();
    let total_pos = rows.iter().filter(|&&r| y[r] == 1).count();
    let mut best: Option<BestSplit> = None;
    let mut sorted = rows.to_vec();

    for feature in 0..x.ncols() {
        sorted.sort_by(|&a, &b| x[[a, feature]].total_cmp(&x[[b, feature]]));

        let mut left_pos = 0;
        for i in 0..n - 1 {
            if y[sorted[i]] == 1 {
                left_pos += 1;
            }
            let (lo, hi) = (x[[sorted[i], feature]], x[[sorted[i + 1], feature]]);
            if lo >= hi {
                continue;
            }
            let left_n = i + 1;
            let impurity =
                weighted_gini(left_pos, left_n) + weighted_gini(total_pos - left_pos, n - left_n);
            let bound = best.as_ref().map_or(parent_impurity, |b| b.impurity);
            if impurity < bound {
                let mid = lo + (hi - lo) / 2.0;
                best = Some(BestSplit {
                    feature,
                    threshold: if mid < hi { mid } else { lo },
                    impurity,
                });
            }
        }
    }
    best
}

// ---------------------------------------------------------------------------
// Forest
// ---------------------------------------------------------------------------

/// One bagged tree and the feature columns it was grown on.
#[derive(Debug, Clone, PartialEq)]
struct Member {
    features: Vec<usize>,
    tree: GiniTree,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RandomForest {
    members: Vec<Member>,
}

impl RandomForest {
    /// Each tree sees a bootstrap sample of the rows and a random subset of
    /// the features, both drawn from one `StdRng` seeded with `seed`.
    pub fn fit(
        x: ArrayView2<'_, f64>,
        y: ArrayView1<'_, usize>,
        config: &RandomForestConfig,
        seed: u64,
    ) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let (n_rows, n_features) = x.dim();
        let n_sampled = config.feature_subset.count(n_features);
        let limits = Limits {
            max_depth: config.max_depth,
            min_samples_split: config.min_weight_split,
        };

        let members = (0..config.num_trees)
            .map(|_| {
                let rows: Vec<usize> = (0..n_rows).map(|_| rng.gen_range(0..n_rows)).collect();
                let mut features =
                    rand::seq::index::sample(&mut rng, n_features, n_sampled).into_vec();
                features.sort_unstable();

                let sub_x = x.select(Axis(1), &features);
                let tree = GiniTree::fit(sub_x.view(), y, rows, limits);
                Member { features, tree }
            })
            .collect();
        RandomForest { members }
    }

    pub fn n_trees(&self) -> usize {
        self.members.len()
    }

    /// Total node count over all trees.
    pub fn n_nodes(&self) -> usize {
        self.members.iter().map(|m| m.tree.n_nodes()).sum()
    }

    /// Mean leaf score over all trees, one value per row of `x`.
    pub fn predict_scores(&self, x: ArrayView2<'_, f64>) -> Array1<f64> {
        let mut scores = Array1::<f64>::zeros(x.nrows());
        if self.members.is_empty() {
            return scores;
        }
        for member in &self.members {
            let sub_x = x.select(Axis(1), &member.features);
            for (score, sample) in scores.iter_mut().zip(sub_x.axis_iter(Axis(0))) {
                *score += member.tree.predict_one(sample);
            }
        }
        scores / self.members.len() as f64
    }
}
