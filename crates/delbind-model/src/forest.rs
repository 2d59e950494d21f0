//! Random forest classifier over dense feature rows.
//!
//! Bagged CART trees with Gini splits on a random feature subset per node.
//! Tree `t` seeds its own generator from `seed + t`, so training is
//! reproducible and trees stay decorrelated. Probability output is the mean
//! positive fraction of the reached leaves.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ModelError, Result};
use crate::features::FeatureMatrix;

/// Candidate features examined per split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaxFeatures {
    /// Square root of the feature count, the usual classification choice.
    Sqrt,
    /// Every feature at every split.
    All,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestConfig {
    pub trees: usize,
    /// `None` grows until purity or the minimum-size stops apply.
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            trees: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::Sqrt,
            seed: 42,
        }
    }
}

/// Splits below this gain are noise, not structure.
const MIN_GAIN: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Node {
    Split {
        feature: u32,
        threshold: f32,
        left: u32,
        right: u32,
    },
    Leaf {
        probability: f32,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn predict(&self, row: &[f32]) -> f32 {
        let mut index = 0usize;
        loop {
            match &self.nodes[index] {
                Node::Leaf { probability } => return *probability,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if row[*feature as usize] <= *threshold {
                        *left as usize
                    } else {
                        *right as usize
                    };
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<Tree>,
    width: usize,
}

impl RandomForest {
    /// Trains on `x` with binary labels `y`.
    pub fn fit(x: &FeatureMatrix, y: &[u8], config: &ForestConfig) -> Result<Self> {
        if config.trees == 0 || config.min_samples_leaf == 0 || config.min_samples_split < 2 {
            return Err(ModelError::InvalidConfig(format!(
                "trees={}, min_samples_split={}, min_samples_leaf={} (need >=1 tree, split >=2, leaf >=1)",
                config.trees, config.min_samples_split, config.min_samples_leaf
            )));
        }
        if x.rows() == 0 {
            return Err(ModelError::EmptyTrainingSet);
        }
        if x.rows() != y.len() {
            return Err(ModelError::LabelMismatch {
                rows: x.rows(),
                labels: y.len(),
            });
        }

        let candidates = match config.max_features {
            MaxFeatures::All => x.width(),
            MaxFeatures::Sqrt => ((x.width() as f64).sqrt().round() as usize).max(1),
        }
        .min(x.width());

        let mut trees = Vec::with_capacity(config.trees);
        for t in 0..config.trees {
            let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(t as u64));
            let bootstrap: Vec<usize> = (0..x.rows()).map(|_| rng.gen_range(0..x.rows())).collect();
            let mut builder = TreeBuilder {
                x,
                y,
                config,
                rng,
                candidates,
                nodes: Vec::new(),
            };
            builder.grow(bootstrap, 0);
            trees.push(Tree {
                nodes: builder.nodes,
            });
        }
        debug!(trees = config.trees, width = x.width(), "forest grown");
        Ok(Self {
            trees,
            width: x.width(),
        })
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Feature width the forest was trained on.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Positive-class probability for every row of `x`.
    pub fn predict_proba(&self, x: &FeatureMatrix) -> Result<Vec<f32>> {
        if x.width() != self.width {
            return Err(ModelError::FeatureWidthMismatch {
                expected: self.width,
                got: x.width(),
            });
        }
        Ok((0..x.rows())
            .map(|i| {
                let row = x.row(i);
                let total: f32 = self.trees.iter().map(|tree| tree.predict(row)).sum();
                total / self.trees.len() as f32
            })
            .collect())
    }
}

struct SplitChoice {
    feature: usize,
    threshold: f32,
}

struct TreeBuilder<'a> {
    x: &'a FeatureMatrix,
    y: &'a [u8],
    config: &'a ForestConfig,
    rng: StdRng,
    candidates: usize,
    nodes: Vec<Node>,
}

impl TreeBuilder<'_> {
    /// Grows the subtree over `samples` and returns its root node index.
    fn grow(&mut self, samples: Vec<usize>, depth: usize) -> u32 {
        let n = samples.len();
        let positives = samples.iter().filter(|&&i| self.y[i] == 1).count();
        let pure = positives == 0 || positives == n;
        let capped = self.config.max_depth.is_some_and(|d| depth >= d);
        if pure || capped || n < self.config.min_samples_split {
            return self.leaf(positives, n);
        }
        let Some(split) = self.best_split(&samples, positives) else {
            return self.leaf(positives, n);
        };
        let SplitChoice { feature, threshold } = split;
        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = samples
            .into_iter()
            .partition(|&i| self.x.row(i)[feature] <= threshold);

        let index = self.nodes.len() as u32;
        // Placeholder, patched once both children exist.
        self.nodes.push(Node::Leaf { probability: 0.0 });
        let left = self.grow(left_rows, depth + 1);
        let right = self.grow(right_rows, depth + 1);
        self.nodes[index as usize] = Node::Split {
            feature: feature as u32,
            threshold,
            left,
            right,
        };
        index
    }

    fn leaf(&mut self, positives: usize, n: usize) -> u32 {
        let probability = if n == 0 {
            0.0
        } else {
            positives as f32 / n as f32
        };
        self.nodes.push(Node::Leaf { probability });
        (self.nodes.len() - 1) as u32
    }

    /// Best Gini split over a random feature subset, or `None` when no
    /// candidate produces a real gain while respecting the leaf minimum.
    fn best_split(&mut self, samples: &[usize], total_pos: usize) -> Option<SplitChoice> {
        let n = samples.len();
        let leaf_min = self.config.min_samples_leaf;
        let parent = gini(total_pos, n);
        let features = rand::seq::index::sample(&mut self.rng, self.x.width(), self.candidates);

        let mut best: Option<(f64, SplitChoice)> = None;
        let mut values: Vec<(f32, u8)> = Vec::with_capacity(n);
        for feature in features {
            values.clear();
            values.extend(samples.iter().map(|&i| (self.x.row(i)[feature], self.y[i])));
            values.sort_unstable_by(|a, b| {
                a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal)
            });

            let mut left_n = 0usize;
            let mut left_pos = 0usize;
            for k in 0..n - 1 {
                left_n += 1;
                if values[k].1 == 1 {
                    left_pos += 1;
                }
                // A threshold only exists between two distinct values.
                if values[k].0 >= values[k + 1].0 {
                    continue;
                }
                let right_n = n - left_n;
                if left_n < leaf_min || right_n < leaf_min {
                    continue;
                }
                let weighted = (left_n as f64 * gini(left_pos, left_n)
                    + right_n as f64 * gini(total_pos - left_pos, right_n))
                    / n as f64;
                let gain = parent - weighted;
                if gain > MIN_GAIN && best.as_ref().is_none_or(|(g, _)| gain > *g) {
                    best = Some((
                        gain,
                        SplitChoice {
                            feature,
                            threshold: midpoint(values[k].0, values[k + 1].0),
                        },
                    ));
                }
            }
        }
        best.map(|(_, choice)| choice)
    }
}

fn gini(positives: usize, n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let p = positives as f64 / n as f64;
    2.0 * p * (1.0 - p)
}

fn midpoint(a: f32, b: f32) -> f32 {
    a + (b - a) / 2.0
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Rows where feature `signal` equals the label and the rest alternate
    /// independently of it.
    fn separable(rows: usize, width: usize, signal: usize) -> (FeatureMatrix, Vec<u8>) {
        let mut x = FeatureMatrix::with_capacity(width, rows);
        let mut y = Vec::with_capacity(rows);
        for i in 0..rows {
            let label = (i % 2) as u8;
            x.try_push_row(|row| {
                for (f, slot) in row.iter_mut().enumerate() {
                    *slot = ((i / (f + 2)) % 2) as f32;
                }
                row[signal] = label as f32;
                Ok::<(), ()>(())
            })
            .unwrap();
            y.push(label);
        }
        (x, y)
    }

    fn config(trees: usize) -> ForestConfig {
        ForestConfig {
            trees,
            max_features: MaxFeatures::All,
            ..ForestConfig::default()
        }
    }

    #[test]
    fn learns_a_separating_feature() {
        let (x, y) = separable(40, 8, 5);
        let forest = RandomForest::fit(&x, &y, &config(50)).unwrap();
        let probs = forest.predict_proba(&x).unwrap();
        for (i, p) in probs.iter().enumerate() {
            if y[i] == 1 {
                assert!(*p > 0.9, "row {i}: positive scored {p}");
            } else {
                assert!(*p < 0.1, "row {i}: negative scored {p}");
            }
        }
    }

    #[test]
    fn probabilities_stay_in_range() {
        let (x, y) = separable(30, 6, 2);
        let forest = RandomForest::fit(&x, &y, &config(20)).unwrap();
        for p in forest.predict_proba(&x).unwrap() {
            assert!((0.0..=1.0).contains(&p));
        }
    }

    #[test]
    fn same_seed_same_forest() {
        let (x, y) = separable(30, 6, 1);
        let a = RandomForest::fit(&x, &y, &config(10)).unwrap();
        let b = RandomForest::fit(&x, &y, &config(10)).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.predict_proba(&x).unwrap(), b.predict_proba(&x).unwrap());
    }

    #[test]
    fn different_seed_changes_the_forest() {
        let (x, y) = separable(30, 6, 1);
        let a = RandomForest::fit(&x, &y, &config(10)).unwrap();
        let mut other = config(10);
        other.seed = 43;
        let b = RandomForest::fit(&x, &y, &other).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn width_mismatch_is_a_hard_error() {
        let (x, y) = separable(20, 4, 0);
        let forest = RandomForest::fit(&x, &y, &config(5)).unwrap();
        let wider = FeatureMatrix::new(6);
        let err = forest.predict_proba(&wider).unwrap_err();
        match err {
            ModelError::FeatureWidthMismatch { expected, got } => {
                assert_eq!(expected, 4);
                assert_eq!(got, 6);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn zero_depth_collapses_to_the_prior() {
        let (x, y) = separable(20, 4, 0);
        let mut cfg = config(15);
        cfg.max_depth = Some(0);
        let forest = RandomForest::fit(&x, &y, &cfg).unwrap();
        let probs = forest.predict_proba(&x).unwrap();
        // Every tree is a single leaf, so every row scores identically.
        for p in &probs {
            assert_eq!(*p, probs[0]);
        }
    }

    #[test]
    fn oversized_leaf_minimum_prevents_splitting() {
        let (x, y) = separable(20, 4, 0);
        let mut cfg = config(5);
        cfg.min_samples_leaf = 15;
        let forest = RandomForest::fit(&x, &y, &cfg).unwrap();
        let probs = forest.predict_proba(&x).unwrap();
        for p in &probs {
            assert_eq!(*p, probs[0]);
        }
    }

    #[test]
    fn rejects_empty_and_mismatched_input() {
        let empty = FeatureMatrix::new(4);
        assert!(matches!(
            RandomForest::fit(&empty, &[], &config(5)),
            Err(ModelError::EmptyTrainingSet)
        ));

        let (x, _) = separable(10, 4, 0);
        assert!(matches!(
            RandomForest::fit(&x, &[1, 0], &config(5)),
            Err(ModelError::LabelMismatch { rows: 10, labels: 2 })
        ));
    }

    #[test]
    fn rejects_degenerate_configuration() {
        let (x, y) = separable(10, 4, 0);
        let mut cfg = config(0);
        assert!(matches!(
            RandomForest::fit(&x, &y, &cfg),
            Err(ModelError::InvalidConfig(_))
        ));
        cfg.trees = 5;
        cfg.min_samples_split = 1;
        assert!(matches!(
            RandomForest::fit(&x, &y, &cfg),
            Err(ModelError::InvalidConfig(_))
        ));
    }
}
