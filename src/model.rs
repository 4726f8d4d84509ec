use anyhow::{bail, ensure, Context, Result};
use serde::Deserialize;
use std::{fs, path::Path};

use crate::types::{FeatureVector, N_FEATURES};

// ---------- Errors ----------

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("{model} model produced a non-finite prediction ({value})")]
    NonFinite { model: &'static str, value: f64 },

    #[error("{model} model failed: {reason}")]
    Internal { model: &'static str, reason: String },
}

// ---------- Regressor seam ----------

/// Anything that maps one ordered feature vector to one scalar.
///
/// The store only ever sees this trait, so tests can hand it fakes.
pub trait Regressor: Send + Sync {
    fn predict(&self, x: &FeatureVector) -> Result<f64, ModelError>;

    /// Short label for startup logs.
    fn describe(&self) -> String {
        "custom".to_string()
    }
}

// ---------- Artifact format ----------

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    /// Random-forest style: average of tree outputs.
    Mean,
    /// Boosting style: learning_rate * sum of tree outputs.
    Sum,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum Node {
    Leaf {
        leaf: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    // Children always sit after their parent (checked at load), so the walk terminates.
    fn eval(&self, x: &FeatureVector) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes[idx] {
                Node::Leaf { leaf } => return leaf,
                Node::Split { feature, threshold, left, right } => {
                    idx = if x[feature] <= threshold { left } else { right };
                }
            }
        }
    }

    fn check(&self) -> Result<()> {
        ensure!(!self.nodes.is_empty(), "tree has no nodes");
        for (i, node) in self.nodes.iter().enumerate() {
            match *node {
                Node::Leaf { leaf } => {
                    ensure!(leaf.is_finite(), "node {}: non-finite leaf value", i);
                }
                Node::Split { feature, threshold, left, right } => {
                    ensure!(
                        feature < N_FEATURES,
                        "node {}: feature index {} out of range (< {})",
                        i, feature, N_FEATURES
                    );
                    ensure!(threshold.is_finite(), "node {}: non-finite threshold", i);
                    for child in [left, right] {
                        if child <= i || child >= self.nodes.len() {
                            bail!("node {}: child index {} is invalid", i, child);
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

fn default_learning_rate() -> f64 {
    1.0
}

/// A serialized regression model as exported by the training pipeline.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegressionModel {
    Linear {
        intercept: f64,
        coefficients: Vec<f64>,
    },
    TreeEnsemble {
        aggregation: Aggregation,
        #[serde(default)]
        base_score: f64,
        #[serde(default = "default_learning_rate")]
        learning_rate: f64,
        trees: Vec<Tree>,
    },
}

impl RegressionModel {
    pub fn from_json(txt: &str) -> Result<Self> {
        let mdl: RegressionModel =
            serde_json::from_str(txt).context("failed to parse model artifact")?;
        mdl.check()?;
        Ok(mdl)
    }

    /// Read, parse and validate an artifact; every failure carries the path.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let txt = fs::read_to_string(path)
            .with_context(|| format!("failed to read model at {}", path.display()))?;
        Self::from_json(&txt).with_context(|| format!("invalid model artifact {}", path.display()))
    }

    fn check(&self) -> Result<()> {
        match self {
            Self::Linear { intercept, coefficients } => {
                ensure!(
                    coefficients.len() == N_FEATURES,
                    "linear model has {} coefficients, expected {}",
                    coefficients.len(),
                    N_FEATURES
                );
                ensure!(
                    intercept.is_finite() && coefficients.iter().all(|c| c.is_finite()),
                    "linear model has non-finite parameters"
                );
            }
            Self::TreeEnsemble { base_score, learning_rate, trees, .. } => {
                ensure!(!trees.is_empty(), "tree ensemble has no trees");
                ensure!(
                    base_score.is_finite() && learning_rate.is_finite(),
                    "tree ensemble has non-finite parameters"
                );
                for (i, t) in trees.iter().enumerate() {
                    t.check().with_context(|| format!("tree {}", i))?;
                }
            }
        }
        Ok(())
    }

    fn eval(&self, x: &FeatureVector) -> f64 {
        match self {
            Self::Linear { intercept, coefficients } => {
                intercept + coefficients.iter().zip(x.iter()).map(|(c, v)| c * v).sum::<f64>()
            }
            Self::TreeEnsemble { aggregation, base_score, learning_rate, trees } => {
                let total: f64 = trees.iter().map(|t| t.eval(x)).sum();
                match aggregation {
                    Aggregation::Mean => base_score + total / trees.len() as f64,
                    Aggregation::Sum => base_score + learning_rate * total,
                }
            }
        }
    }
}

/// A loaded artifact bound to the axis it predicts.
#[derive(Debug, Clone)]
pub struct ArtifactModel {
    axis: &'static str,
    inner: RegressionModel,
}

impl ArtifactModel {
    /// Validates the model first; evaluation relies on the tree and width checks.
    pub fn new(axis: &'static str, inner: RegressionModel) -> Result<Self> {
        inner.check().with_context(|| format!("invalid {} model", axis))?;
        Ok(Self { axis, inner })
    }
}

impl Regressor for ArtifactModel {
    fn predict(&self, x: &FeatureVector) -> Result<f64, ModelError> {
        let y = self.inner.eval(x);
        if !y.is_finite() {
            return Err(ModelError::NonFinite { model: self.axis, value: y });
        }
        Ok(y)
    }

    fn describe(&self) -> String {
        match &self.inner {
            RegressionModel::Linear { .. } => "linear".to_string(),
            RegressionModel::TreeEnsemble { aggregation, trees, .. } => {
                format!("tree_ensemble({:?}, {} trees)", aggregation, trees.len())
            }
        }
    }
}
