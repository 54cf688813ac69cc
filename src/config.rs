use crate::active_learning::RoundingPolicy;
use anyhow::{Context, Result};
use schemars::{JsonSchema, Schema, schema_for};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

fn default_prediction() -> f64 {
    0.0
}

fn default_variance() -> f64 {
    0.0
}

/// Tunables of a [`MondrianTree`](crate::MondrianTree) that are not part of its data.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TreeConfig {
    #[serde(default = "default_prediction")]
    #[schemars(
        title = "Prediction Default",
        description = "Value predicted for points whose leaf holds no labeled data",
        default = "default_prediction"
    )]
    pub prediction_default: f64,

    #[serde(default = "default_variance")]
    #[schemars(
        title = "Default Variance",
        description = "Variance substituted for leaves with zero variance when computing proportions",
        range(min = 0.0),
        default = "default_variance"
    )]
    pub default_variance: f64,

    #[serde(default)]
    #[schemars(
        title = "Rounding Policy",
        description = "Apportionment rule used when turning proportions into label counts"
    )]
    pub rounding_policy: RoundingPolicy,

    #[serde(default)]
    #[schemars(
        title = "Growth Seed",
        description = "PRNG seed for growth calls made without an explicit seed (None = OS entropy)"
    )]
    pub growth_seed: Option<u64>,

    #[serde(default)]
    #[schemars(
        title = "Sampling Seed",
        description = "PRNG seed for leaf sampling calls made without an explicit seed (None = OS entropy)"
    )]
    pub sampling_seed: Option<u64>,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            prediction_default: default_prediction(),
            default_variance: default_variance(),
            rounding_policy: RoundingPolicy::default(),
            growth_seed: None,
            sampling_seed: None,
        }
    }
}

impl TreeConfig {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: TreeConfig =
            serde_json::from_str(raw).context("failed to parse tree config JSON")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read tree config {}", path.display()))?;
        Self::from_json_str(&raw).with_context(|| format!("invalid tree config {}", path.display()))
    }

    pub fn schema() -> Schema {
        schema_for!(TreeConfig)
    }

    fn validate(&self) -> Result<()> {
        if !self.prediction_default.is_finite() {
            anyhow::bail!("prediction_default must be finite");
        }
        if !(self.default_variance.is_finite() && self.default_variance >= 0.0) {
            anyhow::bail!("default_variance must be a finite, non-negative number");
        }
        Ok(())
    }
}
