//! Pipeline configuration.
//!
//! Everything the two commands need lives in one TOML document. Every field
//! has a default, so an absent file or an empty one is a valid
//! configuration; command-line flags override single values on top.

use std::path::{Path, PathBuf};

use anyhow::{ensure, Context};
use serde::{Deserialize, Serialize};
use tracing::info;

use delbind_chem::FingerprintParams;
use delbind_data::DatasetSchema;
use delbind_model::{ForestConfig, InvalidSmilesPolicy, MaxFeatures, UnseenPolicy};

/// Looked for in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "delbind.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Master seed; sampling, splitting and tree growth all derive from it.
    pub seed: u64,
    pub data: DataConfig,
    pub fingerprint: FingerprintParams,
    pub sampling: SamplingConfig,
    pub split: SplitConfig,
    pub policies: PolicyConfig,
    pub forest: ForestSettings,
    pub inference: InferenceConfig,
    pub output: OutputConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            data: DataConfig::default(),
            fingerprint: FingerprintParams::default(),
            sampling: SamplingConfig::default(),
            split: SplitConfig::default(),
            policies: PolicyConfig::default(),
            forest: ForestSettings::default(),
            inference: InferenceConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub train: PathBuf,
    pub test: PathBuf,
    pub schema: DatasetSchema,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            train: PathBuf::from("data/train.parquet"),
            test: PathBuf::from("data/test.parquet"),
            schema: DatasetSchema::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Rows drawn per outcome class.
    pub per_class: usize,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self { per_class: 10_000 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Fraction of the sample held out for validation.
    pub validation: f64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self { validation: 0.2 }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub invalid_smiles: InvalidSmilesPolicy,
    pub unseen_protein: UnseenPolicy,
}

/// Forest shape without the seed, which comes from the pipeline level.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestSettings {
    pub trees: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
}

impl Default for ForestSettings {
    fn default() -> Self {
        let base = ForestConfig::default();
        Self {
            trees: base.trees,
            max_depth: base.max_depth,
            min_samples_split: base.min_samples_split,
            min_samples_leaf: base.min_samples_leaf,
            max_features: base.max_features,
        }
    }
}

impl ForestSettings {
    pub fn to_forest_config(&self, seed: u64) -> ForestConfig {
        ForestConfig {
            trees: self.trees,
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            min_samples_leaf: self.min_samples_leaf,
            max_features: self.max_features,
            seed,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Rows decoded, featurized and scored per chunk; bounds peak memory.
    pub chunk_size: usize,
    /// Skip ids already present in the submission file.
    pub resume: bool,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            chunk_size: 10_000,
            resume: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub artifact: PathBuf,
    pub submission: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            artifact: PathBuf::from("model/delbind.json"),
            submission: PathBuf::from("submission.csv"),
        }
    }
}

impl PipelineConfig {
    /// Loads the given file, or `delbind.toml` when present, or defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_PATH);
                if default.exists() {
                    Self::from_file(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read configuration {}", path.display()))?;
        let config: Self = toml::from_str(&text)
            .with_context(|| format!("invalid configuration {}", path.display()))?;
        info!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(self.sampling.per_class > 0, "sampling.per_class must be positive");
        ensure!(
            (0.0..1.0).contains(&self.split.validation),
            "split.validation must lie in [0, 1), got {}",
            self.split.validation
        );
        ensure!(self.fingerprint.bits > 0, "fingerprint.bits must be positive");
        ensure!(self.forest.trees > 0, "forest.trees must be positive");
        ensure!(
            self.inference.chunk_size > 0,
            "inference.chunk_size must be positive"
        );
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_validate() {
        let config = PipelineConfig::default();
        config.validate().unwrap();
        assert_eq!(config.seed, 42);
        assert_eq!(config.fingerprint.bits, 2048);
        assert_eq!(config.fingerprint.radius, 2);
        assert_eq!(config.sampling.per_class, 10_000);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let config: PipelineConfig = toml::from_str(
            r#"
            seed = 7

            [fingerprint]
            bits = 512

            [sampling]
            per_class = 500

            [forest]
            trees = 32
            max_depth = 12
            "#,
        )
        .unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.fingerprint.bits, 512);
        assert_eq!(config.fingerprint.radius, 2);
        assert_eq!(config.sampling.per_class, 500);
        assert_eq!(config.forest.trees, 32);
        assert_eq!(config.forest.max_depth, Some(12));
        // Untouched sections keep their defaults.
        assert_eq!(config.split.validation, 0.2);
        assert_eq!(config.inference.chunk_size, 10_000);
        assert_eq!(config.data.schema.protein, "protein_name");
    }

    #[test]
    fn enums_parse_from_lowercase() {
        let config: PipelineConfig = toml::from_str(
            r#"
            [policies]
            invalid_smiles = "fail"
            unseen_protein = "zero"

            [forest]
            max_features = "all"
            "#,
        )
        .unwrap();
        assert_eq!(config.policies.invalid_smiles, InvalidSmilesPolicy::Fail);
        assert_eq!(config.policies.unseen_protein, UnseenPolicy::Zero);
        assert_eq!(config.forest.max_features, MaxFeatures::All);
    }

    #[test]
    fn out_of_range_values_fail_validation() {
        let mut config = PipelineConfig::default();
        config.split.validation = 1.0;
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.sampling.per_class = 0;
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.inference.chunk_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn absent_default_file_means_defaults() {
        // Tests run from the package root, which carries no delbind.toml.
        let config = PipelineConfig::load(None).unwrap();
        config.validate().unwrap();
    }
}
