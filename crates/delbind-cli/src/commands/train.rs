//! `delbind train`: balanced sample, featurize, grow the forest, persist.

use std::path::PathBuf;
use std::time::Instant;

use chrono::Utc;
use clap::Args;
use tracing::{info, warn};

use delbind_data::{sample_balanced, split_records};
use delbind_model::{
    average_precision, Featurizer, ModelArtifact, ProteinEncoder, RandomForest, TrainingSummary,
    ARTIFACT_VERSION,
};

use crate::config::PipelineConfig;

#[derive(Debug, Default, Args)]
pub struct TrainArgs {
    /// Training parquet file.
    #[arg(long, value_name = "PATH")]
    pub train_file: Option<PathBuf>,

    /// Rows drawn per outcome class.
    #[arg(long)]
    pub per_class: Option<usize>,

    /// Master seed for sampling, splitting and tree growth.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Fingerprint radius.
    #[arg(long)]
    pub radius: Option<u32>,

    /// Fingerprint width in bits.
    #[arg(long)]
    pub bits: Option<usize>,

    /// Validation holdout fraction.
    #[arg(long)]
    pub validation: Option<f64>,

    /// Number of trees in the forest.
    #[arg(long)]
    pub trees: Option<usize>,

    /// Where to write the model artifact.
    #[arg(long, value_name = "PATH")]
    pub artifact: Option<PathBuf>,
}

impl TrainArgs {
    pub fn apply(&self, config: &mut PipelineConfig) {
        if let Some(path) = &self.train_file {
            config.data.train = path.clone();
        }
        if let Some(per_class) = self.per_class {
            config.sampling.per_class = per_class;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(radius) = self.radius {
            config.fingerprint.radius = radius;
        }
        if let Some(bits) = self.bits {
            config.fingerprint.bits = bits;
        }
        if let Some(validation) = self.validation {
            config.split.validation = validation;
        }
        if let Some(trees) = self.trees {
            config.forest.trees = trees;
        }
        if let Some(path) = &self.artifact {
            config.output.artifact = path.clone();
        }
    }
}

pub fn run(mut config: PipelineConfig, args: TrainArgs) -> anyhow::Result<()> {
    args.apply(&mut config);
    config.validate()?;
    let started = Instant::now();
    info!(
        train = %config.data.train.display(),
        per_class = config.sampling.per_class,
        seed = config.seed,
        "training starts"
    );

    let sample = sample_balanced(
        &config.data.train,
        &config.data.schema,
        config.sampling.per_class,
        config.seed,
    )?;
    let (train_records, validation_records) =
        split_records(sample, config.split.validation, config.seed);
    info!(
        train_rows = train_records.len(),
        validation_rows = validation_records.len(),
        "sample partitioned"
    );

    let encoder = ProteinEncoder::fit(train_records.iter().map(|r| r.protein.as_str()));
    info!(proteins = ?encoder.categories(), "protein encoder fitted");
    let featurizer = Featurizer {
        fingerprint: config.fingerprint,
        encoder,
        invalid_smiles: config.policies.invalid_smiles,
        unseen_protein: config.policies.unseen_protein,
    };

    let train = featurizer.featurize_train(&train_records)?;
    if train.dropped > 0 {
        warn!(dropped = train.dropped, "training rows dropped during featurization");
    }
    anyhow::ensure!(!train.x.is_empty(), "no training rows survived featurization");

    let forest = RandomForest::fit(&train.x, &train.y, &config.forest.to_forest_config(config.seed))?;
    info!(trees = forest.n_trees(), width = forest.width(), "forest trained");

    let validation = featurizer.featurize_train(&validation_records)?;
    let validation_ap = if validation.x.is_empty() {
        None
    } else {
        let scores = forest.predict_proba(&validation.x)?;
        match average_precision(&validation.y, &scores) {
            Ok(ap) => {
                info!(average_precision = ap, rows = validation.x.rows(), "validation scored");
                Some(ap)
            }
            Err(error) => {
                warn!(%error, "validation average precision unavailable");
                None
            }
        }
    };

    let artifact = ModelArtifact {
        version: ARTIFACT_VERSION,
        trained_at: Utc::now(),
        fingerprint: featurizer.fingerprint,
        encoder: featurizer.encoder.clone(),
        invalid_smiles: featurizer.invalid_smiles,
        unseen_protein: featurizer.unseen_protein,
        forest,
        summary: TrainingSummary {
            sampled_per_class: config.sampling.per_class,
            train_rows: train.x.rows(),
            validation_rows: validation.x.rows(),
            dropped_rows: train.dropped + validation.dropped,
            feature_width: featurizer.width(),
            validation_average_precision: validation_ap,
            seed: config.seed,
        },
    };
    artifact.save(&config.output.artifact)?;
    info!(elapsed = ?started.elapsed(), "training finished");
    Ok(())
}
