//! `delbind predict`: stream the test set, score chunk by chunk, append to
//! the submission file.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use tracing::{info, warn};

use delbind_data::{existing_ids, SubmissionWriter, TestScan};
use delbind_model::ModelArtifact;

use crate::config::PipelineConfig;

#[derive(Debug, Default, Args)]
pub struct PredictArgs {
    /// Test parquet file.
    #[arg(long, value_name = "PATH")]
    pub test_file: Option<PathBuf>,

    /// Rows scored per chunk.
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Skip rows whose ids are already in the submission file.
    #[arg(long)]
    pub resume: bool,

    /// Model artifact to load.
    #[arg(long, value_name = "PATH")]
    pub model: Option<PathBuf>,

    /// Submission file to append to.
    #[arg(long, value_name = "PATH")]
    pub submission: Option<PathBuf>,
}

impl PredictArgs {
    pub fn apply(&self, config: &mut PipelineConfig) {
        if let Some(path) = &self.test_file {
            config.data.test = path.clone();
        }
        if let Some(chunk_size) = self.chunk_size {
            config.inference.chunk_size = chunk_size;
        }
        if self.resume {
            config.inference.resume = true;
        }
        if let Some(path) = &self.model {
            config.output.artifact = path.clone();
        }
        if let Some(path) = &self.submission {
            config.output.submission = path.clone();
        }
    }
}

pub fn run(mut config: PipelineConfig, args: PredictArgs) -> anyhow::Result<()> {
    args.apply(&mut config);
    config.validate()?;
    let started = Instant::now();

    let artifact = ModelArtifact::load(&config.output.artifact)?;
    let featurizer = artifact.featurizer();
    info!(
        model = %config.output.artifact.display(),
        trees = artifact.forest.n_trees(),
        width = artifact.forest.width(),
        "model loaded"
    );

    let submission = &config.output.submission;
    let skip: HashSet<i64> = if config.inference.resume {
        let ids = existing_ids(submission)?;
        info!(already_scored = ids.len(), "resuming an existing submission");
        ids
    } else {
        HashSet::new()
    };

    let schema = &config.data.schema;
    let scan = TestScan::open(&config.data.test, schema, config.inference.chunk_size)?;
    info!(
        test = %config.data.test.display(),
        rows = scan.total_rows(),
        chunk_size = config.inference.chunk_size,
        "scoring"
    );

    let mut writer = SubmissionWriter::create_or_append(submission, &schema.id, &schema.outcome)?;
    let mut scored = 0usize;
    let mut skipped = 0usize;
    let mut dropped = 0usize;
    for batch in scan {
        let mut records = batch?;
        if !skip.is_empty() {
            let before = records.len();
            records.retain(|record| !skip.contains(&record.id));
            skipped += before - records.len();
        }
        if records.is_empty() {
            continue;
        }

        let features = featurizer.featurize_test(&records)?;
        dropped += features.dropped;
        if features.x.is_empty() {
            continue;
        }

        let probabilities = artifact.forest.predict_proba(&features.x)?;
        let rows: Vec<(i64, f32)> = features.ids.iter().copied().zip(probabilities).collect();
        writer.append_chunk(&rows)?;
        scored += rows.len();
    }

    if dropped > 0 {
        warn!(dropped, "test rows dropped during featurization");
    }
    info!(
        scored,
        skipped,
        path = %submission.display(),
        elapsed = ?started.elapsed(),
        "submission complete"
    );
    Ok(())
}
