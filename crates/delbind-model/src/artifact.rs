//! Trained-model persistence.
//!
//! The artifact is one JSON document holding everything inference needs:
//! fingerprint shape, fitted protein encoder, row policies, the forest and a
//! training summary. The version field guards against loading an artifact
//! written by an incompatible layout.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use delbind_chem::FingerprintParams;

use crate::encoder::{ProteinEncoder, UnseenPolicy};
use crate::error::{ModelError, Result};
use crate::features::{Featurizer, InvalidSmilesPolicy};
use crate::forest::RandomForest;

pub const ARTIFACT_VERSION: u32 = 1;

/// Numbers worth keeping from a training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSummary {
    pub sampled_per_class: usize,
    pub train_rows: usize,
    pub validation_rows: usize,
    pub dropped_rows: usize,
    pub feature_width: usize,
    /// `None` when the holdout was empty or single-class.
    pub validation_average_precision: Option<f64>,
    pub seed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub version: u32,
    pub trained_at: DateTime<Utc>,
    pub fingerprint: FingerprintParams,
    pub encoder: ProteinEncoder,
    pub invalid_smiles: InvalidSmilesPolicy,
    pub unseen_protein: UnseenPolicy,
    pub forest: RandomForest,
    pub summary: TrainingSummary,
}

impl ModelArtifact {
    /// Writes the artifact as pretty-printed JSON, creating parent
    /// directories as needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| ModelError::ArtifactWrite {
                    path: path.to_path_buf(),
                    source,
                })?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|source| ModelError::ArtifactWrite {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "model artifact written");
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|source| ModelError::ArtifactRead {
            path: path.to_path_buf(),
            source,
        })?;
        let artifact: ModelArtifact = serde_json::from_str(&json)?;
        if artifact.version != ARTIFACT_VERSION {
            return Err(ModelError::ArtifactVersion {
                found: artifact.version,
                expected: ARTIFACT_VERSION,
            });
        }
        Ok(artifact)
    }

    /// Rebuilds the featurizer inference must use: same fingerprint shape,
    /// same encoder, same row policies as training.
    pub fn featurizer(&self) -> Featurizer {
        Featurizer {
            fingerprint: self.fingerprint,
            encoder: self.encoder.clone(),
            invalid_smiles: self.invalid_smiles,
            unseen_protein: self.unseen_protein,
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureMatrix;
    use crate::forest::ForestConfig;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn tiny_artifact() -> ModelArtifact {
        let mut x = FeatureMatrix::new(4);
        for i in 0..8 {
            x.try_push_row(|row| {
                row[0] = (i % 2) as f32;
                row[1] = ((i / 2) % 2) as f32;
                Ok::<(), ()>(())
            })
            .unwrap();
        }
        let y: Vec<u8> = (0..8).map(|i| (i % 2) as u8).collect();
        let forest = RandomForest::fit(
            &x,
            &y,
            &ForestConfig {
                trees: 3,
                ..ForestConfig::default()
            },
        )
        .unwrap();
        ModelArtifact {
            version: ARTIFACT_VERSION,
            trained_at: Utc::now(),
            fingerprint: FingerprintParams {
                radius: 2,
                bits: 2,
            },
            encoder: ProteinEncoder::fit(["BRD4", "HSA"]),
            invalid_smiles: InvalidSmilesPolicy::Drop,
            unseen_protein: UnseenPolicy::Reject,
            forest,
            summary: TrainingSummary {
                sampled_per_class: 4,
                train_rows: 8,
                validation_rows: 0,
                dropped_rows: 0,
                feature_width: 4,
                validation_average_precision: None,
                seed: 42,
            },
        }
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model").join("artifact.json");

        let artifact = tiny_artifact();
        artifact.save(&path).unwrap();
        let loaded = ModelArtifact::load(&path).unwrap();

        assert_eq!(loaded.version, ARTIFACT_VERSION);
        assert_eq!(loaded.encoder, artifact.encoder);
        assert_eq!(loaded.forest, artifact.forest);
        assert_eq!(loaded.summary, artifact.summary);
        assert_eq!(loaded.trained_at, artifact.trained_at);
    }

    #[test]
    fn version_mismatch_refuses_to_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("artifact.json");

        let mut artifact = tiny_artifact();
        artifact.version = 99;
        artifact.save(&path).unwrap();

        let err = ModelArtifact::load(&path).unwrap_err();
        match err {
            ModelError::ArtifactVersion { found, expected } => {
                assert_eq!(found, 99);
                assert_eq!(expected, ARTIFACT_VERSION);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_artifact_reports_its_path() {
        let err = ModelArtifact::load(Path::new("/nonexistent/model.json")).unwrap_err();
        assert!(matches!(err, ModelError::ArtifactRead { .. }));
        assert!(err.to_string().contains("/nonexistent/model.json"));
    }

    #[test]
    fn featurizer_mirrors_the_artifact() {
        let artifact = tiny_artifact();
        let featurizer = artifact.featurizer();
        assert_eq!(featurizer.fingerprint, artifact.fingerprint);
        assert_eq!(featurizer.encoder, artifact.encoder);
        assert_eq!(featurizer.width(), 2 + 2);
    }
}
