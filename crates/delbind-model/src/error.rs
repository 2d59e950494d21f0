//! Error types for featurization, training and scoring.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ModelError>;

#[derive(Debug, Error)]
pub enum ModelError {
    /// A molecule could not be parsed. Whether this is fatal depends on the
    /// caller's invalid-structure policy.
    #[error("invalid molecule for id {id}: {source}")]
    InvalidStructure {
        id: i64,
        #[source]
        source: delbind_chem::ChemError,
    },

    /// A protein name the encoder was never fitted on.
    #[error("unknown protein {name:?} (encoder knows {known} categories)")]
    UnknownCategory { name: String, known: usize },

    /// Feature width disagreement between a model and incoming data. Always
    /// a configuration mistake, never a data problem.
    #[error("feature width mismatch: model expects {expected}, got {got}")]
    FeatureWidthMismatch { expected: usize, got: usize },

    #[error("feature rows ({rows}) and labels ({labels}) differ in length")]
    LabelMismatch { rows: usize, labels: usize },

    #[error("cannot train on an empty feature matrix")]
    EmptyTrainingSet,

    #[error("invalid forest configuration: {0}")]
    InvalidConfig(String),

    #[error("average precision is undefined: {0}")]
    DegenerateLabels(String),

    #[error("cannot read model artifact {path}: {source}")]
    ArtifactRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write model artifact {path}: {source}")]
    ArtifactWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("artifact version {found} is not supported (expected {expected})")]
    ArtifactVersion { found: u32, expected: u32 },

    #[error("artifact serialization: {0}")]
    ArtifactFormat(#[from] serde_json::Error),
}
