//! Model layer: feature assembly, random forest training, ranking metrics
//! and artifact persistence.

pub mod artifact;
pub mod encoder;
pub mod error;
pub mod features;
pub mod forest;
pub mod metrics;

pub use artifact::{ModelArtifact, TrainingSummary, ARTIFACT_VERSION};
pub use encoder::{ProteinEncoder, UnseenPolicy};
pub use error::{ModelError, Result};
pub use features::{FeatureMatrix, Featurizer, InvalidSmilesPolicy, TestFeatures, TrainFeatures};
pub use forest::{ForestConfig, MaxFeatures, RandomForest};
pub use metrics::average_precision;
