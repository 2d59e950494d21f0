//! Dataset access for DEL binding prediction.
//!
//! Training and test data arrive as parquet; this crate streams them with
//! column projection, draws balanced per-class samples, partitions rows for
//! validation and writes the final submission CSV.

pub mod error;
#[cfg(test)]
mod fixture;
pub mod record;
pub mod sampler;
pub mod scan;
pub mod schema;
pub mod split;
pub mod submission;

pub use error::{DataError, Result};
pub use record::{TestRecord, TrainRecord};
pub use sampler::sample_balanced;
pub use scan::{TestScan, TrainScan};
pub use schema::DatasetSchema;
pub use split::split_records;
pub use submission::{existing_ids, SubmissionWriter};
