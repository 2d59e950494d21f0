//! Balanced class sampling over a streaming scan.
//!
//! Training dumps are wildly imbalanced, so the trainer works from an equal
//! number of rows per outcome class. Each class keeps its own reservoir
//! while the scan streams past once; no full materialization ever happens.
//! With a fixed seed the draw is reproducible against the same file.

use std::path::Path;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::error::{DataError, Result};
use crate::record::TrainRecord;
use crate::scan::TrainScan;
use crate::schema::DatasetSchema;

/// Decode granularity while sampling. Sampling touches every row exactly
/// once, so this only bounds transient memory.
const SCAN_BATCH_ROWS: usize = 8192;

/// Draws `per_class` rows of each outcome class, uniformly at random.
///
/// The result holds the negative block first, then the positive block, each
/// block shuffled. Fails with [`DataError::InsufficientClass`] when the file
/// cannot cover a class.
pub fn sample_balanced(
    path: &Path,
    schema: &DatasetSchema,
    per_class: usize,
    seed: u64,
) -> Result<Vec<TrainRecord>> {
    let scan = TrainScan::open(path, schema, SCAN_BATCH_ROWS)?;
    info!(
        path = %path.display(),
        rows = scan.total_rows(),
        per_class,
        "drawing balanced sample"
    );

    let mut rng = StdRng::seed_from_u64(seed);
    let mut reservoirs = [Reservoir::new(per_class), Reservoir::new(per_class)];
    for batch in scan {
        for record in batch? {
            reservoirs[record.outcome as usize].offer(record, &mut rng);
        }
    }

    for (label, reservoir) in reservoirs.iter().enumerate() {
        if reservoir.items.len() < per_class {
            return Err(DataError::InsufficientClass {
                label: label as u8,
                available: reservoir.seen,
                requested: per_class,
            });
        }
    }

    let [mut negatives, mut positives] = reservoirs;
    negatives.items.shuffle(&mut rng);
    positives.items.shuffle(&mut rng);
    info!(
        negatives = negatives.items.len(),
        positives = positives.items.len(),
        "balanced sample ready"
    );

    let mut sample = negatives.items;
    sample.extend(positives.items);
    Ok(sample)
}

/// Algorithm R reservoir: every row seen so far has probability
/// `capacity / seen` of being kept.
struct Reservoir {
    capacity: usize,
    seen: usize,
    items: Vec<TrainRecord>,
}

impl Reservoir {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            seen: 0,
            items: Vec::with_capacity(capacity),
        }
    }

    fn offer(&mut self, record: TrainRecord, rng: &mut StdRng) {
        self.seen += 1;
        if self.items.len() < self.capacity {
            self.items.push(record);
        } else {
            let slot = rng.gen_range(0..self.seen);
            if slot < self.capacity {
                self.items[slot] = record;
            }
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
