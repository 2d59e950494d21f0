//! Feature assembly: fingerprint block plus one-hot protein block.

use serde::{Deserialize, Serialize};
use tracing::warn;

use delbind_chem::{morgan, smiles, FingerprintParams};
use delbind_data::{TestRecord, TrainRecord};

use crate::encoder::{ProteinEncoder, UnseenPolicy};
use crate::error::{ModelError, Result};

/// What to do with a row whose SMILES fails to parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvalidSmilesPolicy {
    /// Drop the row, log it and count it.
    #[default]
    Drop,
    /// Fail the run on the first bad structure.
    Fail,
}

/// Dense row-major feature storage.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    data: Vec<f32>,
    width: usize,
    rows: usize,
}

impl FeatureMatrix {
    pub fn new(width: usize) -> Self {
        Self {
            data: Vec::new(),
            width,
            rows: 0,
        }
    }

    pub fn with_capacity(width: usize, rows: usize) -> Self {
        Self {
            data: Vec::with_capacity(width * rows),
            width,
            rows: 0,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn row(&self, index: usize) -> &[f32] {
        &self.data[index * self.width..(index + 1) * self.width]
    }

    /// Appends a zeroed row and lets `fill` populate it. When `fill` fails
    /// the row is removed again, leaving the matrix untouched.
    pub fn try_push_row<E>(
        &mut self,
        fill: impl FnOnce(&mut [f32]) -> std::result::Result<(), E>,
    ) -> std::result::Result<(), E> {
        let start = self.data.len();
        self.data.resize(start + self.width, 0.0);
        match fill(&mut self.data[start..]) {
            Ok(()) => {
                self.rows += 1;
                Ok(())
            }
            Err(e) => {
                self.data.truncate(start);
                Err(e)
            }
        }
    }
}

/// Featurized training rows. Labels and ids stay aligned with the surviving
/// matrix rows; dropped rows appear only in the counter.
#[derive(Debug, Clone)]
pub struct TrainFeatures {
    pub x: FeatureMatrix,
    pub y: Vec<u8>,
    pub ids: Vec<i64>,
    pub dropped: usize,
}

/// Featurized inference rows.
#[derive(Debug, Clone)]
pub struct TestFeatures {
    pub x: FeatureMatrix,
    pub ids: Vec<i64>,
    pub dropped: usize,
}

/// Turns records into feature rows: `bits` fingerprint columns followed by
/// one one-hot column per fitted protein.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Featurizer {
    pub fingerprint: FingerprintParams,
    pub encoder: ProteinEncoder,
    pub invalid_smiles: InvalidSmilesPolicy,
    pub unseen_protein: UnseenPolicy,
}

impl Featurizer {
    pub fn width(&self) -> usize {
        self.fingerprint.bits + self.encoder.len()
    }

    pub fn featurize_train(&self, records: &[TrainRecord]) -> Result<TrainFeatures> {
        let mut x = FeatureMatrix::with_capacity(self.width(), records.len());
        let mut y = Vec::with_capacity(records.len());
        let mut ids = Vec::with_capacity(records.len());
        let mut dropped = 0usize;
        for record in records {
            if self.push_row(&mut x, record.id, &record.smiles, &record.protein)? {
                y.push(record.outcome);
                ids.push(record.id);
            } else {
                dropped += 1;
            }
        }
        Ok(TrainFeatures { x, y, ids, dropped })
    }

    pub fn featurize_test(&self, records: &[TestRecord]) -> Result<TestFeatures> {
        let mut x = FeatureMatrix::with_capacity(self.width(), records.len());
        let mut ids = Vec::with_capacity(records.len());
        let mut dropped = 0usize;
        for record in records {
            if self.push_row(&mut x, record.id, &record.smiles, &record.protein)? {
                ids.push(record.id);
            } else {
                dropped += 1;
            }
        }
        Ok(TestFeatures { x, ids, dropped })
    }

    /// Returns `Ok(false)` when the row was dropped under
    /// [`InvalidSmilesPolicy::Drop`].
    fn push_row(&self, x: &mut FeatureMatrix, id: i64, text: &str, protein: &str) -> Result<bool> {
        let molecule = match smiles::parse(text) {
            Ok(molecule) => molecule,
            Err(source) => match self.invalid_smiles {
                InvalidSmilesPolicy::Fail => {
                    return Err(ModelError::InvalidStructure { id, source });
                }
                InvalidSmilesPolicy::Drop => {
                    warn!(id, error = %source, "dropping row with unparseable SMILES");
                    return Ok(false);
                }
            },
        };
        let bits = self.fingerprint.bits;
        x.try_push_row(|row| {
            let print = morgan(&molecule, &self.fingerprint);
            print.fill_dense(&mut row[..bits]);
            self.encoder
                .encode_into(protein, &mut row[bits..], self.unseen_protein)
        })?;
        Ok(true)
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
