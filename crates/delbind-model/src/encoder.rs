//! One-hot protein encoding.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::{ModelError, Result};

/// What to do with a protein name the encoder was never fitted on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnseenPolicy {
    /// Fail the run. An unseen target means the model cannot say anything
    /// meaningful, so surfacing it beats silently scoring garbage.
    #[default]
    Reject,
    /// Encode an all-zero vector and keep going.
    Zero,
}

/// Maps protein names to one-hot positions.
///
/// Fitted once on training data; the category list is sorted, so the same
/// set of names always produces the same layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProteinEncoder {
    categories: Vec<String>,
}

impl ProteinEncoder {
    /// Collects the distinct names, sorted.
    pub fn fit<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let unique: BTreeSet<&str> = names.into_iter().collect();
        Self {
            categories: unique.into_iter().map(str::to_string).collect(),
        }
    }

    /// Width of the one-hot block.
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.categories
            .binary_search_by(|c| c.as_str().cmp(name))
            .ok()
    }

    /// Writes the one-hot vector for `name` into `out`, which must be
    /// exactly `len()` wide.
    pub fn encode_into(&self, name: &str, out: &mut [f32], policy: UnseenPolicy) -> Result<()> {
        debug_assert_eq!(out.len(), self.len());
        out.fill(0.0);
        match self.index_of(name) {
            Some(index) => {
                out[index] = 1.0;
                Ok(())
            }
            None => match policy {
                UnseenPolicy::Reject => Err(ModelError::UnknownCategory {
                    name: name.to_string(),
                    known: self.len(),
                }),
                UnseenPolicy::Zero => Ok(()),
            },
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
