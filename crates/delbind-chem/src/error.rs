//! Error types for the chemistry layer.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ChemError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChemError {
    /// The SMILES text could not be parsed. `position` is a byte offset
    /// into the input, suitable for pointing at the offending character.
    #[error("invalid SMILES at byte {position}: {reason}")]
    InvalidSmiles { position: usize, reason: String },

    /// An element symbol that is not in the periodic table.
    #[error("unknown element symbol {symbol:?}")]
    UnknownElement { symbol: String },
}

impl ChemError {
    pub(crate) fn at(position: usize, reason: impl Into<String>) -> Self {
        Self::InvalidSmiles {
            position,
            reason: reason.into(),
        }
    }
}
