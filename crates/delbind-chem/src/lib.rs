//! Chemistry layer: SMILES parsing, molecular graphs and circular
//! fingerprints.
//!
//! Everything here is pure and deterministic. Parsing reports byte-accurate
//! errors so callers can decide whether a bad structure is dropped or fatal;
//! fingerprinting is infallible once a molecule exists.

pub mod element;
pub mod error;
pub mod fingerprint;
pub mod molecule;
pub mod smiles;

pub use element::Element;
pub use error::{ChemError, Result};
pub use fingerprint::{morgan, Fingerprint, FingerprintParams};
pub use molecule::{Atom, Bond, BondOrder, Molecule};
