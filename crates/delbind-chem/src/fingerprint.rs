//! Morgan-style circular fingerprints.
//!
//! Each heavy atom starts from an invariant built out of its element, heavy
//! degree, hydrogen count, charge, aromaticity and ring membership. The
//! invariants are then refined for `radius` rounds by hashing each atom
//! together with its bond-order-tagged neighbor identifiers, and every
//! identifier seen at every round is folded into a fixed-width bit set.
//!
//! Hashing uses a fixed FNV-1a implementation rather than the standard
//! library's `DefaultHasher`, so a given molecule folds to the same bits in
//! every binary, not only within one compiled artifact. A persisted model can
//! therefore be scored by a binary built against a different toolchain.

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::molecule::{BondOrder, Molecule};

/// 64-bit FNV-1a with integers fed in little-endian order, so identifiers are
/// byte-for-byte reproducible across toolchains and platforms.
struct Fnv1a(u64);

impl Fnv1a {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    fn new() -> Self {
        Self(Self::OFFSET)
    }
}

impl Hasher for Fnv1a {
    fn finish(&self) -> u64 {
        self.0
    }

    fn write(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.0 ^= u64::from(byte);
            self.0 = self.0.wrapping_mul(Self::PRIME);
        }
    }

    fn write_u8(&mut self, i: u8) {
        self.write(&[i]);
    }

    fn write_i8(&mut self, i: i8) {
        self.write(&[i as u8]);
    }

    fn write_u32(&mut self, i: u32) {
        self.write(&i.to_le_bytes());
    }

    fn write_u64(&mut self, i: u64) {
        self.write(&i.to_le_bytes());
    }

    fn write_usize(&mut self, i: usize) {
        self.write_u64(i as u64);
    }
}

/// Fingerprint shape. The defaults correspond to the ubiquitous
/// 2048-bit ECFP4 setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FingerprintParams {
    /// Number of neighborhood-expansion rounds.
    pub radius: u32,
    /// Width of the folded bit set.
    pub bits: usize,
}

impl Default for FingerprintParams {
    fn default() -> Self {
        Self {
            radius: 2,
            bits: 2048,
        }
    }
}

/// A folded fingerprint: a fixed-width set of bits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    nbits: usize,
    words: Vec<u64>,
}

impl Fingerprint {
    fn zeroed(nbits: usize) -> Self {
        Self {
            nbits,
            words: vec![0; nbits.div_ceil(64)],
        }
    }

    fn set(&mut self, bit: usize) {
        self.words[bit / 64] |= 1u64 << (bit % 64);
    }

    pub fn nbits(&self) -> usize {
        self.nbits
    }

    pub fn contains(&self, bit: usize) -> bool {
        bit < self.nbits && self.words[bit / 64] >> (bit % 64) & 1 == 1
    }

    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Indices of the set bits, ascending.
    pub fn set_bits(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.nbits).filter(|&b| self.contains(b))
    }

    /// Writes the fingerprint as a dense 0.0/1.0 vector. `out` must be
    /// exactly `nbits` long.
    pub fn fill_dense(&self, out: &mut [f32]) {
        debug_assert_eq!(out.len(), self.nbits);
        for (bit, slot) in out.iter_mut().enumerate() {
            *slot = if self.contains(bit) { 1.0 } else { 0.0 };
        }
    }
}

/// Computes the folded Morgan fingerprint of a molecule.
///
/// Hydrogens present as explicit graph atoms are treated the same way as
/// implicit ones: they contribute to the hydrogen count of their heavy
/// neighbor and are otherwise left out of the neighborhood expansion.
///
/// `params.bits` must be positive.
pub fn morgan(mol: &Molecule, params: &FingerprintParams) -> Fingerprint {
    debug_assert!(params.bits > 0, "fingerprint width must be positive");
    let mut fp = Fingerprint::zeroed(params.bits);
    let heavy: Vec<usize> = (0..mol.atom_count())
        .filter(|&i| !mol.atom(i).element.is_hydrogen())
        .collect();

    let mut ids = vec![0u64; mol.atom_count()];
    for &i in &heavy {
        ids[i] = initial_invariant(mol, i);
        fold(&mut fp, ids[i]);
    }

    for round in 1..=params.radius {
        let mut next = ids.clone();
        for &i in &heavy {
            let mut env: Vec<(u64, u64)> = mol
                .neighbors(i)
                .iter()
                .filter(|&&n| !mol.atom(n).element.is_hydrogen())
                .map(|&n| {
                    let order = mol.bond_between(i, n).unwrap_or(BondOrder::Single);
                    (bond_code(order), ids[n])
                })
                .collect();
            env.sort_unstable();

            let mut hasher = Fnv1a::new();
            round.hash(&mut hasher);
            ids[i].hash(&mut hasher);
            for (code, neighbor_id) in env {
                code.hash(&mut hasher);
                neighbor_id.hash(&mut hasher);
            }
            next[i] = hasher.finish();
            fold(&mut fp, next[i]);
        }
        ids = next;
    }
    fp
}

fn fold(fp: &mut Fingerprint, id: u64) {
    let bit = (id % fp.nbits as u64) as usize;
    fp.set(bit);
}

fn initial_invariant(mol: &Molecule, i: usize) -> u64 {
    let atom = mol.atom(i);
    let mut hasher = Fnv1a::new();
    atom.element.atomic_number().hash(&mut hasher);
    (mol.heavy_degree(i) as u8).hash(&mut hasher);
    mol.total_hydrogens(i).hash(&mut hasher);
    atom.formal_charge.hash(&mut hasher);
    atom.aromatic.hash(&mut hasher);
    atom.in_ring.hash(&mut hasher);
    hasher.finish()
}

fn bond_code(order: BondOrder) -> u64 {
    match order {
        BondOrder::Single => 1,
        BondOrder::Double => 2,
        BondOrder::Triple => 3,
        BondOrder::Aromatic => 4,
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
