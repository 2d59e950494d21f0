//! Molecular graph built by the SMILES parser.
//!
//! The graph stores heavy atoms and any hydrogens written explicitly as
//! bracket atoms. Implicit hydrogens are derived on demand from the normal
//! valence of organic-subset atoms; bracket atoms always carry an explicit
//! hydrogen count, so the valence model never applies to them.

use crate::element::Element;

/// Bond order between two atoms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BondOrder {
    Single,
    Double,
    Triple,
    Aromatic,
}

impl BondOrder {
    /// Contribution to the bonded-valence sum. Aromatic bonds count 1.5 and
    /// the sum is rounded up, so two aromatic bonds consume three valences.
    fn valence_units(self) -> f32 {
        match self {
            BondOrder::Single => 1.0,
            BondOrder::Double => 2.0,
            BondOrder::Triple => 3.0,
            BondOrder::Aromatic => 1.5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Atom {
    pub element: Element,
    pub aromatic: bool,
    pub formal_charge: i8,
    /// `Some` for bracket atoms, which spell their hydrogen count out;
    /// `None` for organic-subset atoms, which take implicit hydrogens.
    pub explicit_hydrogens: Option<u8>,
    /// Set by [`Molecule::finalize`] once all ring bonds are closed.
    pub in_ring: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bond {
    pub a: usize,
    pub b: usize,
    pub order: BondOrder,
}

#[derive(Debug, Clone, Default)]
pub struct Molecule {
    atoms: Vec<Atom>,
    bonds: Vec<Bond>,
    adjacency: Vec<Vec<usize>>,
}

impl Molecule {
    pub(crate) fn add_atom(&mut self, atom: Atom) -> usize {
        self.atoms.push(atom);
        self.adjacency.push(Vec::new());
        self.atoms.len() - 1
    }

    pub(crate) fn add_bond(&mut self, a: usize, b: usize, order: BondOrder) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        self.bonds.push(Bond { a: lo, b: hi, order });
        self.adjacency[lo].push(hi);
        self.adjacency[hi].push(lo);
    }

    /// Marks ring membership by iteratively peeling degree-one atoms; what
    /// survives the peel is exactly the atoms lying on some cycle.
    pub(crate) fn finalize(&mut self) {
        let mut degree: Vec<usize> = self.adjacency.iter().map(Vec::len).collect();
        let mut queue: Vec<usize> = (0..self.atoms.len()).filter(|&i| degree[i] <= 1).collect();
        while let Some(i) = queue.pop() {
            degree[i] = 0;
            for &n in &self.adjacency[i] {
                if degree[n] > 0 {
                    degree[n] -= 1;
                    if degree[n] == 1 {
                        queue.push(n);
                    }
                }
            }
        }
        for (atom, &d) in self.atoms.iter_mut().zip(&degree) {
            atom.in_ring = d >= 2;
        }
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn bond_count(&self) -> usize {
        self.bonds.len()
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    pub fn atom(&self, i: usize) -> &Atom {
        &self.atoms[i]
    }

    pub fn neighbors(&self, i: usize) -> &[usize] {
        &self.adjacency[i]
    }

    /// Order of the bond between `a` and `b`, if one exists.
    pub fn bond_between(&self, a: usize, b: usize) -> Option<BondOrder> {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        self.bonds
            .iter()
            .find(|bond| bond.a == lo && bond.b == hi)
            .map(|bond| bond.order)
    }

    /// Number of non-hydrogen neighbors.
    pub fn heavy_degree(&self, i: usize) -> usize {
        self.adjacency[i]
            .iter()
            .filter(|&&n| !self.atoms[n].element.is_hydrogen())
            .count()
    }

    /// Hydrogens inferred from the normal valence of an organic-subset atom.
    /// Bracket atoms and elements without a default valence get zero.
    pub fn implicit_hydrogens(&self, i: usize) -> u8 {
        let atom = &self.atoms[i];
        if atom.explicit_hydrogens.is_some() {
            return 0;
        }
        let Some(valence) = atom.element.default_valence() else {
            return 0;
        };
        let bonded: f32 = self
            .bonds
            .iter()
            .filter(|b| b.a == i || b.b == i)
            .map(|b| b.order.valence_units())
            .sum();
        let used = bonded.ceil() as i16;
        (valence as i16 - used).max(0) as u8
    }

    /// Total hydrogen count: the bracket count or implicit hydrogens, plus
    /// any hydrogens present as their own graph atoms.
    pub fn total_hydrogens(&self, i: usize) -> u8 {
        let base = self.atoms[i]
            .explicit_hydrogens
            .unwrap_or_else(|| self.implicit_hydrogens(i));
        let atom_hs = self.adjacency[i]
            .iter()
            .filter(|&&n| self.atoms[n].element.is_hydrogen())
            .count() as u8;
        base + atom_hs
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn plain_atom(element: Element) -> Atom {
        Atom {
            element,
            aromatic: false,
            formal_charge: 0,
            explicit_hydrogens: None,
            in_ring: false,
        }
    }

    #[test]
    fn implicit_hydrogens_follow_bond_orders() {
        // C=O: carbon keeps two hydrogens, oxygen none.
        let mut mol = Molecule::default();
        let c = mol.add_atom(plain_atom(Element::CARBON));
        let o = mol.add_atom(plain_atom(Element::OXYGEN));
        mol.add_bond(c, o, BondOrder::Double);
        mol.finalize();
        assert_eq!(mol.implicit_hydrogens(c), 2);
        assert_eq!(mol.implicit_hydrogens(o), 0);
    }

    #[test]
    fn aromatic_bonds_round_up() {
        // An aromatic carbon with two ring bonds has used three valences.
        let mut mol = Molecule::default();
        let mut aromatic_carbon = plain_atom(Element::CARBON);
        aromatic_carbon.aromatic = true;
        let a = mol.add_atom(aromatic_carbon.clone());
        let b = mol.add_atom(aromatic_carbon.clone());
        let c = mol.add_atom(aromatic_carbon);
        mol.add_bond(a, b, BondOrder::Aromatic);
        mol.add_bond(a, c, BondOrder::Aromatic);
        mol.finalize();
        assert_eq!(mol.implicit_hydrogens(a), 1);
    }

    #[test]
    fn bracket_atoms_never_gain_implicit_hydrogens() {
        let mut mol = Molecule::default();
        let mut bare = plain_atom(Element::NITROGEN);
        bare.explicit_hydrogens = Some(0);
        let n = mol.add_atom(bare);
        mol.finalize();
        assert_eq!(mol.implicit_hydrogens(n), 0);
        assert_eq!(mol.total_hydrogens(n), 0);
    }

    #[test]
    fn peel_marks_only_cycle_atoms() {
        // Cyclopropane with a methyl tail: ring atoms flagged, tail not.
        let mut mol = Molecule::default();
        let a = mol.add_atom(plain_atom(Element::CARBON));
        let b = mol.add_atom(plain_atom(Element::CARBON));
        let c = mol.add_atom(plain_atom(Element::CARBON));
        let tail = mol.add_atom(plain_atom(Element::CARBON));
        mol.add_bond(a, b, BondOrder::Single);
        mol.add_bond(b, c, BondOrder::Single);
        mol.add_bond(c, a, BondOrder::Single);
        mol.add_bond(a, tail, BondOrder::Single);
        mol.finalize();
        assert!(mol.atom(a).in_ring);
        assert!(mol.atom(b).in_ring);
        assert!(mol.atom(c).in_ring);
        assert!(!mol.atom(tail).in_ring);
    }

    #[test]
    fn explicit_hydrogen_atoms_count_toward_totals() {
        let mut mol = Molecule::default();
        let c = mol.add_atom(plain_atom(Element::CARBON));
        let mut h = plain_atom(Element::HYDROGEN);
        h.explicit_hydrogens = Some(0);
        let h = mol.add_atom(h);
        mol.add_bond(c, h, BondOrder::Single);
        mol.finalize();
        // Three implicit plus the explicit neighbor.
        assert_eq!(mol.total_hydrogens(c), 4);
        assert_eq!(mol.heavy_degree(c), 0);
    }
}
