//! Periodic table lookups.
//!
//! DNA-encoded libraries reach well outside the organic subset (lanthanide
//! linker atoms such as `[Dy]` are common in building-block SMILES), so the
//! whole periodic table is addressable, not just CHNOPS.

use serde::{Deserialize, Serialize};

use crate::error::{ChemError, Result};

/// Element symbols indexed by atomic number minus one.
const SYMBOLS: [&str; 118] = [
    "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg", "Al", "Si", "P", "S", "Cl",
    "Ar", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", "Ga", "Ge", "As",
    "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In",
    "Sn", "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd", "Pm", "Sm", "Eu", "Gd", "Tb",
    "Dy", "Ho", "Er", "Tm", "Yb", "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg", "Tl",
    "Pb", "Bi", "Po", "At", "Rn", "Fr", "Ra", "Ac", "Th", "Pa", "U", "Np", "Pu", "Am", "Cm", "Bk",
    "Cf", "Es", "Fm", "Md", "No", "Lr", "Rf", "Db", "Sg", "Bh", "Hs", "Mt", "Ds", "Rg", "Cn",
    "Nh", "Fl", "Mc", "Lv", "Ts", "Og",
];

/// A chemical element, stored as its atomic number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Element(u8);

impl Element {
    pub const HYDROGEN: Element = Element(1);
    pub const BORON: Element = Element(5);
    pub const CARBON: Element = Element(6);
    pub const NITROGEN: Element = Element(7);
    pub const OXYGEN: Element = Element(8);
    pub const FLUORINE: Element = Element(9);
    pub const PHOSPHORUS: Element = Element(15);
    pub const SULFUR: Element = Element(16);
    pub const CHLORINE: Element = Element(17);
    pub const BROMINE: Element = Element(35);
    pub const IODINE: Element = Element(53);

    /// Looks a symbol up with exact case, e.g. `"Cl"` but not `"CL"`.
    pub fn from_symbol(symbol: &str) -> Result<Element> {
        SYMBOLS
            .iter()
            .position(|&s| s == symbol)
            .map(|i| Element(i as u8 + 1))
            .ok_or_else(|| ChemError::UnknownElement {
                symbol: symbol.to_string(),
            })
    }

    pub fn atomic_number(self) -> u8 {
        self.0
    }

    pub fn symbol(self) -> &'static str {
        SYMBOLS[self.0 as usize - 1]
    }

    pub fn is_hydrogen(self) -> bool {
        self.0 == 1
    }

    /// Normal valence used to infer implicit hydrogens on organic-subset
    /// atoms. `None` means the element gets no implicit hydrogens.
    pub fn default_valence(self) -> Option<u8> {
        match self {
            Element::HYDROGEN => Some(1),
            Element::BORON => Some(3),
            Element::CARBON => Some(4),
            Element::NITROGEN | Element::PHOSPHORUS => Some(3),
            Element::OXYGEN | Element::SULFUR => Some(2),
            Element::FLUORINE | Element::CHLORINE | Element::BROMINE | Element::IODINE => Some(1),
            _ => None,
        }
    }
}

impl std::fmt::Display for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
