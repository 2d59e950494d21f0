//! SMILES parser for the organic subset plus bracket atoms.
//!
//! Supports branches, ring closures (including `%NN` two-digit labels),
//! dot-separated components, aromatic lowercase atoms, explicit bond symbols
//! and bracket atoms with isotope, chirality, hydrogen count, charge and
//! atom-map fields. Isotope, chirality and atom maps are parsed and
//! discarded; they do not affect the molecular graph. Wildcard atoms (`*`)
//! are rejected.

use std::collections::HashMap;

use crate::element::Element;
use crate::error::{ChemError, Result};
use crate::molecule::{Atom, BondOrder, Molecule};

/// Parses one SMILES string into a molecular graph.
///
/// Surrounding whitespace is ignored; embedded whitespace is an error.
pub fn parse(input: &str) -> Result<Molecule> {
    Parser::new(input.trim()).run()
}

struct RingOpen {
    atom: usize,
    order: Option<BondOrder>,
    position: usize,
}

struct Parser<'a> {
    bytes: &'a [u8],
    pos: usize,
    mol: Molecule,
    prev: Option<usize>,
    pending_bond: Option<BondOrder>,
    branch_stack: Vec<Option<usize>>,
    ring_map: HashMap<u32, RingOpen>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            bytes: input.as_bytes(),
            pos: 0,
            mol: Molecule::default(),
            prev: None,
            pending_bond: None,
            branch_stack: Vec::new(),
            ring_map: HashMap::new(),
        }
    }

    fn run(mut self) -> Result<Molecule> {
        if self.bytes.is_empty() {
            return Err(ChemError::at(0, "empty SMILES"));
        }
        while let Some(b) = self.peek() {
            match b {
                b'-' | b'/' | b'\\' => self.take_bond(BondOrder::Single)?,
                b'=' => self.take_bond(BondOrder::Double)?,
                b'#' => self.take_bond(BondOrder::Triple)?,
                b':' => self.take_bond(BondOrder::Aromatic)?,
                b'(' => self.open_branch()?,
                b')' => self.close_branch()?,
                b'.' => self.split_component()?,
                b'%' => self.ring_closure_percent()?,
                b'0'..=b'9' => {
                    let pos = self.pos;
                    self.pos += 1;
                    self.ring_closure((b - b'0') as u32, pos)?;
                }
                b'[' => {
                    let atom = self.bracket_atom()?;
                    self.place_atom(atom)?;
                }
                b'*' => {
                    return Err(ChemError::at(self.pos, "wildcard atoms are not supported"))
                }
                _ => {
                    let atom = self.organic_atom()?;
                    self.place_atom(atom)?;
                }
            }
        }
        self.finish()
    }

    fn finish(mut self) -> Result<Molecule> {
        if self.pending_bond.is_some() {
            return Err(ChemError::at(self.pos, "dangling bond at end of input"));
        }
        if !self.branch_stack.is_empty() {
            return Err(ChemError::at(self.pos, "unclosed branch"));
        }
        if let Some((label, open)) = self.ring_map.iter().next() {
            return Err(ChemError::at(
                open.position,
                format!("unclosed ring bond {label}"),
            ));
        }
        if self.mol.atom_count() == 0 {
            return Err(ChemError::at(0, "no atoms"));
        }
        self.mol.finalize();
        Ok(self.mol)
    }

    // ── Cursor helpers ───────────────────────────────────────────────────────

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    /// Consumes a run of ASCII digits, if any.
    fn take_digits(&mut self) -> Option<u32> {
        let start = self.pos;
        let mut value: u32 = 0;
        while let Some(b @ b'0'..=b'9') = self.peek() {
            value = value.saturating_mul(10).saturating_add((b - b'0') as u32);
            self.pos += 1;
        }
        (self.pos > start).then_some(value)
    }

    // ── Bonds, branches, components ──────────────────────────────────────────

    fn take_bond(&mut self, order: BondOrder) -> Result<()> {
        if self.pending_bond.is_some() {
            return Err(ChemError::at(self.pos, "repeated bond symbol"));
        }
        self.pending_bond = Some(order);
        self.pos += 1;
        Ok(())
    }

    fn open_branch(&mut self) -> Result<()> {
        if self.prev.is_none() {
            return Err(ChemError::at(self.pos, "branch opened before any atom"));
        }
        if self.pending_bond.is_some() {
            return Err(ChemError::at(self.pos, "bond symbol before '('"));
        }
        self.branch_stack.push(self.prev);
        self.pos += 1;
        Ok(())
    }

    fn close_branch(&mut self) -> Result<()> {
        if self.pending_bond.is_some() {
            return Err(ChemError::at(self.pos, "dangling bond before ')'"));
        }
        match self.branch_stack.pop() {
            Some(restored) => {
                self.prev = restored;
                self.pos += 1;
                Ok(())
            }
            None => Err(ChemError::at(self.pos, "unmatched ')'")),
        }
    }

    fn split_component(&mut self) -> Result<()> {
        if self.pending_bond.is_some() {
            return Err(ChemError::at(self.pos, "bond symbol before '.'"));
        }
        self.prev = None;
        self.pos += 1;
        Ok(())
    }

    // ── Ring closures ────────────────────────────────────────────────────────

    fn ring_closure_percent(&mut self) -> Result<()> {
        let pos = self.pos;
        self.pos += 1;
        let (Some(a @ b'0'..=b'9'), Some(b @ b'0'..=b'9')) = (self.peek(), self.peek_at(1))
        else {
            return Err(ChemError::at(pos, "'%' must be followed by two digits"));
        };
        self.pos += 2;
        self.ring_closure(((a - b'0') as u32) * 10 + (b - b'0') as u32, pos)
    }

    fn ring_closure(&mut self, label: u32, position: usize) -> Result<()> {
        let Some(current) = self.prev else {
            return Err(ChemError::at(position, "ring closure before any atom"));
        };
        let order = self.pending_bond.take();
        match self.ring_map.remove(&label) {
            None => {
                self.ring_map.insert(
                    label,
                    RingOpen {
                        atom: current,
                        order,
                        position,
                    },
                );
                Ok(())
            }
            Some(open) => {
                if open.atom == current {
                    return Err(ChemError::at(position, "ring bond closes on itself"));
                }
                let order = match (open.order, order) {
                    (Some(a), Some(b)) if a != b => {
                        return Err(ChemError::at(position, "conflicting ring bond orders"));
                    }
                    (Some(a), _) => a,
                    (None, Some(b)) => b,
                    (None, None) => self.implicit_order(open.atom, current),
                };
                self.mol.add_bond(open.atom, current, order);
                Ok(())
            }
        }
    }

    // ── Atoms ────────────────────────────────────────────────────────────────

    fn implicit_order(&self, a: usize, b: usize) -> BondOrder {
        if self.mol.atom(a).aromatic && self.mol.atom(b).aromatic {
            BondOrder::Aromatic
        } else {
            BondOrder::Single
        }
    }

    fn place_atom(&mut self, atom: Atom) -> Result<()> {
        if self.prev.is_none() && self.pending_bond.is_some() {
            return Err(ChemError::at(self.pos, "bond with no preceding atom"));
        }
        let idx = self.mol.add_atom(atom);
        if let Some(previous) = self.prev {
            let order = self
                .pending_bond
                .take()
                .unwrap_or_else(|| self.implicit_order(previous, idx));
            self.mol.add_bond(previous, idx, order);
        }
        self.prev = Some(idx);
        Ok(())
    }

    /// Organic-subset atom outside brackets: `B C N O P S F Cl Br I` and the
    /// aromatic forms `b c n o p s`.
    fn organic_atom(&mut self) -> Result<Atom> {
        let pos = self.pos;
        let b = self.bytes[pos];
        let (element, aromatic, width) = match b {
            b'C' if self.peek_at(1) == Some(b'l') => (Element::CHLORINE, false, 2),
            b'B' if self.peek_at(1) == Some(b'r') => (Element::BROMINE, false, 2),
            b'B' => (Element::BORON, false, 1),
            b'C' => (Element::CARBON, false, 1),
            b'N' => (Element::NITROGEN, false, 1),
            b'O' => (Element::OXYGEN, false, 1),
            b'P' => (Element::PHOSPHORUS, false, 1),
            b'S' => (Element::SULFUR, false, 1),
            b'F' => (Element::FLUORINE, false, 1),
            b'I' => (Element::IODINE, false, 1),
            b'b' => (Element::BORON, true, 1),
            b'c' => (Element::CARBON, true, 1),
            b'n' => (Element::NITROGEN, true, 1),
            b'o' => (Element::OXYGEN, true, 1),
            b'p' => (Element::PHOSPHORUS, true, 1),
            b's' => (Element::SULFUR, true, 1),
            _ => {
                return Err(ChemError::at(
                    pos,
                    format!("unexpected character {:?}", b as char),
                ));
            }
        };
        self.pos += width;
        Ok(Atom {
            element,
            aromatic,
            formal_charge: 0,
            explicit_hydrogens: None,
            in_ring: false,
        })
    }

    /// Bracket atom: `[isotope? symbol chirality? Hcount? charge? :map?]`.
    fn bracket_atom(&mut self) -> Result<Atom> {
        self.pos += 1;

        // Isotope is accepted and discarded.
        self.take_digits();

        let (element, aromatic) = self.bracket_symbol()?;

        while self.peek() == Some(b'@') {
            self.pos += 1;
        }

        let explicit_hydrogens = if self.peek() == Some(b'H') {
            self.pos += 1;
            let count = self.take_digits().unwrap_or(1);
            if count > u8::MAX as u32 {
                return Err(ChemError::at(self.pos, "hydrogen count out of range"));
            }
            count as u8
        } else {
            0
        };

        let formal_charge = self.bracket_charge()?;

        if self.peek() == Some(b':') {
            self.pos += 1;
            if self.take_digits().is_none() {
                return Err(ChemError::at(self.pos, "atom map without a number"));
            }
        }

        if self.peek() != Some(b']') {
            return Err(ChemError::at(self.pos, "expected ']'"));
        }
        self.pos += 1;

        Ok(Atom {
            element,
            aromatic,
            formal_charge,
            explicit_hydrogens: Some(explicit_hydrogens),
            in_ring: false,
        })
    }

    fn bracket_symbol(&mut self) -> Result<(Element, bool)> {
        let pos = self.pos;
        match self.peek() {
            Some(b'*') => Err(ChemError::at(pos, "wildcard atoms are not supported")),
            Some(first @ b'A'..=b'Z') => {
                // Two-letter symbols win when the next character completes one.
                if let Some(second @ b'a'..=b'z') = self.peek_at(1) {
                    let symbol = [first, second];
                    let symbol = std::str::from_utf8(&symbol).unwrap_or_default();
                    if let Ok(element) = Element::from_symbol(symbol) {
                        self.pos += 2;
                        return Ok((element, false));
                    }
                }
                let symbol = (first as char).to_string();
                let element = Element::from_symbol(&symbol)
                    .map_err(|_| ChemError::at(pos, format!("unknown element {symbol:?}")))?;
                self.pos += 1;
                Ok((element, false))
            }
            Some(first @ b'a'..=b'z') => {
                // Aromatic bracket atoms: c n o p s b plus se and as.
                if let Some(second @ b'a'..=b'z') = self.peek_at(1) {
                    let two = [first, second];
                    if two == *b"se" || two == *b"as" {
                        let symbol = [first.to_ascii_uppercase(), second];
                        let symbol = std::str::from_utf8(&symbol).unwrap_or_default();
                        let element = Element::from_symbol(symbol)
                            .map_err(|_| ChemError::at(pos, "unknown aromatic symbol"))?;
                        self.pos += 2;
                        return Ok((element, true));
                    }
                }
                if matches!(first, b'b' | b'c' | b'n' | b'o' | b'p' | b's') {
                    let symbol = (first.to_ascii_uppercase() as char).to_string();
                    let element = Element::from_symbol(&symbol)
                        .map_err(|_| ChemError::at(pos, "unknown aromatic symbol"))?;
                    self.pos += 1;
                    Ok((element, true))
                } else {
                    Err(ChemError::at(
                        pos,
                        format!("{:?} cannot be aromatic", first as char),
                    ))
                }
            }
            _ => Err(ChemError::at(pos, "expected an element symbol")),
        }
    }

    fn bracket_charge(&mut self) -> Result<i8> {
        let sign: i32 = match self.peek() {
            Some(b'+') => 1,
            Some(b'-') => -1,
            _ => return Ok(0),
        };
        self.pos += 1;
        let mut magnitude: i32 = 1;
        if let Some(digits) = self.take_digits() {
            magnitude = digits as i32;
        } else {
            // Repeated signs: ++ means +2, -- means -2.
            while self.peek() == Some(if sign > 0 { b'+' } else { b'-' }) {
                magnitude += 1;
                self.pos += 1;
            }
        }
        let charge = sign * magnitude;
        if !(-15..=15).contains(&charge) {
            return Err(ChemError::at(self.pos, "formal charge out of range"));
        }
        Ok(charge as i8)
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
