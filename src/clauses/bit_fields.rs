// src/clauses/bit_fields.rs

use log::debug;
use num::BigInt;
use std::collections::BTreeMap;

use crate::error::EncodingError;
use crate::expr::{simplify, Monomial, Poly, Substitutions, Unknown};

/// Binary layouts of m, p and q plus the admissible carry cells.
///
/// The M-map is concrete and never mutated. P, Q and carry cells start as
/// atomic unknowns and only ever become more resolved. Keys present at
/// construction stay present for the life of the maps; a pruned carry cell
/// becomes the concrete 0 rather than disappearing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BitFields {
    pub m_map: BTreeMap<usize, u8>,
    pub p_map: BTreeMap<usize, Poly>,
    pub q_map: BTreeMap<usize, Poly>,
    pub carry_map: BTreeMap<(usize, usize), Poly>,
}

impl BitFields {
    /// Derives the bit fields for factoring `m`.
    ///
    /// When the true factors are supplied their bit lengths are used to size
    /// the unknown ranges (and the leading bits are fixed to 1); the factor
    /// values themselves are never consulted. With preprocessing enabled the
    /// lowest bit of both factors is fixed to 1 (factors of an odd m are
    /// odd) and a two-bit q gets its top bit fixed as well.
    pub fn build(
        m: &BigInt,
        true_p: Option<&BigInt>,
        true_q: Option<&BigInt>,
        preprocessing: bool,
    ) -> Self {
        let n_m = bit_length(m);

        let mut m_map = BTreeMap::new();
        for i in 0..n_m {
            m_map.insert(i, if m.bit(i as u64) { 1 } else { 0 });
        }

        let n_p = true_p.map(bit_length).unwrap_or(n_m);
        let n_q = true_q.map(bit_length).unwrap_or((n_m + 1) / 2);

        let mut p_map = BTreeMap::new();
        for i in 0..n_p {
            p_map.insert(i, Poly::var(Unknown::P(i)));
        }
        if true_p.is_some() {
            p_map.insert(n_p - 1, Poly::constant(1));
        }

        let mut q_map = BTreeMap::new();
        for i in 0..n_q {
            q_map.insert(i, Poly::var(Unknown::Q(i)));
        }
        if true_q.is_some() {
            q_map.insert(n_q - 1, Poly::constant(1));
        }

        if preprocessing {
            p_map.insert(0, Poly::constant(1));
            q_map.insert(0, Poly::constant(1));
            if q_map.len() == 2 {
                q_map.insert(1, Poly::constant(1));
            }
        }

        // A carry into column `end` can only originate at a lower column
        // `start >= 1`, and only output columns of m can receive one.
        let mut carry_map = BTreeMap::new();
        for end in 1..n_m {
            for start in 1..end {
                carry_map.insert((start, end), Poly::var(Unknown::Carry(start, end)));
            }
        }

        debug!(
            "bit fields for m={}: |p|={}, |q|={}, {} carry cells",
            m,
            p_map.len(),
            q_map.len(),
            carry_map.len()
        );

        BitFields {
            m_map,
            p_map,
            q_map,
            carry_map,
        }
    }

    /// Number of output bit columns: |m| + ceil(|m|/2) - 1.
    pub fn clause_count(&self) -> usize {
        let n_m = self.m_map.len();
        n_m + (n_m + 1) / 2 - 1
    }

    pub fn m_bit(&self, i: usize) -> u8 {
        self.m_map.get(&i).copied().unwrap_or(0)
    }

    pub fn p_cell(&self, i: usize) -> Poly {
        self.p_map.get(&i).cloned().unwrap_or_else(Poly::zero)
    }

    pub fn q_cell(&self, i: usize) -> Poly {
        self.q_map.get(&i).cloned().unwrap_or_else(Poly::zero)
    }

    pub fn carry_cell(&self, start: usize, end: usize) -> Poly {
        self.carry_map
            .get(&(start, end))
            .cloned()
            .unwrap_or_else(Poly::zero)
    }

    /// Folds known expressions into every cell, then propagates resolved
    /// cells into the remaining symbolic ones. Keys are never removed;
    /// values only become more resolved.
    pub fn apply_substitutions(&mut self, subs: &Substitutions) -> Result<(), EncodingError> {
        self.simplify_cells(subs);
        let symbols = self.symbol_substitutions()?;
        if !symbols.is_empty() {
            self.simplify_cells(&symbols);
        }
        Ok(())
    }

    /// A substitution map binding each bit variable to its cell value,
    /// for every cell that has resolved past its own atomic unknown.
    pub fn symbol_substitutions(&self) -> Result<Substitutions, EncodingError> {
        let mut symbols = Substitutions::new();
        for (i, cell) in &self.p_map {
            if *cell != Poly::var(Unknown::P(*i)) {
                symbols.insert(Monomial::var(Unknown::P(*i)), cell.clone())?;
            }
        }
        for (i, cell) in &self.q_map {
            if *cell != Poly::var(Unknown::Q(*i)) {
                symbols.insert(Monomial::var(Unknown::Q(*i)), cell.clone())?;
            }
        }
        for ((start, end), cell) in &self.carry_map {
            if *cell != Poly::var(Unknown::Carry(*start, *end)) {
                symbols.insert(Monomial::var(Unknown::Carry(*start, *end)), cell.clone())?;
            }
        }
        Ok(symbols)
    }

    fn simplify_cells(&mut self, subs: &Substitutions) {
        for cell in self.p_map.values_mut() {
            if !cell.is_concrete() {
                *cell = simplify(cell, subs);
            }
        }
        for cell in self.q_map.values_mut() {
            if !cell.is_concrete() {
                *cell = simplify(cell, subs);
            }
        }
        for cell in self.carry_map.values_mut() {
            if !cell.is_concrete() {
                *cell = simplify(cell, subs);
            }
        }
    }
}

fn bit_length(value: &BigInt) -> usize {
    value.bits() as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_m_map_is_binary_expansion() {
        // 35 = 100011b
        let fields = BitFields::build(&BigInt::from(35), None, None, false);
        let bits: Vec<u8> = (0..6).map(|i| fields.m_bit(i)).collect();
        assert_eq!(bits, vec![1, 1, 0, 0, 0, 1]);
    }

    #[test]
    fn test_default_sizing() {
        let fields = BitFields::build(&BigInt::from(35), None, None, false);
        assert_eq!(fields.p_map.len(), 6);
        assert_eq!(fields.q_map.len(), 3);
        assert_eq!(fields.clause_count(), 8);
    }

    #[test]
    fn test_true_factor_sizing_fixes_leading_bits() {
        let fields = BitFields::build(
            &BigInt::from(35),
            Some(&BigInt::from(7)),
            Some(&BigInt::from(5)),
            false,
        );
        assert_eq!(fields.p_map.len(), 3);
        assert_eq!(fields.q_map.len(), 3);
        assert_eq!(fields.p_cell(2), Poly::constant(1));
        assert_eq!(fields.q_cell(2), Poly::constant(1));
        // the non-leading bits stay unknown
        assert_eq!(fields.p_cell(1), Poly::var(Unknown::P(1)));
    }

    #[test]
    fn test_preprocessing_fixes_low_bits() {
        let fields = BitFields::build(&BigInt::from(15), None, None, true);
        assert_eq!(fields.p_cell(0), Poly::constant(1));
        assert_eq!(fields.q_cell(0), Poly::constant(1));
        // q has exactly two bits, so its top bit is forced as well
        assert_eq!(fields.q_map.len(), 2);
        assert_eq!(fields.q_cell(1), Poly::constant(1));
    }

    #[test]
    fn test_carry_cells_are_admissible() {
        let fields = BitFields::build(&BigInt::from(35), None, None, false);
        for (start, end) in fields.carry_map.keys() {
            assert!(*start >= 1);
            assert!(start < end);
            assert!(*end < fields.m_map.len());
        }
        // no carry originates at column 0 and none lands outside m
        assert!(!fields.carry_map.contains_key(&(0, 1)));
        assert!(!fields.carry_map.contains_key(&(1, 6)));
    }
}
