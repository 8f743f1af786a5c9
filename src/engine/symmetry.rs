// src/engine/symmetry.rs

use log::{debug, info};

use crate::clauses::BitFields;
use crate::error::EncodingError;
use crate::expr::{Monomial, Poly, Substitutions};

/// Breaks the p/q exchange symmetry on an under-determined system.
///
/// When a bit position carries a mutually exclusive pair (cell values
/// summing to 1), either resolution yields a valid factorization with the
/// factors swapped. By convention the P cell is forced to 1 and the Q cell
/// to 0, so the first factor is taken to be the larger.
///
/// Only applies when the P and Q maps have the same length. Deterministic
/// and idempotent: a second invocation on the result changes nothing.
/// Returns the forced assignments (empty if no pair was resolved); the
/// caller merges them into its accumulated map, rebuilds the clauses and
/// re-runs the fixpoint driver afterwards.
pub fn break_symmetry(fields: &mut BitFields) -> Result<Substitutions, EncodingError> {
    if fields.p_map.len() != fields.q_map.len() {
        return Ok(Substitutions::new());
    }

    let keys: Vec<usize> = fields.p_map.keys().rev().copied().collect();
    let mut subs = Substitutions::new();

    for key in keys {
        let p_cell = crate::expr::simplify(&fields.p_cell(key), &subs);
        let q_cell = crate::expr::simplify(&fields.q_cell(key), &subs);
        if p_cell.is_concrete() && q_cell.is_concrete() {
            continue;
        }
        if (&p_cell + &q_cell) != Poly::constant(1) {
            continue;
        }
        debug!("symmetry break at bit {}: p -> 1, q -> 0", key);
        if let Some(var) = bare_var(&p_cell) {
            subs.insert(var, Poly::constant(1))?;
        }
        if let Some(var) = bare_var(&q_cell) {
            subs.insert(var, Poly::zero())?;
        }
    }

    if !subs.is_empty() {
        info!("symmetry breaking fixed {} known expressions", subs.len());
        fields.apply_substitutions(&subs)?;
    }
    Ok(subs)
}

fn bare_var(cell: &Poly) -> Option<Monomial> {
    let (mono, coeff) = cell.single_term()?;
    if mono.single_var().is_some() && num::One::is_one(coeff) {
        Some(mono.clone())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Unknown;
    use num::BigInt;

    fn symmetric_fields() -> BitFields {
        // p = [1, x, 1], q = [1, 1-x, 1] multiply to the same product for
        // either value of x.
        let mut fields = BitFields::build(&BigInt::from(35), None, None, false);
        fields.p_map.clear();
        fields.q_map.clear();
        fields.carry_map.clear();
        let x = Poly::var(Unknown::P(1));
        fields.p_map.insert(0, Poly::constant(1));
        fields.p_map.insert(1, x.clone());
        fields.p_map.insert(2, Poly::constant(1));
        fields.q_map.insert(0, Poly::constant(1));
        fields.q_map.insert(1, &Poly::constant(1) - &x);
        fields.q_map.insert(2, Poly::constant(1));
        fields
    }

    #[test]
    fn test_breaks_complementary_pair() {
        let mut fields = symmetric_fields();
        let forced = break_symmetry(&mut fields).unwrap();
        assert_eq!(
            forced.get(&Monomial::var(Unknown::P(1))),
            Some(&Poly::constant(1))
        );
        assert_eq!(fields.p_cell(1), Poly::constant(1));
        assert_eq!(fields.q_cell(1), Poly::zero());
    }

    #[test]
    fn test_idempotent() {
        let mut fields = symmetric_fields();
        assert!(!break_symmetry(&mut fields).unwrap().is_empty());
        let snapshot = fields.clone();
        assert!(break_symmetry(&mut fields).unwrap().is_empty());
        assert_eq!(fields, snapshot);
    }

    #[test]
    fn test_requires_equal_lengths() {
        let mut fields = symmetric_fields();
        fields.q_map.remove(&2);
        assert!(break_symmetry(&mut fields).unwrap().is_empty());
    }

    #[test]
    fn test_ignores_non_complementary_cells() {
        let mut fields = symmetric_fields();
        fields.q_map.insert(1, Poly::var(Unknown::Q(1)));
        // p_1 + q_1 does not normalize to the constant 1
        assert!(break_symmetry(&mut fields).unwrap().is_empty());
    }
}
