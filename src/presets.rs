// src/presets.rs
//
// Hand-built reduced instances for the two documented hard symmetric cases.
// These are the states the preprocessing engine hands to the optimizer; they
// double as regression fixtures and as ready-made optimizer demo inputs.

use num::BigInt;
use std::collections::BTreeMap;

use crate::clauses::BitFields;
use crate::engine::{Reduction, ReductionStatus};
use crate::expr::{Poly, Substitutions, Unknown};

fn p(i: usize) -> Poly {
    Poly::var(Unknown::P(i))
}

fn q(i: usize) -> Poly {
    Poly::var(Unknown::Q(i))
}

fn bit_map(bits: &[Option<usize>]) -> BTreeMap<usize, Poly> {
    // None marks an unresolved p/q bit, the index is taken from position
    bits.iter()
        .enumerate()
        .map(|(i, bit)| match bit {
            Some(value) => (i, Poly::constant(*value as u32)),
            None => (i, Poly::var(Unknown::P(i))),
        })
        .collect()
}

/// 56153 = 241 × 233: four unknowns and three surviving clauses.
pub fn factor_56153() -> Reduction {
    let mut fields = BitFields::build(&BigInt::from(56153u32), None, None, false);
    fields.carry_map.clear();
    fields.p_map = bit_map(&[
        Some(1),
        Some(0),
        Some(0),
        None,
        None,
        Some(1),
        Some(1),
        Some(1),
    ]);
    fields.q_map = fields
        .p_map
        .iter()
        .map(|(i, cell)| match cell.as_bit() {
            Some(_) => (*i, cell.clone()),
            None => (*i, q(*i)),
        })
        .collect();

    let clauses = vec![
        &(&p(3) + &q(3)) - &Poly::constant(1),
        &(&p(4) + &q(4)) - &Poly::constant(1),
        &(&(&p(4) * &q(3)) + &(&p(3) * &q(4))) - &Poly::constant(1),
    ];

    Reduction {
        fields,
        clauses,
        substitutions: Substitutions::new(),
        status: ReductionStatus::UnderDetermined,
    }
}

/// 291311 = 557 × 523: six unknowns and six surviving clauses.
pub fn factor_291311() -> Reduction {
    let mut fields = BitFields::build(&BigInt::from(291311u32), None, None, false);
    fields.carry_map.clear();
    fields.p_map = bit_map(&[
        Some(1),
        None,
        None,
        Some(1),
        Some(0),
        None,
        Some(0),
        Some(0),
        Some(0),
        Some(1),
    ]);
    fields.q_map = fields
        .p_map
        .iter()
        .map(|(i, cell)| match cell.as_bit() {
            Some(_) => (*i, cell.clone()),
            None => (*i, q(*i)),
        })
        .collect();

    let clauses = vec![
        &(&p(1) + &q(1)) - &Poly::constant(1),
        &(&p(2) + &q(2)) - &Poly::constant(1),
        &(&p(5) + &q(5)) - &Poly::constant(1),
        &(&(&p(1) * &q(2)) + &(&p(2) * &q(1))) - &Poly::constant(1),
        // 557 and 523 share a 1 in neither of bits 2 and 5, so this pair of
        // cross products must vanish rather than sum to 1
        &(&p(2) * &q(5)) + &(&p(5) * &q(2)),
        &(&(&p(5) * &q(1)) + &(&p(1) * &q(5))) - &Poly::constant(1),
    ];

    Reduction {
        fields,
        clauses,
        substitutions: Substitutions::new(),
        status: ReductionStatus::UnderDetermined,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_factor_56153_accepts_true_assignment() {
        // 241 = 11110001b, 233 = 11101001b: (p_3, p_4) = (0, 1) or (1, 0)
        let reduction = factor_56153();
        let mut assignment = BTreeMap::new();
        assignment.insert(Unknown::P(3), 0u8);
        assignment.insert(Unknown::P(4), 1u8);
        assignment.insert(Unknown::Q(3), 1u8);
        assignment.insert(Unknown::Q(4), 0u8);
        let (p, q) = reduction.resolve(&assignment).unwrap();
        assert_eq!(&p * &q, BigInt::from(56153u32));
        assert_eq!(p, BigInt::from(241u32));
        assert_eq!(q, BigInt::from(233u32));
    }

    #[test]
    fn test_factor_56153_rejects_wrong_assignment() {
        let reduction = factor_56153();
        let mut assignment = BTreeMap::new();
        assignment.insert(Unknown::P(3), 1u8);
        assignment.insert(Unknown::P(4), 1u8);
        assignment.insert(Unknown::Q(3), 1u8);
        assignment.insert(Unknown::Q(4), 1u8);
        assert!(reduction.resolve(&assignment).is_err());
    }

    #[test]
    fn test_factor_291311_accepts_true_assignment() {
        // 557 = 1000101101b, 523 = 1000001011b
        let reduction = factor_291311();
        let mut assignment = BTreeMap::new();
        assignment.insert(Unknown::P(1), 0u8);
        assignment.insert(Unknown::P(2), 1u8);
        assignment.insert(Unknown::P(5), 1u8);
        assignment.insert(Unknown::Q(1), 1u8);
        assignment.insert(Unknown::Q(2), 0u8);
        assignment.insert(Unknown::Q(5), 0u8);
        let (p, q) = reduction.resolve(&assignment).unwrap();
        assert_eq!(&p * &q, BigInt::from(291311u32));
    }

    #[test]
    fn test_unknown_counts() {
        assert_eq!(factor_56153().unknown_counts(), (4, 0));
        assert_eq!(factor_291311().unknown_counts(), (6, 0));
    }
}
