// src/engine/accounting.rs

use num::BigInt;
use std::collections::{BTreeMap, BTreeSet};

use crate::clauses::BitFields;
use crate::expr::{Poly, Unknown};

/// Distinct unresolved unknowns still reachable from the bit maps:
/// (total count, count of carry unknowns not shared with any p/q cell).
pub fn count_unknowns(fields: &BitFields) -> (usize, usize) {
    let mut factor_unknowns: BTreeSet<Unknown> = BTreeSet::new();
    for cell in fields.p_map.values().chain(fields.q_map.values()) {
        factor_unknowns.extend(cell.free_unknowns());
    }
    let mut carry_unknowns: BTreeSet<Unknown> = BTreeSet::new();
    for cell in fields.carry_map.values() {
        carry_unknowns.extend(cell.free_unknowns());
    }

    let total = factor_unknowns.union(&carry_unknowns).count();
    let carry_only = carry_unknowns
        .iter()
        .filter(|unknown| unknown.is_carry() && !factor_unknowns.contains(unknown))
        .count();
    (total, carry_only)
}

/// All unresolved unknowns, in a stable order. This is the variable set an
/// external optimizer receives.
pub fn unresolved_unknowns(fields: &BitFields) -> Vec<Unknown> {
    let mut unknowns: BTreeSet<Unknown> = BTreeSet::new();
    for cell in fields
        .p_map
        .values()
        .chain(fields.q_map.values())
        .chain(fields.carry_map.values())
    {
        unknowns.extend(cell.free_unknowns());
    }
    unknowns.into_iter().collect()
}

/// Decodes p and q once every factor cell is concrete.
pub fn decode(fields: &BitFields) -> Option<(BigInt, BigInt)> {
    Some((decode_map(&fields.p_map)?, decode_map(&fields.q_map)?))
}

fn decode_map(map: &BTreeMap<usize, Poly>) -> Option<BigInt> {
    let mut value = BigInt::from(0);
    for (bit, cell) in map {
        value += cell.as_constant()? << *bit;
    }
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Poly;

    fn fields_with_cells() -> BitFields {
        let mut fields = BitFields::build(&BigInt::from(35), None, None, false);
        fields.p_map.clear();
        fields.q_map.clear();
        fields.carry_map.clear();
        fields
    }

    #[test]
    fn test_decode_concrete_maps() {
        let mut fields = fields_with_cells();
        // p = 101b = 5, q = 11b = 3
        for (bit, value) in [(0, 1), (1, 0), (2, 1)] {
            fields.p_map.insert(bit, Poly::constant(value));
        }
        for (bit, value) in [(0, 1), (1, 1)] {
            fields.q_map.insert(bit, Poly::constant(value));
        }
        assert_eq!(
            decode(&fields),
            Some((BigInt::from(5), BigInt::from(3)))
        );
    }

    #[test]
    fn test_decode_requires_concrete_cells() {
        let mut fields = fields_with_cells();
        fields.p_map.insert(0, Poly::var(Unknown::P(0)));
        fields.q_map.insert(0, Poly::constant(1));
        assert_eq!(decode(&fields), None);
    }

    #[test]
    fn test_count_separates_carry_unknowns() {
        let mut fields = fields_with_cells();
        fields.p_map.insert(0, Poly::var(Unknown::P(0)));
        fields.q_map.insert(0, &Poly::constant(1) - &Poly::var(Unknown::P(0)));
        fields
            .carry_map
            .insert((1, 2), Poly::var(Unknown::Carry(1, 2)));
        let (total, carry_only) = count_unknowns(&fields);
        assert_eq!(total, 2);
        assert_eq!(carry_only, 1);
    }

    #[test]
    fn test_carry_unknown_shared_with_factor_cell_not_counted() {
        let mut fields = fields_with_cells();
        // a carry that resolved into a factor expression counts as a factor
        // unknown, not a carry bit
        fields.p_map.insert(0, Poly::var(Unknown::Carry(1, 2)));
        fields
            .carry_map
            .insert((1, 2), Poly::var(Unknown::Carry(1, 2)));
        let (total, carry_only) = count_unknowns(&fields);
        assert_eq!(total, 1);
        assert_eq!(carry_only, 0);
    }
}
