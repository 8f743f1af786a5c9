// src/clauses/builder.rs

use log::{debug, trace};
use num::{BigInt, One};

use super::bit_fields::BitFields;
use crate::expr::Poly;

/// Builds one polynomial clause per output bit column.
///
/// Clause i is the column-sum identity of schoolbook multiplication:
/// sum of the pairwise products landing in column i, minus the m bit, plus
/// incoming carries, minus 2^k times each outgoing carry.
///
/// With preprocessing enabled, each column's headroom bounds how far a carry
/// can travel: an outgoing carry cell beyond `i + floor(log2(headroom))` is
/// provably unreachable and is zeroed out in the shared carry map, so later
/// columns never see it as a free unknown.
pub fn build_clauses(fields: &mut BitFields, preprocessing: bool) -> Vec<Poly> {
    let n_c = fields.clause_count();
    let mut clauses = Vec::with_capacity(n_c);

    for i in 0..n_c {
        let mut clause = Poly::zero();
        for j in 0..=i {
            clause = &clause + &(&fields.q_cell(j) * &fields.p_cell(i - j));
        }
        clause = &clause - &Poly::constant(fields.m_bit(i));
        for j in 0..=i {
            clause = &clause + &fields.carry_cell(j, i);
        }

        if preprocessing && !clause.is_zero() {
            let headroom = clause.max_attainable_sum();
            let max_carry = if headroom >= BigInt::one() {
                (headroom.bits() - 1) as usize
            } else {
                0
            };
            for j in (i + max_carry + 1)..n_c {
                if let Some(cell) = fields.carry_map.get_mut(&(i, j)) {
                    if !cell.is_zero() {
                        trace!("column {}: carry ({}, {}) unreachable, zeroed", i, i, j);
                        *cell = Poly::zero();
                    }
                }
            }
        }

        for k in 1..n_c {
            let outgoing = fields.carry_cell(i, i + k);
            if !outgoing.is_zero() {
                clause = &clause - &outgoing.scale(&(BigInt::one() << k));
            }
        }

        trace!("clause {}: {}", i, clause);
        clauses.push(clause);
    }

    debug!("built {} clauses", clauses.len());
    clauses
}
