// src/engine/mod.rs

pub mod accounting;
pub mod fixpoint;
pub mod symmetry;

// Re-export main operations for convenience
pub use accounting::{count_unknowns, decode, unresolved_unknowns};
pub use fixpoint::reduce_clauses;
pub use symmetry::break_symmetry;

use log::info;
use num::BigInt;
use std::collections::BTreeMap;

use crate::clauses::{build_clauses, BitFields};
use crate::config::ReducerConfig;
use crate::error::EncodingError;
use crate::expr::{simplify, Monomial, Poly, Substitutions, Unknown};
use fixpoint::check_satisfiable;

/// Terminal state of a reduction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReductionStatus {
    /// Every unknown resolved; the factors can be decoded directly.
    Solved,
    /// Unknowns remain after preprocessing and symmetry breaking. This is
    /// the normal handoff point to the external optimizer, not an error.
    UnderDetermined,
}

/// The reduced constraint system handed to the external optimizer: the
/// surviving clauses, the bit maps with every resolvable cell collapsed, and
/// the known expressions accumulated along the way.
#[derive(Clone, Debug)]
pub struct Reduction {
    pub fields: BitFields,
    pub clauses: Vec<Poly>,
    pub substitutions: Substitutions,
    pub status: ReductionStatus,
}

impl Reduction {
    /// (total unresolved unknowns, carry-only unknowns)
    pub fn unknown_counts(&self) -> (usize, usize) {
        count_unknowns(&self.fields)
    }

    /// The surviving unknowns an external optimizer must assign.
    pub fn unresolved_unknowns(&self) -> Vec<Unknown> {
        unresolved_unknowns(&self.fields)
    }

    /// Decoded factors, once every factor cell is concrete.
    pub fn decode(&self) -> Option<(BigInt, BigInt)> {
        decode(&self.fields)
    }

    /// Applies an optimizer's bit assignment for the surviving unknowns,
    /// verifies every clause vanishes under it, and decodes the factors.
    pub fn resolve(
        &self,
        assignment: &BTreeMap<Unknown, u8>,
    ) -> Result<(BigInt, BigInt), EncodingError> {
        for clause in &self.clauses {
            match clause.eval(assignment) {
                Some(value) if value == BigInt::from(0) => {}
                _ => {
                    return Err(EncodingError::UnsatisfiableClause {
                        clause: clause.to_string(),
                    })
                }
            }
        }
        let mut subs = Substitutions::new();
        for (unknown, bit) in assignment {
            subs.insert(Monomial::var(*unknown), Poly::constant(*bit))?;
        }
        let mut fields = self.fields.clone();
        fields.apply_substitutions(&subs)?;
        decode(&fields).ok_or_else(|| EncodingError::UnsatisfiableClause {
            clause: "factor cells unresolved after assignment".to_string(),
        })
    }
}

/// The preprocessing engine: builds the clause system for a target integer
/// and reduces it as far as the rule battery allows.
pub struct Reducer {
    config: ReducerConfig,
}

impl Reducer {
    pub fn new(config: ReducerConfig) -> Self {
        Reducer { config }
    }

    /// Encodes and reduces the factoring problem for `m`.
    ///
    /// `true_p`/`true_q` fix only the bit lengths of the factor fields (for
    /// calibration and testing against a known answer); the values are never
    /// consulted beyond their bit length.
    pub fn reduce(
        &self,
        m: &BigInt,
        true_p: Option<&BigInt>,
        true_q: Option<&BigInt>,
    ) -> Result<Reduction, EncodingError> {
        info!("reducing factoring instance m = {}", m);
        let preprocessing = self.config.preprocessing;
        let mut fields = BitFields::build(m, true_p, true_q, preprocessing);
        let mut substitutions = Substitutions::new();
        let mut clauses = reduce_once(&mut fields, preprocessing, &mut substitutions)?;

        if preprocessing && self.config.symmetry_breaking {
            let trivial = clauses.iter().all(Poly::is_zero);
            let (unknowns, _) = count_unknowns(&fields);
            if trivial && unknowns != 0 {
                let forced = break_symmetry(&mut fields)?;
                if !forced.is_empty() {
                    substitutions.merge(&forced)?;
                    let (remaining, _) = count_unknowns(&fields);
                    if remaining != 0 {
                        clauses = reduce_once(&mut fields, preprocessing, &mut substitutions)?;
                    }
                }
            }
        }

        let (unknowns, carry_unknowns) = count_unknowns(&fields);
        let status = if unknowns == 0 {
            info!("fully reduced, decoding factors directly");
            ReductionStatus::Solved
        } else {
            info!(
                "under-determined: {} unknowns ({} carry bits) survive preprocessing",
                unknowns, carry_unknowns
            );
            ReductionStatus::UnderDetermined
        };

        Ok(Reduction {
            fields,
            clauses,
            substitutions,
            status,
        })
    }
}

/// One full construction-and-reduction sweep over the current bit maps.
fn reduce_once(
    fields: &mut BitFields,
    preprocessing: bool,
    accumulated: &mut Substitutions,
) -> Result<Vec<Poly>, EncodingError> {
    let mut clauses = build_clauses(fields, preprocessing);
    if preprocessing {
        let (reduced, known) = reduce_clauses(&clauses)?;
        clauses = reduced;
        fields.apply_substitutions(&known)?;
        accumulated.merge(&known)?;
    }

    // fold resolved cells back into the clause list
    let symbols = fields.symbol_substitutions()?;
    let mut finals = Vec::with_capacity(clauses.len());
    for clause in &clauses {
        let clause = simplify(clause, &symbols);
        check_satisfiable(&clause)?;
        finals.push(clause);
    }
    Ok(finals)
}
