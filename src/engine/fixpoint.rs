// src/engine/fixpoint.rs

use log::{info, trace, warn};

use crate::error::EncodingError;
use crate::expr::{simplify, Poly, Substitutions};
use crate::rules::Rule;

/// Each pass strictly resolves unknowns, so convergence is quick in
/// practice; the cap only guards against a pathological rewrite cycle.
const MAX_FIXPOINT_ITERATIONS: usize = 100;

/// Runs the rule pipeline over the clause list until a pass changes no
/// clause, with a mandatory minimum of two passes: a substitution derived in
/// one pass only becomes visible to rules on other clauses in the next.
///
/// Returns the stabilized clause list and the accumulated known expressions.
pub fn reduce_clauses(clauses: &[Poly]) -> Result<(Vec<Poly>, Substitutions), EncodingError> {
    let mut accumulated = Substitutions::new();
    let mut current: Vec<Poly> = clauses.to_vec();
    let mut iteration = 0usize;
    loop {
        info!("preprocessing iteration {}", iteration);
        let (next, pass_subs) = apply_rule_pipeline(&current)?;
        let changed = next
            .iter()
            .zip(current.iter())
            .any(|(new, old)| new != old);
        accumulated.merge(&pass_subs)?;
        current = next;
        iteration += 1;
        if !changed && iteration >= 2 {
            break;
        }
        if iteration >= MAX_FIXPOINT_ITERATIONS {
            warn!("fixpoint iteration cap reached, leaving clauses as-is");
            break;
        }
    }
    info!(
        "fixpoint after {} iterations, {} known expressions",
        iteration,
        accumulated.len()
    );
    Ok((current, accumulated))
}

/// One pass: simplify each clause under the substitutions gathered so far in
/// this pass, run every rule on it in pipeline order (re-simplifying after
/// each), then re-simplify the whole list under the pass's final map.
fn apply_rule_pipeline(clauses: &[Poly]) -> Result<(Vec<Poly>, Substitutions), EncodingError> {
    let mut subs = Substitutions::new();

    for (index, clause) in clauses.iter().enumerate() {
        let mut clause = simplify(clause, &subs);
        if clause.is_zero() {
            continue;
        }
        trace!("clause {}: {}", index, clause);
        for rule in Rule::PIPELINE {
            rule.apply(&clause, &mut subs)?;
            clause = simplify(&clause, &subs);
            if clause.is_zero() {
                break;
            }
        }
        check_satisfiable(&clause)?;
    }

    let mut simplified = Vec::with_capacity(clauses.len());
    for clause in clauses {
        let clause = simplify(clause, &subs);
        check_satisfiable(&clause)?;
        simplified.push(clause);
    }
    Ok((simplified, subs))
}

/// A fully substituted clause that reduces to a nonzero constant marks an
/// inconsistent encoding.
pub fn check_satisfiable(clause: &Poly) -> Result<(), EncodingError> {
    match clause.as_constant() {
        Some(value) if value != num::BigInt::from(0) => {
            Err(EncodingError::UnsatisfiableClause {
                clause: clause.to_string(),
            })
        }
        _ => Ok(()),
    }
}
