// src/expr/simplify.rs

use log::warn;
use std::collections::BTreeMap;

use super::poly::{Monomial, Poly};
use crate::error::EncodingError;

/// Substitution passes are iterated to a fixpoint; the cap only exists to
/// keep a malformed substitution chain from spinning forever.
const MAX_SUBSTITUTION_PASSES: usize = 64;

/// Known expressions derived from the clauses: a map from an unknown (or a
/// small product of unknowns) to its resolved value or expression.
///
/// The map is explicit state threaded through every call. Inserting a second
/// concrete value for a key that already resolved to a different concrete
/// value is a fatal encoding contradiction. Refining a composite entry
/// (e.g. replacing `1 - q_1` once `q_1` resolves) overwrites the old entry;
/// the overwrite is logged because a silent last-writer-wins merge can in
/// principle mask a genuine contradiction between composite expressions.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Substitutions {
    map: BTreeMap<Monomial, Poly>,
}

impl Substitutions {
    pub fn new() -> Self {
        Substitutions {
            map: BTreeMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Monomial, &Poly)> {
        self.map.iter()
    }

    pub fn get(&self, key: &Monomial) -> Option<&Poly> {
        self.map.get(key)
    }

    /// Binds `key` to `value`, rejecting concrete-vs-concrete conflicts.
    pub fn insert(&mut self, key: Monomial, value: Poly) -> Result<(), EncodingError> {
        if let Some(existing) = self.map.get(&key) {
            if *existing == value {
                return Ok(());
            }
            if let (Some(old), Some(new)) = (existing.as_constant(), value.as_constant()) {
                return Err(EncodingError::ConflictingAssignment {
                    key: key.to_string(),
                    existing: old.to_string(),
                    new: new.to_string(),
                });
            }
            warn!(
                "substitution for {} rewritten: {} -> {}",
                key, existing, value
            );
        }
        self.map.insert(key, value);
        Ok(())
    }

    /// Merges another substitution map into this one, later entries winning
    /// for composite values, concrete conflicts fatal.
    pub fn merge(&mut self, other: &Substitutions) -> Result<(), EncodingError> {
        for (key, value) in &other.map {
            self.insert(key.clone(), value.clone())?;
        }
        Ok(())
    }

    /// The most specific (highest degree) key whose unknowns all occur in
    /// `mono`, ties broken by monomial order.
    fn best_match(&self, mono: &Monomial) -> Option<(&Monomial, &Poly)> {
        if mono.is_constant() {
            return None;
        }
        let mut best: Option<(&Monomial, &Poly)> = None;
        for (key, value) in &self.map {
            if key.degree() > mono.degree() {
                continue;
            }
            if mono.contains(key) {
                match best {
                    Some((current, _)) if current.degree() >= key.degree() => {}
                    _ => best = Some((key, value)),
                }
            }
        }
        best
    }
}

/// Substitutes known expressions into `poly` and normalizes the result.
///
/// Each pass rewrites every term whose monomial contains a substitution key,
/// expanding the bound expression into the remaining factors. Squared
/// unknowns never arise because monomials are sets. After the rewrite
/// fixpoint the content (scalar common factor) is divided out.
///
/// Idempotent: simplifying an already-simplified polynomial under the same
/// substitutions returns it unchanged.
pub fn simplify(poly: &Poly, subs: &Substitutions) -> Poly {
    let mut current = poly.clone();
    if !subs.is_empty() {
        for pass in 0..MAX_SUBSTITUTION_PASSES {
            let mut next = Poly::zero();
            let mut changed = false;
            for (mono, coeff) in current.iter() {
                match subs.best_match(mono) {
                    Some((key, value)) => {
                        let rest = Poly::monomial(mono.without(key));
                        next = &next + &(value * &rest).scale(coeff);
                        changed = true;
                    }
                    None => next.add_term(mono.clone(), coeff.clone()),
                }
            }
            if !changed || next == current {
                break;
            }
            if pass == MAX_SUBSTITUTION_PASSES - 1 {
                warn!("substitution pass cap reached while simplifying {}", poly);
            }
            current = next;
        }
    }
    current.divide_content();
    current
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::unknown::Unknown;
    use num::BigInt;

    fn p(i: usize) -> Poly {
        Poly::var(Unknown::P(i))
    }

    fn q(i: usize) -> Poly {
        Poly::var(Unknown::Q(i))
    }

    fn mono_p(i: usize) -> Monomial {
        Monomial::var(Unknown::P(i))
    }

    #[test]
    fn test_substitute_single_var() {
        let mut subs = Substitutions::new();
        subs.insert(mono_p(1), Poly::constant(1)).unwrap();
        let clause = &(&p(1) * &q(1)) - &Poly::constant(1);
        assert_eq!(simplify(&clause, &subs), &q(1) - &Poly::constant(1));
    }

    #[test]
    fn test_substitute_product_key() {
        // p_1*q_1 -> 0 kills the product even inside larger monomials.
        let mut subs = Substitutions::new();
        let key = Monomial::from_vars(vec![Unknown::P(1), Unknown::Q(1)]);
        subs.insert(key, Poly::zero()).unwrap();
        let clause = &(&(&p(1) * &q(1)) * &q(2)) + &p(2);
        assert_eq!(simplify(&clause, &subs), p(2));
    }

    #[test]
    fn test_chained_substitution_resolves() {
        // p_1 -> 1 - q_1, q_1 -> 0 resolves p_1 to 1 over two passes.
        let mut subs = Substitutions::new();
        subs.insert(mono_p(1), &Poly::constant(1) - &q(1)).unwrap();
        subs.insert(Monomial::var(Unknown::Q(1)), Poly::zero())
            .unwrap();
        assert_eq!(simplify(&p(1), &subs), Poly::constant(1));
    }

    #[test]
    fn test_mutual_exclusion_pair_is_consistent() {
        // {x*y: 0, x: 1-y} applied to x*y gives (1-y)*y = y - y = 0.
        let mut subs = Substitutions::new();
        let product = Monomial::from_vars(vec![Unknown::P(1), Unknown::Q(1)]);
        subs.insert(product.clone(), Poly::zero()).unwrap();
        subs.insert(mono_p(1), &Poly::constant(1) - &q(1)).unwrap();
        assert_eq!(simplify(&Poly::monomial(product), &subs), Poly::zero());
    }

    #[test]
    fn test_idempotent() {
        let mut subs = Substitutions::new();
        subs.insert(mono_p(1), &Poly::constant(1) - &q(1)).unwrap();
        let clause = &(&(&p(1) + &q(2)).scale(&BigInt::from(2)) - &p(2)) + &Poly::constant(4);
        let once = simplify(&clause, &subs);
        let twice = simplify(&once, &subs);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_conflicting_concrete_insert_rejected() {
        let mut subs = Substitutions::new();
        subs.insert(mono_p(1), Poly::constant(1)).unwrap();
        let err = subs.insert(mono_p(1), Poly::zero()).unwrap_err();
        assert!(matches!(err, EncodingError::ConflictingAssignment { .. }));
    }

    #[test]
    fn test_reinserting_equal_value_is_noop() {
        let mut subs = Substitutions::new();
        subs.insert(mono_p(1), Poly::constant(1)).unwrap();
        subs.insert(mono_p(1), Poly::constant(1)).unwrap();
        assert_eq!(subs.len(), 1);
    }
}
