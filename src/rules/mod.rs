// src/rules/mod.rs

use log::{debug, warn};
use num::{BigInt, Integer, One, Signed, Zero};

use crate::error::EncodingError;
use crate::expr::{Monomial, Poly, Substitutions, Unknown};

/// The fixed battery of inference rules, applied to each simplified clause
/// in pipeline order. Every rule may add entries to the substitution map;
/// the caller re-simplifies the clause between rules.
///
/// The battery is a hand-curated heuristic set and deliberately incomplete:
/// clause shapes no rule recognizes are reported and left unresolved, never
/// guessed at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rule {
    CarryBound,
    Equality,
    ProductOne,
    MutualExclusion,
    ForcedUnit,
    UniformSum,
    Parity,
}

impl Rule {
    pub const PIPELINE: [Rule; 7] = [
        Rule::CarryBound,
        Rule::Equality,
        Rule::ProductOne,
        Rule::MutualExclusion,
        Rule::ForcedUnit,
        Rule::UniformSum,
        Rule::Parity,
    ];

    /// Applies this rule to one simplified clause. Returns true if the rule
    /// added at least one known expression.
    pub fn apply(
        &self,
        clause: &Poly,
        subs: &mut Substitutions,
    ) -> Result<bool, EncodingError> {
        if clause.is_zero() {
            return Ok(false);
        }
        let fired = match self {
            Rule::CarryBound => apply_carry_bound(clause, subs)?,
            Rule::Equality => apply_equality(clause, subs)?,
            Rule::ProductOne => apply_product_one(clause, subs)?,
            Rule::MutualExclusion => apply_mutual_exclusion(clause, subs)?,
            Rule::ForcedUnit => apply_forced_unit(clause, subs)?,
            Rule::UniformSum => apply_uniform_sum(clause, subs)?,
            Rule::Parity => apply_parity(clause, subs)?,
        };
        if fired {
            debug!("{:?} applied to {}", self, clause);
        }
        Ok(fired)
    }
}

/// A negative term whose magnitude exceeds the clause's headroom can never
/// be balanced, so its monomial must be 0.
fn apply_carry_bound(clause: &Poly, subs: &mut Substitutions) -> Result<bool, EncodingError> {
    let headroom = clause.max_attainable_sum();
    let mut forced = Vec::new();
    for (mono, coeff) in clause.iter() {
        if !mono.is_constant() && coeff.is_negative() && -coeff > headroom {
            forced.push(mono.clone());
        }
    }
    let fired = !forced.is_empty();
    for mono in forced {
        subs.insert(mono, Poly::zero())?;
    }
    Ok(fired)
}

/// Direct consequences of the clause equalling zero: a bare unknown is 0, a
/// lone product is 0, and a term balanced against a constant must take the
/// unique {0,1} value that cancels it.
fn apply_equality(clause: &Poly, subs: &mut Substitutions) -> Result<bool, EncodingError> {
    match clause.num_terms() {
        1 => {
            let (mono, _) = clause.single_term().unwrap();
            if mono.is_constant() {
                // Nonzero constant clauses are caught by the fixpoint driver.
                return Ok(false);
            }
            let target = match mono.single_var() {
                Some(var) => Monomial::var(var),
                None => mono.clone(),
            };
            subs.insert(target, Poly::zero())?;
            Ok(true)
        }
        2 => {
            let mut terms = clause.iter();
            let (m0, c0) = terms.next().unwrap();
            let (m1, c1) = terms.next().unwrap();
            if m0.is_constant() || m1.is_constant() {
                let (constant, mono, coeff) = if m0.is_constant() {
                    (c0, m1, c1)
                } else {
                    (c1, m0, c0)
                };
                let negated = -constant;
                if !(&negated % coeff).is_zero() {
                    return Err(EncodingError::UnsatisfiableClause {
                        clause: clause.to_string(),
                    });
                }
                let value = &negated / coeff;
                if value.is_zero() {
                    subs.insert(mono.clone(), Poly::zero())?;
                } else if value.is_one() {
                    // a product equal to 1 forces every factor to 1
                    for var in mono.vars().to_vec() {
                        subs.insert(Monomial::var(var), Poly::constant(1))?;
                    }
                } else {
                    return Err(EncodingError::UnsatisfiableClause {
                        clause: clause.to_string(),
                    });
                }
                Ok(true)
            } else if *c0 == -c1 {
                let (key, value) = orient_pair(m0, m1);
                subs.insert(key.clone(), Poly::monomial(value.clone()))?;
                Ok(true)
            } else if c0 == c1 {
                // same-signed pair summing to zero: both monomials vanish
                subs.insert(m0.clone(), Poly::zero())?;
                subs.insert(m1.clone(), Poly::zero())?;
                Ok(true)
            } else {
                Ok(false)
            }
        }
        _ => Ok(false),
    }
}

/// x*y - 1 = 0: a binary product is 1 only if both factors are.
fn apply_product_one(clause: &Poly, subs: &mut Substitutions) -> Result<bool, EncodingError> {
    if clause.num_terms() != 2 || clause.constant_part() != -BigInt::one() {
        return Ok(false);
    }
    let product = clause
        .iter()
        .find(|(mono, coeff)| !mono.is_constant() && coeff.is_one() && mono.degree() == 2);
    if let Some((mono, _)) = product {
        for var in mono.vars().to_vec() {
            subs.insert(Monomial::var(var), Poly::constant(1))?;
        }
        return Ok(true);
    }
    Ok(false)
}

/// x + y - 1 = 0: the pair is mutually exclusive, so x*y = 0 and one
/// variable is the complement of the other.
fn apply_mutual_exclusion(clause: &Poly, subs: &mut Substitutions) -> Result<bool, EncodingError> {
    if clause.num_terms() != 3 || clause.constant_part() != -BigInt::one() {
        return Ok(false);
    }
    let mut vars = Vec::new();
    for (mono, coeff) in clause.iter() {
        if mono.is_constant() {
            continue;
        }
        match mono.single_var() {
            Some(var) if coeff.is_one() => vars.push(var),
            _ => return Ok(false),
        }
    }
    if vars.len() != 2 {
        return Ok(false);
    }
    let (x, y) = (vars[0], vars[1]);
    subs.insert(Monomial::from_vars(vec![x, y]), Poly::zero())?;
    let (mono_x, mono_y) = (Monomial::var(x), Monomial::var(y));
    let (key, complement) = orient_pair(&mono_x, &mono_y);
    let value = &Poly::constant(1) - &Poly::monomial(complement.clone());
    subs.insert(key.clone(), value)?;
    Ok(true)
}

/// a + b*s = 0 with a a nonzero constant: s = 1 is the only balancing
/// solution exactly when a = -b.
fn apply_forced_unit(clause: &Poly, subs: &mut Substitutions) -> Result<bool, EncodingError> {
    if clause.num_terms() != 2 {
        return Ok(false);
    }
    let constant = clause.constant_part();
    if constant.is_zero() {
        return Ok(false);
    }
    let scaled = clause.iter().find(|(mono, _)| !mono.is_constant());
    if let Some((mono, coeff)) = scaled {
        if constant == -coeff {
            subs.insert(mono.clone(), Poly::constant(1))?;
            return Ok(true);
        }
    }
    Ok(false)
}

/// A sum of unit-coefficient monomials plus one constant c: with c = 0 every
/// monomial must be 0; with c = -(number of monomials) every monomial must
/// be 1, which for a product means every factor is 1.
fn apply_uniform_sum(clause: &Poly, subs: &mut Substitutions) -> Result<bool, EncodingError> {
    if clause.num_terms() < 2 {
        return Ok(false);
    }
    let mut monos = Vec::new();
    for (mono, coeff) in clause.iter() {
        if mono.is_constant() {
            continue;
        }
        if !coeff.is_one() {
            return Ok(false);
        }
        monos.push(mono.clone());
    }
    if monos.is_empty() {
        return Ok(false);
    }
    let constant = clause.constant_part();
    if constant.is_zero() {
        for mono in monos {
            subs.insert(mono, Poly::zero())?;
        }
        Ok(true)
    } else if constant == -BigInt::from(monos.len()) {
        for mono in monos {
            for var in mono.vars().to_vec() {
                subs.insert(Monomial::var(var), Poly::constant(1))?;
            }
        }
        Ok(true)
    } else {
        Ok(false)
    }
}

/// Every even-coefficient term is divisible by 2, so the odd-coefficient
/// terms must sum to an even number on their own. Small odd-term counts each
/// license a specific substitution; other shapes are left unresolved.
fn apply_parity(clause: &Poly, subs: &mut Substitutions) -> Result<bool, EncodingError> {
    let mut odd_terms: Vec<(Monomial, BigInt)> = Vec::new();
    let mut even_positive: Vec<(Monomial, BigInt)> = Vec::new();
    let mut even_negative: Vec<(Monomial, BigInt)> = Vec::new();
    for (mono, coeff) in clause.iter() {
        if coeff.is_odd() {
            odd_terms.push((mono.clone(), coeff.clone()));
        } else if coeff.is_positive() {
            even_positive.push((mono.clone(), coeff.clone()));
        } else {
            even_negative.push((mono.clone(), coeff.clone()));
        }
    }

    match odd_terms.len() {
        1 => {
            let (mono, _) = &odd_terms[0];
            if mono.is_constant() {
                warn!("parity rule: lone odd constant in {}, left unresolved", clause);
                return Ok(false);
            }
            subs.insert(mono.clone(), Poly::zero())?;
            Ok(true)
        }
        2 => {
            let constant_index = odd_terms.iter().position(|(mono, _)| mono.is_constant());
            if let Some(index) = constant_index {
                // odd constant + one odd term: the term must be odd too, so
                // every unknown in it is 1.
                let (mono, _) = &odd_terms[1 - index];
                for var in mono.vars().to_vec() {
                    subs.insert(Monomial::var(var), Poly::constant(1))?;
                }
                Ok(true)
            } else {
                // two odd variable terms must have equal parity, hence equal
                // value for binary unknowns.
                let (key, value) = orient_pair(&odd_terms[0].0, &odd_terms[1].0);
                subs.insert(key.clone(), Poly::monomial(value.clone()))?;
                // a lone even-negative carry term balancing the pair takes
                // the same value.
                if even_negative.len() == 1 && even_positive.is_empty() {
                    let (mono, _) = &even_negative[0];
                    if !mono.is_constant() {
                        subs.insert(mono.clone(), Poly::monomial(value.clone()))?;
                    }
                }
                Ok(true)
            }
        }
        3 => {
            let constant_index = odd_terms.iter().position(|(mono, _)| mono.is_constant());
            if let Some(index) = constant_index {
                // two odd variable terms plus an odd constant: exactly one of
                // the terms is odd, so their product vanishes.
                let mut monos = odd_terms
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != index)
                    .map(|(_, (mono, _))| mono.clone());
                let product = monos.next().unwrap().product(&monos.next().unwrap());
                subs.insert(product, Poly::zero())?;
                Ok(true)
            } else {
                warn!(
                    "parity rule: three odd variable terms in {}, left unresolved",
                    clause
                );
                Ok(false)
            }
        }
        0 => Ok(false),
        count => {
            warn!(
                "parity rule: {} odd terms in {}, left unresolved",
                count, clause
            );
            Ok(false)
        }
    }
}

/// Deterministic side selection shared by the equality, mutual-exclusion and
/// parity rules: resolve the non-q monomial in terms of the q one, falling
/// back to resolving the later monomial in terms of the earlier. Keeping one
/// orientation everywhere prevents substitution cycles.
fn orient_pair<'a>(a: &'a Monomial, b: &'a Monomial) -> (&'a Monomial, &'a Monomial) {
    let a_has_q = a.vars().iter().any(Unknown::is_q);
    let b_has_q = b.vars().iter().any(Unknown::is_q);
    match (a_has_q, b_has_q) {
        (true, false) => (b, a),
        (false, true) => (a, b),
        _ => {
            if a > b {
                (a, b)
            } else {
                (b, a)
            }
        }
    }
}
