// src/expr/poly.rs

use num::{BigInt, Integer, One, Signed, ToPrimitive, Zero};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};
use std::ops::{Add, Mul, Neg, Sub};

use super::unknown::Unknown;

/// A product of distinct unknowns, kept sorted.
///
/// Because every unknown is {0,1}-valued, x*x = x, so a product is fully
/// described by the set of unknowns it contains. The empty monomial is the
/// constant 1.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Monomial(Vec<Unknown>);

impl Monomial {
    pub fn one() -> Self {
        Monomial(Vec::new())
    }

    pub fn var(unknown: Unknown) -> Self {
        Monomial(vec![unknown])
    }

    pub fn from_vars(mut vars: Vec<Unknown>) -> Self {
        vars.sort();
        vars.dedup();
        Monomial(vars)
    }

    pub fn degree(&self) -> usize {
        self.0.len()
    }

    pub fn is_constant(&self) -> bool {
        self.0.is_empty()
    }

    pub fn vars(&self) -> &[Unknown] {
        &self.0
    }

    /// The unknown this monomial consists of, if it has exactly one.
    pub fn single_var(&self) -> Option<Unknown> {
        if self.0.len() == 1 {
            Some(self.0[0])
        } else {
            None
        }
    }

    /// True if every unknown of `other` also appears in `self`.
    pub fn contains(&self, other: &Monomial) -> bool {
        other.0.iter().all(|v| self.0.binary_search(v).is_ok())
    }

    /// The monomial left after dividing out `other` (assumes containment).
    pub fn without(&self, other: &Monomial) -> Monomial {
        Monomial(
            self.0
                .iter()
                .filter(|v| other.0.binary_search(v).is_err())
                .copied()
                .collect(),
        )
    }

    pub fn product(&self, other: &Monomial) -> Monomial {
        let mut vars = self.0.clone();
        vars.extend_from_slice(&other.0);
        Monomial::from_vars(vars)
    }
}

impl Display for Monomial {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.0.is_empty() {
            return write!(f, "1");
        }
        let parts: Vec<String> = self.0.iter().map(|v| v.to_string()).collect();
        write!(f, "{}", parts.join("*"))
    }
}

/// A multilinear polynomial over {0,1}-valued unknowns, in canonical form:
/// a map from monomial to nonzero coefficient. Structural equality is
/// polynomial equality.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Poly {
    terms: BTreeMap<Monomial, BigInt>,
}

impl Poly {
    pub fn zero() -> Self {
        Poly {
            terms: BTreeMap::new(),
        }
    }

    pub fn constant<T: Into<BigInt>>(value: T) -> Self {
        let mut poly = Poly::zero();
        poly.add_term(Monomial::one(), value.into());
        poly
    }

    pub fn var(unknown: Unknown) -> Self {
        Poly::monomial(Monomial::var(unknown))
    }

    pub fn monomial(mono: Monomial) -> Self {
        let mut poly = Poly::zero();
        poly.add_term(mono, BigInt::one());
        poly
    }

    /// Adds `coeff * mono`, dropping the entry if the coefficient cancels.
    pub fn add_term(&mut self, mono: Monomial, coeff: BigInt) {
        if coeff.is_zero() {
            return;
        }
        let entry = self.terms.entry(mono.clone()).or_insert_with(BigInt::zero);
        *entry += coeff;
        if entry.is_zero() {
            self.terms.remove(&mono);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Monomial, &BigInt)> {
        self.terms.iter()
    }

    pub fn num_terms(&self) -> usize {
        self.terms.len()
    }

    pub fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }

    /// The value of this polynomial if it contains no unknowns.
    pub fn as_constant(&self) -> Option<BigInt> {
        match self.terms.len() {
            0 => Some(BigInt::zero()),
            1 => {
                let (mono, coeff) = self.terms.iter().next().unwrap();
                if mono.is_constant() {
                    Some(coeff.clone())
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// The concrete bit this polynomial resolves to, if any.
    pub fn as_bit(&self) -> Option<u8> {
        self.as_constant().and_then(|c| c.to_u8()).filter(|b| *b <= 1)
    }

    pub fn is_concrete(&self) -> bool {
        self.as_constant().is_some()
    }

    pub fn single_term(&self) -> Option<(&Monomial, &BigInt)> {
        if self.terms.len() == 1 {
            self.terms.iter().next()
        } else {
            None
        }
    }

    /// Coefficient of the constant (empty) monomial, zero if absent.
    pub fn constant_part(&self) -> BigInt {
        self.terms
            .get(&Monomial::one())
            .cloned()
            .unwrap_or_else(BigInt::zero)
    }

    pub fn free_unknowns(&self) -> BTreeSet<Unknown> {
        self.terms
            .keys()
            .flat_map(|mono| mono.vars().iter().copied())
            .collect()
    }

    pub fn scale(&self, factor: &BigInt) -> Poly {
        let mut result = Poly::zero();
        for (mono, coeff) in &self.terms {
            result.add_term(mono.clone(), coeff * factor);
        }
        result
    }

    /// Maximum value the polynomial can attain with every unknown treated
    /// optimistically as 1 and negative-coefficient unknown terms ignored.
    /// Signed constants count as-is. This is the "headroom" used both for
    /// carry pruning during clause construction and by the carry-bound rule.
    pub fn max_attainable_sum(&self) -> BigInt {
        let mut max_sum = BigInt::zero();
        for (mono, coeff) in &self.terms {
            if mono.is_constant() {
                max_sum += coeff;
            } else if coeff.is_positive() {
                max_sum += coeff;
            }
        }
        max_sum
    }

    /// Divides out the gcd of the coefficients and normalizes an all-negative
    /// polynomial by -1. Only applied to polynomials with at least two terms;
    /// equality-to-zero semantics are unchanged.
    pub fn divide_content(&mut self) {
        if self.terms.len() < 2 {
            return;
        }
        let mut gcd = BigInt::zero();
        let mut all_negative = true;
        for coeff in self.terms.values() {
            gcd = gcd.gcd(coeff);
            if coeff.is_positive() {
                all_negative = false;
            }
        }
        if all_negative {
            gcd = -gcd;
        }
        if !gcd.is_one() {
            for coeff in self.terms.values_mut() {
                *coeff = &*coeff / &gcd;
            }
        }
    }

    /// Evaluates the polynomial under a complete bit assignment.
    /// Returns None if some unknown has no binding.
    pub fn eval(&self, assignment: &BTreeMap<Unknown, u8>) -> Option<BigInt> {
        let mut total = BigInt::zero();
        for (mono, coeff) in &self.terms {
            let mut all_ones = true;
            for var in mono.vars() {
                match assignment.get(var) {
                    Some(0) => {
                        all_ones = false;
                        break;
                    }
                    Some(_) => {}
                    None => return None,
                }
            }
            if all_ones {
                total += coeff;
            }
        }
        Some(total)
    }
}

impl Add for Poly {
    type Output = Poly;

    fn add(self, other: Poly) -> Poly {
        &self + &other
    }
}

impl Add for &Poly {
    type Output = Poly;

    fn add(self, other: &Poly) -> Poly {
        let mut result = self.clone();
        for (mono, coeff) in &other.terms {
            result.add_term(mono.clone(), coeff.clone());
        }
        result
    }
}

impl Sub for Poly {
    type Output = Poly;

    fn sub(self, other: Poly) -> Poly {
        &self - &other
    }
}

impl Sub for &Poly {
    type Output = Poly;

    fn sub(self, other: &Poly) -> Poly {
        let mut result = self.clone();
        for (mono, coeff) in &other.terms {
            result.add_term(mono.clone(), -coeff.clone());
        }
        result
    }
}

impl Mul for Poly {
    type Output = Poly;

    fn mul(self, other: Poly) -> Poly {
        &self * &other
    }
}

impl Mul for &Poly {
    type Output = Poly;

    fn mul(self, other: &Poly) -> Poly {
        let mut result = Poly::zero();
        for (mono_a, coeff_a) in &self.terms {
            for (mono_b, coeff_b) in &other.terms {
                result.add_term(mono_a.product(mono_b), coeff_a * coeff_b);
            }
        }
        result
    }
}

impl Neg for Poly {
    type Output = Poly;

    fn neg(self) -> Poly {
        self.scale(&-BigInt::one())
    }
}

impl Display for Poly {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.terms.is_empty() {
            return write!(f, "0");
        }
        let mut first = true;
        for (mono, coeff) in &self.terms {
            let sign = if coeff.is_negative() { "-" } else { "+" };
            let abs = coeff.abs();
            if first {
                if coeff.is_negative() {
                    write!(f, "-")?;
                }
                first = false;
            } else {
                write!(f, " {} ", sign)?;
            }
            if mono.is_constant() {
                write!(f, "{}", abs)?;
            } else if abs.is_one() {
                write!(f, "{}", mono)?;
            } else {
                write!(f, "{}*{}", abs, mono)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(i: usize) -> Poly {
        Poly::var(Unknown::P(i))
    }

    fn q(i: usize) -> Poly {
        Poly::var(Unknown::Q(i))
    }

    #[test]
    fn test_square_collapses_to_var() {
        // x * x = x for binary unknowns.
        let x = p(1);
        assert_eq!(&x * &x, x);
    }

    #[test]
    fn test_add_cancels_terms() {
        let sum = &(&p(1) + &q(2)) - &p(1);
        assert_eq!(sum, q(2));
    }

    #[test]
    fn test_as_constant() {
        assert_eq!(Poly::zero().as_constant(), Some(BigInt::zero()));
        assert_eq!(Poly::constant(3).as_constant(), Some(BigInt::from(3)));
        assert_eq!(p(0).as_constant(), None);
    }

    #[test]
    fn test_max_attainable_sum() {
        // p_1*q_1 + 2*z_1_2 - 3 -> 1 + 2 - 3 = 0
        let clause = &(&(&p(1) * &q(1)) + &Poly::var(Unknown::Carry(1, 2)).scale(&BigInt::from(2)))
            - &Poly::constant(3);
        assert_eq!(clause.max_attainable_sum(), BigInt::zero());
        // negative unknown terms are ignored
        let clause = &p(1) - &q(1).scale(&BigInt::from(4));
        assert_eq!(clause.max_attainable_sum(), BigInt::one());
    }

    #[test]
    fn test_divide_content() {
        let mut clause = &(&p(1) + &q(1)).scale(&BigInt::from(2)) - &Poly::constant(2);
        clause.divide_content();
        assert_eq!(clause, &(&p(1) + &q(1)) - &Poly::constant(1));

        // all-negative polynomials flip sign
        let mut clause = (&p(1) + &Poly::constant(3)).scale(&-BigInt::one());
        clause.divide_content();
        assert_eq!(clause, &p(1) + &Poly::constant(3));

        // single terms are left alone
        let mut term = p(1).scale(&BigInt::from(-2));
        term.divide_content();
        assert_eq!(term, p(1).scale(&BigInt::from(-2)));
    }

    #[test]
    fn test_eval() {
        let clause = &(&p(0) * &q(0)) - &Poly::constant(1);
        let mut assignment = BTreeMap::new();
        assignment.insert(Unknown::P(0), 1u8);
        assignment.insert(Unknown::Q(0), 1u8);
        assert_eq!(clause.eval(&assignment), Some(BigInt::zero()));
        assignment.insert(Unknown::Q(0), 0u8);
        assert_eq!(clause.eval(&assignment), Some(BigInt::from(-1)));
    }

    #[test]
    fn test_display() {
        let clause = &(&p(1) * &q(1)) - &Poly::constant(1);
        assert_eq!(clause.to_string(), "-1 + p_1*q_1");
    }
}
