// src/expr/unknown.rs

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result};

/// An atomic {0,1}-valued unknown in the factoring encoding.
///
/// `P(i)` and `Q(i)` are bits of the candidate factors (index 0 is the least
/// significant bit). `Carry(start, end)` represents a carry generated in
/// output column `start` and added into column `end`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Unknown {
    P(usize),
    Q(usize),
    Carry(usize, usize),
}

impl Unknown {
    pub fn is_q(&self) -> bool {
        matches!(self, Unknown::Q(_))
    }

    pub fn is_carry(&self) -> bool {
        matches!(self, Unknown::Carry(_, _))
    }
}

impl Display for Unknown {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Unknown::P(i) => write!(f, "p_{}", i),
            Unknown::Q(i) => write!(f, "q_{}", i),
            Unknown::Carry(start, end) => write!(f, "z_{}_{}", start, end),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names() {
        assert_eq!(Unknown::P(3).to_string(), "p_3");
        assert_eq!(Unknown::Q(0).to_string(), "q_0");
        assert_eq!(Unknown::Carry(1, 2).to_string(), "z_1_2");
    }

    #[test]
    fn test_ordering_groups_kinds() {
        // P bits sort before Q bits, Q bits before carries.
        assert!(Unknown::P(9) < Unknown::Q(0));
        assert!(Unknown::Q(9) < Unknown::Carry(0, 1));
        assert!(Unknown::Carry(1, 2) < Unknown::Carry(1, 3));
    }
}
