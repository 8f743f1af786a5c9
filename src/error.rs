// src/error.rs

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Fatal inconsistencies in the problem encoding or rule application.
///
/// Under-determined systems and unhandled clause shapes are *not* errors:
/// the former is the normal handoff to the external optimizer, the latter is
/// reported as a diagnostic and left unresolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EncodingError {
    /// Two different concrete values were derived for the same expression.
    ConflictingAssignment {
        key: String,
        existing: String,
        new: String,
    },
    /// A fully substituted clause reduced to a nonzero constant.
    UnsatisfiableClause { clause: String },
}

impl Display for EncodingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            EncodingError::ConflictingAssignment { key, existing, new } => write!(
                f,
                "conflicting assignment for {}: already {}, derived {}",
                key, existing, new
            ),
            EncodingError::UnsatisfiableClause { clause } => {
                write!(f, "clause reduced to a nonzero constant: {}", clause)
            }
        }
    }
}

impl Error for EncodingError {}
