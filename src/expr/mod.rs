// src/expr/mod.rs

pub mod poly;
pub mod simplify;
pub mod unknown;

// Re-export main types for convenience
pub use poly::{Monomial, Poly};
pub use simplify::{simplify, Substitutions};
pub use unknown::Unknown;
