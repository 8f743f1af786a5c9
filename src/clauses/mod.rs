// src/clauses/mod.rs

pub mod bit_fields;
pub mod builder;

// Re-export main types for convenience
pub use bit_fields::BitFields;
pub use builder::build_clauses;
