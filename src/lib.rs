// src/lib.rs

pub mod clauses;
pub mod config;
pub mod engine;
pub mod error;
pub mod expr;
pub mod presets;
pub mod rules;
