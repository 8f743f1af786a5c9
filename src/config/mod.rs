// src/config/mod.rs

pub mod reducer_config;

// Re-export main types for convenience
pub use reducer_config::ReducerConfig;
