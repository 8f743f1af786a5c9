// src/config/reducer_config.rs

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Preprocessing engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReducerConfig {
    /// Apply the preprocessing battery (bit fixing, carry pruning, rules).
    /// With this off the engine only constructs the raw clause system.
    pub preprocessing: bool,

    /// Attempt the canonical p/q symmetry break when the clause system
    /// becomes trivial with unknowns remaining.
    pub symmetry_breaking: bool,

    /// Logging level (error, warn, info, debug, trace)
    pub log_level: String,
}

impl Default for ReducerConfig {
    fn default() -> Self {
        ReducerConfig {
            preprocessing: true,
            symmetry_breaking: true,
            log_level: "info".to_string(),
        }
    }
}

impl ReducerConfig {
    /// Load configuration with precedence: config file → env vars → defaults
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            // Start with defaults
            .set_default("preprocessing", true)?
            .set_default("symmetry_breaking", true)?
            .set_default("log_level", "info")?;

        if Path::new("vqf.toml").exists() {
            builder = builder.add_source(File::with_name("vqf.toml"));
        }

        // Override with environment variables (prefix: VQF_)
        builder = builder.add_source(
            Environment::with_prefix("VQF")
                .separator("_")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Load configuration with custom file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("preprocessing", true)?
            .set_default("symmetry_breaking", true)?
            .set_default("log_level", "info")?;

        if path.as_ref().exists() {
            builder = builder.add_source(File::from(path.as_ref()));
        }

        builder = builder.add_source(
            Environment::with_prefix("VQF")
                .separator("_")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}
