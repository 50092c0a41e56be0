//! Pipeline definition files
//!
//! A definition is the ordered list of phase descriptions plus optional model
//! overrides, supplied as TOML or YAML. Personas are opaque text; the engine
//! never parses or branches on them.
//!
//! ```toml
//! model = "gpt-4o"
//! fallback_model = "gpt-4o-mini"
//!
//! [[phases]]
//! id = "theme"
//! persona = "You are a conference theme strategist..."
//! context = "none"
//!
//! [[phases]]
//! id = "schedule"
//! persona = "You are a schedule planner..."
//! context = "all-prior"
//! ```

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use super::phase::PhaseSpec;

#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error("Failed to read pipeline definition {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Unsupported definition format: {0} (expected .toml, .yaml, or .yml)")]
    UnsupportedFormat(String),

    #[error("Invalid TOML pipeline definition: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid YAML pipeline definition: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Parsed pipeline definition, ready to hand to the runner.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineDefinition {
    /// Primary model override; falls back to the environment configuration
    #[serde(default)]
    pub model: Option<String>,

    /// Fallback model override
    #[serde(default)]
    pub fallback_model: Option<String>,

    /// Phases in execution order
    pub phases: Vec<PhaseSpec>,
}

impl PipelineDefinition {
    /// Loads a definition file, choosing the parser by extension.
    pub fn from_path(path: &Path) -> Result<Self, DefinitionError> {
        let contents = std::fs::read_to_string(path).map_err(|source| DefinitionError::Io {
            path: path.display().to_string(),
            source,
        })?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml(&contents),
            Some("yaml") | Some("yml") => Self::from_yaml(&contents),
            other => Err(DefinitionError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }

    pub fn from_toml(contents: &str) -> Result<Self, DefinitionError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn from_yaml(contents: &str) -> Result<Self, DefinitionError> {
        Ok(serde_yaml::from_str(contents)?)
    }
}
