//! Rubric loading from YAML.

use std::path::Path;
use reviewgate_core::{Rubric, RubricDefinition, SchemaError};

/// Errors that can occur while loading a rubric.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// I/O error
    #[error("failed to read rubric {path}: {source}")]
    Io {
        /// File being read
        path: String,
        /// Underlying error
        source: std::io::Error,
    },

    /// YAML syntax or shape error
    #[error("failed to parse rubric YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Rubric failed validation
    #[error("invalid rubric: {0}")]
    Schema(#[from] SchemaError),
}

/// Parse and validate a rubric from YAML text.
pub fn load_rubric_str(yaml: &str) -> Result<Rubric, LoadError> {
    let definition: RubricDefinition = serde_yaml::from_str(yaml)?;
    let rubric = Rubric::from_definition(definition)?;

    tracing::info!(
        "Loaded rubric: {} questions ({} excluded), cutoff {}, max possible {}",
        rubric.questions().len(),
        rubric.excluding_questions().len(),
        rubric.cutoff_score(),
        rubric.max_possible_score()
    );
    if !rubric.cutoff_reachable() {
        tracing::warn!(
            "Cutoff {} is above the highest attainable score {}; no document can be accepted",
            rubric.cutoff_score(),
            rubric.max_possible_score()
        );
    }

    Ok(rubric)
}

/// Read, parse and validate a rubric file.
pub fn load_rubric(path: impl AsRef<Path>) -> Result<Rubric, LoadError> {
    let path = path.as_ref();
    let yaml = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    tracing::debug!("Reading rubric from {}", path.display());
    load_rubric_str(&yaml)
}
