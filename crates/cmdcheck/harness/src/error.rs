//! Harness error types

use cmdcheck_types::CollaboratorError;
use std::path::PathBuf;
use thiserror::Error;

/// Malformed command source. Recoverable at file granularity.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("missing YAML frontmatter in {0}")]
    MissingFrontmatter(PathBuf),

    #[error("unterminated YAML frontmatter in {0}")]
    UnterminatedFrontmatter(PathBuf),

    #[error("empty YAML frontmatter in {0}")]
    EmptyFrontmatter(PathBuf),

    #[error("invalid YAML in {path}: {source}")]
    InvalidYaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Run-level harness errors
#[derive(Error, Debug)]
pub enum HarnessError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("command not found: {0}")]
    CommandNotFound(String),

    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for HarnessError {
    fn from(e: serde_json::Error) -> Self {
        HarnessError::Serialization(e.to_string())
    }
}

impl From<toml::de::Error> for HarnessError {
    fn from(e: toml::de::Error) -> Self {
        HarnessError::Config(e.to_string())
    }
}

/// Harness result type
pub type HarnessResult<T> = Result<T, HarnessError>;
