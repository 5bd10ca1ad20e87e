//! CLI error types

use cmdcheck_harness::HarnessError;
use thiserror::Error;

/// CLI error type
#[derive(Error, Debug)]
pub enum CliError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Harness(#[from] HarnessError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{failed} failed and {errors} errored tests")]
    TestsFailed { failed: usize, errors: usize },
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
