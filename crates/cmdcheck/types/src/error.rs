use thiserror::Error;

/// Failure raised by an external collaborator during a test.
///
/// Always converted to an `Error` status at the single-test boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CollaboratorError {
    #[error("tool environment error: {0}")]
    Environment(String),

    #[error("command simulation error: {0}")]
    Simulation(String),

    #[error("security suite error: {0}")]
    Security(String),

    #[error("evaluator error: {0}")]
    Evaluator(String),

    #[error("cancelled")]
    Cancelled,
}
