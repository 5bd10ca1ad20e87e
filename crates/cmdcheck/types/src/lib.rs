//! cmdcheck - Core types for functional testing of agent command specs
//!
//! Shared data model for the loader, generator, executor and report
//! aggregator:
//!
//! - [`Command`]: an immutable command specification
//! - [`FunctionalTestCase`]: one generated input/expectation pair
//! - [`FunctionalTestResult`]: the outcome of executing a test case
//! - sub-reports from the tool environment, security suite and evaluator

pub mod command;
pub mod error;
pub mod evaluation;
pub mod result;
pub mod security;
pub mod test_case;
pub mod tools;

pub use command::Command;
pub use error::CollaboratorError;
pub use evaluation::{EvaluationMetric, EvaluationReport, Grade, MetricScore};
pub use result::{FunctionalTestResult, TestStatus};
pub use security::{ComplianceStatus, SecurityFinding, SecurityReport, ThreatLevel};
pub use test_case::{default_metrics, FunctionalTestCase, TestId, TestKind};
pub use tools::{ExecutionSummary, ToolCall, ToolResult, ToolUsageValidation};
