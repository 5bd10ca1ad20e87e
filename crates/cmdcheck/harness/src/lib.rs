//! cmdcheck harness - Functional test orchestration for agent command specs
//!
//! The pipeline runs strictly downstream:
//!
//! ```text
//! CommandLoader -> TestCaseGenerator -> ConcurrencyController(TestExecutor) -> FunctionalReport
//! ```
//!
//! - [`CommandLoader`] parses markdown command files with YAML frontmatter
//! - [`TestCaseGenerator`] produces a fixed, deterministic suite per command
//! - [`TestExecutor`] runs one case through tool validation, the security
//!   suite and the evaluator, and decides its status
//! - [`ConcurrencyController`] schedules suites sequentially or on a bounded
//!   worker pool with optional per-test timeouts
//! - [`FunctionalReport`] aggregates results into summary statistics
//!
//! Security probing, scoring and command simulation are collaborators behind
//! the traits in [`collaborators`]; the static implementations there and the
//! [`TemplateSimulator`] let the harness run without external services.

pub mod collaborators;
pub mod config;
pub mod context;
pub mod controller;
pub mod environment;
pub mod error;
pub mod executor;
pub mod generator;
pub mod loader;
pub mod report;
pub mod simulator;

pub use collaborators::{
    simulator_fn, CommandEvaluator, CommandFn, CommandSimulator, EvaluationRequest,
    SecurityTestSuite, StaticEvaluator, StaticSecuritySuite,
};
pub use config::HarnessConfig;
pub use context::{CancellationToken, EnvironmentFactory, RunContext};
pub use controller::{ConcurrencyController, ExecutionMode, ResultLog};
pub use environment::{InMemoryToolEnvironment, ToolEnvironment};
pub use error::{HarnessError, HarnessResult, ParseError};
pub use executor::{determine_status, validate_tool_usage, StatusPolicy, TestExecutor};
pub use generator::TestCaseGenerator;
pub use loader::{parse_command, CommandLoader, CommandRegistry};
pub use report::FunctionalReport;
pub use simulator::TemplateSimulator;
