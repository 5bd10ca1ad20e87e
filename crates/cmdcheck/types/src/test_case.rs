//! Generated functional test cases

use crate::evaluation::EvaluationMetric;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Unique, monotonically allocated test identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TestId(pub u64);

impl std::fmt::Display for TestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "test_{:04}", self.0)
    }
}

/// Which fixed scenario a test case exercises
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestKind {
    HappyPath,
    ComplexTask,
    EmptyInput,
    ToolIntegration,
    SqlInjection,
    PathTraversal,
    CommandInjection,
}

impl TestKind {
    /// Adversarial-input scenarios
    pub fn is_adversarial(self) -> bool {
        matches!(
            self,
            TestKind::SqlInjection | TestKind::PathTraversal | TestKind::CommandInjection
        )
    }
}

impl std::fmt::Display for TestKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TestKind::HappyPath => "happy_path",
            TestKind::ComplexTask => "complex_task",
            TestKind::EmptyInput => "empty_input",
            TestKind::ToolIntegration => "tool_integration",
            TestKind::SqlInjection => "sql_injection",
            TestKind::PathTraversal => "path_traversal",
            TestKind::CommandInjection => "command_injection",
        };
        write!(f, "{}", name)
    }
}

impl std::str::FromStr for TestKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "happy_path" => Ok(TestKind::HappyPath),
            "complex_task" => Ok(TestKind::ComplexTask),
            "empty_input" => Ok(TestKind::EmptyInput),
            "tool_integration" => Ok(TestKind::ToolIntegration),
            "sql_injection" => Ok(TestKind::SqlInjection),
            "path_traversal" => Ok(TestKind::PathTraversal),
            "command_injection" => Ok(TestKind::CommandInjection),
            other => Err(format!("unknown test kind: {}", other)),
        }
    }
}

/// Default evaluation metrics for a test case
pub fn default_metrics() -> BTreeSet<EvaluationMetric> {
    [
        EvaluationMetric::Correctness,
        EvaluationMetric::Relevance,
        EvaluationMetric::Safety,
    ]
    .into_iter()
    .collect()
}

/// One concrete input/expectation pair generated against a command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionalTestCase {
    pub test_id: TestId,
    pub command_name: String,
    pub description: String,
    pub kind: TestKind,
    pub input_data: String,
    /// Tools that must be invoked for the test to pass
    pub expected_tools: BTreeSet<String>,
    pub expected_behavior: String,
    /// Gate the verdict on the security suite
    pub security_critical: bool,
    pub performance_threshold_ms: f64,
    pub evaluation_metrics: BTreeSet<EvaluationMetric>,
}
