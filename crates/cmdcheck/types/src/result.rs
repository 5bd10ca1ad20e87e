//! Test status and per-test results

use crate::evaluation::EvaluationReport;
use crate::security::SecurityReport;
use crate::test_case::FunctionalTestCase;
use crate::tools::ToolUsageValidation;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Test execution status
///
/// `Pending -> InProgress -> {Passed, Failed, Error}`. `Skipped` is only
/// assigned before execution starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    Pending,
    InProgress,
    Passed,
    Failed,
    Skipped,
    Error,
}

impl TestStatus {
    /// Whether the status can appear in a finished run
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TestStatus::Passed | TestStatus::Failed | TestStatus::Skipped | TestStatus::Error
        )
    }
}

impl std::fmt::Display for TestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestStatus::Pending => write!(f, "pending"),
            TestStatus::InProgress => write!(f, "in_progress"),
            TestStatus::Passed => write!(f, "passed"),
            TestStatus::Failed => write!(f, "failed"),
            TestStatus::Skipped => write!(f, "skipped"),
            TestStatus::Error => write!(f, "error"),
        }
    }
}

/// Result of executing one functional test case
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionalTestResult {
    pub test_case: Arc<FunctionalTestCase>,
    pub status: TestStatus,
    pub execution_time_ms: f64,
    pub environment_snapshot: Option<serde_json::Value>,
    pub security_report: Option<SecurityReport>,
    pub llm_report: Option<EvaluationReport>,
    pub tool_usage_validation: Option<ToolUsageValidation>,
    pub error_details: Option<String>,
    pub warnings: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl FunctionalTestResult {
    /// Create a result with no sub-reports
    pub fn new(
        test_case: Arc<FunctionalTestCase>,
        status: TestStatus,
        execution_time_ms: f64,
    ) -> Self {
        Self {
            test_case,
            status,
            execution_time_ms,
            environment_snapshot: None,
            security_report: None,
            llm_report: None,
            tool_usage_validation: None,
            error_details: None,
            warnings: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    /// Create an errored result
    pub fn error(
        test_case: Arc<FunctionalTestCase>,
        details: impl Into<String>,
        execution_time_ms: f64,
    ) -> Self {
        let mut result = Self::new(test_case, TestStatus::Error, execution_time_ms);
        result.error_details = Some(details.into());
        result
    }

    /// Create a skipped result
    pub fn skipped(test_case: Arc<FunctionalTestCase>, reason: impl Into<String>) -> Self {
        let mut result = Self::new(test_case, TestStatus::Skipped, 0.0);
        result.warnings.push(reason.into());
        result
    }

    /// Add a warning to the result
    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    pub fn command_name(&self) -> &str {
        &self.test_case.command_name
    }

    pub fn overall_score(&self) -> Option<f64> {
        self.llm_report.as_ref().map(|r| r.overall_score)
    }
}
