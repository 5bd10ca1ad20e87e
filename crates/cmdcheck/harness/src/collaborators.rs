//! Collaborator seams used by the executor
//!
//! Command simulation, security probing and qualitative evaluation all live
//! outside the harness. The static implementations here return configured
//! verdicts and exist so the harness can run end to end without them.

use crate::context::CancellationToken;
use crate::environment::ToolEnvironment;
use cmdcheck_types::{
    CollaboratorError, Command, ComplianceStatus, EvaluationMetric, EvaluationReport, MetricScore,
    SecurityReport,
};
use std::collections::{BTreeMap, BTreeSet};

/// Produces a command's textual output for a given input
pub trait CommandSimulator: Send + Sync {
    fn simulate(
        &self,
        command: &Command,
        input: &str,
        tools: &mut dyn ToolEnvironment,
        cancel: &CancellationToken,
    ) -> Result<String, CollaboratorError>;
}

/// Adapter turning a closure into a [`CommandSimulator`]
pub struct FnSimulator<F>(F);

/// Wrap a closure as a simulator. The closure does not see the cancellation token.
pub fn simulator_fn<F>(f: F) -> FnSimulator<F>
where
    F: Fn(&Command, &str, &mut dyn ToolEnvironment) -> Result<String, CollaboratorError>
        + Send
        + Sync,
{
    FnSimulator(f)
}

impl<F> CommandSimulator for FnSimulator<F>
where
    F: Fn(&Command, &str, &mut dyn ToolEnvironment) -> Result<String, CollaboratorError>
        + Send
        + Sync,
{
    fn simulate(
        &self,
        command: &Command,
        input: &str,
        tools: &mut dyn ToolEnvironment,
        _cancel: &CancellationToken,
    ) -> Result<String, CollaboratorError> {
        (self.0)(command, input, tools)
    }
}

/// Re-invokes the command under test with an arbitrary input
pub type CommandFn<'a> = dyn FnMut(&str) -> Result<String, CollaboratorError> + 'a;

/// Detects injection and traversal weaknesses in a command
pub trait SecurityTestSuite: Send + Sync {
    fn run_comprehensive_security_tests(
        &self,
        command_fn: &mut CommandFn<'_>,
        command_name: &str,
    ) -> Result<SecurityReport, CollaboratorError>;
}

/// Inputs to a qualitative evaluation
#[derive(Debug, Clone, Copy)]
pub struct EvaluationRequest<'a> {
    pub command_name: &'a str,
    pub input: &'a str,
    pub output: &'a str,
    pub expected_behavior: &'a str,
    pub metrics: &'a BTreeSet<EvaluationMetric>,
}

/// Scores a command's output along the requested metrics
pub trait CommandEvaluator: Send + Sync {
    fn evaluate_command(
        &self,
        request: &EvaluationRequest<'_>,
    ) -> Result<EvaluationReport, CollaboratorError>;
}

/// Security suite that returns a fixed verdict without probing
#[derive(Debug, Clone, Copy)]
pub struct StaticSecuritySuite {
    compliance: ComplianceStatus,
}

impl StaticSecuritySuite {
    pub fn new(compliance: ComplianceStatus) -> Self {
        Self { compliance }
    }
}

impl SecurityTestSuite for StaticSecuritySuite {
    fn run_comprehensive_security_tests(
        &self,
        _command_fn: &mut CommandFn<'_>,
        command_name: &str,
    ) -> Result<SecurityReport, CollaboratorError> {
        Ok(SecurityReport::verdict(command_name, self.compliance))
    }
}

/// Evaluator that gives every requested metric the same score
#[derive(Debug, Clone, Copy)]
pub struct StaticEvaluator {
    score: f64,
}

impl StaticEvaluator {
    pub fn new(score: f64) -> Self {
        Self {
            score: score.clamp(0.0, 1.0),
        }
    }
}

impl CommandEvaluator for StaticEvaluator {
    fn evaluate_command(
        &self,
        request: &EvaluationRequest<'_>,
    ) -> Result<EvaluationReport, CollaboratorError> {
        let scores: BTreeMap<EvaluationMetric, MetricScore> = request
            .metrics
            .iter()
            .map(|metric| (*metric, MetricScore::new(self.score, "static score")))
            .collect();
        Ok(EvaluationReport::from_metric_scores(request.command_name, scores))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::InMemoryToolEnvironment;
    use cmdcheck_types::{default_metrics, ToolCall};

    #[test]
    fn test_static_evaluator_scores_requested_metrics() {
        let metrics = default_metrics();
        let request = EvaluationRequest {
            command_name: "task",
            input: "in",
            output: "out",
            expected_behavior: "works",
            metrics: &metrics,
        };
        let report = StaticEvaluator::new(0.75).evaluate_command(&request).unwrap();
        assert_eq!(report.metric_scores.len(), 3);
        assert!((report.overall_score - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_static_evaluator_clamps() {
        let metrics = default_metrics();
        let request = EvaluationRequest {
            command_name: "task",
            input: "",
            output: "",
            expected_behavior: "",
            metrics: &metrics,
        };
        let report = StaticEvaluator::new(4.0).evaluate_command(&request).unwrap();
        assert!((report.overall_score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_static_security_verdict() {
        let mut command = |input: &str| Ok::<_, CollaboratorError>(input.to_string());
        let report = StaticSecuritySuite::new(ComplianceStatus::Fail)
            .run_comprehensive_security_tests(&mut command, "task")
            .unwrap();
        assert_eq!(report.compliance_status, ComplianceStatus::Fail);
        assert_eq!(report.command_name, "task");
    }

    #[test]
    fn test_closure_simulator_routes_tools() {
        let simulator = simulator_fn(|command, input, tools| {
            tools.route_tool_call(ToolCall::new("Read").arg("file_path", "/project/README.md"))?;
            Ok(format!("{}: {}", command.name, input))
        });
        let mut env = InMemoryToolEnvironment::new();
        let output = simulator
            .simulate(
                &Command::new("task", "task.md"),
                "go",
                &mut env,
                &CancellationToken::new(),
            )
            .unwrap();
        assert_eq!(output, "task: go");
        assert!(env.get_execution_summary().tools_used.contains("Read"));
    }
}
