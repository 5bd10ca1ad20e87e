//! Single-test execution pipeline
//!
//! Reset, simulate, validate tool usage, consult the security suite and the
//! evaluator, snapshot the environment, then decide a status. Every failure
//! inside the pipeline, including a collaborator panic, ends as an `Error`
//! result that keeps whatever sub-reports were gathered before it.

use crate::collaborators::{
    CommandEvaluator, CommandSimulator, EvaluationRequest, SecurityTestSuite, StaticEvaluator,
    StaticSecuritySuite,
};
use crate::config::{HarnessConfig, DEFAULT_MIN_OVERALL_SCORE};
use crate::context::CancellationToken;
use crate::environment::ToolEnvironment;
use crate::error::{HarnessError, HarnessResult};
use crate::loader::CommandRegistry;
use crate::simulator::TemplateSimulator;
use cmdcheck_types::{
    CollaboratorError, ComplianceStatus, EvaluationReport, ExecutionSummary, FunctionalTestCase,
    FunctionalTestResult, SecurityReport, TestStatus, ToolUsageValidation,
};
use std::any::Any;
use std::collections::BTreeSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Thresholds applied when deciding a test's status
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusPolicy {
    pub min_overall_score: f64,
}

impl Default for StatusPolicy {
    fn default() -> Self {
        Self {
            min_overall_score: DEFAULT_MIN_OVERALL_SCORE,
        }
    }
}

/// Reconcile expected tools against what the environment saw
pub fn validate_tool_usage(
    expected_tools: &BTreeSet<String>,
    summary: &ExecutionSummary,
) -> ToolUsageValidation {
    let missing_tools: Vec<String> = expected_tools
        .difference(&summary.tools_used)
        .cloned()
        .collect();
    let unexpected_tools: Vec<String> = summary
        .tools_used
        .difference(expected_tools)
        .cloned()
        .collect();

    ToolUsageValidation {
        expected_tools: expected_tools.clone(),
        actual_tools_used: summary.tools_used.clone(),
        tools_validation_passed: missing_tools.is_empty(),
        missing_tools,
        unexpected_tools,
        tool_call_count: summary.total_tool_calls,
    }
}

/// Decide a completed test's status. The first failing rule wins:
/// elapsed time, missing tools, security compliance, evaluator score.
pub fn determine_status(
    test_case: &FunctionalTestCase,
    execution_time_ms: f64,
    validation: &ToolUsageValidation,
    security: Option<&SecurityReport>,
    evaluation: Option<&EvaluationReport>,
    policy: &StatusPolicy,
) -> TestStatus {
    if execution_time_ms > test_case.performance_threshold_ms {
        return TestStatus::Failed;
    }

    if !validation.missing_tools.is_empty() {
        return TestStatus::Failed;
    }

    if test_case.security_critical {
        let compliant = security
            .map(|report| report.compliance_status == ComplianceStatus::Pass)
            .unwrap_or(false);
        if !compliant {
            return TestStatus::Failed;
        }
    }

    let score = evaluation.map(|report| report.overall_score).unwrap_or(0.0);
    if score < policy.min_overall_score {
        return TestStatus::Failed;
    }

    TestStatus::Passed
}

/// Sub-results collected as the pipeline advances
#[derive(Default)]
struct Collected {
    validation: Option<ToolUsageValidation>,
    security: Option<SecurityReport>,
    evaluation: Option<EvaluationReport>,
    snapshot: Option<serde_json::Value>,
}

/// Runs test cases against the loaded commands and the collaborators
pub struct TestExecutor {
    commands: Arc<CommandRegistry>,
    simulator: Arc<dyn CommandSimulator>,
    security: Arc<dyn SecurityTestSuite>,
    evaluator: Arc<dyn CommandEvaluator>,
    policy: StatusPolicy,
}

impl TestExecutor {
    /// Executor with the built-in simulator, a passing security suite and a 0.8 evaluator
    pub fn new(commands: Arc<CommandRegistry>) -> Self {
        Self {
            commands,
            simulator: Arc::new(TemplateSimulator::new()),
            security: Arc::new(StaticSecuritySuite::new(ComplianceStatus::Pass)),
            evaluator: Arc::new(StaticEvaluator::new(0.8)),
            policy: StatusPolicy::default(),
        }
    }

    /// Executor with built-in collaborators configured from `config`
    pub fn from_config(commands: Arc<CommandRegistry>, config: &HarnessConfig) -> Self {
        Self::new(commands)
            .with_security_suite(Arc::new(StaticSecuritySuite::new(
                config.collaborators.security_compliance,
            )))
            .with_evaluator(Arc::new(StaticEvaluator::new(
                config.collaborators.evaluator_score,
            )))
            .with_policy(StatusPolicy {
                min_overall_score: config.thresholds.min_overall_score,
            })
    }

    pub fn with_simulator(mut self, simulator: Arc<dyn CommandSimulator>) -> Self {
        self.simulator = simulator;
        self
    }

    pub fn with_security_suite(mut self, security: Arc<dyn SecurityTestSuite>) -> Self {
        self.security = security;
        self
    }

    pub fn with_evaluator(mut self, evaluator: Arc<dyn CommandEvaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }

    pub fn with_policy(mut self, policy: StatusPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn commands(&self) -> &Arc<CommandRegistry> {
        &self.commands
    }

    pub fn policy(&self) -> &StatusPolicy {
        &self.policy
    }

    /// Execute one test case. Never fails and never unwinds.
    pub fn execute_test_case(
        &self,
        test_case: Arc<FunctionalTestCase>,
        environment: &mut dyn ToolEnvironment,
        cancel: &CancellationToken,
    ) -> FunctionalTestResult {
        let start = Instant::now();
        let mut collected = Collected::default();

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.run_pipeline(&test_case, environment, cancel, &mut collected)
        }));
        let execution_time_ms = start.elapsed().as_secs_f64() * 1000.0;

        let mut result =
            FunctionalTestResult::new(Arc::clone(&test_case), TestStatus::Error, execution_time_ms);

        let failure = match outcome {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e.to_string()),
            Err(payload) => Some(format!("panicked: {}", panic_message(payload.as_ref()))),
        };

        match failure {
            None => {
                if let Some(validation) = &collected.validation {
                    result.status = determine_status(
                        &test_case,
                        execution_time_ms,
                        validation,
                        collected.security.as_ref(),
                        collected.evaluation.as_ref(),
                        &self.policy,
                    );
                    if !validation.unexpected_tools.is_empty() {
                        result.add_warning(format!(
                            "Unexpected tools used: {}",
                            validation.unexpected_tools.join(", ")
                        ));
                    }
                }
            }
            Some(details) => {
                warn!(
                    test_id = %test_case.test_id,
                    command = %test_case.command_name,
                    error = %details,
                    "Test errored"
                );
                result.error_details = Some(details);
            }
        }

        result.tool_usage_validation = collected.validation;
        result.security_report = collected.security;
        result.llm_report = collected.evaluation;
        result.environment_snapshot = collected.snapshot;

        debug!(
            test_id = %test_case.test_id,
            command = %test_case.command_name,
            status = %result.status,
            elapsed_ms = execution_time_ms,
            "Test finished"
        );

        result
    }

    fn run_pipeline(
        &self,
        test_case: &FunctionalTestCase,
        environment: &mut dyn ToolEnvironment,
        cancel: &CancellationToken,
        collected: &mut Collected,
    ) -> HarnessResult<()> {
        environment.reset_environment()?;

        let command = self
            .commands
            .get_command_by_name(&test_case.command_name)
            .ok_or_else(|| HarnessError::CommandNotFound(test_case.command_name.clone()))?;

        check_cancelled(cancel)?;
        let output =
            self.simulator
                .simulate(&command, &test_case.input_data, environment, cancel)?;

        let validation =
            validate_tool_usage(&test_case.expected_tools, &environment.get_execution_summary());
        collected.validation = Some(validation);

        if test_case.security_critical {
            check_cancelled(cancel)?;
            let simulator = &self.simulator;
            let mut rerun = |input: &str| simulator.simulate(&command, input, environment, cancel);
            let report = self
                .security
                .run_comprehensive_security_tests(&mut rerun, &command.name)?;
            collected.security = Some(report);
        }

        check_cancelled(cancel)?;
        let request = EvaluationRequest {
            command_name: &command.name,
            input: &test_case.input_data,
            output: &output,
            expected_behavior: &test_case.expected_behavior,
            metrics: &test_case.evaluation_metrics,
        };
        collected.evaluation = Some(self.evaluator.evaluate_command(&request)?);

        collected.snapshot = Some(environment.export_state()?);
        Ok(())
    }
}

fn check_cancelled(cancel: &CancellationToken) -> Result<(), CollaboratorError> {
    if cancel.is_cancelled() {
        Err(CollaboratorError::Cancelled)
    } else {
        Ok(())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::simulator_fn;
    use crate::environment::InMemoryToolEnvironment;
    use cmdcheck_types::{default_metrics, Command, TestId, TestKind, ToolCall};
    use proptest::prelude::*;

    fn registry() -> Arc<CommandRegistry> {
        let mut registry = CommandRegistry::new();
        registry.insert(Command::new("task", "task.md").with_allowed_tools(["Read", "Write"]));
        Arc::new(registry)
    }

    fn case(expected: &[&str], security_critical: bool) -> Arc<FunctionalTestCase> {
        Arc::new(FunctionalTestCase {
            test_id: TestId(1),
            command_name: "task".to_string(),
            description: "scenario".to_string(),
            kind: TestKind::ToolIntegration,
            input_data: "read the README".to_string(),
            expected_tools: expected.iter().map(|t| t.to_string()).collect(),
            expected_behavior: "summarizes".to_string(),
            security_critical,
            performance_threshold_ms: 30_000.0,
            evaluation_metrics: default_metrics(),
        })
    }

    fn reads_readme() -> Arc<dyn CommandSimulator> {
        Arc::new(simulator_fn(|_, _, tools| {
            tools.route_tool_call(ToolCall::new("Read").arg("file_path", "/project/README.md"))?;
            Ok("summary".to_string())
        }))
    }

    fn run(executor: &TestExecutor, case: Arc<FunctionalTestCase>) -> FunctionalTestResult {
        let mut env = InMemoryToolEnvironment::new();
        executor.execute_test_case(case, &mut env, &CancellationToken::new())
    }

    #[test]
    fn test_expected_tool_used_passes() {
        let executor = TestExecutor::new(registry()).with_simulator(reads_readme());
        let result = run(&executor, case(&["Read"], false));

        assert_eq!(result.status, TestStatus::Passed);
        let validation = result.tool_usage_validation.unwrap();
        assert!(validation.missing_tools.is_empty());
        assert!(validation.tools_validation_passed);
        assert!(result.environment_snapshot.is_some());
        assert!(result.security_report.is_none());
    }

    #[test]
    fn test_missing_tool_fails_regardless_of_score() {
        let executor = TestExecutor::new(registry())
            .with_simulator(Arc::new(simulator_fn(|_, _, _| Ok("no tools".to_string()))))
            .with_evaluator(Arc::new(StaticEvaluator::new(1.0)));
        let result = run(&executor, case(&["Read"], false));

        assert_eq!(result.status, TestStatus::Failed);
        assert_eq!(
            result.tool_usage_validation.unwrap().missing_tools,
            vec!["Read".to_string()]
        );
    }

    #[test]
    fn test_security_failure_overrides_perfect_run() {
        let executor = TestExecutor::new(registry())
            .with_simulator(reads_readme())
            .with_security_suite(Arc::new(StaticSecuritySuite::new(ComplianceStatus::Fail)))
            .with_evaluator(Arc::new(StaticEvaluator::new(1.0)));
        let result = run(&executor, case(&["Read"], true));

        assert_eq!(result.status, TestStatus::Failed);
        assert_eq!(
            result.security_report.unwrap().compliance_status,
            ComplianceStatus::Fail
        );
    }

    #[test]
    fn test_low_score_fails() {
        let executor = TestExecutor::new(registry())
            .with_simulator(reads_readme())
            .with_evaluator(Arc::new(StaticEvaluator::new(0.5)));
        assert_eq!(run(&executor, case(&["Read"], false)).status, TestStatus::Failed);
    }

    #[test]
    fn test_unexpected_tool_is_a_warning() {
        let executor = TestExecutor::new(registry()).with_simulator(reads_readme());
        let result = run(&executor, case(&[], false));

        assert_eq!(result.status, TestStatus::Passed);
        assert_eq!(result.warnings, vec!["Unexpected tools used: Read".to_string()]);
    }

    #[test]
    fn test_unknown_command_errors() {
        let executor = TestExecutor::new(Arc::new(CommandRegistry::new()));
        let result = run(&executor, case(&[], false));

        assert_eq!(result.status, TestStatus::Error);
        assert!(result.error_details.unwrap().contains("task"));
        assert!(result.tool_usage_validation.is_none());
    }

    #[test]
    fn test_simulator_panic_becomes_error() {
        let executor = TestExecutor::new(registry())
            .with_simulator(Arc::new(simulator_fn(|_, _, _| panic!("simulator exploded"))));
        let result = run(&executor, case(&[], false));

        assert_eq!(result.status, TestStatus::Error);
        assert!(result.error_details.unwrap().contains("simulator exploded"));
    }

    struct FailingEvaluator;

    impl CommandEvaluator for FailingEvaluator {
        fn evaluate_command(
            &self,
            _request: &EvaluationRequest<'_>,
        ) -> Result<EvaluationReport, CollaboratorError> {
            Err(CollaboratorError::Evaluator("model unavailable".into()))
        }
    }

    #[test]
    fn test_partial_results_kept_on_error() {
        let executor = TestExecutor::new(registry())
            .with_simulator(reads_readme())
            .with_evaluator(Arc::new(FailingEvaluator));
        let result = run(&executor, case(&["Read"], true));

        assert_eq!(result.status, TestStatus::Error);
        assert!(result.error_details.unwrap().contains("model unavailable"));
        assert!(result.tool_usage_validation.is_some());
        assert!(result.security_report.is_some());
        assert!(result.llm_report.is_none());
    }

    #[test]
    fn test_cancelled_token_errors() {
        let executor = TestExecutor::new(registry());
        let token = CancellationToken::new();
        token.cancel();
        let mut env = InMemoryToolEnvironment::new();
        let result = executor.execute_test_case(case(&[], false), &mut env, &token);

        assert_eq!(result.status, TestStatus::Error);
        assert_eq!(result.error_details.as_deref(), Some("cancelled"));
    }

    #[test]
    fn test_rerun_after_reset_is_independent() {
        let executor = TestExecutor::new(registry()).with_simulator(reads_readme());
        let mut env = InMemoryToolEnvironment::new();
        let token = CancellationToken::new();
        let first = executor.execute_test_case(case(&["Read"], false), &mut env, &token);
        let second = executor.execute_test_case(case(&["Read"], false), &mut env, &token);

        assert_eq!(first.status, second.status);
        assert_eq!(
            first.tool_usage_validation.unwrap().tool_call_count,
            second.tool_usage_validation.unwrap().tool_call_count
        );
    }

    #[test]
    fn test_slash_prefixed_case_resolves() {
        let executor = TestExecutor::new(registry()).with_simulator(reads_readme());
        let mut slashed = (*case(&["Read"], false)).clone();
        slashed.command_name = "/task".to_string();
        assert_eq!(run(&executor, Arc::new(slashed)).status, TestStatus::Passed);
    }

    fn tool_set() -> impl Strategy<Value = BTreeSet<String>> {
        prop::collection::btree_set(
            prop::sample::select(vec!["Read", "Write", "Edit", "Bash", "Grep"])
                .prop_map(str::to_string),
            0..5,
        )
    }

    proptest! {
        #[test]
        fn prop_validation_is_deterministic(expected in tool_set(), used in tool_set()) {
            let summary = ExecutionSummary {
                total_tool_calls: used.len(),
                successful_calls: used.len(),
                tools_used: used,
                failed_calls: 0,
            };
            let a = validate_tool_usage(&expected, &summary);
            let b = validate_tool_usage(&expected, &summary);
            prop_assert_eq!(&a, &b);
            prop_assert_eq!(a.tools_validation_passed, expected.is_subset(&summary.tools_used));
            for tool in &a.missing_tools {
                prop_assert!(expected.contains(tool) && !summary.tools_used.contains(tool));
            }
        }

        #[test]
        fn prop_status_precedence(
            elapsed in 0.0f64..2000.0,
            threshold in 1.0f64..1000.0,
            missing in any::<bool>(),
            critical in any::<bool>(),
            compliance in prop::option::of(prop::bool::ANY),
            score in 0.0f64..=1.0,
        ) {
            let mut test_case = (*case(&[], critical)).clone();
            test_case.performance_threshold_ms = threshold;

            let expected_tools: BTreeSet<String> = if missing {
                ["Read".to_string()].into_iter().collect()
            } else {
                BTreeSet::new()
            };
            let validation = validate_tool_usage(&expected_tools, &ExecutionSummary::default());
            let security = compliance.map(|pass| {
                SecurityReport::verdict(
                    "task",
                    if pass { ComplianceStatus::Pass } else { ComplianceStatus::Fail },
                )
            });
            let evaluation = EvaluationReport::from_metric_scores(
                "task",
                default_metrics()
                    .into_iter()
                    .map(|m| (m, cmdcheck_types::MetricScore::new(score, "")))
                    .collect(),
            );
            let policy = StatusPolicy::default();

            let status = determine_status(
                &test_case,
                elapsed,
                &validation,
                security.as_ref(),
                Some(&evaluation),
                &policy,
            );

            let should_pass = elapsed <= threshold
                && !missing
                && (!critical || compliance == Some(true))
                && evaluation.overall_score >= policy.min_overall_score;

            prop_assert!(status == TestStatus::Passed || status == TestStatus::Failed);
            prop_assert_eq!(status == TestStatus::Passed, should_pass);
            if elapsed > threshold {
                prop_assert_eq!(status, TestStatus::Failed);
            }
        }
    }
}
