//! Sequential and pooled execution of generated test suites
//!
//! Each worker owns its tool environment. Results land in a shared
//! [`ResultLog`] in completion order, one per submitted case.

use crate::config::HarnessConfig;
use crate::context::{CancellationToken, RunContext};
use crate::environment::ToolEnvironment;
use crate::error::{HarnessError, HarnessResult};
use crate::executor::TestExecutor;
use crate::generator::TestCaseGenerator;
use cmdcheck_types::{FunctionalTestCase, FunctionalTestResult, TestKind, TestStatus};
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// How a suite is scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    Sequential,
    Parallel { workers: usize },
}

impl ExecutionMode {
    pub fn from_config(config: &HarnessConfig) -> Self {
        if config.execution.parallel {
            ExecutionMode::Parallel {
                workers: config.execution.workers.max(1),
            }
        } else {
            ExecutionMode::Sequential
        }
    }
}

impl Default for ExecutionMode {
    fn default() -> Self {
        ExecutionMode::Parallel {
            workers: crate::config::DEFAULT_WORKERS,
        }
    }
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionMode::Sequential => write!(f, "sequential"),
            ExecutionMode::Parallel { workers } => write!(f, "parallel({})", workers),
        }
    }
}

/// Append-only result list shared by workers
#[derive(Debug, Default)]
pub struct ResultLog {
    results: Mutex<Vec<FunctionalTestResult>>,
}

impl ResultLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, result: FunctionalTestResult) {
        self.results.lock().push(result);
    }

    /// Copy of everything recorded so far
    pub fn snapshot(&self) -> Vec<FunctionalTestResult> {
        self.results.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.results.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.lock().is_empty()
    }
}

/// Runs suites through a [`TestExecutor`]
pub struct ConcurrencyController {
    executor: Arc<TestExecutor>,
    generator: TestCaseGenerator,
    mode: ExecutionMode,
    task_timeout: Option<Duration>,
    skip_kinds: BTreeSet<TestKind>,
    log: ResultLog,
}

impl ConcurrencyController {
    pub fn new(executor: TestExecutor) -> Self {
        Self {
            executor: Arc::new(executor),
            generator: TestCaseGenerator::default(),
            mode: ExecutionMode::default(),
            task_timeout: None,
            skip_kinds: BTreeSet::new(),
            log: ResultLog::new(),
        }
    }

    /// Controller with mode, timeout, skip kinds and thresholds taken from `config`
    pub fn from_config(executor: TestExecutor, config: &HarnessConfig) -> Self {
        Self::new(executor)
            .with_mode(ExecutionMode::from_config(config))
            .with_task_timeout(config.execution.task_timeout())
            .with_skip_kinds(config.generation.skip_kinds.iter().copied())
            .with_generator(TestCaseGenerator::new(
                config.thresholds.performance_threshold_ms,
            ))
    }

    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_task_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.task_timeout = timeout;
        self
    }

    pub fn with_skip_kinds(mut self, kinds: impl IntoIterator<Item = TestKind>) -> Self {
        self.skip_kinds = kinds.into_iter().collect();
        self
    }

    pub fn with_generator(mut self, generator: TestCaseGenerator) -> Self {
        self.generator = generator;
        self
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    pub fn executor(&self) -> &TestExecutor {
        &self.executor
    }

    pub fn generator(&self) -> &TestCaseGenerator {
        &self.generator
    }

    /// Every result recorded by this controller
    pub fn results(&self) -> Vec<FunctionalTestResult> {
        self.log.snapshot()
    }

    pub fn log(&self) -> &ResultLog {
        &self.log
    }

    /// Generate, execute and record the suite for one command
    pub fn run_command(
        &self,
        ctx: &mut RunContext,
        name: &str,
    ) -> HarnessResult<Vec<FunctionalTestResult>> {
        let command = self
            .executor
            .commands()
            .get_command_by_name(name)
            .ok_or_else(|| HarnessError::CommandNotFound(name.to_string()))?;

        let cases = self.generator.generate_suite(ctx, &command);
        info!(
            command = %command.name,
            cases = cases.len(),
            mode = %self.mode,
            "Running command suite"
        );

        let results = self.execute_cases(ctx, cases);

        let count = |status: TestStatus| results.iter().filter(|r| r.status == status).count();
        info!(
            command = %command.name,
            passed = count(TestStatus::Passed),
            failed = count(TestStatus::Failed),
            errors = count(TestStatus::Error),
            skipped = count(TestStatus::Skipped),
            "Command suite complete"
        );

        Ok(results)
    }

    /// Run every loaded command in name order
    pub fn run_all(&self, ctx: &mut RunContext) -> BTreeMap<String, Vec<FunctionalTestResult>> {
        let names: Vec<String> = self
            .executor
            .commands()
            .names()
            .map(str::to_string)
            .collect();

        let mut by_command = BTreeMap::new();
        for name in names {
            let results = match self.run_command(ctx, &name) {
                Ok(results) => results,
                Err(e) => {
                    warn!(command = %name, error = %e, "Command suite failed");
                    Vec::new()
                }
            };
            by_command.insert(name, results);
        }
        by_command
    }

    /// Execute already generated cases. Returns this batch's results, which are
    /// also recorded in the log.
    pub fn execute_cases(
        &self,
        ctx: &RunContext,
        cases: Vec<Arc<FunctionalTestCase>>,
    ) -> Vec<FunctionalTestResult> {
        let batch = Mutex::new(Vec::with_capacity(cases.len()));

        let mut runnable = Vec::with_capacity(cases.len());
        for case in cases {
            if self.skip_kinds.contains(&case.kind) {
                debug!(test_id = %case.test_id, kind = ?case.kind, "Skipping test kind");
                self.record(
                    &batch,
                    FunctionalTestResult::skipped(case, "test kind skipped by configuration"),
                );
            } else {
                runnable.push(case);
            }
        }

        match self.mode {
            ExecutionMode::Sequential => {
                let mut environment = None;
                for case in runnable {
                    let result = self.run_or_skip(ctx, case, &mut environment);
                    self.record(&batch, result);
                }
            }
            ExecutionMode::Parallel { workers } => {
                self.run_pool(ctx, runnable, workers, &batch);
            }
        }

        batch.into_inner()
    }

    fn run_pool(
        &self,
        ctx: &RunContext,
        cases: Vec<Arc<FunctionalTestCase>>,
        workers: usize,
        batch: &Mutex<Vec<FunctionalTestResult>>,
    ) {
        if cases.is_empty() {
            return;
        }
        let workers = workers.clamp(1, cases.len());
        let queue = Mutex::new(cases.into_iter());

        std::thread::scope(|scope| {
            for worker in 0..workers {
                let queue = &queue;
                scope.spawn(move || {
                    let mut environment = None;
                    loop {
                        let next = queue.lock().next();
                        let Some(case) = next else { break };
                        let result = self.run_or_skip(ctx, case, &mut environment);
                        self.record(batch, result);
                    }
                    debug!(worker, "Worker drained queue");
                });
            }
        });
    }

    fn record(&self, batch: &Mutex<Vec<FunctionalTestResult>>, result: FunctionalTestResult) {
        self.log.push(result.clone());
        batch.lock().push(result);
    }

    fn run_or_skip(
        &self,
        ctx: &RunContext,
        case: Arc<FunctionalTestCase>,
        environment: &mut Option<Box<dyn ToolEnvironment>>,
    ) -> FunctionalTestResult {
        if ctx.cancellation().is_cancelled() {
            return FunctionalTestResult::skipped(case, "run cancelled before the test started");
        }

        match self.task_timeout {
            None => {
                let env = environment.get_or_insert_with(|| ctx.new_environment());
                self.executor
                    .execute_test_case(case, env.as_mut(), ctx.cancellation())
            }
            Some(limit) => self.run_with_timeout(ctx, case, environment, limit),
        }
    }

    /// Run on a dedicated thread and stop waiting after `limit`.
    ///
    /// A timed out task keeps its environment; the worker builds a new one
    /// for its next case.
    fn run_with_timeout(
        &self,
        ctx: &RunContext,
        case: Arc<FunctionalTestCase>,
        environment: &mut Option<Box<dyn ToolEnvironment>>,
        limit: Duration,
    ) -> FunctionalTestResult {
        let mut env = environment
            .take()
            .unwrap_or_else(|| ctx.new_environment());
        let token = CancellationToken::new();
        let (tx, rx) = mpsc::channel();
        let start = Instant::now();

        let executor = Arc::clone(&self.executor);
        let task_case = Arc::clone(&case);
        let task_token = token.clone();
        let spawned = std::thread::Builder::new()
            .name(format!("cmdcheck-{}", case.test_id))
            .spawn(move || {
                let result = executor.execute_test_case(task_case, env.as_mut(), &task_token);
                // The receiver is gone once the worker has given up on this task
                let _ = tx.send((result, env));
            });

        if let Err(e) = spawned {
            return FunctionalTestResult::error(
                case,
                format!("failed to spawn test thread: {}", e),
                0.0,
            );
        }

        match rx.recv_timeout(limit) {
            Ok((result, env)) => {
                *environment = Some(env);
                result
            }
            Err(RecvTimeoutError::Timeout) => {
                token.cancel();
                warn!(
                    test_id = %case.test_id,
                    command = %case.command_name,
                    limit_ms = limit.as_millis() as u64,
                    "Test timed out"
                );
                let elapsed = start.elapsed().as_secs_f64() * 1000.0;
                FunctionalTestResult::error(
                    case,
                    format!("timed out after {} ms", limit.as_millis()),
                    elapsed,
                )
            }
            Err(RecvTimeoutError::Disconnected) => {
                let elapsed = start.elapsed().as_secs_f64() * 1000.0;
                FunctionalTestResult::error(case, "test thread exited without a result", elapsed)
            }
        }
    }
}
