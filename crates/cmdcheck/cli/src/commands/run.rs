//! Execute command suites and report

use super::load_registry;
use crate::error::{CliError, CliResult};
use crate::output::{self, status_marker, OutputFormat};
use clap::Args;
use cmdcheck_harness::{
    ConcurrencyController, FunctionalReport, HarnessConfig, RunContext, TestExecutor,
};
use cmdcheck_types::FunctionalTestResult;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tabled::Tabled;
use tracing::info;

/// Run options; each overrides the matching config value
#[derive(Debug, Clone, Default, Args)]
pub struct RunArgs {
    /// Only run the suite for this command
    #[arg(long)]
    pub command: Option<String>,

    /// Run tests one at a time
    #[arg(long)]
    pub sequential: bool,

    /// Worker pool size
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Hard per-test timeout in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Write the JSON report to this path
    #[arg(short, long)]
    pub report: Option<PathBuf>,

    /// Exit with an error when any test fails or errors
    #[arg(long)]
    pub strict: bool,
}

impl RunArgs {
    pub fn apply(&self, config: &mut HarnessConfig) {
        if self.sequential {
            config.execution.parallel = false;
        }
        if let Some(workers) = self.workers {
            config.execution.workers = workers;
        }
        if let Some(timeout) = self.timeout_ms {
            config.execution.task_timeout_ms = Some(timeout);
        }
        if let Some(report) = &self.report {
            config.report.output = Some(report.clone());
        }
    }
}

/// Table row for a test result
#[derive(Debug, Serialize, Tabled)]
struct ResultRow {
    id: String,
    command: String,
    kind: String,
    status: String,
    #[tabled(rename = "time ms")]
    time_ms: String,
    score: String,
    details: String,
}

impl From<&FunctionalTestResult> for ResultRow {
    fn from(result: &FunctionalTestResult) -> Self {
        let details = result
            .error_details
            .clone()
            .or_else(|| {
                result
                    .tool_usage_validation
                    .as_ref()
                    .filter(|v| !v.missing_tools.is_empty())
                    .map(|v| format!("missing tools: {}", v.missing_tools.join(", ")))
            })
            .or_else(|| result.warnings.first().cloned())
            .unwrap_or_default();

        Self {
            id: result.test_case.test_id.to_string(),
            command: result.command_name().to_string(),
            kind: result.test_case.kind.to_string(),
            status: status_marker(result.status),
            time_ms: format!("{:.1}", result.execution_time_ms),
            score: result
                .overall_score()
                .map(|s| format!("{:.2}", s))
                .unwrap_or_else(|| "-".to_string()),
            details,
        }
    }
}

#[derive(Serialize)]
struct RunOutput<'a> {
    report: &'a FunctionalReport,
    results: &'a [FunctionalTestResult],
}

pub fn execute(args: RunArgs, mut config: HarnessConfig, format: OutputFormat) -> CliResult<()> {
    args.apply(&mut config);
    config.validate()?;

    let registry = Arc::new(load_registry(&config)?);
    if registry.is_empty() {
        output::print_warning(&format!(
            "No commands found in {}",
            config.commands_dir.display()
        ));
    }

    let executor = TestExecutor::from_config(Arc::clone(&registry), &config);
    let controller = ConcurrencyController::from_config(executor, &config);
    let mut ctx = RunContext::new();
    info!(run_id = %ctx.run_id(), mode = %controller.mode(), "Starting run");

    match &args.command {
        Some(name) => {
            controller.run_command(&mut ctx, name)?;
        }
        None => {
            controller.run_all(&mut ctx);
        }
    }

    let results = controller.results();
    let report = FunctionalReport::aggregate(&results, ctx.run_id());

    if let Some(path) = &config.report.output {
        report.write_to(path)?;
    }

    match format {
        OutputFormat::Table => {
            let rows: Vec<ResultRow> = results.iter().map(ResultRow::from).collect();
            output::print_output(rows, format)?;
            println!();
            print!("{}", report.to_text());
            if let Some(path) = &config.report.output {
                output::print_success(&format!("Report written to {}", path.display()));
            }
        }
        OutputFormat::Json | OutputFormat::Yaml => {
            let run = RunOutput {
                report: &report,
                results: &results,
            };
            output::print_single(&run, format)?;
        }
    }

    if args.strict && !report.all_passed() {
        return Err(CliError::TestsFailed {
            failed: report.summary.failed,
            errors: report.summary.errors,
        });
    }

    Ok(())
}
