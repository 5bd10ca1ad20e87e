//! Preview the generated suite for a command

use super::load_registry;
use crate::error::{CliError, CliResult};
use crate::output::{self, OutputFormat};
use cmdcheck_harness::{HarnessConfig, RunContext, TestCaseGenerator};
use cmdcheck_types::FunctionalTestCase;
use serde::Serialize;
use tabled::Tabled;

/// Table row for generated test cases
#[derive(Debug, Serialize, Tabled)]
struct CaseRow {
    id: String,
    kind: String,
    critical: bool,
    #[tabled(rename = "expected tools")]
    expected_tools: String,
    input: String,
}

impl From<&FunctionalTestCase> for CaseRow {
    fn from(case: &FunctionalTestCase) -> Self {
        Self {
            id: case.test_id.to_string(),
            kind: case.kind.to_string(),
            critical: case.security_critical,
            expected_tools: case
                .expected_tools
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", "),
            input: case.input_data.clone(),
        }
    }
}

pub fn execute(config: &HarnessConfig, name: &str, format: OutputFormat) -> CliResult<()> {
    let registry = load_registry(config)?;
    let command = registry
        .get_command_by_name(name)
        .ok_or_else(|| CliError::NotFound(format!("command {}", name)))?;

    let generator = TestCaseGenerator::new(config.thresholds.performance_threshold_ms);
    let suite = generator.generate_suite(&mut RunContext::new(), &command);

    match format {
        OutputFormat::Table => {
            let rows: Vec<CaseRow> = suite
                .iter()
                .map(|case| CaseRow::from(case.as_ref()))
                .collect();
            output::print_output(rows, format)
        }
        OutputFormat::Json | OutputFormat::Yaml => {
            let cases: Vec<&FunctionalTestCase> = suite.iter().map(|case| case.as_ref()).collect();
            output::print_single(&cases, format)
        }
    }
}
