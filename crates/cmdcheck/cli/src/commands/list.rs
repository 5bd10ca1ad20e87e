//! List loaded commands

use super::load_registry;
use crate::error::CliResult;
use crate::output::{self, OutputFormat};
use cmdcheck_harness::HarnessConfig;
use cmdcheck_types::Command;
use serde::Serialize;
use tabled::Tabled;

/// Table row for command display
#[derive(Debug, Serialize, Tabled)]
struct CommandRow {
    name: String,
    tools: String,
    #[tabled(rename = "argument hint")]
    argument_hint: String,
    description: String,
    source: String,
}

impl From<&Command> for CommandRow {
    fn from(command: &Command) -> Self {
        Self {
            name: command.name.clone(),
            tools: command
                .allowed_tools
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", "),
            argument_hint: command.argument_hint.clone(),
            description: command.description.clone(),
            source: command.source_path.display().to_string(),
        }
    }
}

pub fn execute(config: &HarnessConfig, format: OutputFormat) -> CliResult<()> {
    let registry = load_registry(config)?;
    let rows: Vec<CommandRow> = registry
        .commands()
        .map(|command| CommandRow::from(command.as_ref()))
        .collect();
    output::print_output(rows, format)
}
