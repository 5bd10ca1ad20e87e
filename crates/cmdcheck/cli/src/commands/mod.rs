//! CLI command implementations

pub mod config;
pub mod generate;
pub mod list;
pub mod run;

use crate::error::{CliError, CliResult};
use cmdcheck_harness::{CommandLoader, CommandRegistry, HarnessConfig};

/// Scan the configured commands directory
pub(crate) fn load_registry(config: &HarnessConfig) -> CliResult<CommandRegistry> {
    if !config.commands_dir.is_dir() {
        return Err(CliError::NotFound(format!(
            "commands directory {}",
            config.commands_dir.display()
        )));
    }

    let mut loader = CommandLoader::new(&config.commands_dir);
    loader.load_all_commands();
    Ok(loader.into_registry())
}
