//! Show the effective configuration

use crate::error::CliResult;
use crate::output::{self, OutputFormat};
use cmdcheck_harness::HarnessConfig;
use std::path::Path;

pub fn execute(config: &HarnessConfig, path: &Path, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Table => {
            if path.exists() {
                output::print_info(&format!("Config file: {}", path.display()));
            } else {
                output::print_info(&format!(
                    "Config file {} not found, showing defaults",
                    path.display()
                ));
            }
            println!();
            println!("{}", config.to_toml()?);
            Ok(())
        }
        OutputFormat::Json | OutputFormat::Yaml => output::print_single(config, format),
    }
}
