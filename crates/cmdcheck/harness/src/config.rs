//! Harness configuration
//!
//! Loaded from TOML. Every section is optional; a missing file yields the
//! defaults.
//!
//! ```toml
//! commands_dir = ".claude/commands"
//!
//! [execution]
//! parallel = true
//! workers = 4
//! task_timeout_ms = 60000
//!
//! [thresholds]
//! performance_threshold_ms = 30000.0
//! min_overall_score = 0.6
//!
//! [generation]
//! skip_kinds = ["command_injection"]
//!
//! [collaborators]
//! security_compliance = "PASS"
//! evaluator_score = 0.8
//!
//! [report]
//! output = "functional_report.json"
//! ```

use crate::error::{HarnessError, HarnessResult};
use cmdcheck_types::{ComplianceStatus, TestKind};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_WORKERS: usize = 4;
pub const DEFAULT_PERFORMANCE_THRESHOLD_MS: f64 = 30_000.0;
pub const DEFAULT_MIN_OVERALL_SCORE: f64 = 0.6;

/// Top-level harness configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Directory scanned for `*.md` command files
    pub commands_dir: PathBuf,
    pub execution: ExecutionConfig,
    pub thresholds: ThresholdConfig,
    pub generation: GenerationConfig,
    pub collaborators: CollaboratorConfig,
    pub report: ReportConfig,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            commands_dir: PathBuf::from(".claude/commands"),
            execution: ExecutionConfig::default(),
            thresholds: ThresholdConfig::default(),
            generation: GenerationConfig::default(),
            collaborators: CollaboratorConfig::default(),
            report: ReportConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Run through the worker pool instead of one at a time
    pub parallel: bool,
    pub workers: usize,
    /// Hard per-test limit enforced by the pool
    pub task_timeout_ms: Option<u64>,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            workers: DEFAULT_WORKERS,
            task_timeout_ms: None,
        }
    }
}

impl ExecutionConfig {
    pub fn task_timeout(&self) -> Option<Duration> {
        self.task_timeout_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    /// Stamped onto every generated test case
    pub performance_threshold_ms: f64,
    /// Evaluator scores below this fail the test
    pub min_overall_score: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            performance_threshold_ms: DEFAULT_PERFORMANCE_THRESHOLD_MS,
            min_overall_score: DEFAULT_MIN_OVERALL_SCORE,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Generated cases of these kinds are recorded as skipped
    pub skip_kinds: Vec<TestKind>,
}

/// Settings for the built-in collaborators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollaboratorConfig {
    pub security_compliance: ComplianceStatus,
    pub evaluator_score: f64,
}

impl Default for CollaboratorConfig {
    fn default() -> Self {
        Self {
            security_compliance: ComplianceStatus::Pass,
            evaluator_score: 0.8,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Where to write the JSON report, if anywhere
    pub output: Option<PathBuf>,
}

impl HarnessConfig {
    /// Load configuration from a TOML file, falling back to defaults when it does not exist
    pub fn load(path: impl AsRef<Path>) -> HarnessResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&contents)?;
        debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Parse and validate TOML text
    pub fn from_toml(contents: &str) -> HarnessResult<Self> {
        let config: HarnessConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Render as TOML
    pub fn to_toml(&self) -> HarnessResult<String> {
        toml::to_string_pretty(self).map_err(|e| HarnessError::Serialization(e.to_string()))
    }

    pub fn validate(&self) -> HarnessResult<()> {
        if self.execution.workers == 0 {
            return Err(HarnessError::Config("workers must be at least 1".into()));
        }
        if self.execution.task_timeout_ms == Some(0) {
            return Err(HarnessError::Config("task_timeout_ms must be positive".into()));
        }
        let threshold = self.thresholds.performance_threshold_ms;
        if threshold.is_nan() || threshold <= 0.0 {
            return Err(HarnessError::Config(
                "performance_threshold_ms must be positive".into(),
            ));
        }
        check_unit("min_overall_score", self.thresholds.min_overall_score)?;
        check_unit("evaluator_score", self.collaborators.evaluator_score)?;
        Ok(())
    }
}

fn check_unit(field: &str, value: f64) -> HarnessResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(HarnessError::Config(format!(
            "{} must be within [0, 1], got {}",
            field, value
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HarnessConfig::default();
        assert_eq!(config.execution.workers, 4);
        assert!(config.execution.parallel);
        assert_eq!(config.thresholds.performance_threshold_ms, 30_000.0);
        assert_eq!(config.thresholds.min_overall_score, 0.6);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_missing_config() {
        let config = HarnessConfig::load("/nonexistent/path/cmdcheck.toml").unwrap();
        assert_eq!(config, HarnessConfig::default());
    }

    #[test]
    fn test_partial_toml() {
        let config = HarnessConfig::from_toml(
            r#"
            commands_dir = "cmds"

            [execution]
            workers = 2
            task_timeout_ms = 500

            [generation]
            skip_kinds = ["sql_injection", "empty_input"]

            [collaborators]
            security_compliance = "FAIL"
            "#,
        )
        .unwrap();

        assert_eq!(config.commands_dir, PathBuf::from("cmds"));
        assert_eq!(config.execution.workers, 2);
        assert!(config.execution.parallel);
        assert_eq!(config.execution.task_timeout(), Some(Duration::from_millis(500)));
        assert_eq!(
            config.generation.skip_kinds,
            vec![TestKind::SqlInjection, TestKind::EmptyInput]
        );
        assert_eq!(config.collaborators.security_compliance, ComplianceStatus::Fail);
        assert_eq!(config.thresholds.min_overall_score, 0.6);
    }

    #[test]
    fn test_rejects_zero_workers() {
        let err = HarnessConfig::from_toml("[execution]\nworkers = 0\n").unwrap_err();
        assert!(matches!(err, HarnessError::Config(_)));
    }

    #[test]
    fn test_rejects_out_of_range_scores() {
        assert!(HarnessConfig::from_toml("[thresholds]\nmin_overall_score = 1.5\n").is_err());
        assert!(HarnessConfig::from_toml("[collaborators]\nevaluator_score = -0.1\n").is_err());
    }

    #[test]
    fn test_unknown_skip_kind_is_an_error() {
        assert!(HarnessConfig::from_toml("[generation]\nskip_kinds = [\"fuzz\"]\n").is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = HarnessConfig::default();
        config.report.output = Some(PathBuf::from("out.json"));
        let text = config.to_toml().unwrap();
        assert_eq!(HarnessConfig::from_toml(&text).unwrap(), config);
    }
}
