//! Report aggregation over accumulated results

use crate::error::HarnessResult;
use chrono::{DateTime, Utc};
use cmdcheck_types::{FunctionalTestResult, TestStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::info;
use uuid::Uuid;

/// Outcome counts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub total_tests: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub skipped: usize,
    /// Percentage of tests that passed
    pub success_rate: f64,
}

/// Execution time statistics in milliseconds
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceStats {
    pub avg_execution_time_ms: f64,
    pub max_execution_time_ms: f64,
    pub min_execution_time_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityStats {
    /// Security-critical tests that were executed (skips excluded)
    pub security_critical_tests: usize,
    pub security_passed: usize,
    /// Percentage; 100 when no security-critical test was executed
    pub security_pass_rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityStats {
    /// Mean evaluator score over results that have one
    pub avg_llm_score: f64,
    pub evaluated_tests: usize,
}

/// Aggregate view of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionalReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub summary: SummaryStats,
    pub performance: PerformanceStats,
    pub security: SecurityStats,
    pub quality: QualityStats,
    pub commands_tested: BTreeSet<String>,
}

impl FunctionalReport {
    /// Project `results` into a report. Safe to call repeatedly and with no results.
    pub fn aggregate(results: &[FunctionalTestResult], run_id: Uuid) -> Self {
        let count = |status: TestStatus| results.iter().filter(|r| r.status == status).count();

        let total_tests = results.len();
        let passed = count(TestStatus::Passed);
        let summary = SummaryStats {
            total_tests,
            passed,
            failed: count(TestStatus::Failed),
            errors: count(TestStatus::Error),
            skipped: count(TestStatus::Skipped),
            success_rate: percentage(passed, total_tests),
        };

        let times: Vec<f64> = results.iter().map(|r| r.execution_time_ms).collect();
        let performance = if times.is_empty() {
            PerformanceStats::default()
        } else {
            PerformanceStats {
                avg_execution_time_ms: times.iter().sum::<f64>() / times.len() as f64,
                max_execution_time_ms: times.iter().copied().fold(f64::MIN, f64::max),
                min_execution_time_ms: times.iter().copied().fold(f64::MAX, f64::min),
            }
        };

        // Skipped cases never reached the security suite
        let critical: Vec<&FunctionalTestResult> = results
            .iter()
            .filter(|r| r.test_case.security_critical && r.status != TestStatus::Skipped)
            .collect();
        let security_passed = critical
            .iter()
            .filter(|r| r.status == TestStatus::Passed)
            .count();
        let security = SecurityStats {
            security_critical_tests: critical.len(),
            security_passed,
            security_pass_rate: if critical.is_empty() {
                100.0
            } else {
                percentage(security_passed, critical.len())
            },
        };

        let scores: Vec<f64> = results.iter().filter_map(|r| r.overall_score()).collect();
        let quality = QualityStats {
            avg_llm_score: if scores.is_empty() {
                0.0
            } else {
                scores.iter().sum::<f64>() / scores.len() as f64
            },
            evaluated_tests: scores.len(),
        };

        Self {
            run_id,
            generated_at: Utc::now(),
            summary,
            performance,
            security,
            quality,
            commands_tested: results.iter().map(|r| r.command_name().to_string()).collect(),
        }
    }

    /// True when nothing failed or errored
    pub fn all_passed(&self) -> bool {
        self.summary.failed == 0 && self.summary.errors == 0
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write the JSON rendering to `path`
    pub fn write_to(&self, path: impl AsRef<Path>) -> HarnessResult<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json()?)?;
        info!(path = %path.display(), "Report written");
        Ok(())
    }

    /// Boxed plain-text summary
    pub fn to_text(&self) -> String {
        let rule = "═".repeat(60);
        let mut output = String::new();

        output.push_str(&format!("╔{}╗\n", rule));
        output.push_str(&boxed_line("Command Functional Test Report"));
        output.push_str(&format!("╠{}╣\n", rule));
        output.push_str(&boxed_line(&format!("Run: {}", self.run_id)));
        output.push_str(&boxed_line(&format!(
            "Generated: {}",
            self.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        )));
        let commands: Vec<&str> = self.commands_tested.iter().map(String::as_str).collect();
        for line in wrap_list("Commands: ", &commands) {
            output.push_str(&boxed_line(&line));
        }
        output.push_str(&format!("╠{}╣\n", rule));

        let s = &self.summary;
        output.push_str(&boxed_line(&format!(
            "Total: {}  Passed: {}  Failed: {}  Errors: {}  Skipped: {}",
            s.total_tests, s.passed, s.failed, s.errors, s.skipped
        )));
        output.push_str(&boxed_line(&format!("Success rate: {:.1}%", s.success_rate)));
        output.push_str(&format!("╟{}╢\n", "─".repeat(60)));

        let p = &self.performance;
        output.push_str(&boxed_line(&format!(
            "Time ms  avg {:.1}  min {:.1}  max {:.1}",
            p.avg_execution_time_ms, p.min_execution_time_ms, p.max_execution_time_ms
        )));
        output.push_str(&boxed_line(&format!(
            "Security: {}/{} passed ({:.1}%)",
            self.security.security_passed,
            self.security.security_critical_tests,
            self.security.security_pass_rate
        )));
        output.push_str(&boxed_line(&format!(
            "Quality: avg score {:.2} over {} evaluated",
            self.quality.avg_llm_score, self.quality.evaluated_tests
        )));
        output.push_str(&format!("╠{}╣\n", rule));

        let verdict = if self.all_passed() {
            "Result: ✓ ALL TESTS PASSED"
        } else {
            "Result: ✗ FAILURES PRESENT"
        };
        output.push_str(&boxed_line(verdict));
        output.push_str(&format!("╚{}╝\n", rule));

        output
    }
}

const BOX_WIDTH: usize = 58;

/// One `║  ...║` row. Pads by character count and truncates overlong text.
fn boxed_line(text: &str) -> String {
    let chars = text.chars().count();
    let cell = if chars > BOX_WIDTH {
        let mut cut: String = text.chars().take(BOX_WIDTH - 3).collect();
        cut.push_str("...");
        cut
    } else {
        format!("{}{}", text, " ".repeat(BOX_WIDTH - chars))
    };
    format!("║  {}║\n", cell)
}

/// Comma-join `items` after `label`, breaking onto indented rows that fit the box
fn wrap_list(label: &str, items: &[&str]) -> Vec<String> {
    let indent = " ".repeat(label.chars().count());
    let mut lines = Vec::new();
    let mut current = label.to_string();
    let mut first = true;

    for (i, item) in items.iter().enumerate() {
        let piece = if i + 1 < items.len() {
            format!("{},", item)
        } else {
            item.to_string()
        };
        let sep = if first { "" } else { " " };
        if !first && current.chars().count() + sep.len() + piece.chars().count() > BOX_WIDTH {
            lines.push(current);
            current = format!("{}{}", indent, piece);
        } else {
            current.push_str(sep);
            current.push_str(&piece);
        }
        first = false;
    }
    lines.push(current);
    lines
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmdcheck_types::{
        default_metrics, EvaluationReport, FunctionalTestCase, MetricScore, TestId, TestKind,
    };
    use std::sync::Arc;

    fn result(
        id: u64,
        command: &str,
        critical: bool,
        status: TestStatus,
        ms: f64,
        score: Option<f64>,
    ) -> FunctionalTestResult {
        let case = Arc::new(FunctionalTestCase {
            test_id: TestId(id),
            command_name: command.to_string(),
            description: String::new(),
            kind: TestKind::HappyPath,
            input_data: String::new(),
            expected_tools: Default::default(),
            expected_behavior: String::new(),
            security_critical: critical,
            performance_threshold_ms: 30_000.0,
            evaluation_metrics: default_metrics(),
        });
        let mut result = FunctionalTestResult::new(case, status, ms);
        result.llm_report = score.map(|s| {
            EvaluationReport::from_metric_scores(
                command,
                default_metrics()
                    .into_iter()
                    .map(|m| (m, MetricScore::new(s, "")))
                    .collect(),
            )
        });
        result
    }

    #[test]
    fn test_empty_report() {
        let report = FunctionalReport::aggregate(&[], Uuid::new_v4());
        assert_eq!(report.summary.total_tests, 0);
        assert_eq!(report.summary.success_rate, 0.0);
        assert_eq!(report.performance, PerformanceStats::default());
        assert_eq!(report.security.security_pass_rate, 100.0);
        assert_eq!(report.quality.avg_llm_score, 0.0);
        assert!(report.commands_tested.is_empty());
        assert!(report.all_passed());
    }

    #[test]
    fn test_aggregate_counts_and_rates() {
        let results = vec![
            result(1, "task", false, TestStatus::Passed, 10.0, Some(0.8)),
            result(2, "task", true, TestStatus::Failed, 30.0, Some(0.4)),
            result(3, "help", true, TestStatus::Passed, 20.0, Some(0.6)),
            result(4, "help", false, TestStatus::Error, 40.0, None),
        ];
        let report = FunctionalReport::aggregate(&results, Uuid::new_v4());

        assert_eq!(report.summary.total_tests, 4);
        assert_eq!(report.summary.passed, 2);
        assert_eq!(report.summary.failed, 1);
        assert_eq!(report.summary.errors, 1);
        assert_eq!(report.summary.success_rate, 50.0);

        assert_eq!(report.performance.avg_execution_time_ms, 25.0);
        assert_eq!(report.performance.min_execution_time_ms, 10.0);
        assert_eq!(report.performance.max_execution_time_ms, 40.0);

        assert_eq!(report.security.security_critical_tests, 2);
        assert_eq!(report.security.security_pass_rate, 50.0);

        assert_eq!(report.quality.evaluated_tests, 3);
        assert!((report.quality.avg_llm_score - 0.6).abs() < 1e-9);

        assert_eq!(
            report.commands_tested.iter().collect::<Vec<_>>(),
            vec!["help", "task"]
        );
        assert!(!report.all_passed());
    }

    #[test]
    fn test_no_security_critical_is_full_pass_rate() {
        let results = vec![result(1, "task", false, TestStatus::Failed, 1.0, None)];
        let report = FunctionalReport::aggregate(&results, Uuid::new_v4());
        assert_eq!(report.security.security_pass_rate, 100.0);
    }

    #[test]
    fn test_skipped_critical_tests_do_not_count() {
        let results = vec![
            result(1, "help", false, TestStatus::Passed, 1.0, Some(0.9)),
            result(2, "help", true, TestStatus::Skipped, 0.0, None),
            result(3, "help", true, TestStatus::Skipped, 0.0, None),
        ];
        let report = FunctionalReport::aggregate(&results, Uuid::new_v4());
        assert_eq!(report.summary.skipped, 2);
        assert_eq!(report.security.security_critical_tests, 0);
        assert_eq!(report.security.security_pass_rate, 100.0);

        let mixed = vec![
            result(1, "help", true, TestStatus::Passed, 1.0, Some(0.9)),
            result(2, "help", true, TestStatus::Skipped, 0.0, None),
        ];
        let report = FunctionalReport::aggregate(&mixed, Uuid::new_v4());
        assert_eq!(report.security.security_critical_tests, 1);
        assert_eq!(report.security.security_pass_rate, 100.0);
    }

    #[test]
    fn test_text_box_rows_are_aligned() {
        let names: Vec<String> = (0..12).map(|i| format!("command-number-{}", i)).collect();
        let results: Vec<FunctionalTestResult> = names
            .iter()
            .enumerate()
            .map(|(i, name)| result(i as u64, name, false, TestStatus::Passed, 1.0, Some(0.9)))
            .collect();
        let report = FunctionalReport::aggregate(&results, Uuid::new_v4());
        let text = report.to_text();

        let widths: BTreeSet<usize> = text.lines().map(|l| l.chars().count()).collect();
        assert_eq!(widths.len(), 1, "rows differ in width:\n{}", text);
        assert!(text.contains(&report.run_id.to_string()));
        for name in &names {
            assert!(text.contains(name.as_str()));
        }
    }

    #[test]
    fn test_boxed_line_truncates() {
        let line = boxed_line(&"x".repeat(80));
        assert_eq!(line.trim_end().chars().count(), BOX_WIDTH + 4);
        assert!(line.contains("..."));
    }

    #[test]
    fn test_aggregate_is_repeatable() {
        let results = vec![result(1, "task", true, TestStatus::Passed, 5.0, Some(0.9))];
        let run_id = Uuid::new_v4();
        let a = FunctionalReport::aggregate(&results, run_id);
        let b = FunctionalReport::aggregate(&results, run_id);
        assert_eq!(a.summary, b.summary);
        assert_eq!(a.security, b.security);
        assert_eq!(a.run_id, b.run_id);
    }

    #[test]
    fn test_renderings() {
        let results = vec![result(1, "task", false, TestStatus::Passed, 5.0, Some(0.9))];
        let report = FunctionalReport::aggregate(&results, Uuid::new_v4());

        let text = report.to_text();
        assert!(text.contains("Command Functional Test Report"));
        assert!(text.contains("ALL TESTS PASSED"));

        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["summary"]["passed"], 1);
        assert_eq!(json["commands_tested"][0], "task");
    }

    #[test]
    fn test_write_to() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let report = FunctionalReport::aggregate(&[], Uuid::new_v4());
        report.write_to(&path).unwrap();

        let back: FunctionalReport =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back.run_id, report.run_id);
    }
}
