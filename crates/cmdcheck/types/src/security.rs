//! Security suite verdicts

use serde::{Deserialize, Serialize};

/// Overall compliance verdict of a security run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ComplianceStatus {
    Pass,
    Fail,
}

impl std::str::FromStr for ComplianceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pass" => Ok(ComplianceStatus::Pass),
            "fail" => Ok(ComplianceStatus::Fail),
            other => Err(format!("unknown compliance status: {}", other)),
        }
    }
}

/// Severity of a security finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreatLevel {
    Low,
    Medium,
    High,
    Critical,
}

/// A single vulnerability reported by the suite
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityFinding {
    pub kind: String,
    pub severity: ThreatLevel,
    pub description: String,
    pub remediation: String,
}

/// Report produced by a security test suite
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityReport {
    pub command_name: String,
    pub compliance_status: ComplianceStatus,
    /// Percentage of probes passed
    pub security_score: f64,
    pub total_tests: usize,
    pub passed_tests: usize,
    pub findings: Vec<SecurityFinding>,
}

impl SecurityReport {
    /// Report with no probes and the given verdict
    pub fn verdict(command_name: impl Into<String>, compliance_status: ComplianceStatus) -> Self {
        let security_score = match compliance_status {
            ComplianceStatus::Pass => 100.0,
            ComplianceStatus::Fail => 0.0,
        };
        Self {
            command_name: command_name.into(),
            compliance_status,
            security_score,
            total_tests: 0,
            passed_tests: 0,
            findings: Vec::new(),
        }
    }

    pub fn is_compliant(&self) -> bool {
        self.compliance_status == ComplianceStatus::Pass
    }
}
