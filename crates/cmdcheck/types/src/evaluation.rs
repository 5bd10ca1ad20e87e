//! Qualitative evaluation metrics and reports

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Named qualitative scoring dimension reported by an evaluator
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationMetric {
    Correctness,
    Relevance,
    Coherence,
    Safety,
    Helpfulness,
    TaskCompletion,
    CodeQuality,
    SecurityCompliance,
    UserExperience,
}

impl EvaluationMetric {
    /// Weight of this metric in the overall score
    pub fn weight(self) -> f64 {
        match self {
            EvaluationMetric::Correctness => 0.25,
            EvaluationMetric::Relevance | EvaluationMetric::Safety => 0.20,
            EvaluationMetric::Helpfulness
            | EvaluationMetric::TaskCompletion
            | EvaluationMetric::SecurityCompliance => 0.15,
            EvaluationMetric::Coherence
            | EvaluationMetric::CodeQuality
            | EvaluationMetric::UserExperience => 0.10,
        }
    }
}

impl std::fmt::Display for EvaluationMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EvaluationMetric::Correctness => "correctness",
            EvaluationMetric::Relevance => "relevance",
            EvaluationMetric::Coherence => "coherence",
            EvaluationMetric::Safety => "safety",
            EvaluationMetric::Helpfulness => "helpfulness",
            EvaluationMetric::TaskCompletion => "task_completion",
            EvaluationMetric::CodeQuality => "code_quality",
            EvaluationMetric::SecurityCompliance => "security_compliance",
            EvaluationMetric::UserExperience => "user_experience",
        };
        f.write_str(name)
    }
}

/// Letter grade derived from an overall score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    /// Map a score in [0, 1] to a grade
    pub fn from_score(score: f64) -> Self {
        if score >= 0.9 {
            Grade::A
        } else if score >= 0.8 {
            Grade::B
        } else if score >= 0.7 {
            Grade::C
        } else if score >= 0.6 {
            Grade::D
        } else {
            Grade::F
        }
    }
}

/// Score for a single metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricScore {
    /// Score in [0, 1]
    pub score: f64,
    /// Evaluator's explanation
    pub explanation: String,
    /// Evaluator's confidence in [0, 1]
    pub confidence: f64,
}

impl MetricScore {
    pub fn new(score: f64, explanation: impl Into<String>) -> Self {
        Self {
            score,
            explanation: explanation.into(),
            confidence: 1.0,
        }
    }
}

/// Report produced by a command evaluator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub command_name: String,
    /// Weighted score in [0, 1]
    pub overall_score: f64,
    pub grade: Grade,
    pub metric_scores: BTreeMap<EvaluationMetric, MetricScore>,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
}

impl EvaluationReport {
    /// Build a report whose overall score is the weighted mean of the metric scores.
    ///
    /// An empty score map yields an overall score of 0.
    pub fn from_metric_scores(
        command_name: impl Into<String>,
        metric_scores: BTreeMap<EvaluationMetric, MetricScore>,
    ) -> Self {
        let (weighted, total_weight) = metric_scores.iter().fold(
            (0.0, 0.0),
            |(weighted, total), (metric, score)| {
                (weighted + score.score * metric.weight(), total + metric.weight())
            },
        );
        let overall_score = if total_weight > 0.0 {
            weighted / total_weight
        } else {
            0.0
        };

        let mut strengths = Vec::new();
        let mut weaknesses = Vec::new();
        for (metric, score) in &metric_scores {
            if score.score >= 0.8 {
                strengths.push(format!("strong {}", metric));
            } else if score.score < 0.6 {
                weaknesses.push(format!("weak {}", metric));
            }
        }

        Self {
            command_name: command_name.into(),
            overall_score,
            grade: Grade::from_score(overall_score),
            metric_scores,
            strengths,
            weaknesses,
        }
    }
}
