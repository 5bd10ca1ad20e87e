//! Tool invocation records

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// A request to invoke a tool in the mock environment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub tool_name: String,
    pub args: Map<String, Value>,
}

impl ToolCall {
    pub fn new(tool_name: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            args: Map::new(),
        }
    }

    /// Add an argument
    pub fn arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.args.insert(key.into(), value.into());
        self
    }

    /// String argument, or the default when absent or not a string
    pub fn str_arg<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.args.get(key).and_then(Value::as_str).unwrap_or(default)
    }

    pub fn bool_arg(&self, key: &str) -> bool {
        self.args.get(key).and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn usize_arg(&self, key: &str) -> Option<usize> {
        self.args
            .get(key)
            .and_then(Value::as_u64)
            .and_then(|v| usize::try_from(v).ok())
    }
}

/// Outcome of a routed tool call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,
    pub output: String,
    pub error: Option<String>,
    pub tool_used: String,
    pub resources_used: Map<String, Value>,
}

impl ToolResult {
    pub fn ok(tool: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            error: None,
            tool_used: tool.into(),
            resources_used: Map::new(),
        }
    }

    pub fn err(tool: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: String::new(),
            error: Some(error.into()),
            tool_used: tool.into(),
            resources_used: Map::new(),
        }
    }

    /// Record a resource counter
    pub fn with_resource(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.resources_used.insert(key.into(), value.into());
        self
    }
}

/// Summary of tool activity since the last reset
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionSummary {
    pub tools_used: BTreeSet<String>,
    pub total_tool_calls: usize,
    pub successful_calls: usize,
    pub failed_calls: usize,
}

/// Reconciliation of expected against invoked tools
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolUsageValidation {
    pub expected_tools: BTreeSet<String>,
    pub actual_tools_used: BTreeSet<String>,
    pub tools_validation_passed: bool,
    /// Expected but never invoked
    pub missing_tools: Vec<String>,
    /// Invoked but not expected
    pub unexpected_tools: Vec<String>,
    pub tool_call_count: usize,
}
