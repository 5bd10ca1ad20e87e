//! Mock tool environment
//!
//! [`ToolEnvironment`] is the seam through which simulated commands invoke
//! tools. [`InMemoryToolEnvironment`] is the reference implementation: an
//! in-memory file system seeded with a small sample project. Nothing touches
//! the real file system or spawns processes.

use cmdcheck_types::{CollaboratorError, ExecutionSummary, ToolCall, ToolResult};
use regex::{Regex, RegexBuilder};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Simulated tool-call environment that records which tools were used
pub trait ToolEnvironment: Send {
    /// Restore the environment to its initial state
    fn reset_environment(&mut self) -> Result<(), CollaboratorError>;

    /// Route a tool call to the matching mock implementation
    fn route_tool_call(&mut self, call: ToolCall) -> Result<ToolResult, CollaboratorError>;

    /// Summary of tool activity since the last reset
    fn get_execution_summary(&self) -> ExecutionSummary;

    /// Full state dump for auditing
    fn export_state(&self) -> Result<Value, CollaboratorError>;
}

#[derive(Debug, Clone, Serialize)]
struct ToolCallRecord {
    sequence: usize,
    tool: String,
    args: serde_json::Map<String, Value>,
    success: bool,
    error: Option<String>,
}

const SAMPLE_FILES: &[(&str, &str)] = &[
    (
        "/project/README.md",
        "# Sample Project\n\nThis is a test project for command functional testing.",
    ),
    (
        "/project/src/main.py",
        "def hello():\n    print('Hello, World!')\n\nif __name__ == '__main__':\n    hello()",
    ),
    (
        "/project/tests/test_main.py",
        "import unittest\nfrom src.main import hello\n\nclass TestMain(unittest.TestCase):\n    pass",
    ),
    ("/project/.gitignore", "*.pyc\n__pycache__/\n.venv/"),
];

const SAMPLE_DIRECTORIES: &[&str] = &[
    "/",
    "/tmp",
    "/home",
    "/usr",
    "/project",
    "/project/src",
    "/project/tests",
    "/project/docs",
];

/// In-memory tool environment with a seeded sample project
#[derive(Debug, Clone)]
pub struct InMemoryToolEnvironment {
    files: BTreeMap<String, String>,
    directories: BTreeSet<String>,
    tool_calls: Vec<ToolCallRecord>,
    command_history: Vec<String>,
}

impl InMemoryToolEnvironment {
    pub fn new() -> Self {
        Self {
            files: SAMPLE_FILES
                .iter()
                .map(|(path, content)| (path.to_string(), content.to_string()))
                .collect(),
            directories: SAMPLE_DIRECTORIES.iter().map(|d| d.to_string()).collect(),
            tool_calls: Vec::new(),
            command_history: Vec::new(),
        }
    }

    pub fn file(&self, path: &str) -> Option<&str> {
        self.files.get(&normalize_path(path)).map(String::as_str)
    }

    /// Bash commands recorded since the last reset
    pub fn command_history(&self) -> &[String] {
        &self.command_history
    }

    fn add_parent_dirs(&mut self, path: &str) {
        let mut current = path;
        while let Some(idx) = current.rfind('/') {
            current = &current[..idx];
            let dir = if current.is_empty() { "/" } else { current };
            self.directories.insert(dir.to_string());
        }
    }

    fn read(&self, call: &ToolCall) -> ToolResult {
        let raw = call.str_arg("file_path", "");
        let Some(content) = self.files.get(&normalize_path(raw)) else {
            return ToolResult::err("Read", format!("File not found: {}", raw));
        };

        let offset = call.usize_arg("offset").unwrap_or(0);
        let lines = content.split('\n').skip(offset);
        let selected: Vec<&str> = match call.usize_arg("limit") {
            Some(limit) => lines.take(limit).collect(),
            None => lines.collect(),
        };
        let output = selected.join("\n");
        let bytes = output.len();
        ToolResult::ok("Read", output).with_resource("bytes_read", bytes)
    }

    fn write(&mut self, call: &ToolCall) -> ToolResult {
        let raw = call.str_arg("file_path", "");
        let content = call.str_arg("content", "").to_string();
        let bytes = content.len();
        let path = normalize_path(raw);
        self.add_parent_dirs(&path);
        self.files.insert(path, content);
        ToolResult::ok("Write", format!("File written successfully: {}", raw))
            .with_resource("bytes_written", bytes)
    }

    fn edit(&mut self, call: &ToolCall) -> ToolResult {
        let raw = call.str_arg("file_path", "");
        let old = call.str_arg("old_string", "");
        let new = call.str_arg("new_string", "");
        let Some(content) = self.files.get_mut(&normalize_path(raw)) else {
            return ToolResult::err("Edit", format!("File not found: {}", raw));
        };
        if old.is_empty() {
            return ToolResult::err("Edit", "Empty old_string");
        }

        let replacements = if call.bool_arg("replace_all") {
            let count = content.matches(old).count();
            *content = content.replace(old, new);
            count
        } else {
            if !content.contains(old) {
                return ToolResult::err("Edit", format!("String not found in file: {}", old));
            }
            *content = content.replacen(old, new, 1);
            1
        };

        ToolResult::ok(
            "Edit",
            format!("File edited successfully. Made {} replacement(s).", replacements),
        )
        .with_resource("replacements_made", replacements)
    }

    fn list(&self, call: &ToolCall) -> ToolResult {
        let raw = call.str_arg("path", ".");
        let dir = normalize_path(raw);
        if !self.directories.contains(&dir) {
            return ToolResult::err("LS", format!("Directory not found: {}", raw));
        }

        let prefix = if dir == "/" { "/".to_string() } else { format!("{}/", dir) };
        let direct_child = |path: &String| {
            path.strip_prefix(&prefix)
                .filter(|rest| !rest.is_empty() && !rest.contains('/'))
                .map(str::to_string)
        };

        let mut entries: Vec<String> = self.files.keys().filter_map(direct_child).collect();
        entries.extend(
            self.directories
                .iter()
                .filter_map(direct_child)
                .map(|d| format!("{}/", d)),
        );
        entries.sort();

        let count = entries.len();
        ToolResult::ok("LS", entries.join("\n")).with_resource("items_listed", count)
    }

    fn grep(&self, call: &ToolCall) -> ToolResult {
        let pattern = call.str_arg("pattern", "");
        if pattern.is_empty() {
            return ToolResult::err("Grep", "Empty search pattern");
        }
        let matcher = match RegexBuilder::new(pattern)
            .case_insensitive(call.bool_arg("case_insensitive"))
            .build()
        {
            Ok(matcher) => matcher,
            Err(e) => return ToolResult::err("Grep", format!("Invalid pattern: {}", e)),
        };
        let root = normalize_path(call.str_arg("path", "."));

        let mut matches = Vec::new();
        for (path, content) in self.files.iter().filter(|(p, _)| is_under(p, &root)) {
            for (line_no, line) in content.lines().enumerate() {
                if matcher.is_match(line) {
                    matches.push(format!("{}:{}:{}", path, line_no + 1, line));
                }
            }
        }

        let count = matches.len();
        ToolResult::ok("Grep", matches.join("\n")).with_resource("matches_found", count)
    }

    /// Matches `pattern` against both the path relative to `path` and the full path
    fn glob(&self, call: &ToolCall) -> ToolResult {
        let pattern = call.str_arg("pattern", "*");
        let matcher = match wildcard_regex(pattern) {
            Ok(matcher) => matcher,
            Err(e) => return ToolResult::err("Glob", format!("Invalid pattern: {}", e)),
        };
        let root = normalize_path(call.str_arg("path", "."));

        let found: Vec<&str> = self
            .files
            .keys()
            .filter(|path| is_under(path, &root))
            .filter(|path| {
                let relative = path
                    .strip_prefix(root.as_str())
                    .unwrap_or(path.as_str())
                    .trim_start_matches('/');
                matcher.is_match(relative) || matcher.is_match(path)
            })
            .map(String::as_str)
            .collect();

        let count = found.len();
        ToolResult::ok("Glob", found.join("\n")).with_resource("files_found", count)
    }

    fn bash(&mut self, call: &ToolCall) -> ToolResult {
        let command = call.str_arg("command", "").to_string();
        self.command_history.push(command.clone());
        ToolResult::ok("Bash", format!("(mock) recorded: {}", command))
    }
}

impl Default for InMemoryToolEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolEnvironment for InMemoryToolEnvironment {
    fn reset_environment(&mut self) -> Result<(), CollaboratorError> {
        *self = Self::new();
        Ok(())
    }

    fn route_tool_call(&mut self, call: ToolCall) -> Result<ToolResult, CollaboratorError> {
        let result = match call.tool_name.as_str() {
            "Read" => self.read(&call),
            "Write" => self.write(&call),
            "Edit" => self.edit(&call),
            "LS" => self.list(&call),
            "Grep" => self.grep(&call),
            "Glob" => self.glob(&call),
            "Bash" => self.bash(&call),
            other => ToolResult::err(other, format!("Unknown tool: {}", other)),
        };

        self.tool_calls.push(ToolCallRecord {
            sequence: self.tool_calls.len(),
            tool: call.tool_name,
            args: call.args,
            success: result.success,
            error: result.error.clone(),
        });

        Ok(result)
    }

    fn get_execution_summary(&self) -> ExecutionSummary {
        let successful_calls = self.tool_calls.iter().filter(|c| c.success).count();
        ExecutionSummary {
            tools_used: self.tool_calls.iter().map(|c| c.tool.clone()).collect(),
            total_tool_calls: self.tool_calls.len(),
            successful_calls,
            failed_calls: self.tool_calls.len() - successful_calls,
        }
    }

    fn export_state(&self) -> Result<Value, CollaboratorError> {
        let tool_calls = serde_json::to_value(&self.tool_calls)
            .map_err(|e| CollaboratorError::Environment(e.to_string()))?;
        let summary = serde_json::to_value(self.get_execution_summary())
            .map_err(|e| CollaboratorError::Environment(e.to_string()))?;

        Ok(serde_json::json!({
            "files": self.files,
            "directories": self.directories,
            "tool_calls": tool_calls,
            "commands_executed": self.command_history,
            "execution_summary": summary,
        }))
    }
}

/// Resolve `.` and `..` against `/`. Relative paths are taken from the root.
fn normalize_path(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for component in path.split('/') {
        match component {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    format!("/{}", parts.join("/"))
}

fn is_under(path: &str, root: &str) -> bool {
    root == "/" || path == root || path.starts_with(&format!("{}/", root))
}

/// Shell-style wildcard as an anchored regex. `*` matches any run of
/// characters including `/`, `?` exactly one, `[...]` a class (`[!...]` negated).
fn wildcard_regex(pattern: &str) -> Result<Regex, regex::Error> {
    let mut source = String::from("^");
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '*' => source.push_str(".*"),
            '?' => source.push('.'),
            '[' => {
                let mut class = String::new();
                let mut closed = false;
                for next in chars.by_ref() {
                    if next == ']' && !class.is_empty() {
                        closed = true;
                        break;
                    }
                    class.push(next);
                }
                if closed {
                    source.push('[');
                    match class.strip_prefix('!') {
                        Some(negated) => {
                            source.push('^');
                            source.push_str(&negated.replace('\\', "\\\\"));
                        }
                        None => source.push_str(&class.replace('\\', "\\\\")),
                    }
                    source.push(']');
                } else {
                    source.push_str(&regex::escape(&format!("[{}", class)));
                }
            }
            other => source.push_str(&regex::escape(&other.to_string())),
        }
    }
    source.push('$');
    Regex::new(&source)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(env: &mut InMemoryToolEnvironment, call: ToolCall) -> ToolResult {
        env.route_tool_call(call).unwrap()
    }

    #[test]
    fn test_read_seeded_file() {
        let mut env = InMemoryToolEnvironment::new();
        let result = call(&mut env, ToolCall::new("Read").arg("file_path", "/project/README.md"));
        assert!(result.success);
        assert!(result.output.starts_with("# Sample Project"));
    }

    #[test]
    fn test_read_with_offset_and_limit() {
        let mut env = InMemoryToolEnvironment::new();
        let result = call(
            &mut env,
            ToolCall::new("Read")
                .arg("file_path", "/project/src/main.py")
                .arg("offset", 1)
                .arg("limit", 1),
        );
        assert_eq!(result.output, "    print('Hello, World!')");
    }

    #[test]
    fn test_write_then_edit() {
        let mut env = InMemoryToolEnvironment::new();
        call(
            &mut env,
            ToolCall::new("Write")
                .arg("file_path", "/project/new/notes.txt")
                .arg("content", "Test content"),
        );
        let edit = call(
            &mut env,
            ToolCall::new("Edit")
                .arg("file_path", "/project/new/notes.txt")
                .arg("old_string", "Test")
                .arg("new_string", "Modified"),
        );
        assert!(edit.success);
        assert_eq!(env.file("/project/new/notes.txt"), Some("Modified content"));

        let listing = call(&mut env, ToolCall::new("LS").arg("path", "/project"));
        assert!(listing.output.lines().any(|l| l == "new/"));
    }

    #[test]
    fn test_edit_missing_string_fails() {
        let mut env = InMemoryToolEnvironment::new();
        let result = call(
            &mut env,
            ToolCall::new("Edit")
                .arg("file_path", "/project/README.md")
                .arg("old_string", "not there")
                .arg("new_string", "x"),
        );
        assert!(!result.success);
    }

    #[test]
    fn test_traversal_is_contained() {
        let mut env = InMemoryToolEnvironment::new();
        let result = call(&mut env, ToolCall::new("Read").arg("file_path", "../../../etc/passwd"));
        assert!(!result.success);
        assert_eq!(normalize_path("../../../etc/passwd"), "/etc/passwd");
    }

    #[test]
    fn test_grep_and_glob() {
        let mut env = InMemoryToolEnvironment::new();
        let grep = call(
            &mut env,
            ToolCall::new("Grep")
                .arg("pattern", "HELLO")
                .arg("path", "/project")
                .arg("case_insensitive", true),
        );
        assert!(grep.output.contains("/project/src/main.py:1:def hello():"));

        let glob = call(
            &mut env,
            ToolCall::new("Glob")
                .arg("pattern", "**/*.py")
                .arg("path", "/project"),
        );
        assert_eq!(glob.output.lines().count(), 2);

        let shallow = call(
            &mut env,
            ToolCall::new("Glob")
                .arg("pattern", "*.md")
                .arg("path", "/project"),
        );
        assert_eq!(shallow.output, "/project/README.md");
    }

    #[test]
    fn test_grep_uses_regex_patterns() {
        let mut env = InMemoryToolEnvironment::new();
        let grep = call(
            &mut env,
            ToolCall::new("Grep")
                .arg("pattern", "^def hel+o")
                .arg("path", "/project"),
        );
        assert!(grep.success);
        assert_eq!(grep.output, "/project/src/main.py:1:def hello():");

        let anchored = call(
            &mut env,
            ToolCall::new("Grep")
                .arg("pattern", "^import")
                .arg("path", "/project"),
        );
        assert_eq!(anchored.output, "/project/tests/test_main.py:1:import unittest");

        let case_sensitive = call(
            &mut env,
            ToolCall::new("Grep")
                .arg("pattern", "HEL+O")
                .arg("path", "/project/src"),
        );
        assert!(case_sensitive.output.is_empty());
    }

    #[test]
    fn test_grep_invalid_pattern_fails() {
        let mut env = InMemoryToolEnvironment::new();
        let result = call(
            &mut env,
            ToolCall::new("Grep")
                .arg("pattern", "(unclosed")
                .arg("path", "/project"),
        );
        assert!(!result.success);
        assert!(result.error.unwrap_or_default().starts_with("Invalid pattern"));
    }

    #[test]
    fn test_glob_matches_relative_and_full_paths() {
        let mut env = InMemoryToolEnvironment::new();
        let relative = call(
            &mut env,
            ToolCall::new("Glob")
                .arg("pattern", "src/*.py")
                .arg("path", "/project"),
        );
        assert_eq!(relative.output, "/project/src/main.py");

        let absolute = call(
            &mut env,
            ToolCall::new("Glob")
                .arg("pattern", "/project/*.md")
                .arg("path", "/project"),
        );
        assert_eq!(absolute.output, "/project/README.md");

        let class = call(
            &mut env,
            ToolCall::new("Glob")
                .arg("pattern", "tests/test_[a-m]*.py")
                .arg("path", "/project"),
        );
        assert_eq!(class.output, "/project/tests/test_main.py");
    }

    #[test]
    fn test_unknown_tool_is_recorded() {
        let mut env = InMemoryToolEnvironment::new();
        let result = call(&mut env, ToolCall::new("Teleport"));
        assert!(!result.success);

        let summary = env.get_execution_summary();
        assert!(summary.tools_used.contains("Teleport"));
        assert_eq!(summary.failed_calls, 1);
    }

    #[test]
    fn test_reset_clears_log_and_files() {
        let mut env = InMemoryToolEnvironment::new();
        call(&mut env, ToolCall::new("Bash").arg("command", "ls"));
        call(
            &mut env,
            ToolCall::new("Write")
                .arg("file_path", "/tmp/x")
                .arg("content", "x"),
        );
        env.reset_environment().unwrap();

        assert_eq!(env.get_execution_summary().total_tool_calls, 0);
        assert!(env.file("/tmp/x").is_none());
        assert!(env.command_history().is_empty());
    }

    #[test]
    fn test_export_state_shape() {
        let mut env = InMemoryToolEnvironment::new();
        call(&mut env, ToolCall::new("Read").arg("file_path", "/project/README.md"));
        let state = env.export_state().unwrap();
        assert_eq!(state["execution_summary"]["total_tool_calls"], 1);
        assert_eq!(state["tool_calls"][0]["tool"], "Read");
        assert!(state["files"]["/project/README.md"].is_string());
    }

    #[test]
    fn test_wildcard_regex() {
        let matches = |pattern: &str, text: &str| wildcard_regex(pattern).unwrap().is_match(text);
        assert!(matches("*.py", "main.py"));
        assert!(matches("test_?ain.py", "test_main.py"));
        assert!(!matches("*.py", "README.md"));
        assert!(matches("*", ""));
        assert!(matches("[!a]*.md", "README.md"));
        assert!(matches("a+b[.txt", "a+b[.txt"));
    }
}
