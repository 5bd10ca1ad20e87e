//! Command specifications loaded from markdown sources

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// A named specification of an agent's permitted tools and intended behavior.
///
/// Built once by the loader and shared read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    /// Command name as declared in frontmatter (may carry a leading `/`)
    pub name: String,

    /// Human-readable description
    pub description: String,

    /// Tools the command is allowed to invoke
    pub allowed_tools: BTreeSet<String>,

    /// Hint describing the expected argument
    pub argument_hint: String,

    /// File the command was loaded from
    pub source_path: PathBuf,

    /// Markdown body following the frontmatter
    pub body: String,
}

impl Command {
    /// Create a command with no tools, description or body
    pub fn new(name: impl Into<String>, source_path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            allowed_tools: BTreeSet::new(),
            argument_hint: String::new(),
            source_path: source_path.into(),
            body: String::new(),
        }
    }

    /// Set the allowed tools
    pub fn with_allowed_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_tools = tools.into_iter().map(Into::into).collect();
        self
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Name with any leading `/` removed
    pub fn bare_name(&self) -> &str {
        self.name.strip_prefix('/').unwrap_or(&self.name)
    }

    /// Whether the command may use the given tool
    pub fn allows_tool(&self, tool: &str) -> bool {
        self.allowed_tools.contains(tool)
    }
}
