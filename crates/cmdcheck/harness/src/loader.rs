//! Command spec loading
//!
//! A command source is UTF-8 markdown that starts with a `---` delimited
//! YAML frontmatter block:
//!
//! ```text
//! ---
//! name: task
//! description: Execute development tasks
//! allowed-tools: Read, Write, Bash
//! argument-hint: <task description>
//! ---
//! # Task
//! ...
//! ```

use crate::error::ParseError;
use cmdcheck_types::Command;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

const FRONTMATTER_DELIMITER: &str = "---";

/// Typed view of the frontmatter keys a command may declare
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommandFrontmatter {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "allowed-tools")]
    pub allowed_tools: Option<ToolList>,
    #[serde(rename = "argument-hint")]
    pub argument_hint: Option<String>,
}

/// `allowed-tools` is normally a `", "` separated string; a YAML list is accepted too.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ToolList {
    Delimited(String),
    List(Vec<String>),
}

impl ToolList {
    fn into_tools(self) -> Vec<String> {
        let raw = match self {
            ToolList::Delimited(s) => s.split(',').map(str::to_string).collect(),
            ToolList::List(list) => list,
        };
        raw.into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect()
    }
}

/// Split a source into its YAML block and markdown body
fn split_frontmatter<'a>(content: &'a str, path: &Path) -> Result<(&'a str, &'a str), ParseError> {
    if !content.starts_with(FRONTMATTER_DELIMITER) {
        return Err(ParseError::MissingFrontmatter(path.to_path_buf()));
    }

    let parts: Vec<&str> = content.splitn(3, FRONTMATTER_DELIMITER).collect();
    match parts.as_slice() {
        [_, yaml, body] => Ok((yaml, body)),
        _ => Err(ParseError::UnterminatedFrontmatter(path.to_path_buf())),
    }
}

/// Parse command source text. `path` supplies the default name and error context.
pub fn parse_command(content: &str, path: &Path) -> Result<Command, ParseError> {
    let (yaml, body) = split_frontmatter(content, path)?;
    if yaml.trim().is_empty() {
        return Err(ParseError::EmptyFrontmatter(path.to_path_buf()));
    }

    let frontmatter: CommandFrontmatter =
        serde_yaml::from_str(yaml).map_err(|source| ParseError::InvalidYaml {
            path: path.to_path_buf(),
            source,
        })?;

    let name = frontmatter.name.unwrap_or_else(|| {
        path.file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    });

    Ok(Command {
        name,
        description: frontmatter.description.unwrap_or_default(),
        allowed_tools: frontmatter
            .allowed_tools
            .map(ToolList::into_tools)
            .unwrap_or_default()
            .into_iter()
            .collect(),
        argument_hint: frontmatter.argument_hint.unwrap_or_default(),
        source_path: path.to_path_buf(),
        body: body.trim_start_matches(['\r', '\n']).to_string(),
    })
}

/// Immutable name to command map shared with the executor
#[derive(Debug, Clone, Default)]
pub struct CommandRegistry {
    commands: BTreeMap<String, Arc<Command>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command under its raw name, replacing any previous entry
    pub fn insert(&mut self, command: Command) -> Arc<Command> {
        let command = Arc::new(command);
        if let Some(previous) = self
            .commands
            .insert(command.name.clone(), Arc::clone(&command))
        {
            warn!(
                name = %command.name,
                previous = %previous.source_path.display(),
                "Duplicate command name, keeping the later definition"
            );
        }
        command
    }

    /// Look a command up with or without its leading `/`
    pub fn get_command_by_name(&self, name: &str) -> Option<Arc<Command>> {
        let bare = name.strip_prefix('/').unwrap_or(name);
        self.commands
            .get(bare)
            .or_else(|| self.commands.get(&format!("/{}", bare)))
            .cloned()
    }

    /// Raw command names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }

    pub fn commands(&self) -> impl Iterator<Item = &Arc<Command>> {
        self.commands.values()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Loads command files into a [`CommandRegistry`]
pub struct CommandLoader {
    commands_dir: PathBuf,
    registry: CommandRegistry,
}

impl CommandLoader {
    /// Create a loader rooted at a commands directory
    pub fn new(commands_dir: impl Into<PathBuf>) -> Self {
        Self {
            commands_dir: commands_dir.into(),
            registry: CommandRegistry::new(),
        }
    }

    pub fn commands_dir(&self) -> &Path {
        &self.commands_dir
    }

    /// Load one command file and register it
    pub fn load_command(&mut self, path: impl AsRef<Path>) -> Result<Arc<Command>, ParseError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ParseError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let command = parse_command(&content, path)?;
        debug!(
            name = %command.name,
            tools = command.allowed_tools.len(),
            "Loaded command"
        );
        Ok(self.registry.insert(command))
    }

    /// Recursively load every `*.md` file under the commands directory.
    ///
    /// Files that fail to load are logged and skipped.
    pub fn load_all_commands(&mut self) -> &CommandRegistry {
        let mut failures = 0usize;

        let files: Vec<PathBuf> = WalkDir::new(&self.commands_dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable directory entry");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "md"))
            .collect();

        for file in files {
            if let Err(e) = self.load_command(&file) {
                failures += 1;
                warn!(path = %file.display(), error = %e, "Failed to load command");
            }
        }

        info!(
            dir = %self.commands_dir.display(),
            loaded = self.registry.len(),
            failed = failures,
            "Command scan complete"
        );

        &self.registry
    }

    pub fn get_command_by_name(&self, name: &str) -> Option<Arc<Command>> {
        self.registry.get_command_by_name(name)
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Consume the loader, keeping only the loaded commands
    pub fn into_registry(self) -> CommandRegistry {
        self.registry
    }
}
