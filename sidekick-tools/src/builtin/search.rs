use std::path::Path;

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use serde_json::{Value, json};
use sidekick_core::error::SidekickError;
use sidekick_core::types::FunctionDefinition;
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use crate::sandbox::Workspace;
use crate::tool::{Tool, parse_args};

pub const MAX_MATCHES: usize = 200;
const MAX_LINE_CHARS: usize = 300;
/// Files above this size are skipped
const MAX_SEARCH_FILE_BYTES: u64 = 2 * 1024 * 1024;

pub struct SearchFilesTool {
    workspace: Workspace,
}

impl SearchFilesTool {
    pub const NAME: &'static str = "search_files";

    pub fn new(workspace: Workspace) -> Self {
        Self { workspace }
    }
}

#[derive(Debug, Deserialize)]
struct SearchFilesArgs {
    pattern: String,
    #[serde(default)]
    path: Option<String>,
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .map(|s| s.starts_with('.'))
            .unwrap_or(false)
}

fn search(workspace: &Workspace, start: &Path, regex: &Regex) -> (Vec<String>, bool) {
    let mut matches = Vec::new();

    let files = WalkDir::new(start)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e))
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file());

    for entry in files {
        if entry
            .metadata()
            .map(|m| m.len() > MAX_SEARCH_FILE_BYTES)
            .unwrap_or(true)
        {
            continue;
        }
        // Binary and non-UTF-8 files are skipped.
        let Ok(content) = std::fs::read_to_string(entry.path()) else {
            continue;
        };
        let shown = workspace.display_path(entry.path());
        for (index, line) in content.lines().enumerate() {
            if !regex.is_match(line) {
                continue;
            }
            if matches.len() == MAX_MATCHES {
                return (matches, true);
            }
            let line: String = line.trim_end().chars().take(MAX_LINE_CHARS).collect();
            matches.push(format!("{shown}:{}: {line}", index + 1));
        }
    }

    (matches, false)
}

#[async_trait]
impl Tool for SearchFilesTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn definition(&self) -> FunctionDefinition {
        FunctionDefinition::new(
            Self::NAME,
            "Search workspace text files for lines matching a regular expression.",
            json!({
                "type": "object",
                "properties": {
                    "pattern": {"type": "string", "description": "Regular expression (Rust regex syntax)"},
                    "path": {"type": "string", "description": "File or directory relative to the workspace root (default: root)"}
                },
                "required": ["pattern"]
            }),
        )
    }

    async fn call(&self, arguments: Value) -> Result<String, SidekickError> {
        let args: SearchFilesArgs = parse_args(Self::NAME, arguments)?;
        let regex = Regex::new(&args.pattern)
            .map_err(|e| SidekickError::tool(Self::NAME, format!("invalid pattern: {e}")))?;
        let start = self
            .workspace
            .resolve(args.path.as_deref().unwrap_or("."))?;

        let workspace = self.workspace.clone();
        let (matches, truncated) =
            tokio::task::spawn_blocking(move || search(&workspace, &start, &regex))
                .await
                .map_err(|e| SidekickError::InternalError(format!("search task failed: {e}")))?;
        debug!(pattern = %args.pattern, matches = matches.len(), truncated, "search_files finished");

        if matches.is_empty() {
            return Ok(format!("No matches for /{}/", args.pattern));
        }
        let mut out = matches.join("\n");
        if truncated {
            out.push_str(&format!("\n[stopped after {MAX_MATCHES} matches]"));
        }
        Ok(out)
    }
}
