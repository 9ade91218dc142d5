use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use sidekick_core::error::SidekickError;
use sidekick_core::types::FunctionDefinition;
use tokio::io::AsyncWriteExt;

use crate::sandbox::Workspace;
use crate::tool::{Tool, parse_args};

/// Largest file content returned to the assistant
pub const MAX_READ_BYTES: usize = 100 * 1024;

fn io_error(tool: &str, path: &str, err: std::io::Error) -> SidekickError {
    SidekickError::tool(tool, format!("{path}: {err}"))
}

/// Largest `cut <= limit` that does not split a UTF-8 sequence.
fn char_boundary_before(bytes: &[u8], limit: usize) -> usize {
    let mut cut = limit.min(bytes.len());
    // Continuation bytes look like 0b10xx_xxxx; a sequence has at most 3 of them.
    for _ in 0..3 {
        if cut == 0 || cut == bytes.len() || bytes[cut] & 0b1100_0000 != 0b1000_0000 {
            break;
        }
        cut -= 1;
    }
    cut
}

pub struct ReadFileTool {
    workspace: Workspace,
}

impl ReadFileTool {
    pub const NAME: &'static str = "read_file";

    pub fn new(workspace: Workspace) -> Self {
        Self { workspace }
    }
}

#[derive(Debug, Deserialize)]
struct ReadFileArgs {
    path: String,
}

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn definition(&self) -> FunctionDefinition {
        FunctionDefinition::new(
            Self::NAME,
            "Read a UTF-8 text file from the workspace.",
            json!({
                "type": "object",
                "properties": {
                    "path": {"type": "string", "description": "Path relative to the workspace root"}
                },
                "required": ["path"]
            }),
        )
    }

    async fn call(&self, arguments: Value) -> Result<String, SidekickError> {
        let args: ReadFileArgs = parse_args(Self::NAME, arguments)?;
        let path = self.workspace.resolve(&args.path)?;
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| io_error(Self::NAME, &args.path, e))?;

        if bytes.len() <= MAX_READ_BYTES {
            return Ok(String::from_utf8_lossy(&bytes).into_owned());
        }

        let cut = char_boundary_before(&bytes, MAX_READ_BYTES);
        let mut text = String::from_utf8_lossy(&bytes[..cut]).into_owned();
        text.push_str(&format!(
            "\n\n[truncated: showing {cut} of {} bytes]",
            bytes.len()
        ));
        Ok(text)
    }
}

pub struct WriteFileTool {
    workspace: Workspace,
}

impl WriteFileTool {
    pub const NAME: &'static str = "write_file";

    pub fn new(workspace: Workspace) -> Self {
        Self { workspace }
    }
}

#[derive(Debug, Deserialize)]
struct WriteFileArgs {
    path: String,
    content: String,
    #[serde(default)]
    append: bool,
}

#[async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn definition(&self) -> FunctionDefinition {
        FunctionDefinition::new(
            Self::NAME,
            "Write text to a file in the workspace, creating parent directories as needed.",
            json!({
                "type": "object",
                "properties": {
                    "path": {"type": "string", "description": "Path relative to the workspace root"},
                    "content": {"type": "string", "description": "Text to write"},
                    "append": {"type": "boolean", "description": "Append instead of overwriting", "default": false}
                },
                "required": ["path", "content"]
            }),
        )
    }

    async fn call(&self, arguments: Value) -> Result<String, SidekickError> {
        let args: WriteFileArgs = parse_args(Self::NAME, arguments)?;
        let path = self.workspace.resolve(&args.path)?;
        if path.is_dir() {
            return Err(SidekickError::tool(
                Self::NAME,
                format!("{} is a directory", args.path),
            ));
        }

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error(Self::NAME, &args.path, e))?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .append(args.append)
            .truncate(!args.append)
            .open(&path)
            .await
            .map_err(|e| io_error(Self::NAME, &args.path, e))?;
        file.write_all(args.content.as_bytes())
            .await
            .map_err(|e| io_error(Self::NAME, &args.path, e))?;
        file.flush()
            .await
            .map_err(|e| io_error(Self::NAME, &args.path, e))?;

        let verb = if args.append { "Appended" } else { "Wrote" };
        Ok(format!(
            "{verb} {} bytes to {}",
            args.content.len(),
            self.workspace.display_path(&path)
        ))
    }
}

pub struct ListDirectoryTool {
    workspace: Workspace,
}

impl ListDirectoryTool {
    pub const NAME: &'static str = "list_directory";

    pub fn new(workspace: Workspace) -> Self {
        Self { workspace }
    }
}

#[derive(Debug, Deserialize)]
struct ListDirectoryArgs {
    #[serde(default)]
    path: Option<String>,
}

#[async_trait]
impl Tool for ListDirectoryTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn definition(&self) -> FunctionDefinition {
        FunctionDefinition::new(
            Self::NAME,
            "List the entries of a workspace directory. Directories end with '/'.",
            json!({
                "type": "object",
                "properties": {
                    "path": {"type": "string", "description": "Directory relative to the workspace root (default: root)"}
                },
                "required": []
            }),
        )
    }

    async fn call(&self, arguments: Value) -> Result<String, SidekickError> {
        let args: ListDirectoryArgs = parse_args(Self::NAME, arguments)?;
        let requested = args.path.unwrap_or_else(|| ".".to_string());
        let dir = self.workspace.resolve(&requested)?;

        let mut reader = tokio::fs::read_dir(&dir)
            .await
            .map_err(|e| io_error(Self::NAME, &requested, e))?;
        let mut entries = Vec::new();
        while let Some(entry) = reader
            .next_entry()
            .await
            .map_err(|e| io_error(Self::NAME, &requested, e))?
        {
            let mut name = entry.file_name().to_string_lossy().into_owned();
            let is_dir = entry
                .file_type()
                .await
                .map(|t| t.is_dir())
                .unwrap_or(false);
            if is_dir {
                name.push('/');
            }
            entries.push(name);
        }
        entries.sort();

        if entries.is_empty() {
            return Ok(format!("{} is empty", self.workspace.display_path(&dir)));
        }
        Ok(entries.join("\n"))
    }
}
