//! Tool registry and dispatch of run tool calls.

use std::sync::Arc;

use futures::future::join_all;
use serde_json::Value;
use sidekick_core::error::SidekickError;
use sidekick_core::types::{ToolCall, ToolDefinition, ToolOutput};
use tracing::{debug, warn};

use crate::builtin::{
    GetCurrentTimeTool, ListDirectoryTool, ReadFileTool, SearchFilesTool, WriteFileTool,
};
use crate::sandbox::Workspace;
use crate::tool::Tool;

/// Ordered set of tools, unique by name.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in tool, file tools rooted at `workspace`.
    pub fn with_builtin_tools(workspace: Workspace) -> Self {
        let mut registry = Self::new();
        registry.register(ReadFileTool::new(workspace.clone()));
        registry.register(WriteFileTool::new(workspace.clone()));
        registry.register(ListDirectoryTool::new(workspace.clone()));
        registry.register(SearchFilesTool::new(workspace));
        registry.register(GetCurrentTimeTool);
        registry
    }

    /// Add a tool, replacing any tool with the same name.
    pub fn register(&mut self, tool: impl Tool + 'static) {
        let tool: Arc<dyn Tool> = Arc::new(tool);
        match self.tools.iter_mut().find(|t| t.name() == tool.name()) {
            Some(slot) => *slot = tool,
            None => self.tools.push(tool),
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Function definitions for every registered tool, followed by `hosted`.
    pub fn definitions(&self, hosted: &[ToolDefinition]) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|t| ToolDefinition::function(t.definition()))
            .chain(hosted.iter().cloned())
            .collect()
    }

    /// Execute the function calls of a `requires_action` run.
    ///
    /// `observer` sees each call's name and arguments before it runs. Calls run
    /// concurrently and outputs come back in call order. Failures are reported to
    /// the model as `Error: ...` outputs rather than aborting the run.
    pub async fn handle_tool_calls<F>(&self, calls: &[ToolCall], mut observer: F) -> Vec<ToolOutput>
    where
        F: FnMut(&str, &Value),
    {
        let pending = calls.iter().filter_map(|call| {
            let function = call.function.as_ref()?;
            if call.kind != "function" {
                debug!(tool_call_id = %call.id, kind = %call.kind, "Skipping non-function tool call");
                return None;
            }

            let parsed: Result<Value, _> = if function.arguments.trim().is_empty() {
                Ok(Value::Object(Default::default()))
            } else {
                serde_json::from_str(&function.arguments)
            };
            let shown = parsed
                .as_ref()
                .cloned()
                .unwrap_or_else(|_| Value::String(function.arguments.clone()));
            observer(&function.name, &shown);

            let tool = self.get(&function.name);
            let name = function.name.clone();
            let id = call.id.clone();
            Some(async move {
                let result = match (tool, parsed) {
                    (None, _) => Err(SidekickError::tool(&name, "unknown tool")),
                    (Some(_), Err(e)) => Err(SidekickError::tool(
                        &name,
                        format!("arguments are not valid JSON: {e}"),
                    )),
                    (Some(tool), Ok(args)) => tool.call(args).await,
                };
                let output = match result {
                    Ok(text) => text,
                    Err(e) => {
                        warn!(tool = %name, tool_call_id = %id, error = %e, "Tool call failed");
                        format!("Error: {e}")
                    }
                };
                ToolOutput {
                    tool_call_id: id,
                    output,
                }
            })
        });

        join_all(pending.collect::<Vec<_>>()).await
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}
