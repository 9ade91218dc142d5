//! Tool definitions pushed to the assistant.

use serde::{Deserialize, Serialize};

/// Function tool schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// JSON schema for the function arguments
    pub parameters: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strict: Option<bool>,
}

impl FunctionDefinition {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            strict: None,
        }
    }
}

/// A tool attached to an assistant.
///
/// `code_interpreter` and `file_search` run on the server; only `function` tools
/// come back to the client as `requires_action`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolDefinition {
    Function { function: FunctionDefinition },
    CodeInterpreter,
    FileSearch,
    #[serde(other)]
    Other,
}

impl ToolDefinition {
    pub fn function(definition: FunctionDefinition) -> Self {
        Self::Function {
            function: definition,
        }
    }

    /// Resolve a hosted tool by its wire name.
    pub fn hosted(name: &str) -> Option<Self> {
        match name.trim() {
            "code_interpreter" => Some(Self::CodeInterpreter),
            "file_search" => Some(Self::FileSearch),
            _ => None,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Function { function } => &function.name,
            Self::CodeInterpreter => "code_interpreter",
            Self::FileSearch => "file_search",
            Self::Other => "other",
        }
    }
}
