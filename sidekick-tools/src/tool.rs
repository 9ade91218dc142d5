use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use sidekick_core::error::SidekickError;
use sidekick_core::types::FunctionDefinition;

/// A function the assistant may invoke.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Wire name, unique within a registry
    fn name(&self) -> &str;

    /// Schema advertised to the assistant
    fn definition(&self) -> FunctionDefinition;

    /// Execute with already-decoded JSON arguments; the returned text is sent
    /// back as the tool output.
    async fn call(&self, arguments: Value) -> Result<String, SidekickError>;
}

/// Decode tool arguments into a typed struct.
pub fn parse_args<T: DeserializeOwned>(tool: &str, arguments: Value) -> Result<T, SidekickError> {
    serde_json::from_value(arguments)
        .map_err(|e| SidekickError::tool(tool, format!("invalid arguments: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Args {
        path: String,
    }

    #[test]
    fn parse_args_reports_tool_name() {
        let err = parse_args::<Args>("read_file", serde_json::json!({})).unwrap_err();
        assert!(err.to_string().contains("read_file"));
        assert!(err.to_string().contains("missing field `path`"));

        let ok: Args = parse_args("read_file", serde_json::json!({"path": "a.txt"})).unwrap();
        assert_eq!(ok.path, "a.txt");
    }
}
