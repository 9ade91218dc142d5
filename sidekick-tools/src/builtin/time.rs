use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone};
use serde_json::{Value, json};
use sidekick_core::error::SidekickError;
use sidekick_core::types::FunctionDefinition;

use crate::tool::Tool;

pub struct GetCurrentTimeTool;

impl GetCurrentTimeTool {
    pub const NAME: &'static str = "get_current_time";
}

fn describe<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("{} ({})", now.to_rfc3339(), now.format("%A"))
}

#[async_trait]
impl Tool for GetCurrentTimeTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn definition(&self) -> FunctionDefinition {
        FunctionDefinition::new(
            Self::NAME,
            "Get the current local date and time (RFC 3339) and the day of the week.",
            json!({"type": "object", "properties": {}, "required": []}),
        )
    }

    async fn call(&self, _arguments: Value) -> Result<String, SidekickError> {
        Ok(describe(&Local::now()))
    }
}
