//! Capability traits.
//!
//! `AssistantsCapability` is the seam between the chat session and the hosted
//! Assistants API. The HTTP client in `sidekick-openai` implements it.

use async_trait::async_trait;

use crate::error::SidekickError;
use crate::types::{
    Assistant, AssistantUpdate, DeletionStatus, ListResponse, Message, MessageListQuery, Run,
    Thread, ToolOutput,
};

#[async_trait]
pub trait AssistantsCapability: Send + Sync {
    async fn retrieve_assistant(&self, assistant_id: &str) -> Result<Assistant, SidekickError>;

    async fn update_assistant(
        &self,
        assistant_id: &str,
        update: AssistantUpdate,
    ) -> Result<Assistant, SidekickError>;

    async fn create_thread(&self) -> Result<Thread, SidekickError>;

    async fn delete_thread(&self, thread_id: &str) -> Result<DeletionStatus, SidekickError>;

    /// Append a user message to a thread.
    async fn create_message(&self, thread_id: &str, content: &str)
    -> Result<Message, SidekickError>;

    async fn list_messages(
        &self,
        thread_id: &str,
        query: MessageListQuery,
    ) -> Result<ListResponse<Message>, SidekickError>;

    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<Run, SidekickError>;

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run, SidekickError>;

    async fn list_runs(&self, thread_id: &str) -> Result<ListResponse<Run>, SidekickError>;

    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<Run, SidekickError>;

    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: Vec<ToolOutput>,
    ) -> Result<Run, SidekickError>;
}
