//! Interactive session against a hosted assistant.

use std::time::Duration;

use sidekick_core::config::Settings;
use sidekick_core::error::SidekickError;
use sidekick_core::traits::AssistantsCapability;
use sidekick_core::types::{
    AssistantUpdate, MessageListQuery, MessageRole, Run, RunStatus, ToolDefinition,
};
use sidekick_tools::ToolRegistry;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::store::ThreadStore;
use crate::prompts::SUPER_ASSISTANT_INSTRUCTIONS;
use crate::terminal::Console;

/// Messages fetched when looking for a run's reply
const REPLY_LOOKUP_LIMIT: u32 = 20;

/// Session behavior resolved from settings
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub assistant_id: String,
    pub model: String,
    pub instructions: String,
    pub hosted_tools: Vec<ToolDefinition>,
    pub poll_interval: Duration,
    pub run_timeout: Duration,
    /// Include error details when printing failures
    pub verbose: bool,
}

impl SessionOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            assistant_id: settings.assistant_id.clone(),
            model: settings.model.clone(),
            instructions: SUPER_ASSISTANT_INSTRUCTIONS.to_string(),
            hosted_tools: settings.hosted_tools.clone(),
            poll_interval: settings.poll_interval,
            run_timeout: settings.run_timeout,
            verbose: false,
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

pub struct SessionManager<C> {
    client: C,
    options: SessionOptions,
    console: Console,
    store: ThreadStore,
    tools: ToolRegistry,
    thread_id: String,
}

impl<C: AssistantsCapability> SessionManager<C> {
    /// Retrieve and configure the assistant, then reuse the saved thread or start one.
    pub async fn connect(
        client: C,
        options: SessionOptions,
        console: Console,
        store: ThreadStore,
        tools: ToolRegistry,
    ) -> Result<Self, SidekickError> {
        client
            .retrieve_assistant(&options.assistant_id)
            .await
            .map_err(|e| {
                SidekickError::ConfigurationError(format!(
                    "Could not retrieve assistant with ID {}: {e}",
                    options.assistant_id
                ))
            })?;

        let mut session = Self {
            client,
            options,
            console,
            store,
            tools,
            thread_id: String::new(),
        };
        session.update_assistant_configuration().await;

        match session.store.read_thread_id()? {
            Some(thread_id) => {
                info!(thread_id = %thread_id, "Resuming saved thread");
                session.thread_id = thread_id;
            }
            None => session.create_new_thread().await?,
        }
        Ok(session)
    }

    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    pub fn console_mut(&mut self) -> &mut Console {
        &mut self.console
    }

    /// Push instructions, tool definitions and model. Failure is only a warning.
    pub async fn update_assistant_configuration(&mut self) {
        self.console
            .print_system_message("Updating assistant configuration...");
        let update = AssistantUpdate {
            model: Some(self.options.model.clone()),
            instructions: Some(self.options.instructions.clone()),
            tools: Some(self.tools.definitions(&self.options.hosted_tools)),
        };
        match self
            .client
            .update_assistant(&self.options.assistant_id, update)
            .await
        {
            Ok(_) => self
                .console
                .print_system_message("Assistant configuration updated successfully!"),
            Err(e) => {
                warn!(error = %e, "Assistant update failed");
                self.console.print_system_message(&format!(
                    "Warning: Failed to update assistant configuration: {e}"
                ));
            }
        }
    }

    pub async fn create_new_thread(&mut self) -> Result<(), SidekickError> {
        let thread = self.client.create_thread().await?;
        self.store.save_thread_id(&thread.id)?;
        info!(thread_id = %thread.id, "Created thread");
        self.thread_id = thread.id;
        self.console
            .print_system_message("New conversation thread created.");
        Ok(())
    }

    pub async fn reset_thread(&mut self) -> Result<(), SidekickError> {
        self.store.clear_thread_id()?;
        self.create_new_thread().await?;
        self.console
            .print_system_message("Conversation thread has been reset.");
        Ok(())
    }

    /// Handle one line of input. Returns `false` when the session should end.
    ///
    /// A failed turn is reported and the conversation restarts on a fresh thread;
    /// only a failure to create that thread is returned as an error.
    pub async fn process_user_input(&mut self, input: &str) -> Result<bool, SidekickError> {
        match self.handle_input(input).await {
            Ok(keep_going) => Ok(keep_going),
            Err(e) => {
                self.console.stop_spinner();
                warn!(error = %e, "Turn failed");
                self.console
                    .print_system_message(&format!("An error occurred: {e}"));
                if self.options.verbose {
                    self.console.print_error(&e, true);
                }
                self.console
                    .print_system_message("Starting a new conversation...");
                self.reset_thread().await?;
                Ok(true)
            }
        }
    }

    async fn handle_input(&mut self, input: &str) -> Result<bool, SidekickError> {
        let input = input.trim();
        match input.to_lowercase().as_str() {
            "" => return Ok(true),
            "exit" | "quit" => {
                self.console.print_system_message("Goodbye!");
                return Ok(false);
            }
            "reset" => {
                self.reset_thread().await?;
                return Ok(true);
            }
            "help" => {
                self.console.print_help();
                return Ok(true);
            }
            _ => {}
        }

        self.cancel_active_runs().await;
        self.client.create_message(&self.thread_id, input).await?;
        let run = self
            .client
            .create_run(&self.thread_id, &self.options.assistant_id)
            .await?;
        debug!(run_id = %run.id, "Run created");

        self.console.start_spinner("Thinking...");
        let completed = self.wait_for_completion(&run.id).await;
        self.console.stop_spinner();

        if let Some(run) = completed? {
            self.print_reply(&run).await?;
        }
        Ok(true)
    }

    /// Cancel runs that still hold the thread. Errors are printed, not returned.
    pub async fn cancel_active_runs(&mut self) {
        if let Err(e) = self.try_cancel_active_runs().await {
            self.console
                .print_system_message(&format!("Error canceling runs: {e}"));
        }
    }

    async fn try_cancel_active_runs(&self) -> Result<(), SidekickError> {
        let runs = self.client.list_runs(&self.thread_id).await?;
        for run in runs.data {
            // `cancelling` is already on its way out.
            if run.status.is_active() && run.status != RunStatus::Cancelling {
                debug!(run_id = %run.id, status = %run.status, "Cancelling active run");
                self.client.cancel_run(&self.thread_id, &run.id).await?;
            }
        }
        Ok(())
    }

    /// Poll a run until it completes, fails or times out, executing tool calls
    /// along the way. `None` means there is no reply to show.
    pub async fn wait_for_completion(&mut self, run_id: &str) -> Result<Option<Run>, SidekickError> {
        let deadline = Instant::now() + self.options.run_timeout;

        while Instant::now() < deadline {
            let run = self.client.retrieve_run(&self.thread_id, run_id).await?;
            debug!(run_id, status = %run.status, "Polled run");

            match &run.status {
                RunStatus::Completed => return Ok(Some(run)),
                RunStatus::RequiresAction => {
                    let calls = run.pending_tool_calls();
                    let console = &mut self.console;
                    let outputs = self
                        .tools
                        .handle_tool_calls(calls, |name, args| console.print_tool_usage(name, args))
                        .await;
                    if !outputs.is_empty()
                        && let Err(e) = self
                            .client
                            .submit_tool_outputs(&self.thread_id, run_id, outputs)
                            .await
                    {
                        self.console
                            .print_system_message(&format!("Error handling tool calls: {e}"));
                        return Ok(None);
                    }
                }
                status if status.is_terminal() => {
                    let mut message = format!("Run ended with status: {status}");
                    if let Some(error) = run.last_error.as_ref().filter(|e| !e.message.is_empty()) {
                        message.push_str(&format!(" ({})", error.message));
                    }
                    self.console.print_system_message(&message);
                    return Ok(None);
                }
                _ => {}
            }

            tokio::time::sleep(self.options.poll_interval).await;
        }

        self.console.print_system_message("Run timed out");
        if let Err(e) = self.client.cancel_run(&self.thread_id, run_id).await {
            debug!(run_id, error = %e, "Cancel after timeout failed");
        }
        Ok(None)
    }

    async fn print_reply(&mut self, run: &Run) -> Result<(), SidekickError> {
        let messages = self
            .client
            .list_messages(
                &self.thread_id,
                MessageListQuery::latest(REPLY_LOOKUP_LIMIT).for_run(&run.id),
            )
            .await?;
        match messages
            .data
            .iter()
            .find(|m| m.role == MessageRole::Assistant)
        {
            Some(message) => self.console.print_assistant_response(&message.text()),
            None => debug!(run_id = %run.id, "Run completed without an assistant message"),
        }
        Ok(())
    }

    /// Chat loop until `exit`, end of input, or a fatal error.
    pub async fn run(&mut self) -> Result<(), SidekickError> {
        self.console.clear_screen();
        self.console.print_welcome_message();
        self.console.print_divider();

        loop {
            let Some(input) = self.console.get_user_input().await else {
                self.console.print_system_message("Goodbye!");
                return Ok(());
            };
            self.console.print_divider();

            if !self.process_user_input(&input).await? {
                return Ok(());
            }

            self.console.print_divider();
        }
    }
}

impl<C> std::fmt::Debug for SessionManager<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("assistant_id", &self.options.assistant_id)
            .field("thread_id", &self.thread_id)
            .field("tools", &self.tools)
            .finish()
    }
}
