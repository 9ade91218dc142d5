//! Session flow tests against a mocked Assistants API.

use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;
use sidekick::{Console, SessionManager, SessionOptions, ThreadStore};
use sidekick_core::error::SidekickError;
use sidekick_openai::{AssistantsClient, OpenAiConfig};
use sidekick_tools::{ToolRegistry, Workspace};
use tempfile::TempDir;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl SharedBuffer {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

struct Harness {
    server: MockServer,
    dir: TempDir,
    out: SharedBuffer,
}

impl Harness {
    async fn new() -> Self {
        Self {
            server: MockServer::start().await,
            dir: tempfile::tempdir().unwrap(),
            out: SharedBuffer::default(),
        }
    }

    fn store(&self) -> ThreadStore {
        ThreadStore::new(self.dir.path().join("state").join("thread_id"))
    }

    fn options(&self) -> SessionOptions {
        SessionOptions {
            assistant_id: "asst_abc".into(),
            model: "gpt-4o-mini".into(),
            instructions: "Be helpful.".into(),
            hosted_tools: Vec::new(),
            poll_interval: Duration::from_millis(10),
            run_timeout: Duration::from_secs(5),
            verbose: false,
        }
    }

    fn client(&self) -> AssistantsClient {
        AssistantsClient::new(
            OpenAiConfig::new("sk-test").with_base_url(&format!("{}/v1", self.server.uri())),
        )
        .unwrap()
        .with_retry_options(None)
    }

    async fn connect_with(
        &self,
        options: SessionOptions,
        input: &'static str,
    ) -> Result<SessionManager<AssistantsClient>, SidekickError> {
        let workspace = Workspace::new(self.dir.path()).unwrap();
        SessionManager::connect(
            self.client(),
            options,
            Console::new(input.as_bytes(), self.out.clone()),
            self.store(),
            ToolRegistry::with_builtin_tools(workspace),
        )
        .await
    }

    async fn connect(&self) -> SessionManager<AssistantsClient> {
        self.connect_with(self.options(), "").await.unwrap()
    }

    async fn mount_assistant(&self) {
        Mock::given(method("GET"))
            .and(path("/v1/assistants/asst_abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "asst_abc",
                "object": "assistant",
                "model": "gpt-4o",
                "tools": []
            })))
            .mount(&self.server)
            .await;

        Mock::given(method("POST"))
            .and(path("/v1/assistants/asst_abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "asst_abc",
                "object": "assistant",
                "model": "gpt-4o-mini"
            })))
            .mount(&self.server)
            .await;
    }

    async fn mount_create_thread(&self, thread_id: &str) {
        Mock::given(method("POST"))
            .and(path("/v1/threads"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": thread_id,
                "object": "thread",
                "created_at": 1699012949
            })))
            .mount(&self.server)
            .await;
    }

    async fn mount_no_active_runs(&self, thread_id: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/v1/threads/{thread_id}/runs")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "object": "list",
                "data": [],
                "has_more": false
            })))
            .mount(&self.server)
            .await;
    }

    async fn mount_message_and_run(&self, thread_id: &str, run_id: &str) {
        Mock::given(method("POST"))
            .and(path(format!("/v1/threads/{thread_id}/messages")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "msg_user",
                "thread_id": thread_id,
                "role": "user",
                "content": []
            })))
            .expect(1)
            .mount(&self.server)
            .await;

        Mock::given(method("POST"))
            .and(path(format!("/v1/threads/{thread_id}/runs")))
            .and(body_json(json!({"assistant_id": "asst_abc"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(run_json(run_id, "queued")))
            .expect(1)
            .mount(&self.server)
            .await;
    }
}

fn run_json(run_id: &str, status: &str) -> serde_json::Value {
    json!({
        "id": run_id,
        "object": "thread.run",
        "thread_id": "thread_abc",
        "assistant_id": "asst_abc",
        "status": status
    })
}

#[tokio::test]
async fn test_connect_configures_assistant_and_creates_thread() {
    let h = Harness::new().await;
    h.mount_assistant().await;
    h.mount_create_thread("thread_new").await;

    let session = h.connect().await;

    assert_eq!(session.thread_id(), "thread_new");
    assert_eq!(
        h.store().read_thread_id().unwrap().as_deref(),
        Some("thread_new")
    );
    assert_eq!(
        h.out.contents(),
        "Updating assistant configuration...\n\
         Assistant configuration updated successfully!\n\
         New conversation thread created.\n"
    );
}

#[tokio::test]
async fn test_connect_reuses_saved_thread() {
    let h = Harness::new().await;
    h.mount_assistant().await;
    h.store().save_thread_id("thread_saved").unwrap();

    Mock::given(method("POST"))
        .and(path("/v1/threads"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&h.server)
        .await;

    let session = h.connect().await;
    assert_eq!(session.thread_id(), "thread_saved");
    assert!(!h.out.contents().contains("New conversation thread created."));
}

#[tokio::test]
async fn test_missing_assistant_is_fatal() {
    let h = Harness::new().await;
    Mock::given(method("GET"))
        .and(path("/v1/assistants/asst_abc"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {
                "message": "No assistant found with id 'asst_abc'.",
                "type": "invalid_request_error",
                "code": null
            }
        })))
        .mount(&h.server)
        .await;

    let err = h.connect_with(h.options(), "").await.unwrap_err();
    assert!(matches!(err, SidekickError::ConfigurationError(_)));
    assert!(
        err.to_string()
            .starts_with("Configuration error: Could not retrieve assistant with ID asst_abc: Not found:")
    );
}

#[tokio::test]
async fn test_failed_update_is_only_a_warning() {
    let h = Harness::new().await;
    Mock::given(method("GET"))
        .and(path("/v1/assistants/asst_abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "asst_abc"})))
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/assistants/asst_abc"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"message": "Invalid model", "type": "invalid_request_error"}
        })))
        .mount(&h.server)
        .await;
    h.mount_create_thread("thread_new").await;

    let session = h.connect().await;
    assert_eq!(session.thread_id(), "thread_new");
    assert!(h.out.contents().contains(
        "Warning: Failed to update assistant configuration: Invalid input: Invalid model"
    ));
}

#[tokio::test]
async fn test_turn_with_tool_call_renders_reply() {
    let h = Harness::new().await;
    h.mount_assistant().await;
    h.store().save_thread_id("thread_abc").unwrap();

    // A stale run still holds the thread and must be cancelled first.
    Mock::given(method("GET"))
        .and(path("/v1/threads/thread_abc/runs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "data": [run_json("run_old", "in_progress"), run_json("run_done", "completed")]
        })))
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/threads/thread_abc/runs/run_old/cancel"))
        .respond_with(ResponseTemplate::new(200).set_body_json(run_json("run_old", "cancelling")))
        .expect(1)
        .mount(&h.server)
        .await;

    h.mount_message_and_run("thread_abc", "run_1").await;

    let mut requires_action = run_json("run_1", "requires_action");
    requires_action["required_action"] = json!({
        "type": "submit_tool_outputs",
        "submit_tool_outputs": {
            "tool_calls": [{
                "id": "call_time",
                "type": "function",
                "function": {"name": "get_current_time", "arguments": "{}"}
            }]
        }
    });
    Mock::given(method("GET"))
        .and(path("/v1/threads/thread_abc/runs/run_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(requires_action))
        .up_to_n_times(1)
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/threads/thread_abc/runs/run_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(run_json("run_1", "completed")))
        .mount(&h.server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/threads/thread_abc/runs/run_1/submit_tool_outputs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(run_json("run_1", "in_progress")))
        .expect(1)
        .mount(&h.server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/threads/thread_abc/messages"))
        .and(query_param("order", "desc"))
        .and(query_param("run_id", "run_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "data": [{
                "id": "msg_reply",
                "thread_id": "thread_abc",
                "role": "assistant",
                "run_id": "run_1",
                "content": [{"type": "text", "text": {"value": "It is noon.", "annotations": []}}]
            }]
        })))
        .expect(1)
        .mount(&h.server)
        .await;

    let mut session = h.connect().await;
    let keep_going = session.process_user_input("What time is it?").await.unwrap();

    assert!(keep_going);
    let out = h.out.contents();
    assert!(out.contains("Using tool: get_current_time\n"));
    assert!(out.ends_with("Assistant:\nIt is noon.\n"));
    assert!(!out.contains("An error occurred"));
}

#[tokio::test]
async fn test_failed_run_reports_status_without_reply() {
    let h = Harness::new().await;
    h.mount_assistant().await;
    h.store().save_thread_id("thread_abc").unwrap();
    h.mount_no_active_runs("thread_abc").await;
    h.mount_message_and_run("thread_abc", "run_1").await;

    let mut failed = run_json("run_1", "failed");
    failed["last_error"] = json!({"code": "server_error", "message": "Something went wrong."});
    Mock::given(method("GET"))
        .and(path("/v1/threads/thread_abc/runs/run_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(failed))
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/threads/thread_abc/messages"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&h.server)
        .await;

    let mut session = h.connect().await;
    assert!(session.process_user_input("hello").await.unwrap());
    assert!(
        h.out
            .contents()
            .ends_with("Run ended with status: failed (Something went wrong.)\n")
    );
    assert_eq!(session.thread_id(), "thread_abc");
}

#[tokio::test]
async fn test_turn_error_starts_new_conversation() {
    let h = Harness::new().await;
    h.mount_assistant().await;
    h.store().save_thread_id("thread_gone").unwrap();
    h.mount_no_active_runs("thread_gone").await;
    h.mount_create_thread("thread_fresh").await;

    Mock::given(method("POST"))
        .and(path("/v1/threads/thread_gone/messages"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"message": "No thread found with id 'thread_gone'.", "type": "invalid_request_error"}
        })))
        .expect(1)
        .mount(&h.server)
        .await;

    let mut session = h.connect().await;
    assert!(session.process_user_input("hello").await.unwrap());

    let out = h.out.contents();
    assert!(out.contains("An error occurred: Not found: No thread found with id 'thread_gone'.\n"));
    assert!(out.ends_with(
        "Starting a new conversation...\n\
         New conversation thread created.\n\
         Conversation thread has been reset.\n"
    ));
    assert_eq!(session.thread_id(), "thread_fresh");
    assert_eq!(
        h.store().read_thread_id().unwrap().as_deref(),
        Some("thread_fresh")
    );
}

#[tokio::test]
async fn test_cancel_errors_do_not_abort_the_turn() {
    let h = Harness::new().await;
    h.mount_assistant().await;
    h.store().save_thread_id("thread_abc").unwrap();
    Mock::given(method("GET"))
        .and(path("/v1/threads/thread_abc/runs"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&h.server)
        .await;
    h.mount_message_and_run("thread_abc", "run_1").await;
    Mock::given(method("GET"))
        .and(path("/v1/threads/thread_abc/runs/run_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(run_json("run_1", "cancelled")))
        .mount(&h.server)
        .await;

    let mut session = h.connect().await;
    assert!(session.process_user_input("hello").await.unwrap());
    let out = h.out.contents();
    assert!(out.contains("Error canceling runs: API error 500"));
    assert!(out.ends_with("Run ended with status: cancelled\n"));
}

#[tokio::test]
async fn test_run_timeout_cancels_the_run() {
    let h = Harness::new().await;
    h.mount_assistant().await;
    h.store().save_thread_id("thread_abc").unwrap();
    h.mount_no_active_runs("thread_abc").await;
    h.mount_message_and_run("thread_abc", "run_1").await;
    Mock::given(method("GET"))
        .and(path("/v1/threads/thread_abc/runs/run_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(run_json("run_1", "in_progress")))
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/threads/thread_abc/runs/run_1/cancel"))
        .respond_with(ResponseTemplate::new(200).set_body_json(run_json("run_1", "cancelling")))
        .expect(1)
        .mount(&h.server)
        .await;

    let mut options = h.options();
    options.run_timeout = Duration::from_millis(80);
    let mut session = h.connect_with(options, "").await.unwrap();

    assert!(session.process_user_input("hello").await.unwrap());
    assert!(h.out.contents().ends_with("Run timed out\n"));
}

#[tokio::test]
async fn test_local_commands() {
    let h = Harness::new().await;
    h.mount_assistant().await;
    h.store().save_thread_id("thread_abc").unwrap();
    h.mount_create_thread("thread_reset").await;

    let mut session = h.connect().await;
    let before = h.out.contents().len();

    assert!(session.process_user_input("   ").await.unwrap());
    assert_eq!(h.out.contents().len(), before);

    assert!(session.process_user_input(" HELP ").await.unwrap());
    assert!(h.out.contents().contains("  reset       Start a new conversation thread\n"));

    assert!(session.process_user_input("Reset").await.unwrap());
    assert_eq!(session.thread_id(), "thread_reset");
    assert!(
        h.out
            .contents()
            .ends_with("New conversation thread created.\nConversation thread has been reset.\n")
    );

    assert!(!session.process_user_input("quit").await.unwrap());
    assert!(h.out.contents().ends_with("Goodbye!\n"));
    assert!(!session.process_user_input("EXIT").await.unwrap());
}

#[tokio::test]
async fn test_chat_loop_until_end_of_input() {
    let h = Harness::new().await;
    h.mount_assistant().await;
    h.store().save_thread_id("thread_abc").unwrap();

    let mut session = h.connect_with(h.options(), "help\n").await.unwrap();
    session.run().await.unwrap();

    let out = h.out.contents();
    let divider = "─".repeat(80);
    assert!(out.contains("Commands:\n  exit, quit  End the session\n"));
    assert!(out.contains(&format!("You: {divider}\nCommands:")));
    assert!(out.ends_with("You: Goodbye!\n"));
}
