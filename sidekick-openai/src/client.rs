//! OpenAI Assistants v2 client
//!
//! Implements `AssistantsCapability` over plain JSON requests. Each operation
//! declares whether it is safe to replay; non-idempotent calls (thread, message
//! and run creation, tool output submission) are only retried on rate limits.

use std::time::Instant;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Client as HttpClient, Method};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde_json::Value;

use sidekick_core::error::SidekickError;
use sidekick_core::execution::http::{HttpHeaderBuilder, build_http_client_from_config};
use sidekick_core::observability::ApiTracer;
use sidekick_core::retry_api::{RetryOptions, maybe_retry};
use sidekick_core::traits::AssistantsCapability;
use sidekick_core::types::{
    Assistant, AssistantUpdate, CreateMessageRequest, CreateRunRequest, DeletionStatus,
    ListResponse, Message, MessageListQuery, MessageRole, Run, SubmitToolOutputsRequest, Thread,
    ToolOutput,
};

use crate::config::{ASSISTANTS_BETA_HEADER, OpenAiConfig};
use crate::errors::classify_openai_error;

/// One Assistants API call
struct ApiRequest {
    operation: &'static str,
    method: Method,
    path: String,
    query: Vec<(&'static str, String)>,
    body: Option<Value>,
    idempotent: bool,
}

impl ApiRequest {
    fn new(operation: &'static str, method: Method, path: String) -> Self {
        let idempotent = method != Method::POST;
        Self {
            operation,
            method,
            path,
            query: Vec::new(),
            body: None,
            idempotent,
        }
    }

    fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    fn with_query(mut self, query: Vec<(&'static str, String)>) -> Self {
        self.query = query;
        self
    }

    /// Mark a POST as safe to replay (updates and cancellation).
    fn idempotent(mut self) -> Self {
        self.idempotent = true;
        self
    }
}

#[derive(Clone)]
pub struct AssistantsClient {
    config: OpenAiConfig,
    http_client: HttpClient,
    retry_options: Option<RetryOptions>,
}

impl AssistantsClient {
    /// Build a client with its own `reqwest::Client` from `config.http_config`.
    pub fn new(config: OpenAiConfig) -> Result<Self, SidekickError> {
        let http_client = build_http_client_from_config(&config.http_config)?;
        Ok(Self::with_http_client(config, http_client))
    }

    pub fn with_http_client(config: OpenAiConfig, http_client: HttpClient) -> Self {
        Self {
            config,
            http_client,
            retry_options: Some(RetryOptions::backoff()),
        }
    }

    /// Replace the retry options; `None` disables retries.
    pub fn with_retry_options(mut self, retry_options: Option<RetryOptions>) -> Self {
        self.retry_options = retry_options;
        self
    }

    pub fn config(&self) -> &OpenAiConfig {
        &self.config
    }

    fn build_headers(&self) -> Result<HeaderMap, SidekickError> {
        Ok(HttpHeaderBuilder::new()
            .with_bearer_auth(self.config.api_key.expose_secret())?
            .with_json_content_type()
            .with_header("OpenAI-Beta", ASSISTANTS_BETA_HEADER)?
            .with_optional_header("OpenAI-Organization", self.config.organization.as_deref())?
            .with_optional_header("OpenAI-Project", self.config.project.as_deref())?
            .with_custom_headers(&self.config.http_config.headers)?
            .build())
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url, path.trim_start_matches('/'))
    }

    async fn execute<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, SidekickError> {
        let retry_options = self
            .retry_options
            .clone()
            .map(|opts| opts.with_idempotent(request.idempotent));
        maybe_retry(retry_options, || self.send_once(&request)).await
    }

    async fn send_once<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<T, SidekickError> {
        let url = self.url(&request.path);
        let headers = self.build_headers()?;

        let tracer = ApiTracer::new("openai", request.operation);
        tracer.trace_request_start(request.method.as_str(), &url);
        tracer.trace_request_details(&headers, request.body.as_ref());
        let start = Instant::now();

        let mut builder = self
            .http_client
            .request(request.method.clone(), &url)
            .headers(headers);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let response_headers = response.headers().clone();
        let text = response.text().await?;

        if !status.is_success() {
            tracer.trace_request_error(status.as_u16(), &text, start);
            return Err(classify_openai_error(
                status.as_u16(),
                &text,
                &response_headers,
            ));
        }

        tracer.trace_request_complete(start, status.as_u16());
        tracer.trace_response_body(&text);

        serde_json::from_str(&text).map_err(|e| {
            SidekickError::JsonError(format!(
                "Failed to parse {} response: {e}",
                request.operation
            ))
        })
    }
}

impl std::fmt::Debug for AssistantsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssistantsClient")
            .field("base_url", &self.config.base_url)
            .field("has_organization", &self.config.organization.is_some())
            .field("has_project", &self.config.project.is_some())
            .field("has_retry", &self.retry_options.is_some())
            .finish()
    }
}

fn to_body<T: serde::Serialize>(value: &T) -> Result<Value, SidekickError> {
    serde_json::to_value(value).map_err(SidekickError::from)
}

#[async_trait]
impl AssistantsCapability for AssistantsClient {
    async fn retrieve_assistant(&self, assistant_id: &str) -> Result<Assistant, SidekickError> {
        self.execute(ApiRequest::new(
            "retrieve_assistant",
            Method::GET,
            format!("assistants/{assistant_id}"),
        ))
        .await
    }

    async fn update_assistant(
        &self,
        assistant_id: &str,
        update: AssistantUpdate,
    ) -> Result<Assistant, SidekickError> {
        self.execute(
            ApiRequest::new(
                "update_assistant",
                Method::POST,
                format!("assistants/{assistant_id}"),
            )
            .with_body(to_body(&update)?)
            .idempotent(),
        )
        .await
    }

    async fn create_thread(&self) -> Result<Thread, SidekickError> {
        self.execute(
            ApiRequest::new("create_thread", Method::POST, "threads".to_string())
                .with_body(Value::Object(Default::default())),
        )
        .await
    }

    async fn delete_thread(&self, thread_id: &str) -> Result<DeletionStatus, SidekickError> {
        self.execute(ApiRequest::new(
            "delete_thread",
            Method::DELETE,
            format!("threads/{thread_id}"),
        ))
        .await
    }

    async fn create_message(
        &self,
        thread_id: &str,
        content: &str,
    ) -> Result<Message, SidekickError> {
        let body = CreateMessageRequest {
            role: MessageRole::User,
            content: content.to_string(),
        };
        self.execute(
            ApiRequest::new(
                "create_message",
                Method::POST,
                format!("threads/{thread_id}/messages"),
            )
            .with_body(to_body(&body)?),
        )
        .await
    }

    async fn list_messages(
        &self,
        thread_id: &str,
        query: MessageListQuery,
    ) -> Result<ListResponse<Message>, SidekickError> {
        self.execute(
            ApiRequest::new(
                "list_messages",
                Method::GET,
                format!("threads/{thread_id}/messages"),
            )
            .with_query(query.to_query_pairs()),
        )
        .await
    }

    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<Run, SidekickError> {
        let body = CreateRunRequest {
            assistant_id: assistant_id.to_string(),
        };
        self.execute(
            ApiRequest::new("create_run", Method::POST, format!("threads/{thread_id}/runs"))
                .with_body(to_body(&body)?),
        )
        .await
    }

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run, SidekickError> {
        self.execute(ApiRequest::new(
            "retrieve_run",
            Method::GET,
            format!("threads/{thread_id}/runs/{run_id}"),
        ))
        .await
    }

    async fn list_runs(&self, thread_id: &str) -> Result<ListResponse<Run>, SidekickError> {
        self.execute(ApiRequest::new(
            "list_runs",
            Method::GET,
            format!("threads/{thread_id}/runs"),
        ))
        .await
    }

    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<Run, SidekickError> {
        self.execute(
            ApiRequest::new(
                "cancel_run",
                Method::POST,
                format!("threads/{thread_id}/runs/{run_id}/cancel"),
            )
            .idempotent(),
        )
        .await
    }

    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: Vec<ToolOutput>,
    ) -> Result<Run, SidekickError> {
        let body = SubmitToolOutputsRequest {
            tool_outputs: outputs,
        };
        self.execute(
            ApiRequest::new(
                "submit_tool_outputs",
                Method::POST,
                format!("threads/{thread_id}/runs/{run_id}/submit_tool_outputs"),
            )
            .with_body(to_body(&body)?),
        )
        .await
    }
}
