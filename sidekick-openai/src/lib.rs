//! sidekick-openai
//!
//! HTTP client for the OpenAI Assistants v2 API (assistants, threads, messages, runs)
//! and classification of OpenAI error envelopes.
#![deny(unsafe_code)]

pub mod client;
pub mod config;
pub mod errors;

pub use client::AssistantsClient;
pub use config::OpenAiConfig;
pub use errors::{classify_openai_compatible_http_error, classify_openai_error};
