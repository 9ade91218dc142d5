//! sidekick
//!
//! Interactive terminal client for a hosted OpenAI assistant. The chat session keeps
//! a persisted conversation thread and executes local workspace tools on request.
#![deny(unsafe_code)]

pub mod cli;
pub mod logging;
pub mod manifest;
pub mod prompts;
pub mod session;
pub mod terminal;

pub use session::{SessionManager, SessionOptions, ThreadStore};
pub use terminal::Console;
