//! Shared types: HTTP configuration and the Assistants v2 wire model.

pub mod assistants;
pub mod http;
pub mod tools;

pub use assistants::*;
pub use http::*;
pub use tools::*;
