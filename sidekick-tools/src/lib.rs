//! sidekick-tools
//!
//! Function tools the assistant can call while a run is in `requires_action`.
//! File tools are confined to a workspace root; see [`Workspace`].
#![deny(unsafe_code)]

pub mod builtin;
pub mod registry;
pub mod sandbox;
pub mod tool;

pub use registry::ToolRegistry;
pub use sandbox::Workspace;
pub use tool::{Tool, parse_args};
