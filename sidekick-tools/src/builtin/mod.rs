//! Built-in tools
//! - files.rs: read, write and list inside the workspace
//! - search.rs: regex search over workspace text files
//! - time.rs: local clock

pub mod files;
pub mod search;
pub mod time;

pub use files::{ListDirectoryTool, ReadFileTool, WriteFileTool};
pub use search::SearchFilesTool;
pub use time::GetCurrentTimeTool;
