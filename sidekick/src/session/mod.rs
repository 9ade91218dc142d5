//! Chat session
//! - store.rs: persisted thread id
//! - manager.rs: assistant setup, turn processing and run polling

pub mod manager;
pub mod store;

pub use manager::{SessionManager, SessionOptions};
pub use store::ThreadStore;
