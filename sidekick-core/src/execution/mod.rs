//! Execution primitives shared by API clients.

pub mod http;
