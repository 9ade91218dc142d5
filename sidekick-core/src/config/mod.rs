//! Configuration loading
//!
//! - `dotenv`: `.env` file parsing
//! - `env`: layered variable lookup (dotenv over process environment)
//! - `settings`: the resolved, typed configuration for a chat session

pub mod dotenv;
pub mod env;
pub mod settings;

pub use dotenv::{DotenvParser, EnvEntry, load_dotenv_file};
pub use env::EnvLayers;
pub use settings::{Settings, SettingsOverrides};
