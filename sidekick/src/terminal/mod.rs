//! Terminal output
//! - style.rs: `Console`, the colored and wrapped chat renderer
//! - spinner.rs: progress spinner shown while a run is working

pub mod spinner;
pub mod style;

pub use spinner::create_spinner;
pub use style::{Console, DEFAULT_WIDTH, Segment, split_fenced_blocks};
