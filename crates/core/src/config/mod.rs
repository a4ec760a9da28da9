//! Configuration loading and schema definitions
//!
//! Defaults for the converter session: domain tag, conversion parameters
//! and resource limits.

mod loader;
mod schema;

pub use loader::Config;
pub use schema::*;
