//! Shared building blocks for the site content workspace: response types,
//! logging setup and startup directory checks.

pub mod types;
pub mod utils;
pub mod env;
