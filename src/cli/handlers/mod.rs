//! CLI command handlers.

pub mod apply;
pub mod host;
pub mod templates;
