pub mod bridge;
pub mod cli;
pub mod error;
pub mod executor;
pub mod init;
pub mod mcp;
pub mod merge;
pub mod models;
pub mod progress;
pub mod store;
pub mod utils;

pub use error::MaquetteError;
