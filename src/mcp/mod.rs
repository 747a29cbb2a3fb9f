pub mod error;
pub mod progress;
pub mod server;
pub mod types;

pub use server::{run_mcp_server, MaquetteServer};
pub use types::*;
