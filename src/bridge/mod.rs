//! Socket bridge between the controller process and the host application.
//!
//! The controller side ([`BridgeClient`]) and the host side
//! ([`CommandServer`]) speak the same framed JSON protocol: a 4-byte
//! big-endian length prefix followed by a UTF-8 JSON payload, one request
//! and one response alternating per connection.

pub mod client;
pub mod frame;
pub mod protocol;
pub mod server;

pub use client::{BridgeClient, BridgeConfig, ToolInvoker, DEFAULT_HOST, DEFAULT_PORT};
pub use frame::{frame_payload, read_frame, write_frame, MAX_FRAME_SIZE};
pub use protocol::{BridgeError, ToolInvocation, WireErrorKind, WireRequest, WireResponse};
pub use server::{CommandHandler, CommandServer};
