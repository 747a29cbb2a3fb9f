//! Wire protocol types and the transport error taxonomy.
//!
//! Requests and responses travel as JSON payloads inside length-prefixed
//! frames (see `frame`). The exchange is strictly alternating: one request,
//! one response, nothing in flight concurrently on a connection.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// A named host operation plus its parameter mapping, the unit of
/// dispatch across the bridge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub name: String,
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl ToolInvocation {
    pub fn new(name: impl Into<String>, params: Map<String, Value>) -> Self {
        ToolInvocation {
            name: name.into(),
            params,
        }
    }
}

/// Request frame payload, controller to host.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WireRequest {
    /// Invoke a named command.
    Command {
        /// Command name.
        command: String,
        /// Parameters passed to the handler verbatim.
        #[serde(default)]
        params: Map<String, Value>,
    },
}

/// Response frame payload, host to controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WireResponse {
    /// Command succeeded.
    Ok {
        /// Handler result payload.
        result: Value,
    },
    /// Command failed on the host side.
    Error {
        /// Human-readable failure description.
        message: String,
        /// Machine-readable failure kind.
        kind: WireErrorKind,
    },
}

/// Failure kinds a host can report on the wire.
///
/// Timeouts and connection losses never appear here: those are observed by
/// the client, not reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireErrorKind {
    /// No handler registered for the command name.
    UnknownCommand,
    /// The handler ran and reported failure (or panicked).
    HandlerFailure,
    /// The request frame did not parse; the host will drop the connection.
    ProtocolError,
    /// Anything a newer host reports that this client does not know.
    #[serde(other)]
    Other,
}

/// Transport-level errors for the bridge.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Could not reach the host at all.
    #[error("failed to connect to {addr}: {message}")]
    ConnectionFailed { addr: String, message: String },

    /// The connection dropped mid-exchange.
    #[error("connection lost: {message}")]
    ConnectionLost { message: String },

    /// No complete response arrived in time.
    #[error("timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    /// A frame arrived that is not valid protocol JSON, or the host
    /// reported it could not parse ours.
    #[error("protocol error: {message}")]
    Protocol { message: String },

    /// A length prefix or payload exceeds the frame size cap.
    #[error("frame of {size} bytes exceeds maximum {max}")]
    FrameTooLarge { size: usize, max: usize },

    /// The host knows no such command.
    #[error("unknown command '{command}'")]
    UnknownCommand { command: String },

    /// The host's handler reported failure.
    #[error("handler failed: {message}")]
    Handler { message: String },
}

impl BridgeError {
    /// Stable kind string used in execution traces.
    pub fn kind(&self) -> &'static str {
        match self {
            BridgeError::ConnectionFailed { .. } | BridgeError::ConnectionLost { .. } => {
                "connection_lost"
            }
            BridgeError::Timeout { .. } => "timeout",
            BridgeError::Protocol { .. } | BridgeError::FrameTooLarge { .. } => "protocol_error",
            BridgeError::UnknownCommand { .. } => "unknown_command",
            BridgeError::Handler { .. } => "handler_failure",
        }
    }

    /// True when the connection can no longer be trusted and must be
    /// re-established before the next call.
    pub fn poisons_connection(&self) -> bool {
        matches!(
            self,
            BridgeError::ConnectionFailed { .. }
                | BridgeError::ConnectionLost { .. }
                | BridgeError::Timeout { .. }
                | BridgeError::Protocol { .. }
                | BridgeError::FrameTooLarge { .. }
        )
    }

    /// True when an execution walk cannot continue past this failure.
    pub fn is_connection_loss(&self) -> bool {
        matches!(
            self,
            BridgeError::ConnectionFailed { .. } | BridgeError::ConnectionLost { .. }
        )
    }
}
