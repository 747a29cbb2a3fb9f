//! Host-side command server.
//!
//! The server owns a registry of named handlers and serves framed
//! requests strictly one at a time: one connection, one request, one
//! response. The sequential loop mirrors the host application's
//! single-threaded execution context, where commands must never overlap.

use std::any::Any;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use crate::bridge::frame::{read_frame, write_frame};
use crate::bridge::protocol::{BridgeError, WireErrorKind, WireRequest, WireResponse};

/// A registered command handler.
///
/// Handlers are synchronous on purpose: the host runs commands on its own
/// single execution context, and the serve loop awaits nothing while a
/// handler runs.
pub type CommandHandler = Arc<dyn Fn(Map<String, Value>) -> Result<Value, String> + Send + Sync>;

/// Dispatches framed command requests to registered handlers.
#[derive(Default)]
pub struct CommandServer {
    handlers: HashMap<String, CommandHandler>,
}

impl CommandServer {
    pub fn new() -> Self {
        CommandServer {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler under `name`. Registering the same name twice
    /// replaces the earlier handler.
    pub fn register<F>(&mut self, name: impl Into<String>, handler: F)
    where
        F: Fn(Map<String, Value>) -> Result<Value, String> + Send + Sync + 'static,
    {
        let name = name.into();
        if self.handlers.insert(name.clone(), Arc::new(handler)).is_some() {
            debug!(command = %name, "handler replaced");
        }
    }

    /// Names of all registered commands, sorted.
    pub fn registered(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Accept and serve connections one at a time, forever.
    ///
    /// Per-request failures never end the loop; only a broken listener
    /// does.
    pub async fn serve(&self, listener: TcpListener) -> Result<(), BridgeError> {
        let addr = listener
            .local_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "<unknown>".to_string());
        info!(%addr, commands = self.handlers.len(), "command server listening");

        loop {
            let (stream, peer) = listener
                .accept()
                .await
                .map_err(|e| BridgeError::ConnectionFailed {
                    addr: addr.clone(),
                    message: e.to_string(),
                })?;
            debug!(%peer, "controller connected");

            if let Err(err) = self.serve_connection(stream).await {
                debug!(%peer, error = %err, "connection closed");
            }
        }
    }

    /// Serve one connection until EOF or an unrecoverable framing error.
    async fn serve_connection(&self, mut stream: TcpStream) -> Result<(), BridgeError> {
        loop {
            let payload = read_frame(&mut stream).await?;

            let response = match serde_json::from_slice::<WireRequest>(&payload) {
                Ok(WireRequest::Command { command, params }) => self.dispatch(&command, params),
                Err(err) => {
                    // After an unparseable request the frame boundary can
                    // no longer be trusted: answer, then drop the
                    // connection.
                    let response = WireResponse::Error {
                        message: format!("unparseable request: {err}"),
                        kind: WireErrorKind::ProtocolError,
                    };
                    write_response(&mut stream, &response).await?;
                    return Err(BridgeError::Protocol {
                        message: err.to_string(),
                    });
                }
            };

            write_response(&mut stream, &response).await?;
        }
    }

    /// Run one command through its handler, reporting every failure mode
    /// as a response rather than a crash.
    fn dispatch(&self, command: &str, params: Map<String, Value>) -> WireResponse {
        let Some(handler) = self.handlers.get(command) else {
            return WireResponse::Error {
                message: format!("no handler registered for '{command}'"),
                kind: WireErrorKind::UnknownCommand,
            };
        };

        debug!(%command, "dispatching");
        match catch_unwind(AssertUnwindSafe(|| handler(params))) {
            Ok(Ok(result)) => WireResponse::Ok { result },
            Ok(Err(message)) => WireResponse::Error {
                message,
                kind: WireErrorKind::HandlerFailure,
            },
            Err(panic) => {
                let message = panic_message(panic);
                warn!(%command, %message, "handler panicked");
                WireResponse::Error {
                    message,
                    kind: WireErrorKind::HandlerFailure,
                }
            }
        }
    }
}

async fn write_response(
    stream: &mut TcpStream,
    response: &WireResponse,
) -> Result<(), BridgeError> {
    let payload = serde_json::to_vec(response).map_err(|e| BridgeError::Protocol {
        message: e.to_string(),
    })?;
    write_frame(stream, &payload).await
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("handler panicked: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("handler panicked: {s}")
    } else {
        "handler panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_dispatch_unknown_command() {
        let server = CommandServer::new();
        let response = server.dispatch("nope", Map::new());
        match response {
            WireResponse::Error { kind, .. } => assert_eq!(kind, WireErrorKind::UnknownCommand),
            WireResponse::Ok { .. } => panic!("wrong variant"),
        }
    }

    #[test]
    fn test_dispatch_handler_result() {
        let mut server = CommandServer::new();
        server.register("echo", |params| Ok(Value::Object(params)));

        let params: Map<String, Value> =
            [("x".to_string(), json!(1))].into_iter().collect();
        match server.dispatch("echo", params) {
            WireResponse::Ok { result } => assert_eq!(result, json!({"x": 1})),
            WireResponse::Error { message, .. } => panic!("unexpected error: {message}"),
        }
    }

    #[test]
    fn test_dispatch_handler_error() {
        let mut server = CommandServer::new();
        server.register("fail", |_| Err("broken rig".to_string()));

        match server.dispatch("fail", Map::new()) {
            WireResponse::Error { message, kind } => {
                assert_eq!(kind, WireErrorKind::HandlerFailure);
                assert_eq!(message, "broken rig");
            }
            WireResponse::Ok { .. } => panic!("wrong variant"),
        }
    }

    #[test]
    fn test_dispatch_survives_panicking_handler() {
        let mut server = CommandServer::new();
        server.register("explode", |_| panic!("kaboom"));

        match server.dispatch("explode", Map::new()) {
            WireResponse::Error { message, kind } => {
                assert_eq!(kind, WireErrorKind::HandlerFailure);
                assert!(message.contains("kaboom"));
            }
            WireResponse::Ok { .. } => panic!("wrong variant"),
        }

        // The registry still works after the panic.
        match server.dispatch("explode", Map::new()) {
            WireResponse::Error { kind, .. } => assert_eq!(kind, WireErrorKind::HandlerFailure),
            WireResponse::Ok { .. } => panic!("wrong variant"),
        }
    }

    #[test]
    fn test_register_twice_replaces() {
        let mut server = CommandServer::new();
        server.register("tool", |_| Ok(json!(1)));
        server.register("tool", |_| Ok(json!(2)));

        match server.dispatch("tool", Map::new()) {
            WireResponse::Ok { result } => assert_eq!(result, json!(2)),
            WireResponse::Error { message, .. } => panic!("unexpected error: {message}"),
        }
        assert_eq!(server.registered(), vec!["tool".to_string()]);
    }
}
