//! Controller-side bridge client.
//!
//! One persistent TCP connection to the host application, established
//! lazily on the first call and re-established on the call after a
//! failure. The connection slot sits behind a mutex, so concurrent
//! callers queue up and exactly one request is in flight per client.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::bridge::frame::{read_frame, write_frame};
use crate::bridge::protocol::{
    BridgeError, ToolInvocation, WireErrorKind, WireRequest, WireResponse,
};

/// Default host application address.
pub const DEFAULT_HOST: &str = "127.0.0.1";
/// Default host application port.
pub const DEFAULT_PORT: u16 = 9876;

/// Connection settings for the bridge.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub host: String,
    pub port: u16,
    /// Budget for establishing a TCP connection.
    pub connect_timeout: Duration,
    /// Default budget for one request/response round trip.
    pub call_timeout: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        BridgeConfig {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            connect_timeout: Duration::from_secs(5),
            call_timeout: Duration::from_secs(15),
        }
    }
}

impl BridgeConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Dispatch seam for template execution: anything that can run a named
/// host tool. The production implementation is [`BridgeClient`]; tests
/// substitute recording doubles.
#[async_trait]
pub trait ToolInvoker: Send + Sync {
    /// Run one tool on the host and return its result payload.
    async fn invoke(
        &self,
        invocation: &ToolInvocation,
        call_timeout: Duration,
    ) -> Result<Value, BridgeError>;
}

/// TCP client for the host's command server.
pub struct BridgeClient {
    config: BridgeConfig,
    conn: Mutex<Option<TcpStream>>,
}

impl BridgeClient {
    pub fn new(config: BridgeConfig) -> Self {
        BridgeClient {
            config,
            conn: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Invoke with the configured default call timeout.
    pub async fn invoke_default(&self, invocation: &ToolInvocation) -> Result<Value, BridgeError> {
        self.invoke(invocation, self.config.call_timeout).await
    }

    async fn connect(&self) -> Result<TcpStream, BridgeError> {
        let addr = self.config.addr();
        let stream = timeout(self.config.connect_timeout, TcpStream::connect(&addr))
            .await
            .map_err(|_| BridgeError::Timeout {
                timeout: self.config.connect_timeout,
            })?
            .map_err(|e| BridgeError::ConnectionFailed {
                addr: addr.clone(),
                message: e.to_string(),
            })?;
        debug!(%addr, "connected to host");
        Ok(stream)
    }

    /// One request/response exchange on an established stream.
    async fn round_trip(
        stream: &mut TcpStream,
        request: &WireRequest,
    ) -> Result<WireResponse, BridgeError> {
        let payload = serde_json::to_vec(request).map_err(|e| BridgeError::Protocol {
            message: e.to_string(),
        })?;
        write_frame(stream, &payload).await?;

        let response = read_frame(stream).await?;
        serde_json::from_slice(&response).map_err(|e| BridgeError::Protocol {
            message: format!("unparseable response: {e}"),
        })
    }
}

#[async_trait]
impl ToolInvoker for BridgeClient {
    async fn invoke(
        &self,
        invocation: &ToolInvocation,
        call_timeout: Duration,
    ) -> Result<Value, BridgeError> {
        let mut slot = self.conn.lock().await;
        let mut stream = match slot.take() {
            Some(stream) => stream,
            None => self.connect().await?,
        };

        let request = WireRequest::Command {
            command: invocation.name.clone(),
            params: invocation.params.clone(),
        };

        let exchanged = match timeout(call_timeout, Self::round_trip(&mut stream, &request)).await
        {
            Ok(result) => result,
            Err(_) => Err(BridgeError::Timeout {
                timeout: call_timeout,
            }),
        };

        let result = match exchanged {
            Ok(WireResponse::Ok { result }) => Ok(result),
            Ok(WireResponse::Error { message, kind }) => Err(match kind {
                WireErrorKind::UnknownCommand => BridgeError::UnknownCommand {
                    command: invocation.name.clone(),
                },
                WireErrorKind::ProtocolError => BridgeError::Protocol { message },
                WireErrorKind::HandlerFailure | WireErrorKind::Other => {
                    BridgeError::Handler { message }
                }
            }),
            Err(err) => Err(err),
        };

        match &result {
            Err(err) if err.poisons_connection() => {
                // The stream may hold half a frame; drop it and reconnect
                // on the next call.
                warn!(tool = %invocation.name, kind = err.kind(), "dropping bridge connection");
            }
            _ => *slot = Some(stream),
        }

        result
    }
}
