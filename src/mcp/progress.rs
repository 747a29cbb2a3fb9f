//! Progress notifications for MCP tool calls.
//!
//! When a controller attaches a progress token to an `apply_template`
//! call, each action of the walk is announced back over the peer as an
//! MCP progress notification. Without a token the executor runs silent.

use async_trait::async_trait;
use rmcp::model::{Meta, ProgressNotificationParam, ProgressToken};
use rmcp::{Peer, RoleServer};
use std::sync::Arc;

use crate::progress::{silent_progress, ProgressReporter};

/// Forwards executor progress to the MCP client that asked for it.
pub struct McpProgressReporter {
    client: Peer<RoleServer>,
    token: ProgressToken,
}

impl McpProgressReporter {
    pub fn new(client: Peer<RoleServer>, token: ProgressToken) -> Self {
        Self { client, token }
    }
}

#[async_trait]
impl ProgressReporter for McpProgressReporter {
    async fn report(&self, current: f64, total: f64, message: Option<String>) {
        // Notification failures must never disturb the walk.
        let _ = self
            .client
            .notify_progress(ProgressNotificationParam {
                progress_token: self.token.clone(),
                progress: current,
                total: Some(total),
                message,
            })
            .await;
    }
}

/// Reporter for one tool call: per-action notifications when the request
/// `Meta` carries a progress token, silent otherwise.
pub fn make_mcp_progress(meta: &Meta, client: &Peer<RoleServer>) -> Arc<dyn ProgressReporter> {
    match meta.get_progress_token() {
        Some(token) => Arc::new(McpProgressReporter::new(client.clone(), token.clone())),
        None => silent_progress(),
    }
}
