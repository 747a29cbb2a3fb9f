//! Progress reporting for template execution.
//!
//! The executor announces each action as it starts, so a controller
//! watching a long template sees movement instead of silence. MCP tool
//! calls wrap their peer in `mcp::progress::McpProgressReporter`; the CLI
//! and tests run with [`SilentProgress`].

use std::sync::Arc;

use async_trait::async_trait;

/// Receives per-action progress while a template executes.
///
/// Implementations are fire-and-forget: they must never fail the caller,
/// and they should not meaningfully slow the walk.
#[async_trait]
pub trait ProgressReporter: Send + Sync {
    /// Raw progress update. `current` counts completed or starting
    /// actions, `total` the resolved sequence length.
    async fn report(&self, current: f64, total: f64, message: Option<String>);

    /// Announce that action `index` (zero-based) of `total` is about to
    /// run.
    async fn action_started(&self, index: usize, total: usize, tool: &str) {
        self.report(index as f64, total as f64, Some(format!("running {tool}")))
            .await;
    }
}

/// Reporter that swallows everything. Used by the CLI and tests.
pub struct SilentProgress;

#[async_trait]
impl ProgressReporter for SilentProgress {
    async fn report(&self, _current: f64, _total: f64, _message: Option<String>) {}
}

/// Shorthand for a shared silent reporter.
pub fn silent_progress() -> Arc<dyn ProgressReporter> {
    Arc::new(SilentProgress)
}
