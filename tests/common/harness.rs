//! Test harness for store and bridge lifecycle management.
//!
//! Provides isolated template stores per test using tempfile, plus
//! helpers for running an in-process command server on an ephemeral port.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio::net::TcpListener;

use maquette::bridge::{BridgeClient, BridgeConfig, CommandServer};
use maquette::store::TemplateStore;

/// Test harness that manages template store lifecycle.
///
/// Each TestHarness creates an isolated store in a temporary directory.
/// The directory is automatically cleaned up when the harness is dropped.
pub struct TestHarness {
    /// Store wrapped in Arc for executor sharing
    pub store: Arc<TemplateStore>,
    /// Temporary directory (kept alive while harness exists)
    pub temp_dir: TempDir,
}

impl TestHarness {
    /// Create a new test harness with version history enabled.
    ///
    /// Panics if store initialization fails (appropriate for tests).
    pub fn new() -> Self {
        Self::with_versioning(true)
    }

    /// Create a harness whose store keeps no version history.
    pub fn without_history() -> Self {
        Self::with_versioning(false)
    }

    fn with_versioning(versioning: bool) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory for test store");
        let store = TemplateStore::open(&temp_dir.path().join("templates"), versioning)
            .expect("Failed to open test store");

        Self {
            store: Arc::new(store),
            temp_dir,
        }
    }
}

/// Start `server` on an ephemeral localhost port and return its address.
///
/// The serve task runs until the test binary exits; per-test servers are
/// cheap enough that nothing bothers shutting them down.
pub async fn spawn_host(server: CommandServer) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind ephemeral port");
    let addr = listener
        .local_addr()
        .expect("Failed to read listener address");
    tokio::spawn(async move {
        let _ = server.serve(listener).await;
    });
    addr
}

/// Bridge client pointed at `addr`, with timeouts short enough for tests.
pub fn client_for(addr: SocketAddr) -> BridgeClient {
    BridgeClient::new(BridgeConfig {
        host: addr.ip().to_string(),
        port: addr.port(),
        connect_timeout: Duration::from_secs(2),
        call_timeout: Duration::from_secs(2),
    })
}
