//! Shared initialization logic for MCP and CLI modes.

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::bridge::{BridgeClient, BridgeConfig};
use crate::store::TemplateStore;

/// Application context holding the template store and host bridge.
///
/// Shared between MCP server and CLI commands.
pub struct AppContext {
    pub templates_path: PathBuf,
    pub store: Arc<TemplateStore>,
    pub bridge: Arc<BridgeClient>,
    pub bridge_config: BridgeConfig,
}

impl AppContext {
    /// Initialize application context.
    ///
    /// Templates path priority: explicit path > MAQUETTE_TEMPLATES_DIR env >
    /// ./.maquette/templates (if ./.maquette exists) > ~/.maquette/templates
    pub fn new(
        explicit_path: Option<PathBuf>,
        bridge_config: BridgeConfig,
        versioning: bool,
    ) -> Result<Self> {
        let templates_path = explicit_path
            .or_else(|| {
                std::env::var("MAQUETTE_TEMPLATES_DIR")
                    .ok()
                    .map(PathBuf::from)
            })
            .or_else(|| {
                let local = Path::new(".maquette");
                if local.is_dir() {
                    Some(local.join("templates"))
                } else {
                    None
                }
            })
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .map(|h| h.join(".maquette").join("templates"))
                    .unwrap_or_else(|| PathBuf::from(".maquette/templates"))
            });

        tracing::info!("Using templates path: {}", templates_path.display());

        let store = Arc::new(TemplateStore::open(&templates_path, versioning)?);
        tracing::info!("Template store opened");

        let bridge = Arc::new(BridgeClient::new(bridge_config.clone()));
        tracing::info!("Host bridge targets {}", bridge_config.addr());

        Ok(Self {
            templates_path,
            store,
            bridge,
            bridge_config,
        })
    }
}
