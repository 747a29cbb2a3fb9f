use crate::mcp::progress::make_mcp_progress;
use rmcp::{
    handler::server::tool::ToolRouter,
    handler::server::wrapper::{Json, Parameters},
    model::*,
    tool, tool_handler, tool_router, Peer, RoleServer, ServerHandler, ServiceExt,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

use serde_json::{Map, Value};

use crate::bridge::{ToolInvocation, ToolInvoker};
use crate::executor::TemplateExecutor;
use crate::mcp::error::ToolError;
use crate::mcp::{
    ApplyTemplateInput, ApplyTemplateResponse, CreateTemplateInput, DeleteTemplateInput,
    DeleteTemplateResponse, ExecuteCodeInput, ListTemplatesInput, ListTemplatesResponse,
    ModifyTemplateInput, RunToolInput, SearchTemplatesInput, SearchTemplatesResponse, StatsInput,
    StatsResponse, TemplateResponse,
};
use crate::models::ExecutionReport;
use crate::progress::ProgressReporter;
use crate::store::TemplateStore;
use crate::MaquetteError;

/// MCP server bridging template storage and the host application.
///
/// Holds the store, the executor walking templates against the bridge,
/// and the invoker itself for the direct host passthrough tools.
#[derive(Clone)]
pub struct MaquetteServer {
    store: Arc<TemplateStore>,
    invoker: Arc<dyn ToolInvoker>,
    executor: Arc<TemplateExecutor>,
    host_timeout: Duration,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl MaquetteServer {
    pub fn new(
        store: Arc<TemplateStore>,
        invoker: Arc<dyn ToolInvoker>,
        host_timeout: Duration,
    ) -> Self {
        let executor = Arc::new(
            TemplateExecutor::new(store.clone(), invoker.clone())
                .with_action_timeout(host_timeout),
        );
        Self {
            store,
            invoker,
            executor,
            host_timeout,
            tool_router: Self::tool_router(),
        }
    }

    pub fn from_context(ctx: &crate::init::AppContext) -> Self {
        Self::new(
            ctx.store.clone(),
            ctx.bridge.clone(),
            ctx.bridge_config.call_timeout,
        )
    }

    // ==========================================================================
    // MCP TOOLS (10 total) - All #[tool] methods must be in this impl block
    // 7 template tools + 3 host passthrough tools
    // ==========================================================================

    #[tool(
        description = "Store a named sequence of host actions as a reusable template. Saving under an existing name replaces the content and bumps the version."
    )]
    #[instrument(name = "mcp.create_template", skip_all)]
    pub async fn create_template(
        &self,
        Parameters(input): Parameters<CreateTemplateInput>,
    ) -> Result<Json<TemplateResponse>, ToolError> {
        self.handle_create(input)
            .await
            .map(Json)
            .map_err(ToolError::from)
    }

    #[tool(
        description = "List stored templates with kind, tags, action count and version. Set include_versions to attach archived revision history per template."
    )]
    #[instrument(name = "mcp.list_templates", skip_all)]
    pub async fn list_templates(
        &self,
        Parameters(input): Parameters<ListTemplatesInput>,
    ) -> Result<Json<ListTemplatesResponse>, ToolError> {
        self.handle_list(input)
            .await
            .map(Json)
            .map_err(ToolError::from)
    }

    #[tool(
        description = "Execute a stored template against the host application, optionally merged with transient overrides. Returns a per-action trace; ordinary failures do not stop the walk, only a lost host connection does."
    )]
    #[instrument(name = "mcp.apply_template", skip_all)]
    pub async fn apply_template(
        &self,
        Parameters(input): Parameters<ApplyTemplateInput>,
        meta: Meta,
        client: Peer<RoleServer>,
    ) -> Result<Json<ApplyTemplateResponse>, ToolError> {
        let progress = make_mcp_progress(&meta, &client);
        self.handle_apply(input, progress)
            .await
            .map(Json)
            .map_err(ToolError::from)
    }

    #[tool(
        description = "Find templates sharing at least one tag with the query set. Returns full documents."
    )]
    #[instrument(name = "mcp.search_templates", skip_all)]
    pub async fn search_templates(
        &self,
        Parameters(input): Parameters<SearchTemplatesInput>,
    ) -> Result<Json<SearchTemplatesResponse>, ToolError> {
        self.handle_search(input)
            .await
            .map(Json)
            .map_err(ToolError::from)
    }

    #[tool(
        description = "Usage counters per template: executions, cumulative time, success rate. Omit name for the whole ledger."
    )]
    #[instrument(name = "mcp.get_template_stats", skip_all)]
    pub async fn get_template_stats(
        &self,
        Parameters(input): Parameters<StatsInput>,
    ) -> Result<Json<StatsResponse>, ToolError> {
        self.handle_stats(input)
            .await
            .map(Json)
            .map_err(ToolError::from)
    }

    #[tool(
        description = "Merge partial changes into a stored template. With save=false (default) this previews the merge result without touching disk; with save=true the result is persisted as a new version."
    )]
    #[instrument(name = "mcp.modify_template", skip_all)]
    pub async fn modify_template(
        &self,
        Parameters(input): Parameters<ModifyTemplateInput>,
    ) -> Result<Json<TemplateResponse>, ToolError> {
        self.handle_modify(input)
            .await
            .map(Json)
            .map_err(ToolError::from)
    }

    #[tool(
        description = "Remove a stored template and its usage counters. Deleting a missing name succeeds with deleted=false; archived revisions survive."
    )]
    #[instrument(name = "mcp.delete_template", skip_all)]
    pub async fn delete_template(
        &self,
        Parameters(input): Parameters<DeleteTemplateInput>,
    ) -> Result<Json<DeleteTemplateResponse>, ToolError> {
        self.handle_delete(input)
            .await
            .map(Json)
            .map_err(ToolError::from)
    }

    #[tool(description = "Current scene summary straight from the host application.")]
    #[instrument(name = "mcp.get_scene_info", skip_all)]
    pub async fn get_scene_info(&self) -> Result<Json<Value>, ToolError> {
        self.invoke_host("get_scene_info", Map::new()).await.map(Json)
    }

    #[tool(
        description = "Run code inside the host application's scripting environment and return its result. Prefer templates for repeatable work."
    )]
    #[instrument(name = "mcp.execute_code", skip_all)]
    pub async fn execute_code(
        &self,
        Parameters(input): Parameters<ExecuteCodeInput>,
    ) -> Result<Json<Value>, ToolError> {
        let mut params = Map::new();
        params.insert("code".to_string(), Value::String(input.code));
        self.invoke_host("execute_code", params).await.map(Json)
    }

    #[tool(
        description = "Invoke one registered host command directly with raw parameters. Useful for exploration before capturing steps in a template."
    )]
    #[instrument(name = "mcp.run_tool", skip_all)]
    pub async fn run_tool(
        &self,
        Parameters(input): Parameters<RunToolInput>,
    ) -> Result<Json<Value>, ToolError> {
        self.invoke_host(&input.tool, input.params).await.map(Json)
    }

    // ==========================================================================
    // Handlers
    // ==========================================================================

    async fn handle_create(
        &self,
        input: CreateTemplateInput,
    ) -> Result<TemplateResponse, MaquetteError> {
        let (name, draft) = input.into_parts();
        let template = self.store.create_or_update(&name, draft).await?;
        let hints = if template.version == 1 {
            vec!["Stored as version 1. Run apply_template to execute it.".to_string()]
        } else {
            vec![format!(
                "Replaced the previous content; now at version {}.",
                template.version
            )]
        };
        Ok(TemplateResponse { template, hints })
    }

    async fn handle_list(
        &self,
        input: ListTemplatesInput,
    ) -> Result<ListTemplatesResponse, MaquetteError> {
        let templates = self.store.list(input.include_versions).await?;
        Ok(ListTemplatesResponse {
            total: templates.len(),
            templates,
        })
    }

    async fn handle_apply(
        &self,
        input: ApplyTemplateInput,
        progress: Arc<dyn ProgressReporter>,
    ) -> Result<ApplyTemplateResponse, MaquetteError> {
        let report = self
            .executor
            .apply(&input.name, input.overrides.as_ref(), progress)
            .await?;
        let hints = apply_hints(&report);
        Ok(ApplyTemplateResponse { report, hints })
    }

    async fn handle_search(
        &self,
        input: SearchTemplatesInput,
    ) -> Result<SearchTemplatesResponse, MaquetteError> {
        let templates = self.store.search(&input.tags).await?;
        let hints = if templates.is_empty() {
            vec!["No tag matches. list_templates shows everything stored.".to_string()]
        } else {
            Vec::new()
        };
        Ok(SearchTemplatesResponse {
            total: templates.len(),
            templates,
            hints,
        })
    }

    async fn handle_stats(&self, input: StatsInput) -> Result<StatsResponse, MaquetteError> {
        let stats = match input.name {
            Some(name) => {
                // Existence check first: stats for an unknown template are
                // an error, stats for an unused one are zeroed counters.
                self.store.get(&name).await?;
                let record = self.store.analytics().get(&name).unwrap_or_default();
                BTreeMap::from([(name, record)])
            }
            None => self.store.analytics().all(),
        };
        Ok(StatsResponse { stats })
    }

    async fn handle_modify(
        &self,
        input: ModifyTemplateInput,
    ) -> Result<TemplateResponse, MaquetteError> {
        let template = self
            .store
            .modify(&input.name, &input.changes, input.save)
            .await?;
        let hints = if input.save {
            vec![format!("Persisted as version {}.", template.version)]
        } else {
            vec![
                "Preview only; nothing was persisted. Resend with save=true to keep it."
                    .to_string(),
            ]
        };
        Ok(TemplateResponse { template, hints })
    }

    async fn handle_delete(
        &self,
        input: DeleteTemplateInput,
    ) -> Result<DeleteTemplateResponse, MaquetteError> {
        let deleted = self.store.delete(&input.name).await?;
        let mut hints = Vec::new();
        if !deleted {
            hints.push("Nothing was stored under this name.".to_string());
        } else if self.store.archive().is_some() {
            hints.push(
                "Archived revisions survive the delete; recreating the template continues its history."
                    .to_string(),
            );
        }
        Ok(DeleteTemplateResponse {
            deleted,
            name: input.name,
            hints,
        })
    }

    async fn invoke_host(
        &self,
        tool: &str,
        params: Map<String, Value>,
    ) -> Result<Value, ToolError> {
        let invocation = ToolInvocation::new(tool, params);
        self.invoker
            .invoke(&invocation, self.host_timeout)
            .await
            .map_err(ToolError::from)
    }
}

/// Hints attached to an apply response when the walk was not clean.
fn apply_hints(report: &ExecutionReport) -> Vec<String> {
    let mut hints = Vec::new();
    let failed = report.actions.iter().filter(|o| !o.succeeded()).count();
    if failed > 0 {
        hints.push(format!(
            "{} of {} attempted actions failed; see the actions array for detail.",
            failed,
            report.actions.len()
        ));
    }
    if report.actions.iter().any(|o| {
        o.error
            .as_ref()
            .is_some_and(|e| e.kind == "connection_lost")
    }) {
        hints.push(
            "The host connection dropped mid-run; actions after the drop were not attempted."
                .to_string(),
        );
    }
    hints
}

#[tool_handler]
impl ServerHandler for MaquetteServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "maquette".to_string(),
                title: Some("Maquette Template Bridge".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                r#"# Maquette Template Bridge

Stored command templates for a 3D host application, executed over a TCP bridge.

## Template tools
- create_template — Store a named action sequence (same name replaces, version bumps)
- list_templates — Summaries of everything stored; include_versions attaches revision history
- apply_template — Execute a stored template, optionally with transient overrides
- modify_template — Merge changes into a stored template (save=false previews)
- search_templates — Find templates sharing at least one tag
- get_template_stats — Usage counters: executions, cumulative time, success rate
- delete_template — Remove a template (archived revisions survive)

## Host tools
- get_scene_info — Current scene summary straight from the host
- execute_code — Run code in the host's scripting environment
- run_tool — Invoke any registered host command directly

## Key patterns
- Apply keeps walking past ordinary action failures and stops only when the host connection drops; the report's actions array carries one entry per attempted action.
- Overrides are positional: entry i merges into action i. {} leaves an action untouched, a shorter list overrides a prefix, entries past the end append and need both tool and params.
- Template names double as file stems: letters, digits, underscore, hyphen and spaces, 64 characters max.
"#
                .to_string(),
            ),
        }
    }
}

/// Run MCP server on stdio transport.
pub async fn run_mcp_server(ctx: crate::init::AppContext) -> anyhow::Result<()> {
    let server = MaquetteServer::from_context(&ctx);

    tracing::info!("Starting maquette MCP server v{}", env!("CARGO_PKG_VERSION"));

    let transport = (tokio::io::stdin(), tokio::io::stdout());
    let service = server.serve(transport).await?;
    tracing::info!("MCP server listening on stdio (10 tools)");

    tokio::spawn(async {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("Shutdown signal received");
    });

    service.waiting().await?;

    tracing::info!("MCP server shutting down");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::TempDir;

    use crate::bridge::BridgeError;
    use crate::models::{Action, TemplateKind};

    /// Invoker that answers every call with a fixed payload.
    struct EchoInvoker;

    #[async_trait]
    impl ToolInvoker for EchoInvoker {
        async fn invoke(
            &self,
            invocation: &ToolInvocation,
            _call_timeout: Duration,
        ) -> Result<Value, BridgeError> {
            Ok(json!({ "echo": invocation.name }))
        }
    }

    fn server_with(dir: &TempDir) -> MaquetteServer {
        let store = Arc::new(TemplateStore::open(dir.path(), true).unwrap());
        MaquetteServer::new(store, Arc::new(EchoInvoker), Duration::from_secs(1))
    }

    fn sample_input(name: &str) -> CreateTemplateInput {
        CreateTemplateInput {
            name: name.to_string(),
            kind: TemplateKind::Animation,
            tags: vec!["demo".to_string()],
            description: "sample".to_string(),
            actions: vec![Action {
                tool: "create_object".to_string(),
                params: Map::new(),
            }],
        }
    }

    #[tokio::test]
    async fn test_create_hints_differ_between_first_save_and_replace() {
        let dir = TempDir::new().unwrap();
        let server = server_with(&dir);

        let first = server.handle_create(sample_input("bounce")).await.unwrap();
        assert_eq!(first.template.version, 1);
        assert!(first.hints[0].contains("apply_template"));

        let second = server.handle_create(sample_input("bounce")).await.unwrap();
        assert_eq!(second.template.version, 2);
        assert!(second.hints[0].contains("version 2"));
    }

    #[tokio::test]
    async fn test_stats_for_unknown_template_is_not_found() {
        let dir = TempDir::new().unwrap();
        let server = server_with(&dir);

        let err = server
            .handle_stats(StatsInput {
                name: Some("ghost".to_string()),
            })
            .await
            .unwrap_err();
        let tool_err = ToolError::from(err);
        assert_eq!(tool_err.error_code, "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_stats_for_unused_template_is_zeroed() {
        let dir = TempDir::new().unwrap();
        let server = server_with(&dir);
        server.handle_create(sample_input("fresh")).await.unwrap();

        let response = server
            .handle_stats(StatsInput {
                name: Some("fresh".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(response.stats["fresh"].uses, 0);
    }

    #[tokio::test]
    async fn test_delete_missing_reports_no_op() {
        let dir = TempDir::new().unwrap();
        let server = server_with(&dir);

        let response = server
            .handle_delete(DeleteTemplateInput {
                name: "absent".to_string(),
            })
            .await
            .unwrap();
        assert!(!response.deleted);
        assert!(!response.hints.is_empty());
    }

    #[tokio::test]
    async fn test_apply_clean_run_has_no_hints() {
        let dir = TempDir::new().unwrap();
        let server = server_with(&dir);
        server.handle_create(sample_input("clean")).await.unwrap();

        let response = server
            .handle_apply(
                ApplyTemplateInput {
                    name: "clean".to_string(),
                    overrides: None,
                },
                crate::progress::silent_progress(),
            )
            .await
            .unwrap();
        assert!(response.report.succeeded());
        assert!(response.hints.is_empty());
    }
}
