//! Host bridge handlers for CLI: direct tool invocation and the stub host.

use anyhow::Result;
use serde_json::{json, Map, Value};
use tokio::net::TcpListener;

use crate::bridge::{CommandServer, ToolInvocation};
use crate::cli::output::{output_json, print_success, OutputMode};
use crate::init::AppContext;

pub async fn handle_tool(
    ctx: &AppContext,
    name: &str,
    params_json: Option<&str>,
    mode: OutputMode,
) -> Result<()> {
    let params: Map<String, Value> = match params_json {
        Some(raw) => serde_json::from_str(raw)
            .map_err(|e| anyhow::anyhow!("--params is not a JSON object: {}", e))?,
        None => Map::new(),
    };

    let invocation = ToolInvocation::new(name, params);
    let result = ctx.bridge.invoke_default(&invocation).await?;

    if mode == OutputMode::Json {
        output_json(&result);
    } else {
        print_success(&format!("{} answered", name));
        println!("{}", serde_json::to_string_pretty(&result)?);
    }
    Ok(())
}

/// Run a development stand-in for the host application's command
/// listener. Every registered command echoes its input; `fail` always
/// errors, which exercises the controller's failure paths.
pub async fn handle_stub_host(bind: &str) -> Result<()> {
    let mut server = CommandServer::new();
    register_stub_handlers(&mut server);

    let listener = TcpListener::bind(bind).await?;
    print_success(&format!(
        "Stub host listening on {} ({} commands)",
        listener.local_addr()?,
        server.registered().len()
    ));

    server.serve(listener).await?;
    Ok(())
}

fn register_stub_handlers(server: &mut CommandServer) {
    server.register("ping", |_params| Ok(json!({ "pong": true })));

    server.register("get_scene_info", |_params| {
        Ok(json!({
            "name": "Stub Scene",
            "objects": [],
            "frame_range": [1, 250],
        }))
    });

    server.register("execute_code", |params| {
        let chars = params
            .get("code")
            .and_then(Value::as_str)
            .map_or(0, str::len);
        Ok(json!({ "executed": true, "code_chars": chars }))
    });

    for tool in ["create_object", "delete_object", "set_material", "set_keyframes"] {
        server.register(tool, move |params| {
            Ok(json!({ "command": tool, "params": params }))
        });
    }

    server.register("fail", |_params| Err("stub failure requested".to_string()));
}
