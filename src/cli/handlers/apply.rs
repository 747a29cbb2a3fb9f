//! Apply handler for CLI: execute a stored template against the host.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use crate::cli::output::{
    output_json, print_error, print_hint, print_success, print_table, OutputMode,
};
use crate::executor::TemplateExecutor;
use crate::init::AppContext;
use crate::models::{ExecutionReport, Overall, OverrideDocument};
use crate::progress::{silent_progress, ProgressReporter};

/// Progress reporter that prints each announcement as a dimmed line.
struct PrintingProgress;

#[async_trait]
impl ProgressReporter for PrintingProgress {
    async fn report(&self, _current: f64, _total: f64, message: Option<String>) {
        if let Some(message) = message {
            print_hint(&message);
        }
    }
}

fn render_report(report: &ExecutionReport) {
    let rows: Vec<Vec<String>> = report
        .actions
        .iter()
        .map(|outcome| {
            let (status, detail) = match &outcome.error {
                None => ("ok".to_string(), "-".to_string()),
                Some(failure) => (failure.kind.clone(), failure.message.clone()),
            };
            vec![
                outcome.index.to_string(),
                outcome.tool.clone(),
                status,
                format!("{:.2}", outcome.elapsed_secs),
                detail,
            ]
        })
        .collect();
    print_table(&["#", "Tool", "Status", "Time s", "Detail"], rows);

    let attempted = report.actions.len();
    let failed = report.actions.iter().filter(|o| !o.succeeded()).count();
    match report.overall {
        Overall::Ok => print_success(&format!(
            "{} actions in {:.1}s",
            attempted, report.elapsed_secs
        )),
        Overall::Partial => print_error(&format!(
            "{} of {} actions failed; the rest were applied",
            failed, attempted
        )),
        Overall::Error => print_error(&format!(
            "run failed: {} of {} attempted actions succeeded",
            attempted - failed,
            attempted
        )),
    }
}

pub async fn handle_apply(
    ctx: &AppContext,
    name: &str,
    overrides_json: Option<&str>,
    timeout_secs: u64,
    mode: OutputMode,
) -> Result<()> {
    let overrides: Option<OverrideDocument> = overrides_json
        .map(serde_json::from_str)
        .transpose()
        .map_err(|e| anyhow::anyhow!("--overrides is not a valid override document: {}", e))?;

    let executor = TemplateExecutor::new(ctx.store.clone(), ctx.bridge.clone())
        .with_action_timeout(Duration::from_secs(timeout_secs));

    let progress: Arc<dyn ProgressReporter> = if mode == OutputMode::Json {
        silent_progress()
    } else {
        Arc::new(PrintingProgress)
    };

    let report = executor.apply(name, overrides.as_ref(), progress).await?;

    if mode == OutputMode::Json {
        output_json(&report);
        return Ok(());
    }

    render_report(&report);
    Ok(())
}
