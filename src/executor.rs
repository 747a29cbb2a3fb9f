//! Template execution: look up, merge, walk, record.
//!
//! The executor runs a resolved action sequence strictly in order, one
//! bridge call at a time. A failed action is recorded in the trace and
//! the walk continues; only a lost connection aborts the remainder,
//! because further attempts could not even reach the host. Every walk
//! ends with exactly one analytics update.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::bridge::{ToolInvocation, ToolInvoker};
use crate::merge::merge_template;
use crate::models::{
    ActionFailure, ActionOutcome, ActionStatus, ExecutionReport, Overall, OverrideDocument,
};
use crate::progress::ProgressReporter;
use crate::store::TemplateStore;
use crate::MaquetteError;

/// Default per-action budget, matching the bridge's call timeout.
pub const DEFAULT_ACTION_TIMEOUT: Duration = Duration::from_secs(15);

/// Walks templates against a [`ToolInvoker`].
pub struct TemplateExecutor {
    store: Arc<TemplateStore>,
    invoker: Arc<dyn ToolInvoker>,
    action_timeout: Duration,
}

impl TemplateExecutor {
    pub fn new(store: Arc<TemplateStore>, invoker: Arc<dyn ToolInvoker>) -> Self {
        TemplateExecutor {
            store,
            invoker,
            action_timeout: DEFAULT_ACTION_TIMEOUT,
        }
    }

    /// Replace the per-action timeout.
    pub fn with_action_timeout(mut self, action_timeout: Duration) -> Self {
        self.action_timeout = action_timeout;
        self
    }

    /// Execute the stored template `name`, optionally merged with
    /// `overrides`, and report every attempted action.
    ///
    /// Lookup and merge failures surface as errors before any bridge
    /// traffic happens. Once the walk starts, failures land in the trace
    /// instead: the report's `overall` says `ok` when everything worked
    /// (vacuously for an empty template), `partial` on a mix, and
    /// `error` when nothing succeeded or the connection died mid-walk.
    pub async fn apply(
        &self,
        name: &str,
        overrides: Option<&OverrideDocument>,
        progress: Arc<dyn ProgressReporter>,
    ) -> Result<ExecutionReport, MaquetteError> {
        let template = self.store.get(name).await?;
        let resolved = match overrides {
            Some(overrides) => merge_template(&template, overrides)?,
            None => template,
        };

        let total = resolved.actions.len();
        info!(template = %name, actions = total, "applying template");

        let started = Instant::now();
        let mut outcomes: Vec<ActionOutcome> = Vec::with_capacity(total);
        let mut aborted = false;

        for (index, action) in resolved.actions.iter().enumerate() {
            progress.action_started(index, total, &action.tool).await;

            let invocation = ToolInvocation::new(action.tool.clone(), action.params.clone());
            let action_started = Instant::now();
            let result = self.invoker.invoke(&invocation, self.action_timeout).await;
            let elapsed_secs = action_started.elapsed().as_secs_f64();

            match result {
                Ok(result) => {
                    debug!(template = %name, index, tool = %action.tool, "action ok");
                    outcomes.push(ActionOutcome {
                        index,
                        tool: action.tool.clone(),
                        status: ActionStatus::Ok,
                        elapsed_secs,
                        result: Some(result),
                        error: None,
                    });
                }
                Err(err) => {
                    warn!(
                        template = %name, index, tool = %action.tool,
                        kind = err.kind(), error = %err,
                        "action failed"
                    );
                    let lost_connection = err.is_connection_loss();
                    outcomes.push(ActionOutcome {
                        index,
                        tool: action.tool.clone(),
                        status: ActionStatus::Error,
                        elapsed_secs,
                        result: None,
                        error: Some(ActionFailure {
                            kind: err.kind().to_string(),
                            message: err.to_string(),
                        }),
                    });
                    if lost_connection {
                        warn!(
                            template = %name,
                            attempted = outcomes.len(), total,
                            "connection lost, aborting remaining actions"
                        );
                        aborted = true;
                        break;
                    }
                }
            }
        }

        let elapsed_secs = started.elapsed().as_secs_f64();
        let succeeded = outcomes.iter().filter(|o| o.succeeded()).count();
        let failed = outcomes.len() - succeeded;

        let overall = if aborted {
            Overall::Error
        } else if failed == 0 {
            Overall::Ok
        } else if succeeded == 0 {
            Overall::Error
        } else {
            Overall::Partial
        };

        let clean = matches!(overall, Overall::Ok);
        if let Err(err) = self
            .store
            .analytics()
            .record(name, elapsed_secs, clean)
            .await
        {
            // The walk already happened; a ledger failure must not void
            // the report.
            warn!(template = %name, error = %err, "failed to record analytics");
        }

        progress
            .report(
                total as f64,
                total as f64,
                Some(format!("{} of {} actions ok", succeeded, outcomes.len())),
            )
            .await;
        info!(template = %name, ?overall, succeeded, failed, elapsed_secs, "template applied");

        Ok(ExecutionReport {
            template: name.to_string(),
            overall,
            actions: outcomes,
            elapsed_secs,
        })
    }
}
