//! Execution reports: the per-action trace and rollup returned by `apply`.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::skip_serializing_none;

/// Rollup verdict for one execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Overall {
    /// Every attempted action succeeded (vacuously true for an empty
    /// template).
    Ok,
    /// At least one success and at least one failure.
    Partial,
    /// No successes, or the walk was cut short by a lost connection.
    Error,
}

/// Outcome status of a single action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ActionStatus {
    Ok,
    Error,
}

/// Failure detail for a single action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ActionFailure {
    /// Stable failure kind: `timeout`, `connection_lost`, `protocol_error`,
    /// `unknown_command` or `handler_failure`.
    pub kind: String,
    pub message: String,
}

/// Trace entry for one attempted action. Actions never attempted (those
/// after a connection loss) get no entry at all.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ActionOutcome {
    /// Position in the resolved action sequence.
    pub index: usize,
    pub tool: String,
    pub status: ActionStatus,
    pub elapsed_secs: f64,
    /// Host result payload, present on success.
    pub result: Option<Value>,
    /// Failure detail, present on error.
    pub error: Option<ActionFailure>,
}

impl ActionOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(self.status, ActionStatus::Ok)
    }
}

/// Full report for one `apply` run.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExecutionReport {
    pub template: String,
    pub overall: Overall,
    pub actions: Vec<ActionOutcome>,
    /// Wall-clock duration of the whole walk, in seconds.
    pub elapsed_secs: f64,
}

impl ExecutionReport {
    pub fn succeeded(&self) -> bool {
        matches!(self.overall, Overall::Ok)
    }
}
