use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::models::{
    Action, AnalyticsRecord, ExecutionReport, OverrideDocument, Template, TemplateDraft,
    TemplateKind, TemplateSummary,
};

// =============================================================================
// Tool Input Structs (typed JSON Schema for MCP)
// Each struct becomes a dedicated MCP tool with full JSON Schema validation.
// =============================================================================

/// Input for create_template tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CreateTemplateInput {
    /// Template name, also the document file stem. Letters, digits,
    /// underscores, hyphens and spaces; 64 characters max.
    pub name: String,
    /// Category: animation, lighting, material, scene or other
    #[serde(default)]
    pub kind: TemplateKind,
    /// Free-form tags used by search_templates
    #[serde(default)]
    pub tags: Vec<String>,
    /// What the template does, for listings
    #[serde(default)]
    pub description: String,
    /// Host actions executed in order on apply
    #[serde(default)]
    pub actions: Vec<Action>,
}

impl CreateTemplateInput {
    /// Split into the store's identifier + content pair.
    pub fn into_parts(self) -> (String, TemplateDraft) {
        let draft = TemplateDraft {
            kind: self.kind,
            tags: self.tags,
            description: self.description,
            actions: self.actions,
        };
        (self.name, draft)
    }
}

/// Input for list_templates tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ListTemplatesInput {
    /// Attach archived revision history to each row (default: false)
    #[serde(default)]
    pub include_versions: bool,
}

/// Input for apply_template tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ApplyTemplateInput {
    /// Name of the stored template to execute
    pub name: String,
    /// Transient overrides merged over the stored document before
    /// execution. The stored template is not changed.
    #[serde(default)]
    pub overrides: Option<OverrideDocument>,
}

/// Input for search_templates tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchTemplatesInput {
    /// Tags to match; a template qualifies when it shares at least one
    pub tags: Vec<String>,
}

/// Input for get_template_stats tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct StatsInput {
    /// Restrict to one template (omit for the whole ledger)
    #[serde(default)]
    pub name: Option<String>,
}

/// Input for modify_template tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ModifyTemplateInput {
    /// Name of the stored template to change
    pub name: String,
    /// Partial document merged over the stored base
    pub changes: OverrideDocument,
    /// Persist the merge result (default: false, preview only)
    #[serde(default)]
    pub save: bool,
}

/// Input for delete_template tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DeleteTemplateInput {
    /// Name of the template to remove
    pub name: String,
}

/// Input for execute_code tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExecuteCodeInput {
    /// Code to run inside the host application's scripting environment
    pub code: String,
}

/// Input for run_tool tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RunToolInput {
    /// Host tool name (e.g. "create_object")
    pub tool: String,
    /// Parameters handed to the tool verbatim
    #[serde(default)]
    pub params: Map<String, Value>,
}

// =============================================================================
// Tool Response Structs
// =============================================================================

/// Response carrying one template document, used by create and modify.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TemplateResponse {
    /// The stored (or previewed) document
    pub template: Template,
    /// Helpful hints for next steps
    #[serde(default)]
    pub hints: Vec<String>,
}

/// Response for list_templates.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ListTemplatesResponse {
    /// One row per stored template, sorted by name
    pub templates: Vec<TemplateSummary>,
    pub total: usize,
}

/// Response for search_templates.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchTemplatesResponse {
    /// Full matching documents, sorted by name
    pub templates: Vec<Template>,
    pub total: usize,
    /// Helpful hints for the user
    #[serde(default)]
    pub hints: Vec<String>,
}

/// Response for apply_template.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ApplyTemplateResponse {
    /// Per-action trace and rollup verdict
    pub report: ExecutionReport,
    /// Helpful hints for next steps
    #[serde(default)]
    pub hints: Vec<String>,
}

/// Response for get_template_stats.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StatsResponse {
    /// Usage counters keyed by template name
    pub stats: BTreeMap<String, AnalyticsRecord>,
}

/// Response for delete_template.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DeleteTemplateResponse {
    /// Whether a document existed under this name
    pub deleted: bool,
    pub name: String,
    /// Helpful hints for next steps
    #[serde(default)]
    pub hints: Vec<String>,
}
