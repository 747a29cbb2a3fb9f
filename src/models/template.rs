//! Template documents: named, parameterizable sequences of host commands.
//!
//! A template is the unit of persistence, one JSON document per name in
//! the store root. Names double as file stems, so they are validated by
//! `utils::names` before anything touches disk.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use serde_with::skip_serializing_none;

/// Category of a template, used for organization and search filtering.
///
/// Serializes as a lowercase string. Unknown categories fold into `Other`
/// on the authoring side rather than failing the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum TemplateKind {
    /// Keyframe and motion sequences
    Animation,
    /// Light rigs and exposure setups
    Lighting,
    /// Shader and texture assignments
    Material,
    /// Whole-scene construction
    Scene,
    /// Anything that fits no other category
    #[default]
    Other,
}

impl TemplateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateKind::Animation => "animation",
            TemplateKind::Lighting => "lighting",
            TemplateKind::Material => "material",
            TemplateKind::Scene => "scene",
            TemplateKind::Other => "other",
        }
    }
}

/// One executable step of a template: a host tool name plus its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Action {
    /// Host tool to invoke (e.g. `create_object`, `execute_code`).
    pub tool: String,
    /// Parameters handed to the tool verbatim.
    #[serde(default)]
    pub params: Map<String, Value>,
}

/// A stored template document.
///
/// `name` is the sole external identifier. `version`, `created_at` and
/// `updated_at` are maintained by the store: every persisted mutation bumps
/// `version` and `updated_at` while `created_at` survives updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Template {
    pub name: String,
    #[serde(default)]
    pub kind: TemplateKind,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub actions: Vec<Action>,
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Caller-supplied template content. Name, version and timestamps are
/// assigned by the store on save.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct TemplateDraft {
    #[serde(default)]
    pub kind: TemplateKind,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub actions: Vec<Action>,
}

/// Listing row for a stored template.
///
/// `revisions` is populated only when the caller asked for version history
/// and the archive is enabled.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TemplateSummary {
    pub name: String,
    pub kind: TemplateKind,
    pub tags: Vec<String>,
    pub description: String,
    pub action_count: usize,
    pub version: u32,
    pub updated_at: DateTime<Utc>,
    pub revisions: Option<Vec<RevisionInfo>>,
}

impl From<&Template> for TemplateSummary {
    fn from(template: &Template) -> Self {
        TemplateSummary {
            name: template.name.clone(),
            kind: template.kind,
            tags: template.tags.clone(),
            description: template.description.clone(),
            action_count: template.actions.len(),
            version: template.version,
            updated_at: template.updated_at,
            revisions: None,
        }
    }
}

/// One archived revision of a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RevisionInfo {
    pub revision: u32,
    pub saved_at: DateTime<Utc>,
    /// What triggered the snapshot: `update`, `modify` or `delete`.
    pub reason: String,
}
