//! Override documents: partial templates merged over a stored base.
//!
//! The same shape serves two callers: `apply` merges an override document
//! transiently before execution, and `modify` merges one persistently.
//! Merging itself lives in `crate::merge` and never mutates the base.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use serde_with::skip_serializing_none;

use crate::models::TemplateKind;

/// Partial template document. Absent fields leave the base value
/// untouched. There is deliberately no `name` field: templates cannot be
/// renamed through a merge, a rename is a delete plus a create.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct OverrideDocument {
    pub kind: Option<TemplateKind>,
    pub tags: Option<Vec<String>>,
    pub description: Option<String>,
    /// Positional overrides: entry `i` merges into base action `i`.
    pub actions: Option<Vec<ActionOverride>>,
}

impl OverrideDocument {
    /// True when the document would change nothing.
    pub fn is_empty(&self) -> bool {
        self.kind.is_none()
            && self.tags.is_none()
            && self.description.is_none()
            && self.actions.as_ref().is_none_or(|a| a.is_empty())
    }
}

/// Positional override for one action. An empty entry (`{}`) leaves the
/// aligned base action unchanged; entries past the end of the base
/// sequence append new actions and must carry both fields.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ActionOverride {
    pub tool: Option<String>,
    /// Shallow parameter overrides: top-level keys replace base keys
    /// wholesale, including nested structures.
    pub params: Option<Map<String, Value>>,
}
