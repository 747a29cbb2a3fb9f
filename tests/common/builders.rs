//! Test data builders for template construction.
//!
//! Provides a fluent API for creating drafts with sensible defaults.

use maquette::models::{Action, TemplateDraft, TemplateKind};
use serde_json::{json, Map, Value};

/// Build a parameter map from literal pairs.
pub fn params(pairs: &[(&str, Value)]) -> Map<String, Value> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

/// Builder for template drafts.
#[derive(Default)]
pub struct TemplateBuilder {
    kind: TemplateKind,
    tags: Vec<String>,
    description: String,
    actions: Vec<Action>,
}

impl TemplateBuilder {
    /// Create a new draft builder with empty content.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the template kind.
    pub fn kind(mut self, kind: TemplateKind) -> Self {
        self.kind = kind;
        self
    }

    /// Add a tag.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Set the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Append an action.
    pub fn action(mut self, tool: impl Into<String>, params: Map<String, Value>) -> Self {
        self.actions.push(Action {
            tool: tool.into(),
            params,
        });
        self
    }

    /// Build the TemplateDraft struct.
    pub fn build(self) -> TemplateDraft {
        TemplateDraft {
            kind: self.kind,
            tags: self.tags,
            description: self.description,
            actions: self.actions,
        }
    }
}

/// Two-action bouncing ball draft used across the apply tests.
pub fn bounce_draft() -> TemplateDraft {
    TemplateBuilder::new()
        .kind(TemplateKind::Animation)
        .tag("physics")
        .tag("demo")
        .description("Sphere with a keyframed bounce")
        .action(
            "create_object",
            params(&[("type", json!("SPHERE")), ("name", json!("Ball"))]),
        )
        .action(
            "set_keyframes",
            params(&[("object", json!("Ball")), ("frames", json!(24))]),
        )
        .build()
}
