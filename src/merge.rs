//! Override merging: resolve a stored template against a partial override
//! document before execution or persistence.
//!
//! Merging is pure. Both inputs are borrowed immutably and the result is a
//! fresh document, so the same base and override always resolve to the
//! same output no matter how often they are merged.
//!
//! Action overrides are positional: entry `i` of the override array merges
//! into action `i` of the base. Parameter maps merge one level deep: a
//! top-level key present in the override replaces the base key wholesale,
//! nested structures included. Nothing recurses.

use serde_json::{Map, Value};

use crate::models::{Action, ActionOverride, OverrideDocument, Template};
use crate::MaquetteError;

/// Resolve `base` against `overrides` into the template that would
/// execute.
///
/// Scalar fields (`kind`, `tags`, `description`) are replaced when the
/// override carries them. Actions follow [`resolve_actions`]. Name,
/// version and timestamps pass through untouched; persistence concerns
/// belong to the store.
pub fn merge_template(
    base: &Template,
    overrides: &OverrideDocument,
) -> Result<Template, MaquetteError> {
    let mut resolved = base.clone();

    if let Some(kind) = overrides.kind {
        resolved.kind = kind;
    }
    if let Some(tags) = &overrides.tags {
        resolved.tags = tags.clone();
    }
    if let Some(description) = &overrides.description {
        resolved.description = description.clone();
    }
    if let Some(action_overrides) = &overrides.actions {
        resolved.actions = resolve_actions(&base.actions, action_overrides)?;
    }

    Ok(resolved)
}

/// Merge a positional override list into a base action sequence.
///
/// Override entry `i` merges into base action `i`: `tool` replaces when
/// present, `params` union shallowly with override keys winning. An empty
/// entry leaves the base action as it was, and a short override list
/// leaves the tail of the base untouched.
///
/// Entries past the end of the base append new actions. Those must be
/// fully specified, with both `tool` and `params` present and the tool
/// non-empty, because there is no base action to inherit from.
pub fn resolve_actions(
    base: &[Action],
    overrides: &[ActionOverride],
) -> Result<Vec<Action>, MaquetteError> {
    let mut resolved = Vec::with_capacity(base.len().max(overrides.len()));

    for (i, action) in base.iter().enumerate() {
        let mut action = action.clone();
        if let Some(entry) = overrides.get(i) {
            if let Some(tool) = &entry.tool {
                action.tool = tool.clone();
            }
            if let Some(params) = &entry.params {
                action.params = merge_params(&action.params, params);
            }
        }
        resolved.push(action);
    }

    for (i, entry) in overrides.iter().enumerate().skip(base.len()) {
        let (Some(tool), Some(params)) = (&entry.tool, &entry.params) else {
            return Err(MaquetteError::validation(
                format!("actions[{}]", i),
                "appended action must specify both tool and params",
            ));
        };
        if tool.is_empty() {
            return Err(MaquetteError::validation(
                format!("actions[{}].tool", i),
                "tool cannot be empty",
            ));
        }
        resolved.push(Action {
            tool: tool.clone(),
            params: params.clone(),
        });
    }

    Ok(resolved)
}

/// Shallow one-level union: override keys replace base keys wholesale.
fn merge_params(base: &Map<String, Value>, overrides: &Map<String, Value>) -> Map<String, Value> {
    let mut merged = base.clone();
    for (key, value) in overrides {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TemplateKind;
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn params(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn bounce_template() -> Template {
        let now = Utc::now();
        Template {
            name: "bounce".to_string(),
            kind: TemplateKind::Animation,
            tags: vec!["demo".to_string()],
            description: "Bouncing ball".to_string(),
            actions: vec![
                Action {
                    tool: "execute_code".to_string(),
                    params: params(&[
                        ("code", json!("setup_ball()")),
                        ("frames", json!(48)),
                    ]),
                },
                Action {
                    tool: "set_keyframes".to_string(),
                    params: params(&[("channel", json!("location.z"))]),
                },
            ],
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_empty_override_is_identity() {
        let base = bounce_template();
        let resolved = merge_template(&base, &OverrideDocument::default()).unwrap();
        assert_eq!(resolved, base);
    }

    #[test]
    fn test_scalar_fields_replace_when_present() {
        let base = bounce_template();
        let ov = OverrideDocument {
            kind: Some(TemplateKind::Scene),
            description: Some("tweaked".to_string()),
            ..Default::default()
        };
        let resolved = merge_template(&base, &ov).unwrap();
        assert_eq!(resolved.kind, TemplateKind::Scene);
        assert_eq!(resolved.description, "tweaked");
        // Untouched fields survive.
        assert_eq!(resolved.tags, base.tags);
        assert_eq!(resolved.actions, base.actions);
        assert_eq!(resolved.version, base.version);
    }

    #[test]
    fn test_param_override_replaces_one_key_only() {
        let base = bounce_template();
        let ov = OverrideDocument {
            actions: Some(vec![ActionOverride {
                tool: None,
                params: Some(params(&[("code", json!("setup_cube()"))])),
            }]),
            ..Default::default()
        };
        let resolved = merge_template(&base, &ov).unwrap();

        // Action 0: "code" replaced, "frames" and the tool untouched.
        assert_eq!(resolved.actions[0].tool, "execute_code");
        assert_eq!(resolved.actions[0].params["code"], json!("setup_cube()"));
        assert_eq!(resolved.actions[0].params["frames"], json!(48));
        // Action 1 was beyond the override list and is untouched.
        assert_eq!(resolved.actions[1], base.actions[1]);
    }

    #[test]
    fn test_override_key_replaces_nested_structure_wholesale() {
        let base = Template {
            actions: vec![Action {
                tool: "configure".to_string(),
                params: params(&[("opts", json!({"a": 1, "b": 2}))]),
            }],
            ..bounce_template()
        };
        let ov = OverrideDocument {
            actions: Some(vec![ActionOverride {
                tool: None,
                params: Some(params(&[("opts", json!({"c": 3}))])),
            }]),
            ..Default::default()
        };
        let resolved = merge_template(&base, &ov).unwrap();
        // No recursion: the nested map is replaced, not unioned.
        assert_eq!(resolved.actions[0].params["opts"], json!({"c": 3}));
    }

    #[test]
    fn test_empty_entry_skips_an_index() {
        let base = bounce_template();
        let ov = OverrideDocument {
            actions: Some(vec![
                ActionOverride::default(),
                ActionOverride {
                    tool: Some("bake_keyframes".to_string()),
                    params: None,
                },
            ]),
            ..Default::default()
        };
        let resolved = merge_template(&base, &ov).unwrap();
        assert_eq!(resolved.actions[0], base.actions[0]);
        assert_eq!(resolved.actions[1].tool, "bake_keyframes");
        assert_eq!(resolved.actions[1].params, base.actions[1].params);
    }

    #[test]
    fn test_fully_specified_append() {
        let base = bounce_template();
        let ov = OverrideDocument {
            actions: Some(vec![
                ActionOverride::default(),
                ActionOverride::default(),
                ActionOverride {
                    tool: Some("render_preview".to_string()),
                    params: Some(params(&[("samples", json!(16))])),
                },
            ]),
            ..Default::default()
        };
        let resolved = merge_template(&base, &ov).unwrap();
        assert_eq!(resolved.actions.len(), 3);
        assert_eq!(resolved.actions[2].tool, "render_preview");
    }

    #[test]
    fn test_partial_append_is_rejected() {
        let base = bounce_template();
        let ov = OverrideDocument {
            actions: Some(vec![
                ActionOverride::default(),
                ActionOverride::default(),
                ActionOverride {
                    tool: Some("render_preview".to_string()),
                    params: None,
                },
            ]),
            ..Default::default()
        };
        let err = merge_template(&base, &ov).unwrap_err();
        match err {
            MaquetteError::Validation { path, .. } => assert_eq!(path, "actions[2]"),
            other => panic!("expected validation error, got {other}"),
        }
    }

    #[test]
    fn test_merge_never_mutates_base() {
        let base = bounce_template();
        let before = base.clone();
        let ov = OverrideDocument {
            kind: Some(TemplateKind::Other),
            tags: Some(vec![]),
            description: Some(String::new()),
            actions: Some(vec![ActionOverride {
                tool: Some("noop".to_string()),
                params: Some(Map::new()),
            }]),
        };
        let _ = merge_template(&base, &ov).unwrap();
        assert_eq!(base, before);
    }

    // -- Property-based tests --

    mod prop_tests {
        use super::*;
        use proptest::prelude::*;

        fn param_map() -> impl Strategy<Value = Map<String, Value>> {
            proptest::collection::btree_map("[a-z]{1,6}", -100i64..100, 0..5).prop_map(|m| {
                m.into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect()
            })
        }

        fn action_seq() -> impl Strategy<Value = Vec<Action>> {
            proptest::collection::vec(
                ("[a-z_]{1,12}", param_map()).prop_map(|(tool, params)| Action { tool, params }),
                0..4,
            )
        }

        fn override_seq() -> impl Strategy<Value = Vec<ActionOverride>> {
            proptest::collection::vec(
                (
                    proptest::option::of("[a-z_]{1,12}".prop_map(String::from)),
                    proptest::option::of(param_map()),
                )
                    .prop_map(|(tool, params)| ActionOverride { tool, params }),
                0..4,
            )
        }

        proptest! {
            #[test]
            fn prop_resolve_is_deterministic(base in action_seq(), ov in override_seq()) {
                let first = resolve_actions(&base, &ov);
                let second = resolve_actions(&base, &ov);
                match (first, second) {
                    (Ok(a), Ok(b)) => prop_assert_eq!(a, b),
                    (Err(_), Err(_)) => {}
                    _ => prop_assert!(false, "determinism violated"),
                }
            }

            #[test]
            fn prop_resolve_never_mutates_inputs(base in action_seq(), ov in override_seq()) {
                let base_before = base.clone();
                let ov_before = ov.clone();
                let _ = resolve_actions(&base, &ov);
                prop_assert_eq!(base, base_before);
                prop_assert_eq!(ov, ov_before);
            }

            #[test]
            fn prop_short_override_preserves_length(base in action_seq(), ov in override_seq()) {
                if let Ok(resolved) = resolve_actions(&base, &ov) {
                    prop_assert_eq!(resolved.len(), base.len().max(ov.len()));
                }
            }

            #[test]
            fn prop_override_keys_win(base in action_seq(), params in param_map()) {
                if base.is_empty() {
                    return Ok(());
                }
                let ov = vec![ActionOverride { tool: None, params: Some(params.clone()) }];
                let resolved = resolve_actions(&base, &ov).unwrap();
                for (key, value) in &params {
                    prop_assert_eq!(&resolved[0].params[key], value);
                }
            }
        }
    }
}
