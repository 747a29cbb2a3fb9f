use rmcp::model::{Content, IntoContents};
use serde::Serialize;

use crate::bridge::BridgeError;
use crate::MaquetteError;

/// Structured error response for MCP tool calls.
/// Provides error_code + suggestion so LLMs can auto-fix.
#[derive(Debug, Serialize)]
pub struct ToolError {
    pub error_code: String,
    pub message: String,
    pub suggestion: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<serde_json::Value>,
}

impl IntoContents for ToolError {
    fn into_contents(self) -> Vec<Content> {
        let json = serde_json::to_string(&self).unwrap_or_else(|_| self.message.clone());
        vec![Content::text(json)]
    }
}

impl From<MaquetteError> for ToolError {
    fn from(err: MaquetteError) -> Self {
        match err {
            MaquetteError::NotFound { name } => ToolError {
                error_code: "NOT_FOUND".into(),
                message: format!("template '{}' not found", name),
                suggestion: "Use list_templates to see stored templates, or create_template to add this one.".into(),
                field: Some("name".into()),
                example: Some(serde_json::json!({ "name": "bouncing_ball" })),
            },
            MaquetteError::Validation { path, message } => ToolError {
                error_code: "VALIDATION_ERROR".into(),
                message,
                suggestion: "Fix the field named in `field` and resend the request.".into(),
                field: Some(path),
                example: None,
            },
            MaquetteError::Bridge(bridge) => ToolError::from(bridge),
            MaquetteError::Io(err) => ToolError {
                error_code: "STORE_IO_ERROR".into(),
                message: err.to_string(),
                suggestion: "Check that the templates directory exists and is writable.".into(),
                field: None,
                example: None,
            },
            MaquetteError::Json(err) => ToolError {
                error_code: "INVALID_DOCUMENT".into(),
                message: err.to_string(),
                suggestion: "A stored document did not parse as JSON. Recreate it with create_template.".into(),
                field: None,
                example: None,
            },
        }
    }
}

impl From<BridgeError> for ToolError {
    fn from(err: BridgeError) -> Self {
        let message = err.to_string();
        match err {
            BridgeError::ConnectionFailed { .. } | BridgeError::ConnectionLost { .. } => {
                ToolError {
                    error_code: "HOST_UNAVAILABLE".into(),
                    message,
                    suggestion:
                        "Start the host application's command listener and check host/port settings."
                            .into(),
                    field: None,
                    example: None,
                }
            }
            BridgeError::Timeout { .. } => ToolError {
                error_code: "HOST_TIMEOUT".into(),
                message,
                suggestion:
                    "The host did not answer within the per-action budget. Split long-running code into smaller actions."
                        .into(),
                field: None,
                example: None,
            },
            BridgeError::UnknownCommand { .. } => ToolError {
                error_code: "UNKNOWN_COMMAND".into(),
                message,
                suggestion: "The host registers no handler under this name. Check the tool name for typos.".into(),
                field: Some("tool".into()),
                example: None,
            },
            BridgeError::Handler { .. } => ToolError {
                error_code: "HOST_FAILURE".into(),
                message,
                suggestion: "The host ran the command and reported failure. The message carries the host-side detail.".into(),
                field: None,
                example: None,
            },
            BridgeError::Protocol { .. } | BridgeError::FrameTooLarge { .. } => ToolError {
                error_code: "PROTOCOL_ERROR".into(),
                message,
                suggestion: "The connection will be re-established on the next call. Retry the operation.".into(),
                field: None,
                example: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_not_found_classification() {
        let err = ToolError::from(MaquetteError::not_found("orbit_cam"));
        assert_eq!(err.error_code, "NOT_FOUND");
        assert!(err.message.contains("orbit_cam"));
        assert!(err.suggestion.contains("list_templates"));
        assert!(err.example.is_some());
    }

    #[test]
    fn test_validation_carries_field_path() {
        let err = ToolError::from(MaquetteError::validation(
            "actions[2].tool",
            "tool cannot be empty",
        ));
        assert_eq!(err.error_code, "VALIDATION_ERROR");
        assert_eq!(err.field.as_deref(), Some("actions[2].tool"));
    }

    #[test]
    fn test_connection_loss_classification() {
        let err = ToolError::from(BridgeError::ConnectionLost {
            message: "peer closed the connection".into(),
        });
        assert_eq!(err.error_code, "HOST_UNAVAILABLE");
        assert!(err.suggestion.contains("host"));
    }

    #[test]
    fn test_timeout_classification() {
        let err = ToolError::from(BridgeError::Timeout {
            timeout: Duration::from_secs(15),
        });
        assert_eq!(err.error_code, "HOST_TIMEOUT");
    }

    #[test]
    fn test_unknown_command_names_the_field() {
        let err = ToolError::from(BridgeError::UnknownCommand {
            command: "make_coffee".into(),
        });
        assert_eq!(err.error_code, "UNKNOWN_COMMAND");
        assert_eq!(err.field.as_deref(), Some("tool"));
    }

    #[test]
    fn test_handler_failure_passes_through_bridge_wrapper() {
        let err = ToolError::from(MaquetteError::Bridge(BridgeError::Handler {
            message: "object 'Cube' already exists".into(),
        }));
        assert_eq!(err.error_code, "HOST_FAILURE");
        assert!(err.message.contains("Cube"));
    }

    #[test]
    fn test_into_contents_produces_json() {
        let err = ToolError::from(MaquetteError::not_found("x"));
        let contents = err.into_contents();
        assert_eq!(contents.len(), 1);
    }
}
