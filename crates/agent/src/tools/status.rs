use anyhow::{Context, Result};
use async_trait::async_trait;
use procura_core::{ConversationStatus, Session};
use serde::Deserialize;
use serde_json::{json, Value};

use super::Tool;

/// Moves the session's conversation to a new negotiation stage.
pub struct UpdateConversationStatusTool;

#[derive(Debug, Deserialize)]
struct UpdateStatusInput {
    status: String,
    note: Option<String>,
}

#[async_trait]
impl Tool for UpdateConversationStatusTool {
    fn name(&self) -> &'static str {
        "update_conversation_status"
    }

    fn description(&self) -> String {
        let statuses: Vec<String> = ConversationStatus::ALL
            .iter()
            .map(|status| format!("- {}: {}", status.as_str(), status.description()))
            .collect();
        format!(
            "Update the current conversation status during procurement negotiation.\nAvailable statuses:\n{}\n\nUse this tool to track progress through the procurement process.",
            statuses.join("\n")
        )
    }

    fn parameters(&self) -> Value {
        let literals: Vec<&str> = ConversationStatus::ALL.iter().map(|s| s.as_str()).collect();
        json!({
            "type": "object",
            "properties": {
                "status": {
                    "type": "string",
                    "enum": literals,
                    "description": "New conversation status"
                },
                "note": {
                    "type": "string",
                    "description": "Optional note about the status change"
                }
            },
            "required": ["status"]
        })
    }

    async fn execute(&self, input: Value, session: &Session) -> Result<String> {
        let input: UpdateStatusInput =
            serde_json::from_value(input).context("expected `status` and optional `note`")?;

        Ok(match session.tracker().update_status(&input.status, input.note.as_deref()) {
            Ok(confirmation) => confirmation,
            Err(error) => format!("Failed to update conversation status: {error}"),
        })
    }
}
