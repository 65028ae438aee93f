//! Campaign-builder tools exposed to the voice session.
//!
//! In the full product these mutate the live campaign draft; the CLI
//! build keeps an in-memory draft so the voice loop can be exercised
//! end to end.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use futures_util::FutureExt;
use serde_json::{json, Value};
use tracing::info;

use stump_voice::{SessionHandle, ToolDefinition, VoiceError};

/// The campaign draft the tools read and write.
#[derive(Default)]
pub struct CampaignDraft {
    fields: Mutex<HashMap<String, String>>,
}

pub async fn register_campaign_tools(
    handle: &SessionHandle,
    draft: Arc<CampaignDraft>,
) -> Result<(), VoiceError> {
    let status_draft = draft.clone();
    handle
        .register_tool(
            ToolDefinition {
                name: "get_campaign_status".to_string(),
                description: "Read the current campaign draft: every field set so far.".to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {}
                }),
            },
            Box::new(move |_args: Value| {
                let draft = status_draft.clone();
                async move {
                    let fields = draft.fields.lock().map_err(|e| e.to_string())?;
                    Ok(json!({ "fields": fields.clone() }))
                }
                .boxed()
            }),
        )
        .await?;

    handle
        .register_tool(
            ToolDefinition {
                name: "set_campaign_field".to_string(),
                description: "Set one field of the campaign draft, e.g. name, audience, budget."
                    .to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "field": {
                            "type": "string",
                            "description": "Field to set (name, audience, budget, schedule, ...)"
                        },
                        "value": {
                            "type": "string",
                            "description": "New value for the field"
                        }
                    },
                    "required": ["field", "value"]
                }),
            },
            Box::new(move |args: Value| {
                let draft = draft.clone();
                async move {
                    let field = args
                        .get("field")
                        .and_then(Value::as_str)
                        .ok_or_else(|| "field is required".to_string())?
                        .to_string();
                    let value = args
                        .get("value")
                        .and_then(Value::as_str)
                        .ok_or_else(|| "value is required".to_string())?
                        .to_string();
                    info!(field = %field, "campaign field updated");
                    draft
                        .fields
                        .lock()
                        .map_err(|e| e.to_string())?
                        .insert(field.clone(), value.clone());
                    Ok(json!({ "field": field, "value": value, "updated": true }))
                }
                .boxed()
            }),
        )
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_starts_empty() {
        let draft = CampaignDraft::default();
        assert!(draft.fields.lock().unwrap().is_empty());
    }
}
