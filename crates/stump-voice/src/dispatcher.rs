//! Bridges remote tool-call requests to locally registered handlers.

use std::collections::HashMap;

use futures_util::future::BoxFuture;
use serde_json::{json, Value};
use tracing::{debug, warn};

use stump_common::CallId;

/// Async tool handler. Receives the parsed arguments, returns a result
/// payload or an error message.
pub type ToolHandler =
    Box<dyn Fn(Value) -> BoxFuture<'static, Result<Value, String>> + Send + Sync>;

/// A tool exposed to the remote endpoint.
#[derive(Debug, Clone)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON-schema of the arguments object.
    pub parameters: Value,
}

impl ToolDefinition {
    /// Wire form for the `session.update` tool catalog.
    pub fn to_wire(&self) -> Value {
        json!({
            "type": "function",
            "name": self.name,
            "description": self.description,
            "parameters": self.parameters,
        })
    }
}

/// A remote request to invoke a named local capability. Exists only for
/// the duration of one dispatch.
#[derive(Debug, Clone)]
pub struct ToolCall {
    pub name: String,
    pub arguments: Value,
    pub call_id: CallId,
}

/// The answer to one [`ToolCall`]. Sent exactly once per call, even on
/// handler failure (the payload then carries an `error` marker).
#[derive(Debug, Clone)]
pub struct ToolResult {
    pub call_id: CallId,
    pub payload: Value,
}

impl ToolResult {
    pub fn is_error(&self) -> bool {
        self.payload.get("error").is_some()
    }

    /// Serialized payload for the `function_call_output` item.
    pub fn output(&self) -> String {
        self.payload.to_string()
    }
}

struct ToolEntry {
    definition: ToolDefinition,
    handler: ToolHandler,
    /// Internal tools serve the session protocol itself and are never
    /// listed in the catalog sent to the remote endpoint.
    internal: bool,
}

/// Name → handler registry for remote tool-call requests.
#[derive(Default)]
pub struct ToolDispatcher {
    tools: HashMap<String, ToolEntry>,
}

impl ToolDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler. Re-registration overwrites silently, so hosts
    /// can hot-swap their available actions.
    pub fn register(&mut self, definition: ToolDefinition, handler: ToolHandler) {
        debug!(tool = %definition.name, "tool registered");
        self.tools.insert(
            definition.name.clone(),
            ToolEntry {
                definition,
                handler,
                internal: false,
            },
        );
    }

    /// Register a session-internal tool, excluded from the public catalog.
    pub fn register_internal(&mut self, definition: ToolDefinition, handler: ToolHandler) {
        self.tools.insert(
            definition.name.clone(),
            ToolEntry {
                definition,
                handler,
                internal: true,
            },
        );
    }

    /// Catalog of public tools in wire form.
    pub fn catalog(&self) -> Vec<Value> {
        let mut entries: Vec<&ToolEntry> =
            self.tools.values().filter(|e| !e.internal).collect();
        entries.sort_by(|a, b| a.definition.name.cmp(&b.definition.name));
        entries.iter().map(|e| e.definition.to_wire()).collect()
    }

    /// Dispatch a raw tool-call request as it arrives off the wire.
    ///
    /// Never fails: malformed arguments, unregistered names, and handler
    /// errors all become structured error payloads so the call is always
    /// answered.
    pub async fn dispatch_raw(&self, name: &str, arguments: &str, call_id: CallId) -> ToolResult {
        let arguments = match serde_json::from_str::<Value>(arguments) {
            Ok(value) => value,
            Err(e) => {
                warn!(tool = %name, error = %e, "malformed tool arguments");
                return ToolResult {
                    call_id,
                    payload: json!({ "error": format!("malformed arguments: {e}") }),
                };
            }
        };
        self.dispatch(ToolCall {
            name: name.to_string(),
            arguments,
            call_id,
        })
        .await
    }

    pub async fn dispatch(&self, call: ToolCall) -> ToolResult {
        let Some(entry) = self.tools.get(&call.name) else {
            warn!(tool = %call.name, "tool call for unregistered name");
            return ToolResult {
                call_id: call.call_id,
                payload: json!({ "error": format!("{} not registered", call.name) }),
            };
        };

        debug!(tool = %call.name, call_id = %call.call_id, "dispatching tool call");
        match (entry.handler)(call.arguments).await {
            Ok(payload) => ToolResult {
                call_id: call.call_id,
                payload,
            },
            Err(message) => {
                warn!(tool = %call.name, error = %message, "tool handler failed");
                ToolResult {
                    call_id: call.call_id,
                    payload: json!({ "error": message }),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::FutureExt;

    fn echo_definition(name: &str) -> ToolDefinition {
        ToolDefinition {
            name: name.to_string(),
            description: "echoes its arguments".into(),
            parameters: json!({ "type": "object", "properties": {} }),
        }
    }

    fn echo_handler() -> ToolHandler {
        Box::new(|args| async move { Ok(json!({ "echo": args })) }.boxed())
    }

    #[tokio::test]
    async fn dispatch_invokes_registered_handler() {
        let mut dispatcher = ToolDispatcher::new();
        dispatcher.register(echo_definition("echo"), echo_handler());

        let result = dispatcher
            .dispatch_raw("echo", r#"{"x":1}"#, CallId::from("call_1".to_string()))
            .await;

        assert!(!result.is_error());
        assert_eq!(result.payload["echo"]["x"], 1);
        assert_eq!(result.call_id.as_str(), "call_1");
    }

    #[tokio::test]
    async fn unregistered_name_yields_error_result() {
        let dispatcher = ToolDispatcher::new();
        let result = dispatcher
            .dispatch_raw("missing", "{}", CallId::from("call_2".to_string()))
            .await;

        assert!(result.is_error());
        assert_eq!(result.payload["error"], "missing not registered");
    }

    #[tokio::test]
    async fn handler_error_becomes_error_payload() {
        let mut dispatcher = ToolDispatcher::new();
        dispatcher.register(
            echo_definition("boom"),
            Box::new(|_| async { Err("handler exploded".to_string()) }.boxed()),
        );

        let result = dispatcher
            .dispatch_raw("boom", "{}", CallId::new())
            .await;
        assert!(result.is_error());
        assert_eq!(result.payload["error"], "handler exploded");
    }

    #[tokio::test]
    async fn malformed_arguments_become_error_payload() {
        let mut dispatcher = ToolDispatcher::new();
        dispatcher.register(echo_definition("echo"), echo_handler());

        let result = dispatcher
            .dispatch_raw("echo", "not json", CallId::new())
            .await;
        assert!(result.is_error());
    }

    #[tokio::test]
    async fn re_registration_overwrites() {
        let mut dispatcher = ToolDispatcher::new();
        dispatcher.register(
            echo_definition("swap"),
            Box::new(|_| async { Ok(json!({"generation": 1})) }.boxed()),
        );
        dispatcher.register(
            echo_definition("swap"),
            Box::new(|_| async { Ok(json!({"generation": 2})) }.boxed()),
        );

        let result = dispatcher.dispatch_raw("swap", "{}", CallId::new()).await;
        assert_eq!(result.payload["generation"], 2);
        assert_eq!(dispatcher.catalog().len(), 1);
    }

    #[tokio::test]
    async fn catalog_excludes_internal_tools() {
        let mut dispatcher = ToolDispatcher::new();
        dispatcher.register(echo_definition("public_tool"), echo_handler());
        dispatcher.register_internal(echo_definition("secret_tool"), echo_handler());

        let catalog = dispatcher.catalog();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog[0]["name"], "public_tool");

        // Internal tools are still dispatchable
        let result = dispatcher
            .dispatch_raw("secret_tool", "{}", CallId::new())
            .await;
        assert!(!result.is_error());
    }

    #[test]
    fn wire_form_is_a_function_declaration() {
        let wire = echo_definition("echo").to_wire();
        assert_eq!(wire["type"], "function");
        assert_eq!(wire["name"], "echo");
        assert!(wire["parameters"].is_object());
    }
}
