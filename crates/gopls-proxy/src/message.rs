//! JSON-RPC message helpers.

use serde_json::{json, Value};

/// JSON-RPC error code for a request the server could not serve.
pub const REQUEST_FAILED: i64 = -32803;

/// JSON-RPC error code for an internal failure.
pub const INTERNAL_ERROR: i64 = -32603;

/// The shape of a JSON-RPC message.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Kind {
    Request { id: Value, method: String },
    Notification { method: String },
    Response { id: Value },
    Invalid,
}

/// Classifies a message by the presence of `id` and `method`.
pub(crate) fn classify(message: &Value) -> Kind {
    let id = message.get("id").filter(|id| !id.is_null()).cloned();
    let method = message.get("method").and_then(Value::as_str).map(str::to_string);
    match (id, method) {
        (Some(id), Some(method)) => Kind::Request { id, method },
        (None, Some(method)) => Kind::Notification { method },
        (Some(id), None) => Kind::Response { id },
        (None, None) => Kind::Invalid,
    }
}

/// Key for a request id; numeric and string ids never collide.
pub(crate) fn id_key(id: &Value) -> String {
    id.to_string()
}

/// Builds a request.
pub(crate) fn request(id: Value, method: &str, params: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params })
}

/// Builds a notification.
pub(crate) fn notification(method: &str, params: Value) -> Value {
    json!({ "jsonrpc": "2.0", "method": method, "params": params })
}

/// Builds an error response.
pub(crate) fn error_response(id: &Value, code: i64, message: &str) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "error": { "code": code, "message": message } })
}

/// Returns `params.textDocument.uri`, if present.
pub(crate) fn document_uri(message: &Value) -> Option<&str> {
    message.pointer("/params/textDocument/uri").and_then(Value::as_str)
}
