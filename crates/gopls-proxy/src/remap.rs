//! Rewriting positions and URIs inside protocol messages.
//!
//! Requests travel editor → gopls and have their document URI and position
//! moved into the generated file. Responses and diagnostics travel back and
//! have every range, location, location link and text edit moved into the
//! original file. Values that do not refer to a sugo document are left alone.

use crate::session::Snapshot;
use lsp_types::Range;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Keys whose value is a range in the document of the enclosing object.
const RANGE_KEYS: &[&str] = &[
    "range",
    "targetRange",
    "targetSelectionRange",
    "selectionRange",
    "insert",
    "replace",
];

/// Key of a `LocationLink` range that lies in the requesting document.
const ORIGIN_RANGE: &str = "originSelectionRange";

/// Resolves a generated URI to its original URI and the snapshot to map with.
pub(crate) type Resolver<'a> = dyn Fn(&str) -> Option<(String, Arc<Snapshot>)> + 'a;

/// Moves a request's document and position into the generated file.
pub(crate) fn request_to_generated(message: &mut Value, snapshot: &Snapshot, generated_uri: &str) {
    let Some(params) = message.get_mut("params").and_then(Value::as_object_mut) else {
        return;
    };
    if let Some(uri) = params
        .get_mut("textDocument")
        .and_then(|doc| doc.get_mut("uri"))
    {
        *uri = Value::String(generated_uri.to_string());
    }
    if let Some(position) = params.get_mut("position") {
        if let Ok(original) = serde_json::from_value::<lsp_types::Position>(position.clone()) {
            *position = position_value(snapshot.generated_position(original));
        }
    }
}

/// Moves every location in a server payload back into original files.
///
/// `context` is the snapshot for ranges not qualified by a URI, i.e. those
/// belonging to the requesting document.
pub(crate) fn to_original(value: &mut Value, context: Option<&Arc<Snapshot>>, resolve: &Resolver<'_>) {
    match value {
        Value::Array(items) => {
            for item in items {
                to_original(item, context, resolve);
            }
        }
        Value::Object(map) => object_to_original(map, context, resolve),
        _ => {}
    }
}

fn object_to_original(
    map: &mut Map<String, Value>,
    context: Option<&Arc<Snapshot>>,
    resolve: &Resolver<'_>,
) {
    // A URI in the object scopes its ranges to that document.
    let mut scoped = None;
    let mut qualified = false;
    for key in ["uri", "targetUri"] {
        let Some(Value::String(uri)) = map.get_mut(key) else {
            continue;
        };
        qualified = true;
        if let Some((original, snapshot)) = resolve(uri) {
            *uri = original;
            scoped = Some(snapshot);
        }
    }
    if let Some(Value::Object(doc)) = map.get_mut("textDocument") {
        if let Some(Value::String(uri)) = doc.get_mut("uri") {
            qualified = true;
            if let Some((original, snapshot)) = resolve(uri) {
                *uri = original;
                // The server's version is a generation, not the editor's version.
                if doc.contains_key("version") {
                    doc.insert("version".to_string(), Value::Null);
                }
                scoped = Some(snapshot);
            }
        }
    }
    let snapshot = if qualified { scoped.as_ref() } else { context };

    if let Some(Value::Object(changes)) = map.get_mut("changes") {
        let entries = std::mem::take(changes);
        for (uri, mut edits) in entries {
            match resolve(&uri) {
                Some((original, target)) => {
                    to_original(&mut edits, Some(&target), resolve);
                    changes.insert(original, edits);
                }
                None => {
                    changes.insert(uri, edits);
                }
            }
        }
    }

    for (key, child) in map.iter_mut() {
        match key.as_str() {
            "changes" | "textDocument" => {}
            ORIGIN_RANGE => {
                if let Some(snapshot) = context {
                    map_range(child, snapshot);
                }
            }
            k if RANGE_KEYS.contains(&k) && is_range(child) => {
                if let Some(snapshot) = snapshot {
                    map_range(child, snapshot);
                }
            }
            _ => to_original(child, snapshot, resolve),
        }
    }
}

fn is_range(value: &Value) -> bool {
    value.get("start").is_some_and(Value::is_object) && value.get("end").is_some_and(Value::is_object)
}

fn map_range(value: &mut Value, snapshot: &Snapshot) {
    if let Ok(range) = serde_json::from_value::<Range>(value.clone()) {
        let mapped = snapshot.original_range(range);
        if let Ok(mapped) = serde_json::to_value(mapped) {
            *value = mapped;
        }
    }
}

fn position_value(position: lsp_types::Position) -> Value {
    serde_json::json!({ "line": position.line, "character": position.character })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use source_map::LineIndex;

    const SOURCE: &str = "package main\n\nfunc main() {\n\tlet x = 1\n\t_ = x\n}\n";

    fn snapshot() -> Arc<Snapshot> {
        let transpiled = sugo_bridge::transpile(SOURCE, "main.sugo").unwrap();
        Arc::new(Snapshot::new(1, Arc::new(LineIndex::new(SOURCE)), transpiled))
    }

    fn resolver(snapshot: Arc<Snapshot>) -> impl Fn(&str) -> Option<(String, Arc<Snapshot>)> {
        move |uri| (uri == "file:///w/main.go").then(|| ("file:///w/main.sugo".to_string(), Arc::clone(&snapshot)))
    }

    #[test]
    fn test_request_moves_uri_and_position() {
        let snapshot = snapshot();
        let mut message = json!({
            "jsonrpc": "2.0",
            "id": 3,
            "method": "textDocument/hover",
            "params": {
                "textDocument": { "uri": "file:///w/main.sugo" },
                "position": { "line": 3, "character": 5 }
            }
        });
        request_to_generated(&mut message, &snapshot, "file:///w/main.go");
        assert_eq!(message["params"]["textDocument"]["uri"], "file:///w/main.go");
        // `x` in `let x = 1` is at column 1 of `x := 1`.
        assert_eq!(message["params"]["position"], json!({ "line": 3, "character": 1 }));
    }

    #[test]
    fn test_locations_are_renamed_and_mapped() {
        let snapshot = snapshot();
        let resolve = resolver(Arc::clone(&snapshot));
        let mut result = json!([
            { "uri": "file:///w/main.go", "range": { "start": { "line": 4, "character": 5 }, "end": { "line": 4, "character": 6 } } },
            { "uri": "file:///usr/lib/go/src/fmt/print.go", "range": { "start": { "line": 9, "character": 0 }, "end": { "line": 9, "character": 4 } } }
        ]);
        to_original(&mut result, Some(&snapshot), &resolve);
        assert_eq!(result[0]["uri"], "file:///w/main.sugo");
        assert_eq!(result[0]["range"]["start"], json!({ "line": 4, "character": 5 }));
        assert_eq!(result[1]["uri"], "file:///usr/lib/go/src/fmt/print.go");
        assert_eq!(result[1]["range"]["start"], json!({ "line": 9, "character": 0 }));
    }

    #[test]
    fn test_workspace_edit_changes_are_rekeyed() {
        let snapshot = snapshot();
        let resolve = resolver(Arc::clone(&snapshot));
        let mut edit = json!({
            "changes": {
                "file:///w/main.go": [
                    { "range": { "start": { "line": 4, "character": 5 }, "end": { "line": 4, "character": 6 } }, "newText": "y" }
                ]
            }
        });
        to_original(&mut edit, None, &resolve);
        let edits = &edit["changes"]["file:///w/main.sugo"];
        assert_eq!(edits[0]["newText"], "y");
        assert_eq!(edits[0]["range"]["end"], json!({ "line": 4, "character": 6 }));
    }

    #[test]
    fn test_document_changes_drop_server_version() {
        let snapshot = snapshot();
        let resolve = resolver(Arc::clone(&snapshot));
        let mut edit = json!({
            "documentChanges": [{
                "textDocument": { "uri": "file:///w/main.go", "version": 7 },
                "edits": [{ "range": { "start": { "line": 4, "character": 5 }, "end": { "line": 4, "character": 6 } }, "newText": "y" }]
            }]
        });
        to_original(&mut edit, None, &resolve);
        let change = &edit["documentChanges"][0];
        assert_eq!(change["textDocument"], json!({ "uri": "file:///w/main.sugo", "version": null }));
        assert_eq!(change["edits"][0]["range"]["start"], json!({ "line": 4, "character": 5 }));
    }

    #[test]
    fn test_unqualified_range_uses_context() {
        let snapshot = snapshot();
        let resolve = |_: &str| -> Option<(String, Arc<Snapshot>)> { None };
        let mut hover = json!({
            "contents": { "kind": "markdown", "value": "var x int" },
            "range": { "start": { "line": 3, "character": 1 }, "end": { "line": 3, "character": 2 } }
        });
        to_original(&mut hover, Some(&snapshot), &resolve);
        assert_eq!(hover["range"]["start"], json!({ "line": 3, "character": 5 }));
        assert_eq!(hover["contents"]["value"], "var x int");
    }
}
