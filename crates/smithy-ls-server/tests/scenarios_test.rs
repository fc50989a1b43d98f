//! End-to-end scenarios through the dispatcher.

use serde_json::{json, Value};
use smithy_ls_server::dispatch::Dispatcher;
use smithy_ls_server::protocol::Incoming;

fn uri_of(path: &std::path::Path) -> String {
    format!("file://{}", path.display())
}

fn request(dispatcher: &Dispatcher, id: i64, method: &str, params: Value) -> Value {
    let outcome = dispatcher.handle(Incoming {
        id: Some(json!(id)),
        method: Some(method.to_string()),
        params,
    });
    let response = outcome.response.expect("request must produce a response");
    assert!(response.error.is_none(), "unexpected error: {response:?}");
    response.result.unwrap_or(Value::Null)
}

fn notify(dispatcher: &Dispatcher, method: &str, params: Value) -> Vec<(String, Value)> {
    let outcome = dispatcher.handle(Incoming {
        id: None,
        method: Some(method.to_string()),
        params,
    });
    outcome
        .notifications
        .into_iter()
        .map(|notification| (notification.method, notification.params))
        .collect()
}

/// Diagnostics published for `uri`, flattened out of a notification
/// batch.
fn diagnostics_for<'a>(
    notifications: &'a [(String, Value)],
    uri: &str,
) -> Option<&'a Vec<Value>> {
    notifications
        .iter()
        .filter(|(method, _)| method == "textDocument/publishDiagnostics")
        .find(|(_, params)| params["uri"].as_str() == Some(uri))
        .and_then(|(_, params)| params["diagnostics"].as_array())
}

struct Workspace {
    dir: tempfile::TempDir,
    dispatcher: Dispatcher,
}

impl Workspace {
    fn new(files: &[(&str, &str)]) -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("model")).unwrap();
        std::fs::write(
            dir.path().join("smithy-build.json"),
            r#"{"version": "1.0", "sources": ["model"]}"#,
        )
        .unwrap();
        for (name, text) in files {
            std::fs::write(dir.path().join("model").join(name), text).unwrap();
        }
        let dispatcher = Dispatcher::new();
        request(
            &dispatcher,
            1,
            "initialize",
            json!({"rootUri": uri_of(dir.path()), "capabilities": {}}),
        );
        notify(&dispatcher, "initialized", json!({}));
        Self { dir, dispatcher }
    }

    fn model_uri(&self, name: &str) -> String {
        uri_of(&self.dir.path().join("model").join(name))
    }

    fn open(&self, name: &str, text: &str) -> Vec<(String, Value)> {
        notify(
            &self.dispatcher,
            "textDocument/didOpen",
            json!({"textDocument": {
                "uri": self.model_uri(name),
                "languageId": "smithy",
                "version": 1,
                "text": text,
            }}),
        )
    }
}

#[test]
fn empty_file_gets_a_define_version_diagnostic() {
    let ws = Workspace::new(&[("a.smithy", "")]);
    let notifications = ws.open("a.smithy", "");
    let uri = ws.model_uri("a.smithy");
    let diagnostics = diagnostics_for(&notifications, &uri).unwrap();
    assert_eq!(diagnostics.len(), 1);
    let diagnostic = &diagnostics[0];
    assert_eq!(diagnostic["code"], "define-idl-version");
    assert_eq!(diagnostic["severity"], 2);
    assert_eq!(
        diagnostic["range"],
        json!({"start": {"line": 0, "character": 0}, "end": {"line": 0, "character": 0}})
    );
}

#[test]
fn version_one_files_get_an_upgrade_diagnostic() {
    let text = "$version: \"1\"\nnamespace com.a";
    let ws = Workspace::new(&[("a.smithy", text)]);
    let notifications = ws.open("a.smithy", text);
    let uri = ws.model_uri("a.smithy");
    let diagnostics = diagnostics_for(&notifications, &uri).unwrap();
    let upgrade = diagnostics
        .iter()
        .find(|d| d["code"] == "migrating-idl-1-to-2")
        .expect("upgrade diagnostic");
    assert_eq!(upgrade["severity"], 2);
    assert_eq!(
        upgrade["range"],
        json!({"start": {"line": 0, "character": 0}, "end": {"line": 0, "character": 13}})
    );
}

#[test]
fn detached_files_are_flagged_and_still_served() {
    let dispatcher = Dispatcher::new();
    request(&dispatcher, 1, "initialize", json!({"capabilities": {}}));
    notify(&dispatcher, "initialized", json!({}));

    let orphan = tempfile::tempdir().unwrap();
    let path = orphan.path().join("orphan.smithy");
    std::fs::write(&path, "$version: \"2\"\nnamespace com.a\n@doc").unwrap();
    let uri = uri_of(&path);

    let notifications = notify(
        &dispatcher,
        "textDocument/didOpen",
        json!({"textDocument": {
            "uri": uri,
            "languageId": "smithy",
            "version": 1,
            "text": "$version: \"2\"\nnamespace com.a\n@doc",
        }}),
    );
    let diagnostics = diagnostics_for(&notifications, &uri).unwrap();
    let detached = diagnostics
        .iter()
        .find(|d| d["code"] == "detached-file")
        .expect("detached diagnostic");
    assert_eq!(detached["range"]["start"]["line"], 0);

    // completion still functions against the builtins
    let items = request(
        &dispatcher,
        2,
        "textDocument/completion",
        json!({
            "textDocument": {"uri": uri},
            "position": {"line": 2, "character": 4},
        }),
    );
    let labels: Vec<&str> = items
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|item| item["label"].as_str())
        .collect();
    assert!(labels.contains(&"documentation"), "got {labels:?}");
}

#[test]
fn incremental_change_preserves_cross_file_traits() {
    let defines = "$version: \"2\"\nnamespace com.a\nstructure S {}\n";
    let applies =
        "$version: \"2\"\nnamespace com.b\nuse com.a#S\napply S @documentation(\"x\")\n";
    let ws = Workspace::new(&[("a.smithy", defines), ("b.smithy", applies)]);
    ws.open("a.smithy", defines);

    // whitespace-only edit at the top of a.smithy
    notify(
        &ws.dispatcher,
        "textDocument/didChange",
        json!({
            "textDocument": {"uri": ws.model_uri("a.smithy"), "version": 2},
            "contentChanges": [{
                "range": {"start": {"line": 2, "character": 0}, "end": {"line": 2, "character": 0}},
                "text": "\n",
            }],
        }),
    );

    let path = ws.dir.path().join("model/a.smithy");
    let project = ws
        .dispatcher
        .state()
        .manager
        .project_for(&path.to_string_lossy())
        .unwrap();
    let snapshot = project.snapshot().unwrap();
    let shape = snapshot
        .model_result
        .model
        .get_shape(&"com.a#S".parse().unwrap())
        .unwrap();
    assert_eq!(shape.documentation(), Some("x"));
}

#[test]
fn hover_and_symbols_round_trip_over_the_wire() {
    let text = "$version: \"2\"\nnamespace com.a\n/// Doc.\nstructure Thing {\n    name: String\n}\n";
    let ws = Workspace::new(&[("a.smithy", text)]);
    ws.open("a.smithy", text);
    let uri = ws.model_uri("a.smithy");

    let hover = request(
        &ws.dispatcher,
        3,
        "textDocument/hover",
        json!({
            "textDocument": {"uri": uri},
            "position": {"line": 3, "character": 12},
        }),
    );
    assert!(hover["contents"]["value"]
        .as_str()
        .unwrap()
        .contains("structure Thing"));

    let symbols = request(
        &ws.dispatcher,
        4,
        "textDocument/documentSymbol",
        json!({"textDocument": {"uri": uri}}),
    );
    let names: Vec<&str> = symbols
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|symbol| symbol["name"].as_str())
        .collect();
    assert!(names.contains(&"Thing"));
}

#[test]
fn shutdown_then_exit_is_clean() {
    let ws = Workspace::new(&[("a.smithy", "")]);
    request(&ws.dispatcher, 9, "shutdown", Value::Null);
    let outcome = ws.dispatcher.handle(Incoming {
        id: None,
        method: Some("exit".to_string()),
        params: Value::Null,
    });
    assert_eq!(outcome.exit, Some(0));
}
