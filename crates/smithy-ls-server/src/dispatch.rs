//! The synchronous request/notification dispatcher.
//!
//! Messages are handled one at a time, in arrival order, so a request
//! always sees either the pre- or post-edit snapshot of a project and
//! never a partially applied batch. The transport layer feeds messages
//! in and writes the returned response and notifications out.

use std::collections::BTreeSet;

use lsp_types::{
    CompletionOptions, CompletionParams, DidChangeConfigurationParams,
    DidChangeTextDocumentParams, DidChangeWatchedFilesParams, DidCloseTextDocumentParams,
    DidOpenTextDocumentParams, DidSaveTextDocumentParams, DocumentSymbolParams, FileChangeType,
    FoldingRangeParams, HoverParams, HoverProviderCapability, InitializeParams, InitializeResult,
    InlayHintParams, OneOf, PublishDiagnosticsParams, ReferenceParams, RenameOptions,
    RenameParams, ServerCapabilities, ServerInfo, TextDocumentPositionParams,
    TextDocumentSyncCapability, TextDocumentSyncKind, Uri, WorkDoneProgressOptions,
};
use serde_json::Value;
use smithy_ls_handlers::references::path_to_uri;
use smithy_ls_handlers::{
    completion, diagnostics, folding, hover, inlay, references, rename, symbols, CancelToken,
    FileView, RpcError,
};
use smithy_ls_project::Project;
use tracing::{debug, info, warn};

use crate::protocol::{codes, Incoming, OutgoingNotification, Response};
use crate::state::ServerState;

/// What handling one message produced.
#[derive(Debug, Default)]
pub struct Outcome {
    pub response: Option<Response>,
    pub notifications: Vec<OutgoingNotification>,
    /// Raw server-to-client requests (capability registrations).
    pub requests: Vec<Value>,
    /// Set when the server should terminate with this exit code.
    pub exit: Option<i32>,
}

#[derive(Default)]
pub struct Dispatcher {
    state: ServerState,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ServerState {
        &self.state
    }

    /// Handle one message, synchronously.
    pub fn handle(&self, message: Incoming) -> Outcome {
        match (message.id, message.method) {
            (Some(id), Some(method)) => self.handle_request(id, &method, message.params),
            (None, Some(method)) => self.handle_notification(&method, message.params),
            // a reply to one of our own requests; nothing to do
            (Some(_), None) | (None, None) => Outcome::default(),
        }
    }

    fn handle_request(&self, id: Value, method: &str, params: Value) -> Outcome {
        let cancel = CancelToken::new();
        if self.state.take_cancelled(&id) {
            cancel.cancel();
        }

        let result = match method {
            "initialize" => self.initialize(params),
            "shutdown" => {
                self.state.request_shutdown();
                Ok(Value::Null)
            }
            "textDocument/completion" => self.completion(params, &cancel),
            "textDocument/hover" => self.hover(params, &cancel),
            "textDocument/documentSymbol" => self.document_symbols(params, &cancel),
            "textDocument/foldingRange" => self.folding_range(params, &cancel),
            "textDocument/inlayHint" => self.inlay_hint(params, &cancel),
            "textDocument/references" => self.references(params, &cancel),
            "textDocument/prepareRename" => self.prepare_rename(params),
            "textDocument/rename" => self.rename(params, &cancel),
            other => {
                debug!(method = other, "unhandled request");
                return Outcome {
                    response: Some(Response::failure(
                        id,
                        codes::METHOD_NOT_FOUND,
                        format!("unhandled method '{other}'"),
                    )),
                    ..Outcome::default()
                };
            }
        };

        let response = match result {
            Ok(result) => Response::success(id, result),
            Err(error) => Response::failure(id, error.code, error.message),
        };
        Outcome {
            response: Some(response),
            ..Outcome::default()
        }
    }

    fn handle_notification(&self, method: &str, params: Value) -> Outcome {
        match method {
            "initialized" => {
                info!("client initialized");
                let mut outcome = self.publish_managed_diagnostics();
                outcome.requests.push(watched_files_registration());
                outcome
            }
            "textDocument/didOpen" => self.did_open(params),
            "textDocument/didChange" => self.did_change(params),
            "textDocument/didSave" => self.did_save(params),
            "textDocument/didClose" => self.did_close(params),
            "workspace/didChangeWatchedFiles" => self.did_change_watched_files(params),
            "workspace/didChangeConfiguration" => {
                if let Ok(params) =
                    serde_json::from_value::<DidChangeConfigurationParams>(params)
                {
                    self.state.apply_settings(&params.settings);
                }
                self.publish_managed_diagnostics()
            }
            "$/cancelRequest" => {
                if let Some(id) = params.get("id") {
                    self.state.cancel(id);
                }
                Outcome::default()
            }
            "exit" => Outcome {
                exit: Some(if self.state.shutdown_requested() { 0 } else { 1 }),
                ..Outcome::default()
            },
            other => {
                debug!(method = other, "ignored notification");
                Outcome::default()
            }
        }
    }

    fn initialize(&self, params: Value) -> Result<Value, DispatchError> {
        let params: InitializeParams = parse(params)?;
        if let Some(options) = &params.initialization_options {
            self.state.apply_settings(options);
        }
        #[allow(deprecated)]
        let root = params
            .root_uri
            .as_ref()
            .and_then(|uri| uri_to_path(uri))
            .or_else(|| {
                params
                    .workspace_folders
                    .as_ref()
                    .and_then(|folders| folders.first())
                    .and_then(|folder| uri_to_path(&folder.uri))
            });
        if let Some(root) = root {
            let root = std::path::PathBuf::from(root);
            self.state.manager.load_root(&root);
            *self.state.root.lock() = Some(root);
        }

        let result = InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::INCREMENTAL,
                )),
                completion_provider: Some(CompletionOptions {
                    trigger_characters: Some(
                        ["@", ":", "#", ".", "$"].map(str::to_string).to_vec(),
                    ),
                    ..CompletionOptions::default()
                }),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                document_symbol_provider: Some(OneOf::Left(true)),
                folding_range_provider: Some(
                    lsp_types::FoldingRangeProviderCapability::Simple(true),
                ),
                inlay_hint_provider: Some(OneOf::Left(true)),
                references_provider: Some(OneOf::Left(true)),
                rename_provider: Some(OneOf::Right(RenameOptions {
                    prepare_provider: Some(true),
                    work_done_progress_options: WorkDoneProgressOptions::default(),
                })),
                ..ServerCapabilities::default()
            },
            server_info: Some(ServerInfo {
                name: "smithy-ls".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
            offset_encoding: None,
        };
        Ok(serde_json::to_value(result).unwrap_or(Value::Null))
    }

    fn completion(&self, params: Value, cancel: &CancelToken) -> Result<Value, DispatchError> {
        let params: CompletionParams = parse(params)?;
        let position = params.text_document_position.position;
        let items = self
            .with_file(&params.text_document_position.text_document.uri, |project, view| {
                completion::completions(project, view, position, cancel)
            })
            .unwrap_or_default();
        Ok(serde_json::to_value(items).unwrap_or(Value::Null))
    }

    fn hover(&self, params: Value, cancel: &CancelToken) -> Result<Value, DispatchError> {
        let params: HoverParams = parse(params)?;
        let position = params.text_document_position_params.position;
        let minimum = self.state.minimum_severity();
        let result = self
            .with_file(
                &params.text_document_position_params.text_document.uri,
                |project, view| hover::hover(project, view, position, minimum, cancel),
            )
            .flatten();
        Ok(serde_json::to_value(result).unwrap_or(Value::Null))
    }

    fn document_symbols(&self, params: Value, cancel: &CancelToken) -> Result<Value, DispatchError> {
        let params: DocumentSymbolParams = parse(params)?;
        let result = self
            .with_file(&params.text_document.uri, |_, view| {
                symbols::document_symbols(view, cancel)
            })
            .unwrap_or_default();
        Ok(serde_json::to_value(result).unwrap_or(Value::Null))
    }

    fn folding_range(&self, params: Value, cancel: &CancelToken) -> Result<Value, DispatchError> {
        let params: FoldingRangeParams = parse(params)?;
        let result = self
            .with_file(&params.text_document.uri, |_, view| {
                folding::folding_ranges(view, cancel)
            })
            .unwrap_or_default();
        Ok(serde_json::to_value(result).unwrap_or(Value::Null))
    }

    fn inlay_hint(&self, params: Value, cancel: &CancelToken) -> Result<Value, DispatchError> {
        let params: InlayHintParams = parse(params)?;
        let range = params.range;
        let result = self
            .with_file(&params.text_document.uri, |_, view| {
                inlay::inlay_hints(view, range, cancel)
            })
            .unwrap_or_default();
        Ok(serde_json::to_value(result).unwrap_or(Value::Null))
    }

    fn references(&self, params: Value, cancel: &CancelToken) -> Result<Value, DispatchError> {
        let params: ReferenceParams = parse(params)?;
        let position = params.text_document_position.position;
        let result = self
            .with_file(
                &params.text_document_position.text_document.uri,
                |project, view| {
                    references::find_references_request(project, view, position, cancel)
                },
            )
            .transpose()?
            .unwrap_or_default();
        Ok(serde_json::to_value(result).unwrap_or(Value::Null))
    }

    fn prepare_rename(&self, params: Value) -> Result<Value, DispatchError> {
        let params: TextDocumentPositionParams = parse(params)?;
        let position = params.position;
        let result = self
            .with_file(&params.text_document.uri, |project, view| {
                rename::prepare_rename(project, view, position)
            })
            .flatten();
        Ok(serde_json::to_value(result).unwrap_or(Value::Null))
    }

    fn rename(&self, params: Value, cancel: &CancelToken) -> Result<Value, DispatchError> {
        let params: RenameParams = parse(params)?;
        let position = params.text_document_position.position;
        let new_name = params.new_name;
        let result = self
            .with_file(
                &params.text_document_position.text_document.uri,
                |project, view| rename::rename(project, view, position, &new_name, cancel),
            )
            .transpose()?;
        Ok(serde_json::to_value(result).unwrap_or(Value::Null))
    }

    fn did_open(&self, params: Value) -> Outcome {
        let Ok(params) = serde_json::from_value::<DidOpenTextDocumentParams>(params) else {
            return Outcome::default();
        };
        let Some(path) = uri_to_path(&params.text_document.uri) else {
            return Outcome::default();
        };
        self.state
            .manager
            .open_document(&path, &params.text_document.text);
        self.publish_managed_diagnostics()
    }

    fn did_change(&self, params: Value) -> Outcome {
        let Ok(params) = serde_json::from_value::<DidChangeTextDocumentParams>(params) else {
            return Outcome::default();
        };
        let Some(path) = uri_to_path(&params.text_document.uri) else {
            return Outcome::default();
        };
        for change in &params.content_changes {
            self.state
                .manager
                .change_document(&path, change.range, &change.text);
        }
        self.reload_and_publish(&path)
    }

    fn did_save(&self, params: Value) -> Outcome {
        let Ok(params) = serde_json::from_value::<DidSaveTextDocumentParams>(params) else {
            return Outcome::default();
        };
        let Some(path) = uri_to_path(&params.text_document.uri) else {
            return Outcome::default();
        };
        self.reload_and_publish(&path)
    }

    fn did_close(&self, params: Value) -> Outcome {
        let Ok(params) = serde_json::from_value::<DidCloseTextDocumentParams>(params) else {
            return Outcome::default();
        };
        let Some(path) = uri_to_path(&params.text_document.uri) else {
            return Outcome::default();
        };
        self.state.manager.close_document(&path);
        // clear diagnostics for the closed file
        let Some(uri) = path_to_uri(&path) else {
            return Outcome::default();
        };
        Outcome {
            notifications: vec![publish(uri, Vec::new())],
            ..Outcome::default()
        }
    }

    fn did_change_watched_files(&self, params: Value) -> Outcome {
        let Ok(params) = serde_json::from_value::<DidChangeWatchedFilesParams>(params) else {
            return Outcome::default();
        };
        let mut added = BTreeSet::new();
        let mut changed = BTreeSet::new();
        let mut removed = BTreeSet::new();
        for event in &params.changes {
            let Some(path) = uri_to_path(&event.uri) else {
                continue;
            };
            if event.typ == FileChangeType::CREATED {
                added.insert(path);
            } else if event.typ == FileChangeType::CHANGED {
                changed.insert(path);
            } else if event.typ == FileChangeType::DELETED {
                removed.insert(path);
            }
        }
        self.state.manager.on_watched_files(added, changed, removed);
        self.publish_managed_diagnostics()
    }

    /// Feed a file's new text into its project and republish
    /// diagnostics for every open file of that project.
    fn reload_and_publish(&self, path: &str) -> Outcome {
        if let Some(project) = self.state.manager.project_for(path) {
            let changed: BTreeSet<String> = [path.to_string()].into();
            project.update_files(
                &BTreeSet::new(),
                &BTreeSet::new(),
                &changed,
                true,
                &self.state.manager,
            );
        } else {
            warn!(path, "change for an untracked file");
        }
        self.publish_managed_diagnostics()
    }

    /// Diagnostics for every open document, each as its own publish
    /// notification. Publication is monotonic per file within its
    /// project: recomputed from the latest snapshot every time.
    fn publish_managed_diagnostics(&self) -> Outcome {
        let cancel = CancelToken::new();
        let minimum = self.state.minimum_severity();
        let mut notifications = Vec::new();
        for path in self.state.manager.managed_paths() {
            let Some(project) = self.state.manager.project_for(&path) else {
                continue;
            };
            let Some(uri) = path_to_uri(&path) else {
                continue;
            };
            let diagnostics =
                diagnostics::diagnostics_for_path(&project, &path, minimum, &cancel);
            notifications.push(publish(uri, diagnostics));
        }
        Outcome {
            notifications,
            ..Outcome::default()
        }
    }

    fn with_file<T>(
        &self,
        uri: &Uri,
        run: impl FnOnce(&Project, &FileView<'_>) -> T,
    ) -> Option<T> {
        let path = uri_to_path(uri)?;
        let project = self.state.manager.project_for(&path)?;
        let file = project.smithy_file(&path)?;
        let document = file.document();
        let parsed = file.parsed();
        let view = FileView::new(&path, &document, &parsed);
        Some(run(&project, &view))
    }
}

/// A request-level error carried back to the wire.
#[derive(Debug)]
pub struct DispatchError {
    pub code: i32,
    pub message: String,
}

impl From<RpcError> for DispatchError {
    fn from(error: RpcError) -> Self {
        Self {
            code: error.code(),
            message: error.to_string(),
        }
    }
}

fn parse<T: serde::de::DeserializeOwned>(params: Value) -> Result<T, DispatchError> {
    serde_json::from_value(params).map_err(|error| DispatchError {
        code: codes::INVALID_PARAMS,
        message: error.to_string(),
    })
}

/// The `client/registerCapability` request watching every build-file
/// name and all model files.
fn watched_files_registration() -> Value {
    let watchers: Vec<Value> = [
        "**/*.smithy",
        "**/smithy-build.json",
        "**/.smithy-project.json",
        "**/.smithy.json",
        "**/build/smithy-dependencies.json",
    ]
    .iter()
    .map(|glob| serde_json::json!({"globPattern": glob}))
    .collect();
    serde_json::json!({
        "jsonrpc": "2.0",
        "id": "smithy-ls-watched-files",
        "method": "client/registerCapability",
        "params": {
            "registrations": [{
                "id": "smithy-ls-watched-files",
                "method": "workspace/didChangeWatchedFiles",
                "registerOptions": {"watchers": watchers},
            }],
        },
    })
}

fn publish(uri: Uri, diagnostics: Vec<lsp_types::Diagnostic>) -> OutgoingNotification {
    OutgoingNotification::new(
        "textDocument/publishDiagnostics",
        serde_json::to_value(PublishDiagnosticsParams {
            uri,
            diagnostics,
            version: None,
        })
        .unwrap_or(Value::Null),
    )
}

/// Convert a `file://` URI into a filesystem path, decoding percent
/// escapes.
pub fn uri_to_path(uri: &Uri) -> Option<String> {
    let text = uri.to_string();
    let rest = text.strip_prefix("file://")?;
    // strip an authority component when present
    let path = match rest.find('/') {
        Some(0) => rest,
        Some(at) => &rest[at..],
        None => return None,
    };
    Some(percent_decode(path))
}

fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut index = 0;
    while index < bytes.len() {
        if bytes[index] == b'%' && index + 2 < bytes.len() {
            let hex = &input[index + 1..index + 3];
            if let Ok(byte) = u8::from_str_radix(hex, 16) {
                out.push(byte);
                index += 3;
                continue;
            }
        }
        out.push(bytes[index]);
        index += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_file_uris() {
        let uri: Uri = "file:///tmp/with%20space/a.smithy".parse().unwrap();
        assert_eq!(
            uri_to_path(&uri).as_deref(),
            Some("/tmp/with space/a.smithy")
        );
    }

    #[test]
    fn json_is_ignored_for_unknown_notifications() {
        let dispatcher = Dispatcher::new();
        let outcome = dispatcher.handle(Incoming {
            id: None,
            method: Some("$/unknown".to_string()),
            params: Value::Null,
        });
        assert!(outcome.response.is_none());
        assert!(outcome.notifications.is_empty());
    }

    #[test]
    fn unknown_requests_fail_cleanly() {
        let dispatcher = Dispatcher::new();
        let outcome = dispatcher.handle(Incoming {
            id: Some(json!(1)),
            method: Some("textDocument/unknown".to_string()),
            params: Value::Null,
        });
        let response = outcome.response.unwrap();
        assert_eq!(response.error.unwrap().code, codes::METHOD_NOT_FOUND);
    }

    #[test]
    fn exit_code_depends_on_shutdown() {
        let dispatcher = Dispatcher::new();
        let outcome = dispatcher.handle(Incoming {
            id: None,
            method: Some("exit".to_string()),
            params: Value::Null,
        });
        assert_eq!(outcome.exit, Some(1));

        let dispatcher = Dispatcher::new();
        dispatcher.handle(Incoming {
            id: Some(json!(1)),
            method: Some("shutdown".to_string()),
            params: Value::Null,
        });
        let outcome = dispatcher.handle(Incoming {
            id: None,
            method: Some("exit".to_string()),
            params: Value::Null,
        });
        assert_eq!(outcome.exit, Some(0));
    }
}
