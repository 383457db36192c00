//! The proxy loop.
//!
//! Editor messages are read in order on one task. Regenerations and requests
//! waiting for a regeneration run on their own tasks. gopls output is read on
//! a task per connection.
//!
//! Every message to gopls that depends on a snapshot is sent while holding
//! the dispatch gate, and snapshots are published under the same gate. gopls
//! therefore always sees a request after the document version it was mapped
//! against, and before any later one.

use crate::codec::LspCodec;
use crate::connector::{ServerConnection, ServerConnector};
use crate::convert::diagnostic_to_lsp;
use crate::message::{self, Kind, INTERNAL_ERROR, REQUEST_FAILED};
use crate::remap;
use crate::session::{DocumentSession, SessionState, Snapshot};
use crate::uri::{self, GENERATED_EXTENSION};
use crate::{ProxyConfig, ProxyError};
use camino::Utf8PathBuf;
use futures::{SinkExt, StreamExt};
use lsp_types::notification::{
    DidChangeTextDocument, DidCloseTextDocument, DidOpenTextDocument, DidSaveTextDocument, Exit,
    Initialized, Notification, PublishDiagnostics, ShowMessage,
};
use lsp_types::request::{Completion, GotoDefinition, HoverRequest, Initialize, References, Rename, Request};
use lsp_types::{MessageType, ShowMessageParams, TextDocumentContentChangeEvent};
use rustc_hash::FxHashMap;
use serde_json::{json, Value};
use source_map::LineIndex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use sugo_bridge::Transpiler;
use sugo_diagnostics::Diagnostic;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::process::Child;
use tokio::sync::{mpsc, oneshot};
use tokio_util::codec::{FramedRead, FramedWrite};

/// Requests whose document position and response locations are mapped.
const MAPPED_REQUESTS: &[&str] = &[
    HoverRequest::METHOD,
    Completion::METHOD,
    GotoDefinition::METHOD,
    References::METHOD,
    Rename::METHOD,
];

/// How long gopls may take to exit after its input closes.
const SERVER_EXIT_GRACE: Duration = Duration::from_secs(2);

/// Serves `.sugo` documents to an editor through gopls.
pub struct Proxy {
    connector: Arc<dyn ServerConnector>,
    config: ProxyConfig,
    transpiler: Transpiler,
}

impl Proxy {
    /// Creates a proxy that reaches gopls through `connector`.
    pub fn new(connector: impl ServerConnector + 'static, config: ProxyConfig) -> Self {
        Self {
            connector: Arc::new(connector),
            config,
            transpiler: Transpiler::default(),
        }
    }

    /// Serves one editor connection until `exit` or the end of its input.
    pub async fn serve<R, W>(self, input: R, output: W) -> Result<(), ProxyError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let (client_tx, client_rx) = mpsc::unbounded_channel();
        let writer = tokio::spawn(forward(FramedWrite::new(output, LspCodec::new()), client_rx));
        let shared = Arc::new(Shared::new(self, client_tx));

        let mut input = FramedRead::new(input, LspCodec::new());
        let result = loop {
            match input.next().await {
                Some(Ok(message)) => {
                    if shared.handle_client(message).await == Flow::Exit {
                        tracing::info!("exit received");
                        break Ok(());
                    }
                }
                Some(Err(err)) => break Err(ProxyError::Transport(err)),
                None => {
                    tracing::info!("editor closed the connection");
                    break Ok(());
                }
            }
        };

        shared.shutdown();
        if let Err(err) = writer.await {
            tracing::warn!("editor writer task failed: {err}");
        }
        result
    }
}

impl std::fmt::Debug for Proxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Proxy").field("config", &self.config).finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

/// A request forwarded to gopls and not yet answered.
enum PendingRequest {
    /// An editor request; mapped requests carry the snapshot they were sent against.
    Client {
        id: Value,
        method: String,
        target: Option<Target>,
    },
    /// A request the proxy issued itself.
    Internal(oneshot::Sender<Value>),
}

struct Target {
    session: Arc<DocumentSession>,
    snapshot: Arc<Snapshot>,
}

struct ServerLink {
    tx: mpsc::UnboundedSender<Value>,
    epoch: u64,
}

struct Shared {
    connector: Arc<dyn ServerConnector>,
    transpiler: Transpiler,
    config: RwLock<ProxyConfig>,
    client: Mutex<Option<mpsc::UnboundedSender<Value>>>,
    server: Mutex<Option<ServerLink>>,
    connecting: tokio::sync::Mutex<()>,
    epoch: AtomicU64,
    replays: AtomicU64,
    initialize: Mutex<Option<Value>>,
    sessions: RwLock<FxHashMap<String, Arc<DocumentSession>>>,
    pending: Mutex<FxHashMap<String, PendingRequest>>,
    dispatch: Mutex<()>,
}

impl Shared {
    fn new(proxy: Proxy, client: mpsc::UnboundedSender<Value>) -> Self {
        Self {
            connector: proxy.connector,
            transpiler: proxy.transpiler,
            config: RwLock::new(proxy.config),
            client: Mutex::new(Some(client)),
            server: Mutex::new(None),
            connecting: tokio::sync::Mutex::new(()),
            epoch: AtomicU64::new(0),
            replays: AtomicU64::new(0),
            initialize: Mutex::new(None),
            sessions: RwLock::new(FxHashMap::default()),
            pending: Mutex::new(FxHashMap::default()),
            dispatch: Mutex::new(()),
        }
    }

    // ---- editor → gopls -------------------------------------------------

    async fn handle_client(self: &Arc<Self>, message: Value) -> Flow {
        match message::classify(&message) {
            Kind::Request { id, method } => self.client_request(id, &method, message).await,
            Kind::Notification { method } => return self.client_notification(&method, message).await,
            Kind::Response { .. } => {
                self.send_server(message);
            }
            Kind::Invalid => tracing::warn!("dropping malformed message from the editor"),
        }
        Flow::Continue
    }

    async fn client_request(self: &Arc<Self>, id: Value, method: &str, message: Value) {
        if method == Initialize::METHOD {
            let params = message.get("params").cloned().unwrap_or(Value::Null);
            if let Some(options) = params.get("initializationOptions").filter(|o| !o.is_null()) {
                write(&self.config).merge_initialization_options(options);
            }
            *lock(&self.initialize) = Some(params);
            if let Err(err) = self.connect().await {
                tracing::error!("{err}");
                self.send_client(message::error_response(&id, INTERNAL_ERROR, &err.to_string()));
                return;
            }
        } else if MAPPED_REQUESTS.contains(&method) {
            if let Some(session) = message::document_uri(&message).and_then(|uri| self.session(uri)) {
                self.dispatch_mapped(id, method.to_string(), session, message);
                return;
            }
        }
        self.forward_request(id, method, message);
    }

    fn forward_request(&self, id: Value, method: &str, message: Value) {
        let key = message::id_key(&id);
        lock(&self.pending).insert(
            key.clone(),
            PendingRequest::Client {
                id: id.clone(),
                method: method.to_string(),
                target: None,
            },
        );
        if !self.send_server(message) {
            lock(&self.pending).remove(&key);
            self.send_client(message::error_response(&id, REQUEST_FAILED, "gopls is not running"));
        }
    }

    /// Sends a mapped request now if its document is synced, otherwise once
    /// the pending regeneration finishes.
    fn dispatch_mapped(self: &Arc<Self>, id: Value, method: String, session: Arc<DocumentSession>, message: Value) {
        if self.try_dispatch(&id, &method, &session, &message) {
            return;
        }
        tracing::debug!(uri = session.uri(), %method, "request waits for regeneration");
        let shared = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                if session.ready().await.is_none() {
                    shared.send_client(message::error_response(&id, REQUEST_FAILED, "document closed"));
                    return;
                }
                if shared.try_dispatch(&id, &method, &session, &message) {
                    return;
                }
            }
        });
    }

    /// Returns false if the document is still regenerating.
    fn try_dispatch(&self, id: &Value, method: &str, session: &Arc<DocumentSession>, message: &Value) -> bool {
        let _gate = lock(&self.dispatch);
        let view = session.view();
        match (view.state, view.snapshot) {
            (state, _) if state.is_pending() => false,
            (SessionState::Synced, Some(snapshot)) => {
                let mut request = message.clone();
                remap::request_to_generated(&mut request, &snapshot, session.generated_uri());
                let key = message::id_key(id);
                lock(&self.pending).insert(
                    key.clone(),
                    PendingRequest::Client {
                        id: id.clone(),
                        method: method.to_string(),
                        target: Some(Target {
                            session: Arc::clone(session),
                            snapshot,
                        }),
                    },
                );
                if !self.send_server(request) {
                    lock(&self.pending).remove(&key);
                    self.send_client(message::error_response(id, REQUEST_FAILED, "gopls is not running"));
                }
                true
            }
            (state, _) => {
                tracing::debug!(uri = session.uri(), method, ?state, "refusing request");
                self.send_client(message::error_response(
                    id,
                    REQUEST_FAILED,
                    "the document does not transpile; fix the reported errors first",
                ));
                true
            }
        }
    }

    async fn client_notification(self: &Arc<Self>, method: &str, message: Value) -> Flow {
        if method == DidOpenTextDocument::METHOD {
            self.did_open(message).await;
        } else if method == DidChangeTextDocument::METHOD {
            self.did_change(message);
        } else if method == DidSaveTextDocument::METHOD {
            self.did_save(message);
        } else if method == DidCloseTextDocument::METHOD {
            self.did_close(message);
        } else if method == Exit::METHOD {
            self.send_server(message);
            return Flow::Exit;
        } else {
            self.send_server(message);
        }
        Flow::Continue
    }

    async fn did_open(self: &Arc<Self>, message: Value) {
        if let Err(err) = self.reconnect().await {
            tracing::error!("failed to restart gopls: {err}");
        }

        let Some(uri) = message::document_uri(&message).map(str::to_string) else {
            self.send_server(message);
            return;
        };
        let Some(generated) = uri::generated_uri(&uri) else {
            self.send_server(message);
            return;
        };
        let text = message
            .pointer("/params/textDocument/text")
            .and_then(Value::as_str)
            .unwrap_or_default();

        tracing::debug!(%uri, "opening document");
        let session = Arc::new(DocumentSession::new(uri.clone(), generated, text));
        let previous = write(&self.sessions).insert(uri, Arc::clone(&session));
        if let Some(previous) = previous {
            self.release(&previous);
        }
        let edit = session.begin_regeneration();
        self.spawn_regeneration(session, edit);
    }

    fn did_change(self: &Arc<Self>, message: Value) {
        let Some(session) = message::document_uri(&message).and_then(|uri| self.session(uri)) else {
            self.send_server(message);
            return;
        };
        let changes: Vec<TextDocumentContentChangeEvent> = message
            .pointer("/params/contentChanges")
            .cloned()
            .and_then(|changes| serde_json::from_value(changes).ok())
            .unwrap_or_default();

        let edit = {
            let _gate = lock(&self.dispatch);
            session.begin_edit(&changes)
        };
        tracing::trace!(uri = session.uri(), edit, "document changed");
        self.spawn_regeneration(session, edit);
    }

    fn did_save(self: &Arc<Self>, message: Value) {
        let Some(session) = message::document_uri(&message).and_then(|uri| self.session(uri)) else {
            self.send_server(message);
            return;
        };
        if session.opened_on_server() {
            self.send_server(message::notification(
                DidSaveTextDocument::METHOD,
                json!({ "textDocument": { "uri": session.generated_uri() } }),
            ));
        }
        if !read(&self.config).auto_regenerate_on_save {
            return;
        }
        tokio::spawn(async move {
            let Some(view) = session.ready().await else {
                return;
            };
            let (SessionState::Synced, Some(snapshot)) = (view.state, view.snapshot) else {
                tracing::debug!(uri = session.uri(), "not writing artifacts for a document with errors");
                return;
            };
            match write_artifacts(session.uri(), &snapshot).await {
                Ok(Some(path)) => tracing::info!(%path, "wrote generated Go"),
                Ok(None) => tracing::debug!(uri = session.uri(), "document is not a file; nothing written"),
                Err(err) => tracing::error!("{err}"),
            }
        });
    }

    fn did_close(&self, message: Value) {
        let Some(uri) = message::document_uri(&message) else {
            self.send_server(message);
            return;
        };
        let Some(session) = write(&self.sessions).remove(uri) else {
            self.send_server(message);
            return;
        };
        tracing::debug!(%uri, "closing document");
        self.release(&session);
        self.send_client(message::notification(
            PublishDiagnostics::METHOD,
            json!({ "uri": session.uri(), "diagnostics": [] }),
        ));
    }

    /// Closes a session and tells gopls if it had the document open.
    fn release(&self, session: &DocumentSession) {
        {
            let _gate = lock(&self.dispatch);
            session.close();
        }
        if session.opened_on_server() {
            session.set_opened_on_server(false);
            self.send_server(message::notification(
                DidCloseTextDocument::METHOD,
                json!({ "textDocument": { "uri": session.generated_uri() } }),
            ));
        }
    }

    // ---- regeneration ---------------------------------------------------

    fn spawn_regeneration(self: &Arc<Self>, session: Arc<DocumentSession>, edit: u64) {
        tokio::spawn(Arc::clone(self).regenerate(session, edit));
    }

    /// Transpiles the session's text and publishes the result, unless a newer
    /// edit arrives first.
    async fn regenerate(self: Arc<Self>, session: Arc<DocumentSession>, edit: u64) {
        let _running = session.lock_regeneration().await;
        if !session.is_current(edit) {
            tracing::trace!(uri = session.uri(), edit, "regeneration superseded before it started");
            return;
        }

        let text = session.text();
        let name = source_name(session.uri()).to_string();
        let shared = Arc::clone(&self);
        let joined = tokio::task::spawn_blocking(move || {
            let result = shared.transpiler.transpile(&text, &name);
            (text, name, result)
        })
        .await;
        let (text, name, result) = match joined {
            Ok(joined) => joined,
            Err(err) => {
                tracing::error!(uri = session.uri(), "regeneration task failed: {err}");
                return;
            }
        };

        let original = Arc::new(LineIndex::new(&text));
        let local = {
            let _gate = lock(&self.dispatch);
            if !session.is_current(edit) {
                tracing::trace!(uri = session.uri(), edit, "regeneration superseded; result discarded");
                return;
            }
            match result {
                Ok(transpiled) => {
                    let generation = session.next_generation();
                    let snapshot = Arc::new(Snapshot::new(generation, Arc::clone(&original), transpiled));
                    self.sync_server(&session, &snapshot);
                    session.publish(snapshot);
                    tracing::debug!(uri = session.uri(), generation, "regenerated");
                    Vec::new()
                }
                Err(err) => {
                    session.mark_stale();
                    tracing::debug!(uri = session.uri(), "regeneration failed: {err}");
                    Diagnostic::from_transpile_error(&name, &original, &err)
                }
            }
        };
        self.publish_local(&session, &original, &local);
    }

    /// Sends the snapshot's text to gopls as an open or a full change.
    fn sync_server(&self, session: &DocumentSession, snapshot: &Snapshot) {
        let notification = if session.opened_on_server() {
            message::notification(
                DidChangeTextDocument::METHOD,
                json!({
                    "textDocument": { "uri": session.generated_uri(), "version": snapshot.generation },
                    "contentChanges": [{ "text": snapshot.generated }]
                }),
            )
        } else {
            message::notification(
                DidOpenTextDocument::METHOD,
                json!({
                    "textDocument": {
                        "uri": session.generated_uri(),
                        "languageId": "go",
                        "version": snapshot.generation,
                        "text": snapshot.generated
                    }
                }),
            )
        };
        session.set_opened_on_server(self.send_server(notification));
    }

    /// Publishes transpiler diagnostics, or clears earlier ones.
    fn publish_local(&self, session: &DocumentSession, original: &LineIndex, diagnostics: &[Diagnostic]) {
        let showing = !diagnostics.is_empty();
        if !session.swap_local_diagnostics(showing) && !showing {
            return;
        }
        let diagnostics: Vec<_> = diagnostics
            .iter()
            .map(|diag| diagnostic_to_lsp(original, diag))
            .collect();
        self.send_client(message::notification(
            PublishDiagnostics::METHOD,
            json!({ "uri": session.uri(), "diagnostics": diagnostics }),
        ));
    }

    // ---- gopls → editor -------------------------------------------------

    fn handle_server(&self, message: Value) {
        match message::classify(&message) {
            Kind::Response { id } => self.server_response(&id, message),
            Kind::Notification { method } if method == PublishDiagnostics::METHOD => {
                self.server_diagnostics(message)
            }
            Kind::Invalid => tracing::warn!("dropping malformed message from gopls"),
            Kind::Request { .. } | Kind::Notification { .. } => self.send_client(message),
        }
    }

    fn server_response(&self, id: &Value, mut message: Value) {
        let pending = lock(&self.pending).remove(&message::id_key(id));
        match pending {
            Some(PendingRequest::Internal(reply)) => {
                if reply.send(message).is_err() {
                    tracing::debug!(%id, "internal request was abandoned");
                }
            }
            Some(PendingRequest::Client {
                method,
                target: Some(target),
                ..
            }) => {
                if let Some(result) = message.get_mut("result") {
                    let resolve = |uri: &str| self.resolve_generated(uri, Some(&target));
                    remap::to_original(result, Some(&target.snapshot), &resolve);
                }
                tracing::trace!(%method, generation = target.snapshot.generation, "mapped response");
                self.send_client(message);
            }
            Some(PendingRequest::Client { .. }) | None => self.send_client(message),
        }
    }

    fn server_diagnostics(&self, mut message: Value) {
        let Some(session) = message
            .pointer("/params/uri")
            .and_then(Value::as_str)
            .and_then(|uri| self.session_by_generated(uri))
        else {
            self.send_client(message);
            return;
        };

        // Publication happens under the gate, after the document was sent.
        let view = {
            let _gate = lock(&self.dispatch);
            session.view()
        };
        let Some(snapshot) = view.snapshot.filter(|_| {
            !matches!(view.state, SessionState::Stale | SessionState::Closed)
        }) else {
            tracing::trace!(uri = session.uri(), "dropping gopls diagnostics for a stale document");
            return;
        };
        let version = message.pointer("/params/version").and_then(Value::as_u64);
        if version.is_some_and(|version| version != snapshot.generation) {
            tracing::trace!(uri = session.uri(), ?version, "dropping diagnostics for a superseded generation");
            return;
        }

        if let Some(params) = message.get_mut("params").and_then(Value::as_object_mut) {
            params.insert("uri".to_string(), Value::String(session.uri().to_string()));
            params.remove("version");
            if let Some(diagnostics) = params.get_mut("diagnostics") {
                let resolve = |uri: &str| self.resolve_generated(uri, None);
                remap::to_original(diagnostics, Some(&snapshot), &resolve);
            }
        }
        session.swap_local_diagnostics(false);
        self.send_client(message);
    }

    /// Finds the original document behind a generated URI.
    ///
    /// The requesting document resolves to the snapshot its request was sent
    /// against; any other document to its latest snapshot.
    fn resolve_generated(&self, uri: &str, target: Option<&Target>) -> Option<(String, Arc<Snapshot>)> {
        if let Some(target) = target.filter(|t| t.session.generated_uri() == uri) {
            return Some((target.session.uri().to_string(), Arc::clone(&target.snapshot)));
        }
        let session = self.session_by_generated(uri)?;
        Some((session.uri().to_string(), session.snapshot()?))
    }

    /// Marks every document stale after gopls goes away.
    fn server_exited(&self, epoch: u64) {
        {
            let mut server = lock(&self.server);
            if server.as_ref().map(|link| link.epoch) != Some(epoch) {
                return;
            }
            *server = None;
        }
        tracing::warn!("gopls exited");

        {
            let _gate = lock(&self.dispatch);
            for session in read(&self.sessions).values() {
                session.set_opened_on_server(false);
                session.mark_stale();
            }
        }

        let pending: Vec<PendingRequest> = lock(&self.pending).drain().map(|(_, request)| request).collect();
        for request in pending {
            if let PendingRequest::Client { id, .. } = request {
                self.send_client(message::error_response(&id, REQUEST_FAILED, "gopls exited"));
            }
        }

        let banner = ShowMessageParams {
            typ: MessageType::ERROR,
            message: "gopls exited. It will be restarted when a file is opened.".to_string(),
        };
        match serde_json::to_value(banner) {
            Ok(params) => self.send_client(message::notification(ShowMessage::METHOD, params)),
            Err(err) => tracing::error!("failed to encode banner: {err}"),
        }
    }

    // ---- connection management ----------------------------------------

    /// Connects to gopls unless a connection is live. Returns true for a new
    /// connection.
    async fn connect(self: &Arc<Self>) -> Result<bool, ProxyError> {
        let _connecting = self.connecting.lock().await;
        if lock(&self.server).is_some() {
            return Ok(false);
        }

        let ServerConnection { reader, writer, child } = self.connector.connect().await?;
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        let (tx, rx) = mpsc::unbounded_channel();
        *lock(&self.server) = Some(ServerLink { tx, epoch });

        tokio::spawn(write_server(FramedWrite::new(writer, LspCodec::new()), rx, child));
        let shared = Arc::clone(self);
        tokio::spawn(async move {
            let mut stream = FramedRead::new(reader, LspCodec::new());
            while let Some(message) = stream.next().await {
                match message {
                    Ok(message) => shared.handle_server(message),
                    Err(err) => {
                        tracing::warn!("{}", ProxyError::Transport(err));
                        break;
                    }
                }
            }
            shared.server_exited(epoch);
        });

        tracing::debug!(epoch, "connected to gopls");
        Ok(true)
    }

    /// Restarts gopls after it exited: replays `initialize`, then reopens
    /// every session.
    async fn reconnect(self: &Arc<Self>) -> Result<(), ProxyError> {
        let Some(params) = lock(&self.initialize).clone() else {
            return Ok(());
        };
        if !self.connect().await? {
            return Ok(());
        }
        tracing::info!("gopls restarted; replaying initialize");

        let id = json!(format!("sugo-replay-{}", self.replays.fetch_add(1, Ordering::SeqCst) + 1));
        let (reply_tx, reply_rx) = oneshot::channel();
        lock(&self.pending).insert(message::id_key(&id), PendingRequest::Internal(reply_tx));
        self.send_server(message::request(id, Initialize::METHOD, params));
        let reply = reply_rx.await.map_err(|_| ProxyError::ServerExited)?;
        if let Some(error) = reply.get("error") {
            tracing::warn!("gopls rejected the replayed initialize: {error}");
        }
        self.send_server(message::notification(Initialized::METHOD, json!({})));

        let sessions: Vec<_> = read(&self.sessions).values().cloned().collect();
        for session in sessions {
            let edit = {
                let _gate = lock(&self.dispatch);
                session.begin_regeneration()
            };
            self.spawn_regeneration(session, edit);
        }
        Ok(())
    }

    fn shutdown(&self) {
        lock(&self.server).take();
        lock(&self.client).take();
    }

    // ---- plumbing -------------------------------------------------------

    fn session(&self, uri: &str) -> Option<Arc<DocumentSession>> {
        read(&self.sessions).get(uri).cloned()
    }

    fn session_by_generated(&self, uri: &str) -> Option<Arc<DocumentSession>> {
        read(&self.sessions)
            .values()
            .find(|session| session.generated_uri() == uri)
            .cloned()
    }

    fn send_server(&self, message: Value) -> bool {
        match lock(&self.server).as_ref() {
            Some(link) => link.tx.send(message).is_ok(),
            None => false,
        }
    }

    fn send_client(&self, message: Value) {
        if let Some(tx) = lock(&self.client).as_ref() {
            if tx.send(message).is_err() {
                tracing::debug!("editor connection closed; message dropped");
            }
        }
    }
}

/// Writes the generated file and its source map next to the source.
async fn write_artifacts(uri: &str, snapshot: &Snapshot) -> Result<Option<Utf8PathBuf>, ProxyError> {
    let Some(source) = uri::uri_to_path(uri) else {
        return Ok(None);
    };
    let go_path = source.with_extension(GENERATED_EXTENSION);
    let map_path = Utf8PathBuf::from(format!("{go_path}.map"));
    let file_name = go_path.file_name().unwrap_or_default().to_string();
    let map = snapshot
        .source_map
        .to_json(file_name, Some(snapshot.original.text()))
        .to_json_string();

    tokio::fs::write(&go_path, &snapshot.generated)
        .await
        .map_err(|source| ProxyError::WriteFailed {
            path: go_path.clone(),
            source,
        })?;
    tokio::fs::write(&map_path, map)
        .await
        .map_err(|source| ProxyError::WriteFailed { path: map_path, source })?;
    Ok(Some(go_path))
}

/// The file name used as the source map's source.
fn source_name(uri: &str) -> &str {
    uri.rsplit('/').next().unwrap_or(uri)
}

async fn forward<W>(mut sink: FramedWrite<W, LspCodec>, mut rx: mpsc::UnboundedReceiver<Value>)
where
    W: AsyncWrite + Unpin,
{
    while let Some(message) = rx.recv().await {
        if let Err(err) = sink.send(message).await {
            tracing::warn!("failed to write message: {err}");
            break;
        }
    }
}

async fn write_server<W>(sink: FramedWrite<W, LspCodec>, rx: mpsc::UnboundedReceiver<Value>, child: Option<Child>)
where
    W: AsyncWrite + Unpin,
{
    forward(sink, rx).await;
    let Some(mut child) = child else {
        return;
    };
    match tokio::time::timeout(SERVER_EXIT_GRACE, child.wait()).await {
        Ok(Ok(status)) => tracing::debug!(%status, "gopls stopped"),
        Ok(Err(err)) => tracing::warn!("failed to wait for gopls: {err}"),
        Err(_) => {
            tracing::warn!("gopls did not exit; killing it");
            if let Err(err) = child.kill().await {
                tracing::warn!("failed to kill gopls: {err}");
            }
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
