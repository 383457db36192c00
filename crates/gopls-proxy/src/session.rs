//! Per-document sessions.
//!
//! A session owns the editor's text for one `.sugo` document and publishes
//! immutable [`Snapshot`]s of its transpilation. State and snapshot are
//! published together through a `watch` channel, so a reader always sees a
//! consistent pair without taking a lock.

use lsp_types::TextDocumentContentChangeEvent;
use source_map::{LineIndex, Position, PositionTranslator, SourceMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use sugo_bridge::Transpiled;
use tokio::sync::{watch, MutexGuard};

/// Lifecycle of a document session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// First transpilation is running.
    Opening,
    /// gopls has the current generation; requests are proxied.
    Synced,
    /// An edit arrived; new requests wait for the next generation.
    Regenerating,
    /// The last transpilation failed, or gopls went away.
    Stale,
    /// The editor closed the document.
    Closed,
}

impl SessionState {
    /// True while a regeneration is pending.
    pub fn is_pending(self) -> bool {
        matches!(self, Self::Opening | Self::Regenerating)
    }
}

/// One immutable transpilation of a document.
#[derive(Debug)]
pub struct Snapshot {
    /// Monotonic generation, sent to gopls as the document version.
    pub generation: u64,
    /// The generated Go.
    pub generated: String,
    /// Line index over the original text.
    pub original: Arc<LineIndex>,
    /// Line index over the generated text.
    pub generated_index: LineIndex,
    /// Source map from generated to original.
    pub source_map: Arc<SourceMap>,
    translator: PositionTranslator,
}

impl Snapshot {
    /// Builds a snapshot from a successful transpilation.
    pub fn new(generation: u64, original: Arc<LineIndex>, transpiled: Transpiled) -> Self {
        let translator = transpiled.translator();
        Self {
            generation,
            generated_index: LineIndex::new(&transpiled.generated),
            generated: transpiled.generated,
            original,
            source_map: transpiled.source_map,
            translator,
        }
    }

    /// Returns the translator over this snapshot's map.
    pub fn translator(&self) -> &PositionTranslator {
        &self.translator
    }

    /// Maps an editor position into the generated document.
    pub fn generated_position(&self, original: lsp_types::Position) -> lsp_types::Position {
        let query = to_position(&self.original, original);
        let position = self
            .translator
            .reverse_or_nearest(query)
            .map(|resolved| resolved.position)
            .unwrap_or(query);
        to_lsp(&self.generated_index, position)
    }

    /// Maps a generated position back into the editor's document.
    ///
    /// Within a copied run the column offset from the preceding mapping is
    /// kept, as long as mapping the result back lands on the same position.
    pub fn original_position(&self, generated: lsp_types::Position) -> lsp_types::Position {
        let query = to_position(&self.generated_index, generated);
        let Ok(resolved) = self.translator.forward_or_nearest(query) else {
            return generated;
        };
        let mut position = resolved.position;
        if !resolved.approximate {
            if let Ok(anchor) = self.translator.reverse(position) {
                if anchor.line == query.line && anchor.column < query.column {
                    let shifted = Position::new(position.line, position.column + query.column - anchor.column);
                    if self.translator.reverse(shifted) == Ok(query) {
                        position = shifted;
                    }
                }
            }
        }
        to_lsp(&self.original, position)
    }

    /// Maps a generated range back into the editor's document.
    pub fn original_range(&self, range: lsp_types::Range) -> lsp_types::Range {
        let start = self.original_position(range.start);
        let end = self.original_position(range.end);
        let end = if end < start { start } else { end };
        lsp_types::Range { start, end }
    }
}

fn to_position(index: &LineIndex, position: lsp_types::Position) -> Position {
    let line = position.line + 1;
    Position::new(line, index.utf16_to_column(line, position.character))
}

fn to_lsp(index: &LineIndex, position: Position) -> lsp_types::Position {
    lsp_types::Position {
        line: position.line.saturating_sub(1),
        character: index.column_to_utf16(position.line, position.column),
    }
}

/// The state and snapshot of a session, published together.
#[derive(Debug, Clone)]
pub struct SessionView {
    /// Current lifecycle state.
    pub state: SessionState,
    /// Latest successful generation, if any.
    pub snapshot: Option<Arc<Snapshot>>,
}

/// A `.sugo` document open in the editor.
#[derive(Debug)]
pub struct DocumentSession {
    uri: String,
    generated_uri: String,
    text: Mutex<String>,
    latest_edit: AtomicU64,
    generation: AtomicU64,
    opened_on_server: AtomicBool,
    local_diagnostics: AtomicBool,
    regeneration: tokio::sync::Mutex<()>,
    view: watch::Sender<SessionView>,
}

impl DocumentSession {
    /// Creates a session in the `Opening` state.
    pub fn new(uri: impl Into<String>, generated_uri: impl Into<String>, text: impl Into<String>) -> Self {
        let (view, _) = watch::channel(SessionView {
            state: SessionState::Opening,
            snapshot: None,
        });
        Self {
            uri: uri.into(),
            generated_uri: generated_uri.into(),
            text: Mutex::new(text.into()),
            latest_edit: AtomicU64::new(0),
            generation: AtomicU64::new(0),
            opened_on_server: AtomicBool::new(false),
            local_diagnostics: AtomicBool::new(false),
            regeneration: tokio::sync::Mutex::new(()),
            view,
        }
    }

    /// The editor's URI for this document.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// The URI gopls knows this document by.
    pub fn generated_uri(&self) -> &str {
        &self.generated_uri
    }

    /// Returns the current state and snapshot.
    pub fn view(&self) -> SessionView {
        self.view.borrow().clone()
    }

    /// Returns the current state.
    pub fn state(&self) -> SessionState {
        self.view.borrow().state
    }

    /// Returns the latest snapshot.
    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.view.borrow().snapshot.clone()
    }

    /// Waits until no regeneration is pending and returns the view.
    ///
    /// Returns `None` if the session was dropped while waiting.
    pub async fn ready(&self) -> Option<SessionView> {
        let mut rx = self.view.subscribe();
        let view = rx.wait_for(|view| !view.state.is_pending()).await.ok()?;
        Some(view.clone())
    }

    /// Returns a copy of the editor's text.
    pub fn text(&self) -> String {
        self.text.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Applies editor changes and starts a new regeneration.
    ///
    /// Returns the edit number the regeneration must still be current for.
    pub fn begin_edit(&self, changes: &[TextDocumentContentChangeEvent]) -> u64 {
        {
            let mut text = self.text.lock().unwrap_or_else(PoisonError::into_inner);
            for change in changes {
                apply_change(&mut text, change);
            }
        }
        self.begin_regeneration()
    }

    /// Starts a regeneration of the unchanged text, e.g. after gopls restarts.
    pub fn begin_regeneration(&self) -> u64 {
        let edit = self.latest_edit.fetch_add(1, Ordering::SeqCst) + 1;
        self.view.send_modify(|view| {
            if view.state != SessionState::Closed {
                if view.state != SessionState::Opening {
                    view.state = SessionState::Regenerating;
                }
            }
        });
        edit
    }

    /// True if no edit arrived after `edit` and the session is still open.
    pub fn is_current(&self, edit: u64) -> bool {
        self.latest_edit.load(Ordering::SeqCst) == edit && self.state() != SessionState::Closed
    }

    /// Serializes regenerations of this document.
    pub async fn lock_regeneration(&self) -> MutexGuard<'_, ()> {
        self.regeneration.lock().await
    }

    /// Allocates the next generation number.
    pub fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Publishes a new snapshot and enters `Synced`.
    pub fn publish(&self, snapshot: Arc<Snapshot>) {
        self.view.send_replace(SessionView {
            state: SessionState::Synced,
            snapshot: Some(snapshot),
        });
    }

    /// Enters `Stale`, keeping the last snapshot for in-flight responses.
    pub fn mark_stale(&self) {
        self.view.send_modify(|view| {
            if view.state != SessionState::Closed {
                view.state = SessionState::Stale;
            }
        });
    }

    /// Enters `Closed` and releases the snapshot.
    pub fn close(&self) {
        self.latest_edit.fetch_add(1, Ordering::SeqCst);
        self.view.send_replace(SessionView {
            state: SessionState::Closed,
            snapshot: None,
        });
    }

    /// True if gopls currently has this document open.
    pub fn opened_on_server(&self) -> bool {
        self.opened_on_server.load(Ordering::SeqCst)
    }

    /// Records whether gopls has this document open.
    pub fn set_opened_on_server(&self, opened: bool) {
        self.opened_on_server.store(opened, Ordering::SeqCst);
    }

    /// Records whether locally produced diagnostics are showing, returning
    /// the previous value.
    pub fn swap_local_diagnostics(&self, showing: bool) -> bool {
        self.local_diagnostics.swap(showing, Ordering::SeqCst)
    }
}

/// Applies one content change to `text`.
///
/// A change without a range replaces the whole document.
pub fn apply_change(text: &mut String, change: &TextDocumentContentChangeEvent) {
    let Some(range) = change.range else {
        text.clone_from(&change.text);
        return;
    };
    let index = LineIndex::new(text);
    let start = lsp_offset(&index, range.start);
    let end = lsp_offset(&index, range.end).max(start);
    text.replace_range(start..end, &change.text);
}

fn lsp_offset(index: &LineIndex, position: lsp_types::Position) -> usize {
    index
        .offset(to_position(index, position))
        .map(|offset| u32::from(offset) as usize)
        .unwrap_or_else(|| index.text().len())
}
