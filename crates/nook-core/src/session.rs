//! Editor session controller
//!
//! Owns one open note's editing lifecycle: load content into a document
//! (falling back to the canonical empty document so bad input never takes
//! the editor down), funnel every mutation through the formatting engine,
//! debounce content and title changes into single-slot pending buffers,
//! and on an explicit save serialize, submit to the store, and reload the
//! authoritative note; the store is the source of truth after a write.
//!
//! Content and title debounce independently (500 ms / 300 ms by default)
//! so retitling never drags a whole-document serialization behind it.
//! Time comes in through `Instant` arguments; the session never sleeps.

use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::debounce::Debouncer;
use crate::document::{Alignment, Document, InlineFormat, ListOrdering};
use crate::engine::{BlockKind, FormattingEngine, ToolbarState};
use crate::models::Note;
use crate::selection::Selection;
use crate::services::{NoteService, ServiceError};
use crate::store::{DocumentStore, StoreError};

use tokio::sync::watch;

pub struct EditorSession {
    project_id: String,
    note: Note,
    notes: NoteService,
    engine: FormattingEngine,
    content_buf: Debouncer<Document>,
    title_buf: Debouncer<String>,
    pending_content: Option<Document>,
    pending_title: Option<String>,
}

impl EditorSession {
    /// Open a session on an existing note with default tuning.
    pub async fn open(
        store: Arc<dyn DocumentStore>,
        project_id: &str,
        note_id: &str,
    ) -> Result<Self, ServiceError> {
        Self::open_with_config(store, &Config::default(), project_id, note_id).await
    }

    pub async fn open_with_config(
        store: Arc<dyn DocumentStore>,
        config: &Config,
        project_id: &str,
        note_id: &str,
    ) -> Result<Self, ServiceError> {
        let notes = NoteService::new(store);
        let note = notes
            .get(project_id, note_id)
            .await?
            .ok_or_else(|| ServiceError::NoteNotFound(note_id.to_string()))?;

        let document = Document::from_json_or_empty(Some(&note.content));
        tracing::debug!("opened note {} ({} blocks)", note.id, document.blocks().len());

        Ok(Self {
            project_id: project_id.to_string(),
            note,
            notes,
            engine: FormattingEngine::new(document, config.history_limit),
            content_buf: Debouncer::new(config.content_debounce()),
            title_buf: Debouncer::new(config.title_debounce()),
            pending_content: None,
            pending_title: None,
        })
    }

    pub fn note(&self) -> &Note {
        &self.note
    }

    pub fn document(&self) -> &Document {
        self.engine.document()
    }

    /// The title as the user currently sees it (debounced edits included).
    pub fn title(&self) -> &str {
        self.pending_title.as_deref().unwrap_or(&self.note.title)
    }

    pub fn toolbar_state(&self) -> ToolbarState {
        self.engine.toolbar_state()
    }

    pub fn subscribe_toolbar(&self) -> watch::Receiver<ToolbarState> {
        self.engine.subscribe()
    }

    pub fn set_selection(&mut self, selection: Option<Selection>) {
        self.engine.set_selection(selection);
    }

    pub fn select_all(&mut self) {
        self.engine.select_all();
    }

    // ==================== Editing commands ====================
    //
    // Each command runs through the engine and, when it changed the
    // document, queues a debounced content snapshot.

    pub fn toggle_inline_format(&mut self, flag: InlineFormat, now: Instant) -> bool {
        let applied = self.engine.toggle_inline_format(flag);
        if applied {
            self.queue_content(now);
        }
        applied
    }

    pub fn set_block_type(&mut self, kind: BlockKind, now: Instant) -> bool {
        let applied = self.engine.set_block_type(kind);
        if applied {
            self.queue_content(now);
        }
        applied
    }

    pub fn set_alignment(&mut self, alignment: Alignment, now: Instant) -> bool {
        let applied = self.engine.set_alignment(alignment);
        if applied {
            self.queue_content(now);
        }
        applied
    }

    pub fn insert_list(&mut self, ordering: ListOrdering, now: Instant) -> bool {
        let applied = self.engine.insert_list(ordering);
        if applied {
            self.queue_content(now);
        }
        applied
    }

    pub fn undo(&mut self, now: Instant) -> bool {
        let applied = self.engine.undo();
        if applied {
            self.queue_content(now);
        }
        applied
    }

    pub fn redo(&mut self, now: Instant) -> bool {
        let applied = self.engine.redo();
        if applied {
            self.queue_content(now);
        }
        applied
    }

    /// Swap in entirely new content (an import or an external edit).
    pub fn replace_content(&mut self, document: Document, now: Instant) {
        self.engine.replace_document(document);
        self.queue_content(now);
    }

    /// Queue a debounced snapshot of the current document for saving.
    fn queue_content(&mut self, now: Instant) {
        self.content_buf.push(self.engine.document().clone(), now);
    }

    /// Title keystroke; coalesced separately from content.
    pub fn on_title_changed(&mut self, title: impl Into<String>, now: Instant) {
        self.title_buf.push(title.into(), now);
    }

    /// Drain any debounce slot whose quiet window has elapsed into the
    /// pending save buffers. Drive this from the host's tick/timer.
    pub fn tick(&mut self, now: Instant) {
        if let Some(document) = self.content_buf.poll(now) {
            self.pending_content = Some(document);
        }
        if let Some(title) = self.title_buf.poll(now) {
            self.pending_title = Some(title);
        }
    }

    /// True when there are edits the store has not seen yet.
    pub fn is_dirty(&self) -> bool {
        self.pending_content.is_some()
            || self.pending_title.is_some()
            || self.content_buf.is_pending()
            || self.title_buf.is_pending()
    }

    /// Persist the latest pending title and content, then reload the
    /// authoritative note from the store before reporting success.
    pub async fn save(&mut self) -> Result<(), ServiceError> {
        if let Some(document) = self.content_buf.flush() {
            self.pending_content = Some(document);
        }
        if let Some(title) = self.title_buf.flush() {
            self.pending_title = Some(title);
        }

        let title = self
            .pending_title
            .clone()
            .unwrap_or_else(|| self.note.title.clone());
        let document = self
            .pending_content
            .clone()
            .unwrap_or_else(|| self.engine.document().clone());
        let content = document.to_json_string().map_err(StoreError::from)?;

        self.notes
            .update(&self.project_id, &self.note.id, &title, &content)
            .await?;

        let reloaded = self
            .notes
            .get(&self.project_id, &self.note.id)
            .await?
            .ok_or_else(|| ServiceError::NoteNotFound(self.note.id.clone()))?;
        self.engine.sync_document(reloaded.document());
        self.note = reloaded;
        self.pending_content = None;
        self.pending_title = None;
        Ok(())
    }
}
