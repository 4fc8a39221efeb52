//! Nook Core Library
//!
//! This crate provides the core functionality for nook, a personal
//! note-taking system organizing rich-text notes and reference resources
//! into projects.
//!
//! # Architecture
//!
//! The center of gravity is the rich-text pipeline: a structured document
//! model that is edited through discrete formatting commands, serialized
//! to JSON for storage, degraded to plain text for list previews, and
//! sanitized on HTML import/export. Everything around it is glue to a
//! remote document store accessed through the [`DocumentStore`] trait.
//!
//! # Quick Start
//!
//! ```text
//! let store: Arc<dyn DocumentStore> = Arc::new(FileStore::open(path)?);
//! let projects = ProjectService::new(Arc::clone(&store));
//! let notes = NoteService::new(Arc::clone(&store));
//!
//! let project = projects.create("Reading", "bg-sky-500").await?;
//! let note = notes.create(&project.id, "First note").await?;
//!
//! // Edit through a session
//! let mut session = EditorSession::open(store, &project.id, &note.id).await?;
//! session.select_all();
//! session.toggle_inline_format(InlineFormat::Bold, Instant::now());
//! session.save().await?;
//! ```
//!
//! # Modules
//!
//! - `document`: the rich-text tree model and its JSON round-trip
//! - `engine`: formatting commands, selection handling, undo/redo
//! - `session`: per-note editing lifecycle with debounced save buffers
//! - `plaintext`: flat preview projection of stored content
//! - `html`: sanitizing import/export mapping for pasted markup
//! - `store`: document store trait plus in-memory and file-backed stores
//! - `services`: project/note/resource operations over the store
//! - `config`: application configuration

pub mod config;
pub mod debounce;
pub mod document;
pub mod engine;
pub mod history;
pub mod html;
pub mod models;
pub mod plaintext;
pub mod selection;
pub mod services;
pub mod session;
pub mod store;
pub mod style;

pub use config::Config;
pub use debounce::Debouncer;
pub use document::{
    Alignment, Document, FormatFlags, HeadingLevel, InlineFormat, ListOrdering,
    MalformedDocumentError, Node,
};
pub use engine::{BlockKind, FormattingEngine, ToolbarState};
pub use history::History;
pub use html::{from_html, to_html};
pub use models::{ModelError, Note, Project, Resource};
pub use plaintext::extract_plain_text;
pub use selection::{Point, Selection};
pub use services::{
    CascadeSummary, NoteService, ProjectService, ResourceService, ResourceUpdate, ServiceError,
    ValidationError,
};
pub use session::EditorSession;
pub use store::{
    Aggregate, CollectionPath, DocumentStore, Entity, EntityPath, Fields, FileStore, MemoryStore,
    StoreError,
};
pub use style::{extra_styles, parse_allowed_color, parse_allowed_font_size, ExtraStyleSource};
