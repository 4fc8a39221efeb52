//! Note command handlers

use std::io::{self, Read};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};

use nook_core::{Document, DocumentStore, EditorSession, Node, NoteService};

use crate::commands::confirm;
use crate::output::Output;

pub async fn create(
    notes: &NoteService,
    project_id: String,
    title: String,
    output: &Output,
) -> Result<()> {
    let note = notes
        .create(&project_id, &title)
        .await
        .context("Failed to create note")?;

    output.success(&format!("Created note: {}", note.id));
    Ok(())
}

pub async fn list(notes: &NoteService, project_id: String, output: &Output) -> Result<()> {
    let all = notes
        .list(&project_id)
        .await
        .context("Failed to list notes")?;
    output.print_notes(&all);
    Ok(())
}

pub async fn show(
    notes: &NoteService,
    project_id: String,
    note_id: String,
    output: &Output,
) -> Result<()> {
    let note = notes
        .get(&project_id, &note_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Note not found: {}", note_id))?;
    output.print_note(&note);
    Ok(())
}

/// Replace a note's content (and optionally title) through an editing
/// session: stdin lines become paragraphs, the session serializes and
/// saves, and the note is reloaded from the store before we report back.
pub async fn edit(
    store: Arc<dyn DocumentStore>,
    project_id: String,
    note_id: String,
    title: Option<String>,
    output: &Output,
) -> Result<()> {
    let mut session = EditorSession::open(store, &project_id, &note_id)
        .await
        .context("Failed to open note")?;

    if !output.is_quiet() {
        eprintln!("Reading new note body from stdin (end with Ctrl-D)...");
    }
    let mut body = String::new();
    io::stdin()
        .read_to_string(&mut body)
        .context("Failed to read note body")?;

    let now = Instant::now();
    session.replace_content(document_from_lines(&body), now);
    if let Some(title) = title {
        session.on_title_changed(title, now);
    }

    session.save().await.context("Failed to save note")?;
    output.success(&format!("Saved note: {}", session.note().id));
    output.print_note(session.note());
    Ok(())
}

pub async fn delete(
    notes: &NoteService,
    project_id: String,
    note_id: String,
    assume_yes: bool,
    output: &Output,
) -> Result<()> {
    let note = notes
        .get(&project_id, &note_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Note not found: {}", note_id))?;

    if !confirm(&format!("Delete note '{}'?", note.title), assume_yes)? {
        output.success("Cancelled");
        return Ok(());
    }

    notes
        .delete(&project_id, &note_id)
        .await
        .context("Failed to delete note")?;
    output.success(&format!("Deleted note {}", note_id));
    Ok(())
}

pub async fn search(
    notes: &NoteService,
    project_id: String,
    query: String,
    output: &Output,
) -> Result<()> {
    let matches = notes
        .search(&project_id, &query)
        .await
        .context("Search failed")?;
    output.print_notes(&matches);
    Ok(())
}

/// One paragraph per non-empty input line.
fn document_from_lines(body: &str) -> Document {
    let mut document = Document::empty();
    let blocks: Vec<Node> = body
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| Node::paragraph(vec![Node::text(line)]))
        .collect();
    if !blocks.is_empty() {
        document.root.children = blocks;
    }
    document
}
