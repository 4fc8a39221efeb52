//! Note operations
//!
//! Notes live in a subcollection under their project. Creating or deleting
//! a note atomically bumps the project's denormalized `noteCount` so the
//! sidebar counts never require scanning subcollections.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;

use crate::models::{keys, timestamp_value, Note};
use crate::store::{CollectionPath, DocumentStore, Fields};

use super::{validate_title, ServiceError, NOTES, PROJECTS};

#[derive(Clone)]
pub struct NoteService {
    store: Arc<dyn DocumentStore>,
}

impl NoteService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    fn collection(&self, project_id: &str) -> Result<CollectionPath, ServiceError> {
        Ok(CollectionPath::new(PROJECTS)?
            .entity(project_id)
            .collection(NOTES))
    }

    /// Create a note with empty content and bump the project's counter.
    pub async fn create(&self, project_id: &str, title: &str) -> Result<Note, ServiceError> {
        validate_title(title)?;

        let now = Utc::now();
        let mut fields = Fields::new();
        fields.insert(keys::TITLE.to_string(), Value::from(title));
        fields.insert(keys::CONTENT.to_string(), Value::from(""));
        fields.insert(keys::CREATED_AT.to_string(), timestamp_value(now));

        let collection = self.collection(project_id)?;
        let id = self.store.create(&collection, fields).await.map_err(|err| {
            tracing::error!("failed to create note in project {project_id}: {err}");
            err
        })?;

        let project_path = CollectionPath::new(PROJECTS)?.entity(project_id);
        self.store
            .increment(&project_path, keys::NOTE_COUNT, 1)
            .await
            .map_err(|err| {
                tracing::error!("failed to bump note count for project {project_id}: {err}");
                err
            })?;

        Ok(Note {
            id,
            title: title.to_string(),
            content: String::new(),
            created_at: now,
        })
    }

    pub async fn list(&self, project_id: &str) -> Result<Vec<Note>, ServiceError> {
        let collection = self.collection(project_id)?;
        let entities = self.store.list(&collection).await.map_err(|err| {
            tracing::error!("failed to list notes for project {project_id}: {err}");
            err
        })?;
        let mut notes = Vec::with_capacity(entities.len());
        for entity in &entities {
            notes.push(Note::from_entity(entity)?);
        }
        Ok(notes)
    }

    pub async fn get(&self, project_id: &str, note_id: &str) -> Result<Option<Note>, ServiceError> {
        let path = self.collection(project_id)?.entity(note_id);
        match self.store.get(&path).await? {
            Some(entity) => Ok(Some(Note::from_entity(&entity)?)),
            None => Ok(None),
        }
    }

    /// Save a note's title and serialized content, refreshing its
    /// timestamp (shown as "Last updated").
    pub async fn update(
        &self,
        project_id: &str,
        note_id: &str,
        title: &str,
        content: &str,
    ) -> Result<(), ServiceError> {
        validate_title(title)?;

        let mut fields = Fields::new();
        fields.insert(keys::TITLE.to_string(), Value::from(title));
        fields.insert(keys::CONTENT.to_string(), Value::from(content));
        fields.insert(keys::CREATED_AT.to_string(), timestamp_value(Utc::now()));

        let path = self.collection(project_id)?.entity(note_id);
        self.store.update(&path, fields).await.map_err(|err| {
            tracing::error!("failed to update note {note_id}: {err}");
            err.into()
        })
    }

    /// Delete a note and decrement the project's counter.
    pub async fn delete(&self, project_id: &str, note_id: &str) -> Result<(), ServiceError> {
        let path = self.collection(project_id)?.entity(note_id);
        self.store.delete(&path).await.map_err(|err| {
            tracing::error!("failed to delete note {note_id}: {err}");
            err
        })?;

        let project_path = CollectionPath::new(PROJECTS)?.entity(project_id);
        self.store
            .increment(&project_path, keys::NOTE_COUNT, -1)
            .await
            .map_err(|err| {
                tracing::error!("failed to drop note count for project {project_id}: {err}");
                err
            })?;
        Ok(())
    }

    /// Case-insensitive substring search over titles and content previews.
    pub async fn search(&self, project_id: &str, query: &str) -> Result<Vec<Note>, ServiceError> {
        let query = query.to_lowercase();
        let notes = self.list(project_id).await?;
        if query.is_empty() {
            return Ok(notes);
        }
        Ok(notes
            .into_iter()
            .filter(|note| {
                note.title.to_lowercase().contains(&query)
                    || note.preview().to_lowercase().contains(&query)
            })
            .collect())
    }
}
