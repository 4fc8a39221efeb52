//! Entity models
//!
//! Projects aggregate notes and reference resources. These are thin typed
//! views over the schemaless entities the store returns; timestamps are
//! stored as integer milliseconds.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::document::Document;
use crate::plaintext::extract_plain_text;
use crate::store::{Entity, Fields};

/// Field keys used in stored entities.
pub(crate) mod keys {
    pub const TITLE: &str = "title";
    pub const COLOR: &str = "color";
    pub const CONTENT: &str = "content";
    pub const URL: &str = "url";
    pub const NOTE_COUNT: &str = "noteCount";
    pub const RESOURCE_COUNT: &str = "resourceCount";
    pub const CREATED_AT: &str = "createdAt";
    pub const UPDATED_AT: &str = "updatedAt";
}

/// Errors mapping stored fields into typed models.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("invalid field type for {0}")]
    InvalidType(String),

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(i64),
}

fn get_string(fields: &Fields, key: &str) -> Result<String, ModelError> {
    match fields.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(ModelError::InvalidType(key.to_string())),
        None => Err(ModelError::MissingField(key.to_string())),
    }
}

fn get_optional_string(fields: &Fields, key: &str) -> Result<Option<String>, ModelError> {
    match fields.get(key) {
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Null) | None => Ok(None),
        Some(_) => Err(ModelError::InvalidType(key.to_string())),
    }
}

fn get_count(fields: &Fields, key: &str) -> Result<i64, ModelError> {
    match fields.get(key) {
        Some(value) => value
            .as_i64()
            .ok_or_else(|| ModelError::InvalidType(key.to_string())),
        None => Ok(0),
    }
}

fn get_timestamp(fields: &Fields, key: &str) -> Result<DateTime<Utc>, ModelError> {
    let millis = match fields.get(key) {
        Some(value) => value
            .as_i64()
            .ok_or_else(|| ModelError::InvalidType(key.to_string()))?,
        None => return Err(ModelError::MissingField(key.to_string())),
    };
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or(ModelError::InvalidTimestamp(millis))
}

pub(crate) fn timestamp_value(at: DateTime<Utc>) -> Value {
    Value::from(at.timestamp_millis())
}

/// A project: a color-tagged folder of notes and resources, carrying
/// denormalized child counts kept in sync by atomic increments.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub id: String,
    pub title: String,
    pub color: String,
    pub note_count: i64,
    pub resource_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn from_entity(entity: &Entity) -> Result<Self, ModelError> {
        Ok(Self {
            id: entity.id.clone(),
            title: get_string(&entity.fields, keys::TITLE)?,
            color: get_string(&entity.fields, keys::COLOR)?,
            note_count: get_count(&entity.fields, keys::NOTE_COUNT)?,
            resource_count: get_count(&entity.fields, keys::RESOURCE_COUNT)?,
            created_at: get_timestamp(&entity.fields, keys::CREATED_AT)?,
            updated_at: get_timestamp(&entity.fields, keys::UPDATED_AT)?,
        })
    }
}

/// A note: a title plus rich-text content stored as serialized JSON.
///
/// `created_at` doubles as the last-updated stamp: saving a note
/// refreshes it, and the editor shows it as "Last updated".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Note {
    pub id: String,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Note {
    pub fn from_entity(entity: &Entity) -> Result<Self, ModelError> {
        Ok(Self {
            id: entity.id.clone(),
            title: get_string(&entity.fields, keys::TITLE)?,
            content: get_string(&entity.fields, keys::CONTENT)?,
            created_at: get_timestamp(&entity.fields, keys::CREATED_AT)?,
        })
    }

    /// Flat preview of the content for list rows.
    pub fn preview(&self) -> String {
        extract_plain_text(Some(&self.content))
    }

    /// The content as an editable document, falling back to the canonical
    /// empty document for blank or malformed content.
    pub fn document(&self) -> Document {
        Document::from_json_or_empty(Some(&self.content))
    }
}

/// A reference link attached to a project.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Resource {
    pub id: String,
    pub title: String,
    pub url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Resource {
    pub fn from_entity(entity: &Entity) -> Result<Self, ModelError> {
        Ok(Self {
            id: entity.id.clone(),
            title: get_string(&entity.fields, keys::TITLE)?,
            url: get_optional_string(&entity.fields, keys::URL)?,
            created_at: get_timestamp(&entity.fields, keys::CREATED_AT)?,
        })
    }
}
