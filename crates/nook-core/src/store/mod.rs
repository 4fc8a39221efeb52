//! Persistence collaborator
//!
//! Notes, projects, and resources live in a remote document store the core
//! treats as opaque: schemaless entities addressed by slash paths, with
//! collections nesting under entities (`projects/<id>/notes`). The
//! [`DocumentStore`] trait is the seam; [`MemoryStore`] backs tests and
//! [`FileStore`] adds JSON-on-disk persistence for the CLI.
//!
//! Deleting an entity never touches its subcollections; cascading is the
//! service layer's responsibility.

pub mod file;
pub mod memory;

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::watch;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Field map of one stored entity.
pub type Fields = BTreeMap<String, Value>;

/// An entity as returned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: String,
    pub fields: Fields,
}

/// Full recomputed aggregate over one collection: entity count plus the
/// integer sums of requested fields. Delivered whole on every change, not
/// as deltas.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Aggregate {
    pub count: u64,
    pub sums: BTreeMap<String, i64>,
}

impl Aggregate {
    pub fn sum(&self, field: &str) -> i64 {
        self.sums.get(field).copied().unwrap_or(0)
    }
}

/// Errors from store operations.
///
/// Remote failures are logged by callers and passed through; nothing in
/// the core retries.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("entity not found: {path}")]
    NotFound { path: String },

    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("field '{field}' is not numeric")]
    NonNumericField { field: String },

    #[error("storage I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage encoding failure: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("store backend failure: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

fn validate_segments(path: &str) -> StoreResult<Vec<&str>> {
    if path.is_empty() {
        return Err(StoreError::InvalidPath {
            path: path.to_string(),
            reason: "empty path".to_string(),
        });
    }
    let segments: Vec<&str> = path.split('/').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(StoreError::InvalidPath {
            path: path.to_string(),
            reason: "empty path segment".to_string(),
        });
    }
    Ok(segments)
}

/// Path to a collection: an odd number of slash-separated segments
/// (`projects`, `projects/p1/notes`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollectionPath(String);

impl CollectionPath {
    pub fn new(path: impl Into<String>) -> StoreResult<Self> {
        let path = path.into();
        let segments = validate_segments(&path)?;
        if segments.len() % 2 == 0 {
            return Err(StoreError::InvalidPath {
                path,
                reason: "collection paths have an odd number of segments".to_string(),
            });
        }
        Ok(Self(path))
    }

    /// Path of the entity `id` within this collection.
    pub fn entity(&self, id: &str) -> EntityPath {
        EntityPath(format!("{}/{}", self.0, id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Path to an entity: an even number of segments (`projects/p1`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityPath(String);

impl EntityPath {
    pub fn new(path: impl Into<String>) -> StoreResult<Self> {
        let path = path.into();
        let segments = validate_segments(&path)?;
        if segments.len() % 2 != 0 {
            return Err(StoreError::InvalidPath {
                path,
                reason: "entity paths have an even number of segments".to_string(),
            });
        }
        Ok(Self(path))
    }

    /// Subcollection `name` nested under this entity.
    pub fn collection(&self, name: &str) -> CollectionPath {
        CollectionPath(format!("{}/{}", self.0, name))
    }

    /// The collection this entity belongs to.
    pub fn parent(&self) -> CollectionPath {
        match self.0.rsplit_once('/') {
            Some((parent, _)) => CollectionPath(parent.to_string()),
            None => CollectionPath(self.0.clone()),
        }
    }

    /// The entity's id (last path segment).
    pub fn id(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The remote document store the editing core collaborates with.
///
/// Operations are asynchronous and non-cancelable once issued; there is no
/// request deduplication, so overlapping writes resolve last-write-wins.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create an entity with a store-assigned id; returns the id.
    async fn create(&self, collection: &CollectionPath, fields: Fields) -> StoreResult<String>;

    /// All entities of a collection. Order is store-defined and not
    /// guaranteed stable across calls.
    async fn list(&self, collection: &CollectionPath) -> StoreResult<Vec<Entity>>;

    /// Fetch one entity, `None` when absent.
    async fn get(&self, path: &EntityPath) -> StoreResult<Option<Entity>>;

    /// Merge `fields` into an existing entity. Fails with
    /// [`StoreError::NotFound`] when the entity does not exist.
    async fn update(&self, path: &EntityPath, fields: Fields) -> StoreResult<()>;

    /// Delete an entity. Deleting an absent entity is not an error, and
    /// subcollections are left in place.
    async fn delete(&self, path: &EntityPath) -> StoreResult<()>;

    /// Atomically add `delta` to a numeric field, treating an absent field
    /// as zero. Safe against concurrent read-modify-write races.
    async fn increment(&self, path: &EntityPath, field: &str, delta: i64) -> StoreResult<()>;

    /// Subscribe to a collection's aggregate. The receiver holds the
    /// current value immediately and sees a full recomputation after every
    /// mutation of the collection.
    async fn observe_aggregate(
        &self,
        collection: &CollectionPath,
        sum_fields: &[&str],
    ) -> StoreResult<watch::Receiver<Aggregate>>;
}
