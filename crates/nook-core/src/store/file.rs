//! JSON file-backed document store
//!
//! Wraps [`MemoryStore`] with persistence: the full collection map is
//! loaded at open and rewritten after every mutation using an atomic write
//! (temp file, then rename) so the data file is never left half-written.
//! Suits a single local client; it is the CLI's stand-in for the remote
//! store the core is designed against.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::watch;

use super::{
    Aggregate, CollectionPath, DocumentStore, Entity, EntityPath, Fields, StoreResult,
};
use super::memory::MemoryStore;

pub struct FileStore {
    mem: MemoryStore,
    path: PathBuf,
}

impl FileStore {
    /// Open the store at `path`, loading existing data if present.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let mem = if path.exists() {
            let content = fs::read_to_string(&path)?;
            MemoryStore::restore(serde_json::from_str(&content)?)
        } else {
            MemoryStore::new()
        };
        Ok(Self { mem, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> StoreResult<()> {
        let collections = self.mem.snapshot()?;
        let json = serde_json::to_string_pretty(&collections)?;
        atomic_write(&self.path, json.as_bytes())
    }
}

#[async_trait]
impl DocumentStore for FileStore {
    async fn create(&self, collection: &CollectionPath, fields: Fields) -> StoreResult<String> {
        let id = self.mem.create(collection, fields).await?;
        self.persist()?;
        Ok(id)
    }

    async fn list(&self, collection: &CollectionPath) -> StoreResult<Vec<Entity>> {
        self.mem.list(collection).await
    }

    async fn get(&self, path: &EntityPath) -> StoreResult<Option<Entity>> {
        self.mem.get(path).await
    }

    async fn update(&self, path: &EntityPath, fields: Fields) -> StoreResult<()> {
        self.mem.update(path, fields).await?;
        self.persist()
    }

    async fn delete(&self, path: &EntityPath) -> StoreResult<()> {
        self.mem.delete(path).await?;
        self.persist()
    }

    async fn increment(&self, path: &EntityPath, field: &str, delta: i64) -> StoreResult<()> {
        self.mem.increment(path, field, delta).await?;
        self.persist()
    }

    async fn observe_aggregate(
        &self,
        collection: &CollectionPath,
        sum_fields: &[&str],
    ) -> StoreResult<watch::Receiver<Aggregate>> {
        self.mem.observe_aggregate(collection, sum_fields).await
    }
}

/// Write data to a file atomically: temp file in the same directory,
/// sync, then rename over the target.
fn atomic_write(path: &Path, data: &[u8]) -> StoreResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let temp_path = path.with_extension("tmp");
    let mut file = File::create(&temp_path)?;
    file.write_all(data)?;
    file.sync_all()?;
    fs::rename(&temp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use tempfile::TempDir;

    fn fields(pairs: &[(&str, Value)]) -> Fields {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[tokio::test]
    async fn test_data_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let data_path = dir.path().join("nook.json");
        let projects = CollectionPath::new("projects").unwrap();

        let id = {
            let store = FileStore::open(&data_path).unwrap();
            store
                .create(&projects, fields(&[("title", Value::from("Persisted"))]))
                .await
                .unwrap()
        };
        assert!(data_path.exists());

        let store = FileStore::open(&data_path).unwrap();
        let entity = store.get(&projects.entity(&id)).await.unwrap().unwrap();
        assert_eq!(entity.fields.get("title"), Some(&Value::from("Persisted")));
    }

    #[tokio::test]
    async fn test_mutations_rewrite_file() {
        let dir = TempDir::new().unwrap();
        let data_path = dir.path().join("nook.json");
        let projects = CollectionPath::new("projects").unwrap();

        let store = FileStore::open(&data_path).unwrap();
        let id = store.create(&projects, Fields::new()).await.unwrap();
        store
            .increment(&projects.entity(&id), "noteCount", 3)
            .await
            .unwrap();
        store.delete(&projects.entity(&id)).await.unwrap();

        let reopened = FileStore::open(&data_path).unwrap();
        assert!(reopened
            .get(&projects.entity(&id))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_open_missing_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path().join("absent.json")).unwrap();
        let projects = CollectionPath::new("projects").unwrap();
        assert!(store.list(&projects).await.unwrap().is_empty());
    }
}
