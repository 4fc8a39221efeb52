//! In-memory document store
//!
//! Backs tests and the file store. All state sits behind one mutex, which
//! is what makes `increment` atomic with respect to concurrent writers.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::watch;
use uuid::Uuid;

use super::{
    Aggregate, CollectionPath, DocumentStore, Entity, EntityPath, Fields, StoreError, StoreResult,
};

type Collections = BTreeMap<String, BTreeMap<String, Fields>>;

struct Watcher {
    sum_fields: Vec<String>,
    tx: watch::Sender<Aggregate>,
}

#[derive(Default)]
struct Inner {
    collections: Collections,
    watchers: HashMap<String, Vec<Watcher>>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from previously exported collections.
    pub(crate) fn restore(collections: Collections) -> Self {
        Self {
            inner: Mutex::new(Inner {
                collections,
                watchers: HashMap::new(),
            }),
        }
    }

    /// Copy of all collections, for persistence.
    pub(crate) fn snapshot(&self) -> StoreResult<Collections> {
        Ok(self.lock()?.collections.clone())
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Backend("store mutex poisoned".to_string()))
    }
}

impl Inner {
    /// Recompute and broadcast aggregates after a mutation of `collection`.
    fn notify(&mut self, collection: &str) {
        let Some(watchers) = self.watchers.get_mut(collection) else {
            return;
        };
        watchers.retain(|w| !w.tx.is_closed());
        let entities = self.collections.get(collection);
        for watcher in self.watchers.get(collection).into_iter().flatten() {
            let aggregate = compute_aggregate(entities, &watcher.sum_fields);
            watcher.tx.send_replace(aggregate);
        }
    }
}

fn compute_aggregate(
    entities: Option<&BTreeMap<String, Fields>>,
    sum_fields: &[String],
) -> Aggregate {
    let mut aggregate = Aggregate::default();
    let Some(entities) = entities else {
        for field in sum_fields {
            aggregate.sums.insert(field.clone(), 0);
        }
        return aggregate;
    };
    aggregate.count = entities.len() as u64;
    for field in sum_fields {
        let total = entities
            .values()
            .filter_map(|fields| fields.get(field).and_then(Value::as_i64))
            .sum();
        aggregate.sums.insert(field.clone(), total);
    }
    aggregate
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn create(&self, collection: &CollectionPath, fields: Fields) -> StoreResult<String> {
        let id = Uuid::new_v4().to_string();
        let mut inner = self.lock()?;
        inner
            .collections
            .entry(collection.as_str().to_string())
            .or_default()
            .insert(id.clone(), fields);
        inner.notify(collection.as_str());
        Ok(id)
    }

    async fn list(&self, collection: &CollectionPath) -> StoreResult<Vec<Entity>> {
        let inner = self.lock()?;
        Ok(inner
            .collections
            .get(collection.as_str())
            .map(|entities| {
                entities
                    .iter()
                    .map(|(id, fields)| Entity {
                        id: id.clone(),
                        fields: fields.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get(&self, path: &EntityPath) -> StoreResult<Option<Entity>> {
        let inner = self.lock()?;
        Ok(inner
            .collections
            .get(path.parent().as_str())
            .and_then(|entities| entities.get(path.id()))
            .map(|fields| Entity {
                id: path.id().to_string(),
                fields: fields.clone(),
            }))
    }

    async fn update(&self, path: &EntityPath, fields: Fields) -> StoreResult<()> {
        let mut inner = self.lock()?;
        let parent = path.parent();
        let entity = inner
            .collections
            .get_mut(parent.as_str())
            .and_then(|entities| entities.get_mut(path.id()))
            .ok_or_else(|| StoreError::NotFound {
                path: path.as_str().to_string(),
            })?;
        entity.extend(fields);
        inner.notify(parent.as_str());
        Ok(())
    }

    async fn delete(&self, path: &EntityPath) -> StoreResult<()> {
        let mut inner = self.lock()?;
        let parent = path.parent();
        if let Some(entities) = inner.collections.get_mut(parent.as_str()) {
            entities.remove(path.id());
        }
        inner.notify(parent.as_str());
        Ok(())
    }

    async fn increment(&self, path: &EntityPath, field: &str, delta: i64) -> StoreResult<()> {
        let mut inner = self.lock()?;
        let parent = path.parent();
        let entity = inner
            .collections
            .get_mut(parent.as_str())
            .and_then(|entities| entities.get_mut(path.id()))
            .ok_or_else(|| StoreError::NotFound {
                path: path.as_str().to_string(),
            })?;

        let current = match entity.get(field) {
            None | Some(Value::Null) => 0,
            Some(value) => value.as_i64().ok_or_else(|| StoreError::NonNumericField {
                field: field.to_string(),
            })?,
        };
        entity.insert(field.to_string(), Value::from(current + delta));
        inner.notify(parent.as_str());
        Ok(())
    }

    async fn observe_aggregate(
        &self,
        collection: &CollectionPath,
        sum_fields: &[&str],
    ) -> StoreResult<watch::Receiver<Aggregate>> {
        let mut inner = self.lock()?;
        let sum_fields: Vec<String> = sum_fields.iter().map(|s| s.to_string()).collect();
        let current = compute_aggregate(inner.collections.get(collection.as_str()), &sum_fields);
        let (tx, rx) = watch::channel(current);
        inner
            .watchers
            .entry(collection.as_str().to_string())
            .or_default()
            .push(Watcher { sum_fields, tx });
        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn fields(pairs: &[(&str, Value)]) -> Fields {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[tokio::test]
    async fn test_create_get_update_delete() {
        let store = MemoryStore::new();
        let projects = CollectionPath::new("projects").unwrap();

        let id = store
            .create(&projects, fields(&[("title", Value::from("Research"))]))
            .await
            .unwrap();

        let path = projects.entity(&id);
        let entity = store.get(&path).await.unwrap().unwrap();
        assert_eq!(entity.fields.get("title"), Some(&Value::from("Research")));

        store
            .update(&path, fields(&[("title", Value::from("Renamed"))]))
            .await
            .unwrap();
        let entity = store.get(&path).await.unwrap().unwrap();
        assert_eq!(entity.fields.get("title"), Some(&Value::from("Renamed")));

        store.delete(&path).await.unwrap();
        assert!(store.get(&path).await.unwrap().is_none());
        // Deleting again is not an error
        store.delete(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_update_missing_entity_fails() {
        let store = MemoryStore::new();
        let path = CollectionPath::new("projects").unwrap().entity("ghost");
        let err = store
            .update(&path, fields(&[("title", Value::from("x"))]))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_update_merges_partially() {
        let store = MemoryStore::new();
        let projects = CollectionPath::new("projects").unwrap();
        let id = store
            .create(
                &projects,
                fields(&[("title", Value::from("t")), ("color", Value::from("red"))]),
            )
            .await
            .unwrap();

        store
            .update(&projects.entity(&id), fields(&[("title", Value::from("u"))]))
            .await
            .unwrap();

        let entity = store.get(&projects.entity(&id)).await.unwrap().unwrap();
        assert_eq!(entity.fields.get("title"), Some(&Value::from("u")));
        assert_eq!(entity.fields.get("color"), Some(&Value::from("red")));
    }

    #[tokio::test]
    async fn test_subcollections_are_independent() {
        let store = MemoryStore::new();
        let projects = CollectionPath::new("projects").unwrap();
        let id = store.create(&projects, Fields::new()).await.unwrap();

        let notes = projects.entity(&id).collection("notes");
        let note_id = store
            .create(&notes, fields(&[("title", Value::from("n"))]))
            .await
            .unwrap();

        // Deleting the project leaves the subcollection in place
        store.delete(&projects.entity(&id)).await.unwrap();
        assert!(store
            .get(&notes.entity(&note_id))
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_increment_from_absent_and_existing() {
        let store = MemoryStore::new();
        let projects = CollectionPath::new("projects").unwrap();
        let id = store.create(&projects, Fields::new()).await.unwrap();
        let path = projects.entity(&id);

        store.increment(&path, "noteCount", 1).await.unwrap();
        store.increment(&path, "noteCount", 1).await.unwrap();
        store.increment(&path, "noteCount", -1).await.unwrap();

        let entity = store.get(&path).await.unwrap().unwrap();
        assert_eq!(entity.fields.get("noteCount"), Some(&Value::from(1)));
    }

    #[tokio::test]
    async fn test_increment_non_numeric_field_fails() {
        let store = MemoryStore::new();
        let projects = CollectionPath::new("projects").unwrap();
        let id = store
            .create(&projects, fields(&[("title", Value::from("x"))]))
            .await
            .unwrap();

        let err = store
            .increment(&projects.entity(&id), "title", 1)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NonNumericField { .. }));
    }

    #[tokio::test]
    async fn test_concurrent_increments_do_not_race() {
        let store = Arc::new(MemoryStore::new());
        let projects = CollectionPath::new("projects").unwrap();
        let id = store.create(&projects, Fields::new()).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..50 {
            let store = Arc::clone(&store);
            let path = projects.entity(&id);
            handles.push(tokio::spawn(async move {
                store.increment(&path, "noteCount", 1).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let entity = store.get(&projects.entity(&id)).await.unwrap().unwrap();
        assert_eq!(entity.fields.get("noteCount"), Some(&Value::from(50)));
    }

    #[tokio::test]
    async fn test_aggregate_recomputed_on_every_change() {
        let store = MemoryStore::new();
        let projects = CollectionPath::new("projects").unwrap();

        let rx = store
            .observe_aggregate(&projects, &["noteCount"])
            .await
            .unwrap();
        assert_eq!(rx.borrow().count, 0);
        assert_eq!(rx.borrow().sum("noteCount"), 0);

        let a = store
            .create(&projects, fields(&[("noteCount", Value::from(2))]))
            .await
            .unwrap();
        store
            .create(&projects, fields(&[("noteCount", Value::from(3))]))
            .await
            .unwrap();
        assert_eq!(rx.borrow().count, 2);
        assert_eq!(rx.borrow().sum("noteCount"), 5);

        store
            .increment(&projects.entity(&a), "noteCount", 1)
            .await
            .unwrap();
        assert_eq!(rx.borrow().sum("noteCount"), 6);

        store.delete(&projects.entity(&a)).await.unwrap();
        assert_eq!(rx.borrow().count, 1);
        assert_eq!(rx.borrow().sum("noteCount"), 3);
    }

    #[tokio::test]
    async fn test_list_returns_all_entities() {
        let store = MemoryStore::new();
        let projects = CollectionPath::new("projects").unwrap();
        assert!(store.list(&projects).await.unwrap().is_empty());

        store.create(&projects, Fields::new()).await.unwrap();
        store.create(&projects, Fields::new()).await.unwrap();
        assert_eq!(store.list(&projects).await.unwrap().len(), 2);
    }
}
