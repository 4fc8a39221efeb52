//! Project operations
//!
//! Projects own their notes and resources. Deleting a project cascades
//! over both subcollections best-effort: the store has no transactions, so
//! a failure partway leaves orphans, which is logged as a partial outcome
//! rather than unwinding.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tokio::sync::watch;

use crate::models::{keys, timestamp_value, Project};
use crate::store::{Aggregate, CollectionPath, DocumentStore, Fields};

use super::{validate_color, validate_title, ServiceError, NOTES, PROJECTS, RESOURCES};

#[derive(Clone)]
pub struct ProjectService {
    store: Arc<dyn DocumentStore>,
}

/// Outcome of a cascade delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CascadeSummary {
    pub notes_deleted: usize,
    pub resources_deleted: usize,
    pub failures: usize,
}

impl CascadeSummary {
    /// True when some children could not be removed and were orphaned.
    pub fn is_partial(&self) -> bool {
        self.failures > 0
    }
}

impl ProjectService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, title: &str, color: &str) -> Result<Project, ServiceError> {
        validate_title(title)?;
        validate_color(color)?;

        let now = Utc::now();
        let mut fields = Fields::new();
        fields.insert(keys::TITLE.to_string(), Value::from(title));
        fields.insert(keys::COLOR.to_string(), Value::from(color));
        fields.insert(keys::NOTE_COUNT.to_string(), Value::from(0));
        fields.insert(keys::RESOURCE_COUNT.to_string(), Value::from(0));
        fields.insert(keys::CREATED_AT.to_string(), timestamp_value(now));
        fields.insert(keys::UPDATED_AT.to_string(), timestamp_value(now));

        let projects = CollectionPath::new(PROJECTS)?;
        let id = self.store.create(&projects, fields).await.map_err(|err| {
            tracing::error!("failed to create project: {err}");
            err
        })?;

        Ok(Project {
            id,
            title: title.to_string(),
            color: color.to_string(),
            note_count: 0,
            resource_count: 0,
            created_at: now,
            updated_at: now,
        })
    }

    pub async fn list(&self) -> Result<Vec<Project>, ServiceError> {
        let projects = CollectionPath::new(PROJECTS)?;
        let entities = self.store.list(&projects).await.map_err(|err| {
            tracing::error!("failed to list projects: {err}");
            err
        })?;
        let mut result = Vec::with_capacity(entities.len());
        for entity in &entities {
            result.push(Project::from_entity(entity)?);
        }
        Ok(result)
    }

    pub async fn get(&self, project_id: &str) -> Result<Option<Project>, ServiceError> {
        let path = CollectionPath::new(PROJECTS)?.entity(project_id);
        match self.store.get(&path).await? {
            Some(entity) => Ok(Some(Project::from_entity(&entity)?)),
            None => Ok(None),
        }
    }

    /// Rename and/or recolor a project; refreshes `updatedAt`.
    pub async fn update(
        &self,
        project_id: &str,
        title: Option<&str>,
        color: Option<&str>,
    ) -> Result<(), ServiceError> {
        let mut fields = Fields::new();
        if let Some(title) = title {
            validate_title(title)?;
            fields.insert(keys::TITLE.to_string(), Value::from(title));
        }
        if let Some(color) = color {
            validate_color(color)?;
            fields.insert(keys::COLOR.to_string(), Value::from(color));
        }
        if fields.is_empty() {
            return Ok(());
        }
        fields.insert(keys::UPDATED_AT.to_string(), timestamp_value(Utc::now()));

        let path = CollectionPath::new(PROJECTS)?.entity(project_id);
        self.store.update(&path, fields).await.map_err(|err| {
            tracing::error!("failed to update project {project_id}: {err}");
            err.into()
        })
    }

    /// Delete a project and, best-effort, everything under it.
    ///
    /// Children are removed sequentially before the project document; any
    /// child failure is counted and logged, never retried, and does not
    /// stop the cascade. The project document delete itself is the only
    /// fatal step.
    pub async fn delete(&self, project_id: &str) -> Result<CascadeSummary, ServiceError> {
        let project_path = CollectionPath::new(PROJECTS)?.entity(project_id);
        let mut summary = CascadeSummary::default();

        for name in [NOTES, RESOURCES] {
            let collection = project_path.collection(name);
            let children = match self.store.list(&collection).await {
                Ok(children) => children,
                Err(err) => {
                    tracing::warn!("cascade delete could not list {collection}: {err}");
                    summary.failures += 1;
                    continue;
                }
            };
            let mut deleted = 0;
            for child in children {
                match self.store.delete(&collection.entity(&child.id)).await {
                    Ok(()) => deleted += 1,
                    Err(err) => {
                        tracing::warn!(
                            "cascade delete failed for {collection}/{}: {err}",
                            child.id
                        );
                        summary.failures += 1;
                    }
                }
            }
            match name {
                NOTES => summary.notes_deleted = deleted,
                _ => summary.resources_deleted = deleted,
            }
        }

        self.store.delete(&project_path).await.map_err(|err| {
            tracing::error!("failed to delete project {project_id}: {err}");
            err
        })?;

        if summary.is_partial() {
            tracing::warn!(
                "project {project_id} deleted with {} orphaned children left behind",
                summary.failures
            );
        }
        Ok(summary)
    }

    /// Cross-project totals (project count plus summed note/resource
    /// counters), recomputed and delivered on every projects change.
    pub async fn observe_totals(&self) -> Result<watch::Receiver<Aggregate>, ServiceError> {
        let projects = CollectionPath::new(PROJECTS)?;
        Ok(self
            .store
            .observe_aggregate(&projects, &[keys::NOTE_COUNT, keys::RESOURCE_COUNT])
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ValidationError;
    use crate::store::MemoryStore;

    fn service() -> ProjectService {
        ProjectService::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let projects = service();
        let created = projects.create("Research", "bg-sky-500").await.unwrap();
        assert_eq!(created.note_count, 0);
        assert_eq!(created.resource_count, 0);

        let fetched = projects.get(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched.title, "Research");
        assert_eq!(fetched.color, "bg-sky-500");
    }

    #[tokio::test]
    async fn test_create_validation() {
        let projects = service();
        let err = projects.create("ab", "bg-sky-500").await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Validation(ValidationError::TitleTooShort)
        ));

        let err = projects.create("valid title", "").await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Validation(ValidationError::MissingColor)
        ));
    }

    #[tokio::test]
    async fn test_update_refreshes_updated_at() {
        let projects = service();
        let created = projects.create("Before", "bg-red-500").await.unwrap();

        projects
            .update(&created.id, Some("After"), None)
            .await
            .unwrap();
        let fetched = projects.get(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched.title, "After");
        assert_eq!(fetched.color, "bg-red-500");
        assert!(fetched.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn test_delete_missing_children_is_clean() {
        let projects = service();
        let created = projects.create("Doomed", "bg-red-500").await.unwrap();

        let summary = projects.delete(&created.id).await.unwrap();
        assert!(!summary.is_partial());
        assert_eq!(summary.notes_deleted, 0);
        assert!(projects.get(&created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list() {
        let projects = service();
        projects.create("One", "bg-red-500").await.unwrap();
        projects.create("Two", "bg-sky-500").await.unwrap();
        assert_eq!(projects.list().await.unwrap().len(), 2);
    }
}
