//! Resource operations
//!
//! Resources are reference links stored under a project, mirroring notes:
//! creation and deletion keep the project's `resourceCount` in step via
//! atomic increments.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;

use crate::models::{keys, timestamp_value, Resource};
use crate::store::{CollectionPath, DocumentStore, Fields};

use super::{validate_title, validate_url, ServiceError, PROJECTS, RESOURCES};

/// Partial update for a resource.
#[derive(Debug, Clone, Default)]
pub struct ResourceUpdate {
    pub title: Option<String>,
    pub url: Option<String>,
}

#[derive(Clone)]
pub struct ResourceService {
    store: Arc<dyn DocumentStore>,
}

impl ResourceService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    fn collection(&self, project_id: &str) -> Result<CollectionPath, ServiceError> {
        Ok(CollectionPath::new(PROJECTS)?
            .entity(project_id)
            .collection(RESOURCES))
    }

    pub async fn create(
        &self,
        project_id: &str,
        title: &str,
        url: Option<&str>,
    ) -> Result<Resource, ServiceError> {
        validate_title(title)?;
        if let Some(url) = url {
            validate_url(url)?;
        }

        let now = Utc::now();
        let mut fields = Fields::new();
        fields.insert(keys::TITLE.to_string(), Value::from(title));
        if let Some(url) = url {
            fields.insert(keys::URL.to_string(), Value::from(url));
        }
        fields.insert(keys::CREATED_AT.to_string(), timestamp_value(now));

        let collection = self.collection(project_id)?;
        let id = self.store.create(&collection, fields).await.map_err(|err| {
            tracing::error!("failed to create resource in project {project_id}: {err}");
            err
        })?;

        let project_path = CollectionPath::new(PROJECTS)?.entity(project_id);
        self.store
            .increment(&project_path, keys::RESOURCE_COUNT, 1)
            .await
            .map_err(|err| {
                tracing::error!("failed to bump resource count for project {project_id}: {err}");
                err
            })?;

        Ok(Resource {
            id,
            title: title.to_string(),
            url: url.map(str::to_string),
            created_at: now,
        })
    }

    pub async fn list(&self, project_id: &str) -> Result<Vec<Resource>, ServiceError> {
        let collection = self.collection(project_id)?;
        let entities = self.store.list(&collection).await.map_err(|err| {
            tracing::error!("failed to list resources for project {project_id}: {err}");
            err
        })?;
        let mut resources = Vec::with_capacity(entities.len());
        for entity in &entities {
            resources.push(Resource::from_entity(entity)?);
        }
        Ok(resources)
    }

    pub async fn update(
        &self,
        project_id: &str,
        resource_id: &str,
        update: ResourceUpdate,
    ) -> Result<(), ServiceError> {
        let mut fields = Fields::new();
        if let Some(title) = &update.title {
            validate_title(title)?;
            fields.insert(keys::TITLE.to_string(), Value::from(title.as_str()));
        }
        if let Some(url) = &update.url {
            validate_url(url)?;
            fields.insert(keys::URL.to_string(), Value::from(url.as_str()));
        }
        if fields.is_empty() {
            return Ok(());
        }

        let path = self.collection(project_id)?.entity(resource_id);
        self.store.update(&path, fields).await.map_err(|err| {
            tracing::error!("failed to update resource {resource_id}: {err}");
            err.into()
        })
    }

    pub async fn delete(&self, project_id: &str, resource_id: &str) -> Result<(), ServiceError> {
        let path = self.collection(project_id)?.entity(resource_id);
        self.store.delete(&path).await.map_err(|err| {
            tracing::error!("failed to delete resource {resource_id}: {err}");
            err
        })?;

        let project_path = CollectionPath::new(PROJECTS)?.entity(project_id);
        self.store
            .increment(&project_path, keys::RESOURCE_COUNT, -1)
            .await
            .map_err(|err| {
                tracing::error!("failed to drop resource count for project {project_id}: {err}");
                err
            })?;
        Ok(())
    }
}
