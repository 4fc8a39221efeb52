//! Resource command handlers

use anyhow::{Context, Result};

use nook_core::ResourceService;

use crate::commands::confirm;
use crate::output::Output;

pub async fn create(
    resources: &ResourceService,
    project_id: String,
    title: String,
    url: Option<String>,
    output: &Output,
) -> Result<()> {
    let resource = resources
        .create(&project_id, &title, url.as_deref())
        .await
        .context("Failed to create resource")?;

    output.success(&format!("Created resource: {}", resource.id));
    Ok(())
}

pub async fn list(
    resources: &ResourceService,
    project_id: String,
    output: &Output,
) -> Result<()> {
    let all = resources
        .list(&project_id)
        .await
        .context("Failed to list resources")?;
    output.print_resources(&all);
    Ok(())
}

pub async fn delete(
    resources: &ResourceService,
    project_id: String,
    resource_id: String,
    assume_yes: bool,
    output: &Output,
) -> Result<()> {
    if !confirm("Delete this resource?", assume_yes)? {
        output.success("Cancelled");
        return Ok(());
    }

    resources
        .delete(&project_id, &resource_id)
        .await
        .context("Failed to delete resource")?;
    output.success(&format!("Deleted resource {}", resource_id));
    Ok(())
}
