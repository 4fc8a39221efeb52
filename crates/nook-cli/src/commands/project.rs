//! Project command handlers

use anyhow::{Context, Result};

use nook_core::ProjectService;

use crate::commands::confirm;
use crate::output::Output;

pub async fn create(
    projects: &ProjectService,
    title: String,
    color: String,
    output: &Output,
) -> Result<()> {
    let project = projects
        .create(&title, &color)
        .await
        .context("Failed to create project")?;

    output.success(&format!("Created project: {}", project.id));
    output.print_project(&project);
    Ok(())
}

pub async fn list(projects: &ProjectService, output: &Output) -> Result<()> {
    let all = projects.list().await.context("Failed to list projects")?;
    output.print_projects(&all);
    Ok(())
}

pub async fn show(projects: &ProjectService, id: String, output: &Output) -> Result<()> {
    let project = projects
        .get(&id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Project not found: {}", id))?;
    output.print_project(&project);
    Ok(())
}

/// Delete a project and everything under it.
pub async fn delete(
    projects: &ProjectService,
    id: String,
    assume_yes: bool,
    output: &Output,
) -> Result<()> {
    let project = projects
        .get(&id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Project not found: {}", id))?;

    let prompt = format!(
        "Delete project '{}' with {} notes and {} resources?",
        project.title, project.note_count, project.resource_count
    );
    if !confirm(&prompt, assume_yes)? {
        output.success("Cancelled");
        return Ok(());
    }

    let summary = projects
        .delete(&id)
        .await
        .context("Failed to delete project")?;

    if summary.is_partial() {
        output.success(&format!(
            "Deleted project {} ({} children could not be removed)",
            id, summary.failures
        ));
    } else {
        output.success(&format!(
            "Deleted project {} ({} notes, {} resources)",
            id, summary.notes_deleted, summary.resources_deleted
        ));
    }
    Ok(())
}

/// Cross-project totals for the status line.
pub async fn status(projects: &ProjectService, output: &Output) -> Result<()> {
    let totals = projects
        .observe_totals()
        .await
        .context("Failed to read totals")?;
    let aggregate = totals.borrow().clone();
    output.success(&format!(
        "{} projects · {} total notes · {} total resources",
        aggregate.count,
        aggregate.sum("noteCount"),
        aggregate.sum("resourceCount"),
    ));
    Ok(())
}
