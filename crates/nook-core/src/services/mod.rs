//! Entity services
//!
//! Request/response glue between callers and the document store: field
//! validation, denormalized counter upkeep, cascade deletes, and substring
//! search. Services are stateless handles over a shared store; callers
//! refetch whatever they display after a write rather than reloading
//! everything.

mod note;
mod project;
mod resource;

pub use note::NoteService;
pub use project::{CascadeSummary, ProjectService};
pub use resource::{ResourceService, ResourceUpdate};

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::models::ModelError;
use crate::store::StoreError;

pub(crate) const PROJECTS: &str = "projects";
pub(crate) const NOTES: &str = "notes";
pub(crate) const RESOURCES: &str = "resources";

const TITLE_MIN_CHARS: usize = 3;
const TITLE_MAX_CHARS: usize = 50;

static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://\S+$").expect("url regex"));

/// Form input failures, surfaced inline at the offending field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Title must be at least 3 characters")]
    TitleTooShort,

    #[error("Title up to 50 characters")]
    TitleTooLong,

    #[error("You must choose a color")]
    MissingColor,

    #[error("Enter a valid http(s) URL")]
    InvalidUrl,
}

/// Errors from service operations.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("note not found: {0}")]
    NoteNotFound(String),
}

pub(crate) fn validate_title(title: &str) -> Result<(), ValidationError> {
    let chars = title.chars().count();
    if chars < TITLE_MIN_CHARS {
        return Err(ValidationError::TitleTooShort);
    }
    if chars > TITLE_MAX_CHARS {
        return Err(ValidationError::TitleTooLong);
    }
    Ok(())
}

pub(crate) fn validate_color(color: &str) -> Result<(), ValidationError> {
    if color.is_empty() {
        return Err(ValidationError::MissingColor);
    }
    Ok(())
}

pub(crate) fn validate_url(url: &str) -> Result<(), ValidationError> {
    if URL_RE.is_match(url) {
        Ok(())
    } else {
        Err(ValidationError::InvalidUrl)
    }
}
