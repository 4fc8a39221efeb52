//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use chrono::{DateTime, Utc};
use nook_core::{Note, Project, Resource};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Render a timestamp the way the app does ("Sep 27, 10:25 AM").
pub fn format_date(at: DateTime<Utc>) -> String {
    at.format("%b %d, %I:%M %p").to_string()
}

/// Output helper for consistent formatting
pub struct Output {
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    /// Print a success message (suppressed in quiet mode)
    pub fn success(&self, message: &str) {
        if !self.is_quiet() {
            println!("{}", message);
        }
    }

    pub fn print_project(&self, project: &Project) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:        {}", project.id);
                println!("Title:     {}", project.title);
                println!("Color:     {}", project.color);
                println!(
                    "Children:  {} notes, {} resources",
                    project.note_count, project.resource_count
                );
                println!("Updated:   {}", format_date(project.updated_at));
            }
            OutputFormat::Json => print_json(project),
            OutputFormat::Quiet => println!("{}", project.id),
        }
    }

    pub fn print_projects(&self, projects: &[Project]) {
        match self.format {
            OutputFormat::Human => {
                if projects.is_empty() {
                    println!("No project yet. Create your first project to get started.");
                    return;
                }
                for project in projects {
                    println!(
                        "{}  {}  ({} notes, {} resources)",
                        project.id, project.title, project.note_count, project.resource_count
                    );
                }
            }
            OutputFormat::Json => print_json(projects),
            OutputFormat::Quiet => {
                for project in projects {
                    println!("{}", project.id);
                }
            }
        }
    }

    pub fn print_note(&self, note: &Note) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:           {}", note.id);
                println!("Title:        {}", note.title);
                println!("Last updated: {}", format_date(note.created_at));
                let body = note.preview();
                if !body.is_empty() {
                    println!();
                    println!("{}", body);
                }
            }
            OutputFormat::Json => print_json(note),
            OutputFormat::Quiet => println!("{}", note.id),
        }
    }

    pub fn print_notes(&self, notes: &[Note]) {
        match self.format {
            OutputFormat::Human => {
                if notes.is_empty() {
                    println!("No notes.");
                    return;
                }
                for note in notes {
                    let preview = truncate(&note.preview(), 60);
                    println!(
                        "{}  {}  {}  {}",
                        note.id,
                        note.title,
                        format_date(note.created_at),
                        preview
                    );
                }
            }
            OutputFormat::Json => print_json(notes),
            OutputFormat::Quiet => {
                for note in notes {
                    println!("{}", note.id);
                }
            }
        }
    }

    pub fn print_resources(&self, resources: &[Resource]) {
        match self.format {
            OutputFormat::Human => {
                if resources.is_empty() {
                    println!("No resources.");
                    return;
                }
                for resource in resources {
                    match &resource.url {
                        Some(url) => println!("{}  {}  {}", resource.id, resource.title, url),
                        None => println!("{}  {}", resource.id, resource.title),
                    }
                }
            }
            OutputFormat::Json => print_json(resources),
            OutputFormat::Quiet => {
                for resource in resources {
                    println!("{}", resource.id);
                }
            }
        }
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(err) => eprintln!("Failed to encode output: {}", err),
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}…", cut)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_flags() {
        assert_eq!(OutputFormat::from_flags(false, false), OutputFormat::Human);
        assert_eq!(OutputFormat::from_flags(true, false), OutputFormat::Json);
        // Quiet wins over json
        assert_eq!(OutputFormat::from_flags(true, true), OutputFormat::Quiet);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("exactly-10", 10), "exactly-10");
        assert_eq!(truncate("this is too long", 7), "this is…");
    }

    #[test]
    fn test_format_date() {
        let at = DateTime::from_timestamp(1_695_810_300, 0).unwrap();
        assert_eq!(format_date(at), "Sep 27, 10:25 AM");
    }
}
