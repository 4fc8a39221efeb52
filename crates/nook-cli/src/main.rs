//! nook CLI
//!
//! Command-line interface for nook - project-organized notes with
//! rich-text content and reference resources.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use nook_core::{
    Config, DocumentStore, FileStore, NoteService, ProjectService, ResourceService,
};

mod commands;
mod output;

use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "nook")]
#[command(about = "nook - organize notes and resources into projects")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage projects
    Project {
        #[command(subcommand)]
        command: ProjectCommands,
    },
    /// Manage notes within a project
    Note {
        #[command(subcommand)]
        command: NoteCommands,
    },
    /// Manage resources within a project
    Resource {
        #[command(subcommand)]
        command: ResourceCommands,
    },
    /// Show cross-project totals
    Status,
    /// Show or locate configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ProjectCommands {
    /// Create a new project
    #[command(alias = "add")]
    Create {
        /// Project name (3-50 characters)
        title: String,
        /// Color tag for the project
        #[arg(short, long, default_value = "bg-sky-500")]
        color: String,
    },
    /// List all projects
    #[command(alias = "ls")]
    List,
    /// Show project details
    Show {
        /// Project ID
        id: String,
    },
    /// Delete a project and everything in it
    #[command(alias = "rm")]
    Delete {
        /// Project ID
        id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum NoteCommands {
    /// Create a new note
    #[command(alias = "add")]
    Create {
        /// Project ID
        project_id: String,
        /// Note title (3-50 characters)
        title: String,
    },
    /// List notes in a project
    #[command(alias = "ls")]
    List {
        /// Project ID
        project_id: String,
    },
    /// Show a note with its plain-text body
    Show {
        /// Project ID
        project_id: String,
        /// Note ID
        note_id: String,
    },
    /// Replace a note's body from stdin
    Edit {
        /// Project ID
        project_id: String,
        /// Note ID
        note_id: String,
        /// New title
        #[arg(short = 'T', long)]
        title: Option<String>,
    },
    /// Delete a note
    #[command(alias = "rm")]
    Delete {
        /// Project ID
        project_id: String,
        /// Note ID
        note_id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Search notes by title or content
    Search {
        /// Project ID
        project_id: String,
        /// Search query
        query: String,
    },
}

#[derive(Subcommand)]
enum ResourceCommands {
    /// Add a resource to a project
    #[command(alias = "add")]
    Create {
        /// Project ID
        project_id: String,
        /// Resource title (3-50 characters)
        title: String,
        /// Resource URL
        #[arg(short, long)]
        url: Option<String>,
    },
    /// List resources in a project
    #[command(alias = "ls")]
    List {
        /// Project ID
        project_id: String,
    },
    /// Delete a resource
    #[command(alias = "rm")]
    Delete {
        /// Project ID
        project_id: String,
        /// Resource ID
        resource_id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Print the config file path
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    let config = Config::load().context("Failed to load configuration")?;

    // Config commands don't need the store
    if let Commands::Config { command } = &cli.command {
        return handle_config_command(command.clone(), &config);
    }

    config.ensure_data_dir()?;
    let store: Arc<dyn DocumentStore> = Arc::new(
        FileStore::open(config.store_path()).context("Failed to open data store")?,
    );
    let projects = ProjectService::new(Arc::clone(&store));
    let notes = NoteService::new(Arc::clone(&store));
    let resources = ResourceService::new(Arc::clone(&store));

    match cli.command {
        Commands::Project { command } => match command {
            ProjectCommands::Create { title, color } => {
                commands::project::create(&projects, title, color, &output).await
            }
            ProjectCommands::List => commands::project::list(&projects, &output).await,
            ProjectCommands::Show { id } => commands::project::show(&projects, id, &output).await,
            ProjectCommands::Delete { id, yes } => {
                commands::project::delete(&projects, id, yes, &output).await
            }
        },
        Commands::Note { command } => match command {
            NoteCommands::Create { project_id, title } => {
                commands::note::create(&notes, project_id, title, &output).await
            }
            NoteCommands::List { project_id } => {
                commands::note::list(&notes, project_id, &output).await
            }
            NoteCommands::Show {
                project_id,
                note_id,
            } => commands::note::show(&notes, project_id, note_id, &output).await,
            NoteCommands::Edit {
                project_id,
                note_id,
                title,
            } => commands::note::edit(store, project_id, note_id, title, &output).await,
            NoteCommands::Delete {
                project_id,
                note_id,
                yes,
            } => commands::note::delete(&notes, project_id, note_id, yes, &output).await,
            NoteCommands::Search { project_id, query } => {
                commands::note::search(&notes, project_id, query, &output).await
            }
        },
        Commands::Resource { command } => match command {
            ResourceCommands::Create {
                project_id,
                title,
                url,
            } => commands::resource::create(&resources, project_id, title, url, &output).await,
            ResourceCommands::List { project_id } => {
                commands::resource::list(&resources, project_id, &output).await
            }
            ResourceCommands::Delete {
                project_id,
                resource_id,
                yes,
            } => {
                commands::resource::delete(&resources, project_id, resource_id, yes, &output).await
            }
        },
        Commands::Status => commands::project::status(&projects, &output).await,
        Commands::Config { .. } => unreachable!(), // Handled above
    }
}

fn handle_config_command(command: ConfigCommands, config: &Config) -> Result<()> {
    match command {
        ConfigCommands::Show => {
            println!("data_dir            = {}", config.data_dir.display());
            println!("content_debounce_ms = {}", config.content_debounce_ms);
            println!("title_debounce_ms   = {}", config.title_debounce_ms);
            println!("history_limit       = {}", config.history_limit);
        }
        ConfigCommands::Path => {
            println!("{}", Config::config_file_path().display());
        }
    }
    Ok(())
}
