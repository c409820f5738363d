//! # Corpora CLI (`corpora`)
//!
//! Manage a course-material corpus from the command line: classes,
//! chapters, files with extracted text, tags, and keyword search.
//!
//! ```bash
//! corpora --config ./config/corpora.toml <command>
//! ```
//!
//! ## Examples
//!
//! ```bash
//! corpora init
//! corpora class add "Operating Systems" --teacher "Tanenbaum"
//! corpora chapter add 1 "Processes"
//! corpora file add 1 1 ~/notes/scheduling.pdf ~/notes/threads.md
//! corpora search "round robin"
//! ```
//!
//! Logging goes to stderr and is controlled with `RUST_LOG`
//! (default `warn`).

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use corpora::{commands, config};

/// Corpora: classes, chapters, files, tags and full-text search over
/// extracted course material.
#[derive(Parser)]
#[command(name = "corpora", version)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/corpora.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database and schema. Safe to run more than once.
    Init,

    /// Manage classes.
    Class {
        #[command(subcommand)]
        action: ClassAction,
    },

    /// Manage chapters.
    Chapter {
        #[command(subcommand)]
        action: ChapterAction,
    },

    /// Manage files.
    File {
        #[command(subcommand)]
        action: FileAction,
    },

    /// Manage tags and their attachment to files.
    Tag {
        #[command(subcommand)]
        action: TagAction,
    },

    /// Print the extracted text of a file.
    Text { file_id: i64 },

    /// Search extracted text.
    Search {
        keyword: String,

        /// Print results as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List every file as `class / chapter / file`.
    Ls,
}

#[derive(Subcommand)]
enum ClassAction {
    Add {
        name: String,
        #[arg(long, default_value = "")]
        teacher: String,
    },
    /// Delete a class with all of its chapters and files.
    Delete { class_id: i64 },
    List,
}

#[derive(Subcommand)]
enum ChapterAction {
    Add { class_id: i64, name: String },
    /// Delete a chapter with all of its files.
    Delete { chapter_id: i64 },
}

#[derive(Subcommand)]
enum FileAction {
    /// Register files under a chapter and extract their text.
    Add {
        chapter_id: i64,
        class_id: i64,
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    Delete {
        file_id: i64,
    },
    Info {
        file_id: i64,
        #[arg(long)]
        json: bool,
    },
    /// List the chapters and files of a class.
    List {
        class_id: i64,
    },
    /// Extract a registered file's text again from its stored path.
    Reextract {
        file_id: i64,
    },
}

#[derive(Subcommand)]
enum TagAction {
    Add { name: String },
    Delete { tag_id: i64 },
    List,
    Attach { file_id: i64, tag_id: i64 },
    Detach { file_id: i64, tag_id: i64 },
    /// List the tags of a file.
    Show { file_id: i64 },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => commands::run_init(&cfg).await?,
        Commands::Class { action } => match action {
            ClassAction::Add { name, teacher } => {
                commands::run_class_add(&cfg, &name, &teacher).await?
            }
            ClassAction::Delete { class_id } => commands::run_class_delete(&cfg, class_id).await?,
            ClassAction::List => commands::run_class_list(&cfg).await?,
        },
        Commands::Chapter { action } => match action {
            ChapterAction::Add { class_id, name } => {
                commands::run_chapter_add(&cfg, class_id, &name).await?
            }
            ChapterAction::Delete { chapter_id } => {
                commands::run_chapter_delete(&cfg, chapter_id).await?
            }
        },
        Commands::File { action } => match action {
            FileAction::Add {
                chapter_id,
                class_id,
                paths,
            } => commands::run_file_add(&cfg, chapter_id, class_id, &paths).await?,
            FileAction::Delete { file_id } => commands::run_file_delete(&cfg, file_id).await?,
            FileAction::Info { file_id, json } => {
                commands::run_file_info(&cfg, file_id, json).await?
            }
            FileAction::List { class_id } => commands::run_file_list(&cfg, class_id).await?,
            FileAction::Reextract { file_id } => {
                commands::run_file_reextract(&cfg, file_id).await?
            }
        },
        Commands::Tag { action } => match action {
            TagAction::Add { name } => commands::run_tag_add(&cfg, &name).await?,
            TagAction::Delete { tag_id } => commands::run_tag_delete(&cfg, tag_id).await?,
            TagAction::List => commands::run_tag_list(&cfg).await?,
            TagAction::Attach { file_id, tag_id } => {
                commands::run_tag_attach(&cfg, file_id, tag_id).await?
            }
            TagAction::Detach { file_id, tag_id } => {
                commands::run_tag_detach(&cfg, file_id, tag_id).await?
            }
            TagAction::Show { file_id } => commands::run_tag_show(&cfg, file_id).await?,
        },
        Commands::Text { file_id } => commands::run_text(&cfg, file_id).await?,
        Commands::Search { keyword, json } => commands::run_search(&cfg, &keyword, json).await?,
        Commands::Ls => commands::run_listing(&cfg).await?,
    }

    Ok(())
}
