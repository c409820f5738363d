//! CLI command implementations. Each `run_*` function opens a session,
//! performs one operation and prints the result to stdout.

use anyhow::{bail, Result};
use std::path::PathBuf;

use crate::config::Config;
use crate::kinds::{viewer_for, DocumentKind};
use crate::models::human_size;
use crate::session::{ExtractionOutcome, Session};

pub async fn run_init(config: &Config) -> Result<()> {
    let session = Session::open(config.clone()).await?;
    session.close().await;
    println!("Database initialized at {}", config.db.path.display());
    Ok(())
}

// ============ Classes ============

pub async fn run_class_add(config: &Config, name: &str, teacher: &str) -> Result<()> {
    let session = Session::open(config.clone()).await?;
    let id = session.store().add_class(name, teacher).await?;
    println!("class {} added: {}", id, name);
    session.close().await;
    Ok(())
}

pub async fn run_class_delete(config: &Config, class_id: i64) -> Result<()> {
    let session = Session::open(config.clone()).await?;
    session.store().delete_class(class_id).await?;
    println!("class {} deleted", class_id);
    session.close().await;
    Ok(())
}

pub async fn run_class_list(config: &Config) -> Result<()> {
    let session = Session::open(config.clone()).await?;
    let classes = session.store().list_classes().await?;
    if classes.is_empty() {
        println!("No classes.");
    }
    for class in classes {
        println!(
            "{}. {} ({})",
            class.id,
            class.name,
            class.teacher_name.as_deref().unwrap_or("-")
        );
    }
    session.close().await;
    Ok(())
}

// ============ Chapters ============

pub async fn run_chapter_add(config: &Config, class_id: i64, name: &str) -> Result<()> {
    let session = Session::open(config.clone()).await?;
    let id = session.store().add_chapter(class_id, name).await?;
    println!("chapter {} added: {}", id, name);
    session.close().await;
    Ok(())
}

pub async fn run_chapter_delete(config: &Config, chapter_id: i64) -> Result<()> {
    let session = Session::open(config.clone()).await?;
    session.store().delete_chapter(chapter_id).await?;
    println!("chapter {} deleted", chapter_id);
    session.close().await;
    Ok(())
}

// ============ Files ============

pub async fn run_file_add(
    config: &Config,
    chapter_id: i64,
    class_id: i64,
    paths: &[PathBuf],
) -> Result<()> {
    let session = Session::open(config.clone()).await?;
    let mut registered = 0usize;
    let mut extracted = 0usize;
    let mut skipped = 0usize;

    for path in paths {
        let added = match session.add_file_from_path(path, chapter_id, class_id).await {
            Ok(added) => added,
            Err(e) => {
                session.close().await;
                return Err(e);
            }
        };
        registered += 1;
        match &added.extraction {
            ExtractionOutcome::Stored { chars } => {
                extracted += 1;
                println!("{}. {} ({} chars of text)", added.file_id, added.name, chars);
            }
            ExtractionOutcome::Unsupported(tag) => {
                skipped += 1;
                println!(
                    "{}. {} (no text: unsupported type '{}')",
                    added.file_id, added.name, tag
                );
            }
            ExtractionOutcome::Failed(e) => {
                skipped += 1;
                println!("{}. {} (no text: {})", added.file_id, added.name, e);
            }
            ExtractionOutcome::NotStored(e) => {
                skipped += 1;
                println!("{}. {} (text not stored: {})", added.file_id, added.name, e);
            }
        }
    }

    println!("files registered: {}", registered);
    println!("text extracted: {}", extracted);
    println!("extraction skipped: {}", skipped);
    session.close().await;
    Ok(())
}

pub async fn run_file_delete(config: &Config, file_id: i64) -> Result<()> {
    let session = Session::open(config.clone()).await?;
    let result = session.store().delete_file(file_id).await;
    session.close().await;
    result?;
    println!("file {} deleted", file_id);
    Ok(())
}

pub async fn run_file_info(config: &Config, file_id: i64, json: bool) -> Result<()> {
    let session = Session::open(config.clone()).await?;
    let store = session.store();
    let Some(info) = store.get_file_info(file_id).await? else {
        session.close().await;
        bail!("No file with id {}", file_id);
    };
    let tags = store.list_tags_for_file(file_id).await?;
    let has_text = store.get_text_content(file_id).await?.is_some();
    session.close().await;

    let declared_type = info.declared_type.clone().unwrap_or_default();
    if json {
        let value = serde_json::json!({
            "id": file_id,
            "info": info,
            "tags": tags,
            "has_text": has_text,
            "viewer": viewer_for(&declared_type).to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("id: {}", file_id);
    println!("name: {}", info.name.as_deref().unwrap_or("(unnamed)"));
    println!("address: {}", info.address.as_deref().unwrap_or(""));
    println!(
        "type: {} [{}]",
        declared_type,
        DocumentKind::from_declared(&declared_type)
    );
    println!("size: {}", human_size(info.size));
    println!("viewer: {}", viewer_for(&declared_type));
    println!("text: {}", if has_text { "yes" } else { "no" });
    let tag_names: Vec<&str> = tags.iter().filter_map(|t| t.name.as_deref()).collect();
    println!("tags: {}", tag_names.join(", "));
    Ok(())
}

pub async fn run_file_list(config: &Config, class_id: i64) -> Result<()> {
    let session = Session::open(config.clone()).await?;
    let listing = session.store().list_files_by_class(class_id).await?;
    session.close().await;

    if listing.is_empty() {
        println!("No chapters.");
        return Ok(());
    }
    for entry in &listing.chapters {
        println!(
            "[{}] {} ({})",
            entry.chapter.id,
            entry.chapter.name.as_deref().unwrap_or("(unnamed)"),
            human_size(entry.chapter.total_size)
        );
        for file in &entry.files {
            println!(
                "    {}. {}  {}  {}",
                file.id,
                file.name.as_deref().unwrap_or("(unnamed)"),
                file.declared_type.as_deref().unwrap_or(""),
                human_size(file.size)
            );
        }
    }
    Ok(())
}

pub async fn run_file_reextract(config: &Config, file_id: i64) -> Result<()> {
    let session = Session::open(config.clone()).await?;
    let outcome = session.reextract(file_id).await;
    session.close().await;
    match outcome? {
        None => bail!("No file with id {}", file_id),
        Some(ExtractionOutcome::Stored { chars }) => println!("text stored: {} chars", chars),
        Some(ExtractionOutcome::Unsupported(tag)) => {
            println!("extraction skipped: unsupported type '{}'", tag)
        }
        Some(ExtractionOutcome::Failed(e)) => println!("extraction failed: {}", e),
        Some(ExtractionOutcome::NotStored(e)) => println!("text not stored: {}", e),
    }
    Ok(())
}

pub async fn run_text(config: &Config, file_id: i64) -> Result<()> {
    let session = Session::open(config.clone()).await?;
    let text = session.store().get_text_content(file_id).await?;
    session.close().await;
    match text {
        Some(text) => println!("{}", text),
        None => println!("No text stored for file {}.", file_id),
    }
    Ok(())
}

pub async fn run_listing(config: &Config) -> Result<()> {
    let session = Session::open(config.clone()).await?;
    let rows = session.store().list_all_files().await?;
    session.close().await;

    if rows.is_empty() {
        println!("No files.");
    }
    for row in rows {
        println!(
            "{} / {} / {}",
            row.class_name,
            row.chapter_name.as_deref().unwrap_or("(unnamed)"),
            row.file_name.as_deref().unwrap_or("(unnamed)")
        );
    }
    Ok(())
}

// ============ Tags ============

pub async fn run_tag_add(config: &Config, name: &str) -> Result<()> {
    let session = Session::open(config.clone()).await?;
    let id = session.store().add_tag(name).await?;
    println!("tag {} added: {}", id, name);
    session.close().await;
    Ok(())
}

pub async fn run_tag_delete(config: &Config, tag_id: i64) -> Result<()> {
    let session = Session::open(config.clone()).await?;
    session.store().delete_tag(tag_id).await?;
    println!("tag {} deleted", tag_id);
    session.close().await;
    Ok(())
}

pub async fn run_tag_list(config: &Config) -> Result<()> {
    let session = Session::open(config.clone()).await?;
    let tags = session.store().list_tags().await?;
    session.close().await;
    if tags.is_empty() {
        println!("No tags.");
    }
    for tag in tags {
        println!("{}. {}", tag.id, tag.name.as_deref().unwrap_or(""));
    }
    Ok(())
}

pub async fn run_tag_attach(config: &Config, file_id: i64, tag_id: i64) -> Result<()> {
    let session = Session::open(config.clone()).await?;
    let inserted = session.store().add_file_tag(file_id, tag_id).await?;
    session.close().await;
    if inserted {
        println!("tag {} attached to file {}", tag_id, file_id);
    } else {
        println!("tag {} already on file {}", tag_id, file_id);
    }
    Ok(())
}

pub async fn run_tag_detach(config: &Config, file_id: i64, tag_id: i64) -> Result<()> {
    let session = Session::open(config.clone()).await?;
    session.store().delete_file_tag(file_id, tag_id).await?;
    session.close().await;
    println!("tag {} detached from file {}", tag_id, file_id);
    Ok(())
}

pub async fn run_tag_show(config: &Config, file_id: i64) -> Result<()> {
    let session = Session::open(config.clone()).await?;
    let tags = session.store().list_tags_for_file(file_id).await?;
    session.close().await;
    if tags.is_empty() {
        println!("No tags.");
    }
    for tag in tags {
        println!("{}. {}", tag.id, tag.name.as_deref().unwrap_or(""));
    }
    Ok(())
}

// ============ Search ============

pub async fn run_search(config: &Config, keyword: &str, json: bool) -> Result<()> {
    let session = Session::open(config.clone()).await?;
    let results = session.search(keyword).await;
    session.close().await;
    let results = results?;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, result) in results.iter().enumerate() {
        println!(
            "{}. {} ({})",
            i + 1,
            result.file_name.as_deref().unwrap_or("(unnamed)"),
            human_size(result.file_size)
        );
        println!("    path: {}", result.file_address.as_deref().unwrap_or(""));
        println!("    excerpt: \"{}\"", result.snippet);
        println!("    id: {}", result.file_id);
        println!();
    }
    Ok(())
}
