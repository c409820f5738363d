//! Core data models for the corpus hierarchy.
//!
//! Identifiers are SQLite rowids. A [`FileRecord`] carries both its chapter
//! and its class; the class is copied from the chapter at insert time and is
//! never edited on its own.

use serde::Serialize;

/// Top-level grouping of course content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Class {
    pub id: i64,
    pub name: String,
    pub teacher_name: Option<String>,
}

/// A sub-grouping of files within a class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chapter {
    pub id: i64,
    pub name: Option<String>,
    /// Sum of the sizes of the files currently under this chapter.
    pub total_size: i64,
    pub class_id: i64,
}

/// A registered file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    pub id: i64,
    pub name: Option<String>,
    pub address: Option<String>,
    pub declared_type: Option<String>,
    pub size: i64,
    pub chapter_id: i64,
    pub class_id: i64,
}

/// Input for [`CorpusStore::add_file`](crate::store::CorpusStore::add_file).
#[derive(Debug, Clone)]
pub struct NewFile {
    pub name: String,
    pub address: String,
    pub declared_type: String,
    pub size: i64,
    pub chapter_id: i64,
    pub class_id: i64,
}

/// Display metadata for a single file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileInfo {
    pub name: Option<String>,
    pub address: Option<String>,
    pub declared_type: Option<String>,
    pub size: i64,
}

/// A user-defined label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tag {
    pub id: i64,
    pub name: Option<String>,
}

/// A chapter together with the files registered under it.
#[derive(Debug, Clone, Serialize)]
pub struct ChapterFiles {
    pub chapter: Chapter,
    pub files: Vec<FileRecord>,
}

/// Every chapter of one class, in id order, each with its files.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ClassFiles {
    pub chapters: Vec<ChapterFiles>,
}

impl ClassFiles {
    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }

    pub fn file_count(&self) -> usize {
        self.chapters.iter().map(|c| c.files.len()).sum()
    }
}

/// One row of the flattened `allfiles` listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingRow {
    pub class_name: String,
    pub chapter_name: Option<String>,
    pub file_name: Option<String>,
}

/// Format a byte count as `B`, `KB`, `MB` or `GB`, rounded to two decimals.
/// Scaled values always carry a fractional part (`1.0KB`, `1.5KB`, `1.21KB`).
pub fn human_size(size: i64) -> String {
    const KB: f64 = 1024.0;
    let bytes = size.max(0);
    let value = bytes as f64;
    if bytes < 1024 {
        format!("{}B", bytes)
    } else if value < KB * KB {
        format!("{}KB", round2(value / KB))
    } else if value < KB * KB * KB {
        format!("{}MB", round2(value / KB / KB))
    } else {
        format!("{}GB", round2(value / KB / KB / KB))
    }
}

fn round2(v: f64) -> String {
    let rounded = (v * 100.0).round() / 100.0;
    if rounded.fract() == 0.0 {
        format!("{:.1}", rounded)
    } else {
        rounded.to_string()
    }
}
