//! Schema creation. Every statement is idempotent, so running the
//! migrations against an existing database is safe.
//!
//! Relationships are declared as foreign keys without `ON DELETE CASCADE`:
//! removing a parent row is always done by [`crate::store::CorpusStore`]
//! deleting the children first, inside one transaction.

use anyhow::Result;
use sqlx::SqlitePool;

pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS classes (
            class_id INTEGER PRIMARY KEY AUTOINCREMENT,
            class_name TEXT NOT NULL,
            teacher_name TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    // The (chapter_id, classes_class_id) pair is unique so files can
    // reference it as a composite key; a file's class always matches its
    // chapter's class.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS chapters (
            chapter_id INTEGER PRIMARY KEY AUTOINCREMENT,
            chapter_name TEXT,
            total_size INTEGER NOT NULL DEFAULT 0,
            classes_class_id INTEGER NOT NULL,
            UNIQUE(chapter_id, classes_class_id),
            FOREIGN KEY (classes_class_id) REFERENCES classes(class_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS files (
            file_id INTEGER PRIMARY KEY AUTOINCREMENT,
            file_name TEXT,
            file_address TEXT,
            file_type TEXT,
            file_size INTEGER NOT NULL DEFAULT 0,
            chapters_chapter_id INTEGER NOT NULL,
            chapters_classes_class_id INTEGER NOT NULL,
            FOREIGN KEY (chapters_chapter_id, chapters_classes_class_id)
                REFERENCES chapters(chapter_id, classes_class_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS textfiles (
            files_file_id INTEGER NOT NULL UNIQUE,
            content TEXT NOT NULL,
            FOREIGN KEY (files_file_id) REFERENCES files(file_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tagname (
            tag_id INTEGER PRIMARY KEY AUTOINCREMENT,
            tag_name TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS filetag (
            files_file_id INTEGER NOT NULL,
            tagname_tag_id INTEGER NOT NULL,
            UNIQUE(files_file_id, tagname_tag_id),
            FOREIGN KEY (files_file_id) REFERENCES files(file_id),
            FOREIGN KEY (tagname_tag_id) REFERENCES tagname(tag_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // FTS5 CREATE is not idempotent natively, so we check first
    let fts_exists: bool = sqlx::query_scalar(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='textfiles_fts'",
    )
    .fetch_one(pool)
    .await?;

    if !fts_exists {
        sqlx::query(
            r#"
            CREATE VIRTUAL TABLE textfiles_fts USING fts5(
                files_file_id UNINDEXED,
                content
            )
            "#,
        )
        .execute(pool)
        .await?;
    }

    sqlx::query(
        r#"
        CREATE VIEW IF NOT EXISTS allfiles AS
        SELECT c.class_name AS class_name,
               ch.chapter_name AS chapter_name,
               f.file_name AS file_name
        FROM files f
        JOIN chapters ch
          ON ch.chapter_id = f.chapters_chapter_id
         AND ch.classes_class_id = f.chapters_classes_class_id
        JOIN classes c ON c.class_id = ch.classes_class_id
        ORDER BY c.class_id, ch.chapter_id, f.file_id
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_chapters_class ON chapters(classes_class_id)")
        .execute(pool)
        .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_files_chapter ON files(chapters_chapter_id, chapters_classes_class_id)",
    )
    .execute(pool)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_files_class ON files(chapters_classes_class_id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_filetag_tag ON filetag(tagname_tag_id)")
        .execute(pool)
        .await?;

    Ok(())
}
