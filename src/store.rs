//! The corpus store: classes, chapters, files, extracted text and tags.
//!
//! [`CorpusStore`] is the only writer of the hierarchy. Every operation that
//! touches more than one row runs inside a single transaction: the
//! transaction is committed only after its last statement succeeds, and an
//! early return drops it, which rolls everything back.
//!
//! # Cascades
//!
//! Deletes never rely on `ON DELETE CASCADE`. Removing a class, chapter or
//! file runs the same ordered sequence, children first:
//!
//! ```text
//! filetag → textfiles_fts → textfiles → files → (chapters → classes)
//! ```
//!
//! # Chapter sizes
//!
//! `chapters.total_size` is a cache of the sum of its files' sizes. It is
//! recomputed from the `files` rows by [`update_total_size`] inside every
//! transaction that adds or removes a file, and never patched by deltas.

use anyhow::Result;
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::config::DbConfig;
use crate::db;
use crate::error::{StoreError, StoreResult};
use crate::migrate;
use crate::models::{
    Chapter, ChapterFiles, Class, ClassFiles, FileInfo, FileRecord, ListingRow, NewFile, Tag,
};

/// Handle to an open corpus database.
pub struct CorpusStore {
    pool: SqlitePool,
}

/// The set of files a cascade applies to.
#[derive(Debug, Clone, Copy)]
enum FileScope {
    Class(i64),
    Chapter(i64),
    File(i64),
}

impl FileScope {
    fn column(self) -> &'static str {
        match self {
            FileScope::Class(_) => "chapters_classes_class_id",
            FileScope::Chapter(_) => "chapters_chapter_id",
            FileScope::File(_) => "file_id",
        }
    }

    fn id(self) -> i64 {
        match self {
            FileScope::Class(id) | FileScope::Chapter(id) | FileScope::File(id) => id,
        }
    }
}

fn tx_err(operation: &'static str) -> impl FnOnce(sqlx::Error) -> StoreError {
    move |e| StoreError::in_transaction(operation, e)
}

impl CorpusStore {
    /// Open the configured database file and bring its schema up to date.
    pub async fn open(config: &DbConfig) -> Result<Self> {
        let pool = db::connect(config).await?;
        migrate::run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    /// Open a fresh, private in-memory corpus.
    pub async fn open_in_memory() -> Result<Self> {
        let pool = db::connect_in_memory().await?;
        migrate::run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    /// Wrap an existing pool. The schema must already exist.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Release the connection. Further calls fail with
    /// [`StoreError::Connectivity`].
    pub async fn close(&self) {
        self.pool.close().await;
    }

    // ============ Classes ============

    pub async fn add_class(&self, name: &str, teacher_name: &str) -> StoreResult<i64> {
        if name.trim().is_empty() {
            return Err(StoreError::Validation(
                "class name must not be empty".to_string(),
            ));
        }

        let result = sqlx::query("INSERT INTO classes (class_name, teacher_name) VALUES (?, ?)")
            .bind(name)
            .bind(teacher_name)
            .execute(&self.pool)
            .await?;

        let id = result.last_insert_rowid();
        debug!(class_id = id, name, "class added");
        Ok(id)
    }

    pub async fn delete_class(&self, class_id: i64) -> StoreResult<()> {
        const OP: &str = "delete_class";
        let mut tx = self.pool.begin().await?;

        delete_files_in(&mut tx, FileScope::Class(class_id))
            .await
            .map_err(tx_err(OP))?;
        sqlx::query("DELETE FROM chapters WHERE classes_class_id = ?")
            .bind(class_id)
            .execute(&mut *tx)
            .await
            .map_err(tx_err(OP))?;
        sqlx::query("DELETE FROM classes WHERE class_id = ?")
            .bind(class_id)
            .execute(&mut *tx)
            .await
            .map_err(tx_err(OP))?;

        tx.commit().await.map_err(tx_err(OP))?;
        debug!(class_id, "class deleted");
        Ok(())
    }

    pub async fn list_classes(&self) -> StoreResult<Vec<Class>> {
        let rows =
            sqlx::query("SELECT class_id, class_name, teacher_name FROM classes ORDER BY class_id")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows
            .iter()
            .map(|row| Class {
                id: row.get("class_id"),
                name: row.get("class_name"),
                teacher_name: row.get("teacher_name"),
            })
            .collect())
    }

    // ============ Chapters ============

    pub async fn add_chapter(&self, class_id: i64, name: &str) -> StoreResult<i64> {
        let result = sqlx::query(
            "INSERT INTO chapters (chapter_name, total_size, classes_class_id) VALUES (?, 0, ?)",
        )
        .bind(name)
        .bind(class_id)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        debug!(chapter_id = id, class_id, "chapter added");
        Ok(id)
    }

    pub async fn delete_chapter(&self, chapter_id: i64) -> StoreResult<()> {
        const OP: &str = "delete_chapter";
        let mut tx = self.pool.begin().await?;

        delete_files_in(&mut tx, FileScope::Chapter(chapter_id))
            .await
            .map_err(tx_err(OP))?;
        sqlx::query("DELETE FROM chapters WHERE chapter_id = ?")
            .bind(chapter_id)
            .execute(&mut *tx)
            .await
            .map_err(tx_err(OP))?;

        tx.commit().await.map_err(tx_err(OP))?;
        debug!(chapter_id, "chapter deleted");
        Ok(())
    }

    pub async fn get_chapter(&self, chapter_id: i64) -> StoreResult<Option<Chapter>> {
        let row = sqlx::query(
            "SELECT chapter_id, chapter_name, total_size, classes_class_id FROM chapters WHERE chapter_id = ?",
        )
        .bind(chapter_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(chapter_from_row))
    }

    pub async fn list_chapters(&self, class_id: i64) -> StoreResult<Vec<Chapter>> {
        let rows = sqlx::query(
            r#"
            SELECT chapter_id, chapter_name, total_size, classes_class_id
            FROM chapters
            WHERE classes_class_id = ?
            ORDER BY chapter_id
            "#,
        )
        .bind(class_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(chapter_from_row).collect())
    }

    // ============ Files ============

    /// Register a file under a chapter and refresh the chapter's size.
    ///
    /// The chapter must exist and belong to `file.class_id`.
    pub async fn add_file(&self, file: &NewFile) -> StoreResult<i64> {
        const OP: &str = "add_file";
        if file.size < 0 {
            return Err(StoreError::Validation(format!(
                "file size must not be negative (got {})",
                file.size
            )));
        }

        let mut tx = self.pool.begin().await?;

        let owner: Option<i64> =
            sqlx::query_scalar("SELECT classes_class_id FROM chapters WHERE chapter_id = ?")
                .bind(file.chapter_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(tx_err(OP))?;
        match owner {
            None => {
                return Err(StoreError::Validation(format!(
                    "chapter {} does not exist",
                    file.chapter_id
                )))
            }
            Some(class_id) if class_id != file.class_id => {
                return Err(StoreError::Validation(format!(
                    "chapter {} belongs to class {}, not class {}",
                    file.chapter_id, class_id, file.class_id
                )))
            }
            Some(_) => {}
        }

        let result = sqlx::query(
            r#"
            INSERT INTO files (file_name, file_address, file_type, file_size,
                               chapters_chapter_id, chapters_classes_class_id)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&file.name)
        .bind(&file.address)
        .bind(&file.declared_type)
        .bind(file.size)
        .bind(file.chapter_id)
        .bind(file.class_id)
        .execute(&mut *tx)
        .await
        .map_err(tx_err(OP))?;
        let file_id = result.last_insert_rowid();

        update_total_size(&mut tx, file.chapter_id, file.class_id)
            .await
            .map_err(tx_err(OP))?;

        tx.commit().await.map_err(tx_err(OP))?;
        debug!(file_id, chapter_id = file.chapter_id, "file added");
        Ok(file_id)
    }

    pub async fn delete_file(&self, file_id: i64) -> StoreResult<()> {
        const OP: &str = "delete_file";
        let mut tx = self.pool.begin().await?;

        let owner: Option<(i64, i64)> = sqlx::query_as(
            "SELECT chapters_chapter_id, chapters_classes_class_id FROM files WHERE file_id = ?",
        )
        .bind(file_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(tx_err(OP))?;
        let (chapter_id, class_id) = owner.ok_or(StoreError::NotFound {
            entity: "file",
            id: file_id,
        })?;

        delete_files_in(&mut tx, FileScope::File(file_id))
            .await
            .map_err(tx_err(OP))?;
        update_total_size(&mut tx, chapter_id, class_id)
            .await
            .map_err(tx_err(OP))?;

        tx.commit().await.map_err(tx_err(OP))?;
        debug!(file_id, chapter_id, "file deleted");
        Ok(())
    }

    /// Recompute a chapter's `total_size` from its files.
    pub async fn update_total_size(&self, chapter_id: i64, class_id: i64) -> StoreResult<()> {
        let mut conn = self.pool.acquire().await?;
        update_total_size(&mut conn, chapter_id, class_id).await?;
        Ok(())
    }

    /// All chapters of a class with their files. An unknown class yields an
    /// empty result.
    pub async fn list_files_by_class(&self, class_id: i64) -> StoreResult<ClassFiles> {
        let chapters = self.list_chapters(class_id).await?;

        let rows = sqlx::query(
            r#"
            SELECT file_id, file_name, file_address, file_type, file_size,
                   chapters_chapter_id, chapters_classes_class_id
            FROM files
            WHERE chapters_classes_class_id = ?
            ORDER BY chapters_chapter_id, file_id
            "#,
        )
        .bind(class_id)
        .fetch_all(&self.pool)
        .await?;
        let mut files: Vec<FileRecord> = rows.iter().map(file_from_row).collect();

        let chapters = chapters
            .into_iter()
            .map(|chapter| {
                let (mine, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut files)
                    .into_iter()
                    .partition(|f| f.chapter_id == chapter.id);
                files = rest;
                ChapterFiles {
                    chapter,
                    files: mine,
                }
            })
            .collect();

        Ok(ClassFiles { chapters })
    }

    pub async fn get_file_info(&self, file_id: i64) -> StoreResult<Option<FileInfo>> {
        let row = sqlx::query(
            "SELECT file_name, file_address, file_type, file_size FROM files WHERE file_id = ?",
        )
        .bind(file_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| FileInfo {
            name: r.get("file_name"),
            address: r.get("file_address"),
            declared_type: r.get("file_type"),
            size: r.get("file_size"),
        }))
    }

    pub async fn get_file(&self, file_id: i64) -> StoreResult<Option<FileRecord>> {
        let row = sqlx::query(
            r#"
            SELECT file_id, file_name, file_address, file_type, file_size,
                   chapters_chapter_id, chapters_classes_class_id
            FROM files
            WHERE file_id = ?
            "#,
        )
        .bind(file_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(file_from_row))
    }

    /// Flattened `(class, chapter, file)` listing of the whole corpus.
    pub async fn list_all_files(&self) -> StoreResult<Vec<ListingRow>> {
        let rows = sqlx::query("SELECT class_name, chapter_name, file_name FROM allfiles")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(|row| ListingRow {
                class_name: row.get("class_name"),
                chapter_name: row.get("chapter_name"),
                file_name: row.get("file_name"),
            })
            .collect())
    }

    // ============ Text content ============

    /// Store (or replace) the extracted text of a file.
    pub async fn add_text_content(&self, file_id: i64, text: &str) -> StoreResult<()> {
        const OP: &str = "add_text_content";
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO textfiles (files_file_id, content) VALUES (?, ?)
            ON CONFLICT(files_file_id) DO UPDATE SET content = excluded.content
            "#,
        )
        .bind(file_id)
        .bind(text)
        .execute(&mut *tx)
        .await
        .map_err(tx_err(OP))?;

        sqlx::query("DELETE FROM textfiles_fts WHERE files_file_id = ?")
            .bind(file_id)
            .execute(&mut *tx)
            .await
            .map_err(tx_err(OP))?;
        sqlx::query("INSERT INTO textfiles_fts (files_file_id, content) VALUES (?, ?)")
            .bind(file_id)
            .bind(text)
            .execute(&mut *tx)
            .await
            .map_err(tx_err(OP))?;

        tx.commit().await.map_err(tx_err(OP))?;
        debug!(file_id, chars = text.chars().count(), "text content stored");
        Ok(())
    }

    /// Remove a file's extracted text and its index row. A file without
    /// text is left as it is.
    pub async fn delete_text_content(&self, file_id: i64) -> StoreResult<()> {
        const OP: &str = "delete_text_content";
        let mut tx = self.pool.begin().await?;

        for table in ["textfiles_fts", "textfiles"] {
            sqlx::query(&format!("DELETE FROM {} WHERE files_file_id = ?", table))
                .bind(file_id)
                .execute(&mut *tx)
                .await
                .map_err(tx_err(OP))?;
        }

        tx.commit().await.map_err(tx_err(OP))?;
        debug!(file_id, "text content removed");
        Ok(())
    }

    pub async fn get_text_content(&self, file_id: i64) -> StoreResult<Option<String>> {
        let content: Option<String> =
            sqlx::query_scalar("SELECT content FROM textfiles WHERE files_file_id = ?")
                .bind(file_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(content)
    }

    // ============ Tags ============

    pub async fn add_tag(&self, name: &str) -> StoreResult<i64> {
        let result = sqlx::query("INSERT INTO tagname (tag_name) VALUES (?)")
            .bind(name)
            .execute(&self.pool)
            .await?;

        let id = result.last_insert_rowid();
        debug!(tag_id = id, name, "tag added");
        Ok(id)
    }

    /// Remove a tag and every file association that references it.
    pub async fn delete_tag(&self, tag_id: i64) -> StoreResult<()> {
        const OP: &str = "delete_tag";
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM filetag WHERE tagname_tag_id = ?")
            .bind(tag_id)
            .execute(&mut *tx)
            .await
            .map_err(tx_err(OP))?;
        sqlx::query("DELETE FROM tagname WHERE tag_id = ?")
            .bind(tag_id)
            .execute(&mut *tx)
            .await
            .map_err(tx_err(OP))?;

        tx.commit().await.map_err(tx_err(OP))?;
        debug!(tag_id, "tag deleted");
        Ok(())
    }

    pub async fn list_tags(&self) -> StoreResult<Vec<Tag>> {
        let rows = sqlx::query("SELECT tag_id, tag_name FROM tagname ORDER BY tag_id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(tag_from_row).collect())
    }

    /// Attach a tag to a file. Returns `false` when the pair already existed.
    pub async fn add_file_tag(&self, file_id: i64, tag_id: i64) -> StoreResult<bool> {
        let result =
            sqlx::query("INSERT OR IGNORE INTO filetag (files_file_id, tagname_tag_id) VALUES (?, ?)")
                .bind(file_id)
                .bind(tag_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn delete_file_tag(&self, file_id: i64, tag_id: i64) -> StoreResult<()> {
        sqlx::query("DELETE FROM filetag WHERE files_file_id = ? AND tagname_tag_id = ?")
            .bind(file_id)
            .bind(tag_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn list_tags_for_file(&self, file_id: i64) -> StoreResult<Vec<Tag>> {
        let rows = sqlx::query(
            r#"
            SELECT t.tag_id, t.tag_name
            FROM filetag ft
            JOIN tagname t ON t.tag_id = ft.tagname_tag_id
            WHERE ft.files_file_id = ?
            ORDER BY t.tag_id
            "#,
        )
        .bind(file_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(tag_from_row).collect())
    }
}

/// Delete every file in `scope` along with its tags, text and index rows.
async fn delete_files_in(conn: &mut SqliteConnection, scope: FileScope) -> Result<(), sqlx::Error> {
    let files = format!("SELECT file_id FROM files WHERE {} = ?", scope.column());

    for table in ["filetag", "textfiles_fts", "textfiles"] {
        sqlx::query(&format!(
            "DELETE FROM {} WHERE files_file_id IN ({})",
            table, files
        ))
        .bind(scope.id())
        .execute(&mut *conn)
        .await?;
    }

    sqlx::query(&format!("DELETE FROM files WHERE {} = ?", scope.column()))
        .bind(scope.id())
        .execute(&mut *conn)
        .await?;

    Ok(())
}

/// Set a chapter's `total_size` to the sum of its files' sizes.
pub(crate) async fn update_total_size(
    conn: &mut SqliteConnection,
    chapter_id: i64,
    class_id: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE chapters
        SET total_size = (
            SELECT COALESCE(SUM(file_size), 0)
            FROM files
            WHERE chapters_chapter_id = ? AND chapters_classes_class_id = ?
        )
        WHERE chapter_id = ? AND classes_class_id = ?
        "#,
    )
    .bind(chapter_id)
    .bind(class_id)
    .bind(chapter_id)
    .bind(class_id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

fn chapter_from_row(row: &sqlx::sqlite::SqliteRow) -> Chapter {
    Chapter {
        id: row.get("chapter_id"),
        name: row.get("chapter_name"),
        total_size: row.get("total_size"),
        class_id: row.get("classes_class_id"),
    }
}

fn file_from_row(row: &sqlx::sqlite::SqliteRow) -> FileRecord {
    FileRecord {
        id: row.get("file_id"),
        name: row.get("file_name"),
        address: row.get("file_address"),
        declared_type: row.get("file_type"),
        size: row.get("file_size"),
        chapter_id: row.get("chapters_chapter_id"),
        class_id: row.get("chapters_classes_class_id"),
    }
}

fn tag_from_row(row: &sqlx::sqlite::SqliteRow) -> Tag {
    Tag {
        id: row.get("tag_id"),
        name: row.get("tag_name"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> CorpusStore {
        CorpusStore::open_in_memory().await.unwrap()
    }

    fn new_file(name: &str, size: i64, chapter_id: i64, class_id: i64) -> NewFile {
        NewFile {
            name: name.to_string(),
            address: format!("/docs/{}", name),
            declared_type: name.rsplit('.').next().unwrap_or_default().to_string(),
            size,
            chapter_id,
            class_id,
        }
    }

    async fn count(store: &CorpusStore, sql: &str) -> i64 {
        sqlx::query_scalar(sql).fetch_one(store.pool()).await.unwrap()
    }

    #[tokio::test]
    async fn empty_class_name_is_a_validation_error() {
        let store = store().await;
        let err = store.add_class("", "x").await.unwrap_err();
        assert!(err.is_validation());
        let err = store.add_class("   ", "x").await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(count(&store, "SELECT COUNT(*) FROM classes").await, 0);
    }

    #[tokio::test]
    async fn duplicate_class_names_are_allowed() {
        let store = store().await;
        let a = store.add_class("Algebra", "Noether").await.unwrap();
        let b = store.add_class("Algebra", "Artin").await.unwrap();
        assert_ne!(a, b);
        assert_eq!(store.list_classes().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn total_size_tracks_adds_and_deletes() {
        let store = store().await;
        let class = store.add_class("OS", "Tanenbaum").await.unwrap();
        let chapter = store.add_chapter(class, "Processes").await.unwrap();

        let a = store.add_file(&new_file("a.pdf", 100, chapter, class)).await.unwrap();
        let chap = store.get_chapter(chapter).await.unwrap().unwrap();
        assert_eq!(chap.total_size, 100);

        store.add_file(&new_file("b.txt", 25, chapter, class)).await.unwrap();
        assert_eq!(store.get_chapter(chapter).await.unwrap().unwrap().total_size, 125);

        store.delete_file(a).await.unwrap();
        assert_eq!(store.get_chapter(chapter).await.unwrap().unwrap().total_size, 25);
    }

    #[tokio::test]
    async fn file_must_belong_to_its_chapters_class() {
        let store = store().await;
        let c1 = store.add_class("A", "t").await.unwrap();
        let c2 = store.add_class("B", "t").await.unwrap();
        let chapter = store.add_chapter(c1, "one").await.unwrap();

        let err = store.add_file(&new_file("x.txt", 1, chapter, c2)).await.unwrap_err();
        assert!(err.is_validation());
        let err = store.add_file(&new_file("x.txt", 1, 999, c1)).await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(count(&store, "SELECT COUNT(*) FROM files").await, 0);
    }

    #[tokio::test]
    async fn duplicate_file_tag_is_a_no_op() {
        let store = store().await;
        let class = store.add_class("A", "t").await.unwrap();
        let chapter = store.add_chapter(class, "c").await.unwrap();
        let file = store.add_file(&new_file("f.md", 3, chapter, class)).await.unwrap();
        let tag = store.add_tag("exam").await.unwrap();

        assert!(store.add_file_tag(file, tag).await.unwrap());
        assert!(!store.add_file_tag(file, tag).await.unwrap());
        assert_eq!(count(&store, "SELECT COUNT(*) FROM filetag").await, 1);
    }

    #[tokio::test]
    async fn delete_tag_detaches_files_first() {
        let store = store().await;
        let class = store.add_class("A", "t").await.unwrap();
        let chapter = store.add_chapter(class, "c").await.unwrap();
        let file = store.add_file(&new_file("f.md", 3, chapter, class)).await.unwrap();
        let keep = store.add_tag("keep").await.unwrap();
        let drop = store.add_tag("drop").await.unwrap();
        store.add_file_tag(file, keep).await.unwrap();
        store.add_file_tag(file, drop).await.unwrap();

        store.delete_tag(drop).await.unwrap();

        let tags = store.list_tags_for_file(file).await.unwrap();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].id, keep);
        assert_eq!(store.list_tags().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn text_content_upsert_replaces_previous_text() {
        let store = store().await;
        let class = store.add_class("A", "t").await.unwrap();
        let chapter = store.add_chapter(class, "c").await.unwrap();
        let file = store.add_file(&new_file("f.md", 3, chapter, class)).await.unwrap();

        store.add_text_content(file, "first").await.unwrap();
        store.add_text_content(file, "second").await.unwrap();

        assert_eq!(store.get_text_content(file).await.unwrap().as_deref(), Some("second"));
        assert_eq!(count(&store, "SELECT COUNT(*) FROM textfiles").await, 1);
        assert_eq!(count(&store, "SELECT COUNT(*) FROM textfiles_fts").await, 1);
    }

    #[tokio::test]
    async fn delete_text_content_clears_text_and_index() {
        let store = store().await;
        let class = store.add_class("A", "t").await.unwrap();
        let chapter = store.add_chapter(class, "c").await.unwrap();
        let file = store.add_file(&new_file("f.md", 3, chapter, class)).await.unwrap();
        store.add_text_content(file, "stale").await.unwrap();

        store.delete_text_content(file).await.unwrap();
        assert!(store.get_text_content(file).await.unwrap().is_none());
        assert_eq!(count(&store, "SELECT COUNT(*) FROM textfiles_fts").await, 0);
        assert!(store.get_file(file).await.unwrap().is_some());

        // Nothing left to remove.
        store.delete_text_content(file).await.unwrap();
    }

    #[tokio::test]
    async fn reads_of_missing_ids_are_empty() {
        let store = store().await;
        assert!(store.get_file_info(42).await.unwrap().is_none());
        assert!(store.list_files_by_class(42).await.unwrap().is_empty());
        assert!(store.list_tags_for_file(42).await.unwrap().is_empty());
        assert!(store.get_text_content(42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_missing_file_is_not_found() {
        let store = store().await;
        let err = store.delete_file(7).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { entity: "file", id: 7 }));
    }

    #[tokio::test]
    async fn files_are_grouped_by_chapter() {
        let store = store().await;
        let class = store.add_class("A", "t").await.unwrap();
        let ch1 = store.add_chapter(class, "one").await.unwrap();
        let ch2 = store.add_chapter(class, "two").await.unwrap();
        let empty = store.add_chapter(class, "three").await.unwrap();
        store.add_file(&new_file("a.txt", 1, ch2, class)).await.unwrap();
        store.add_file(&new_file("b.txt", 2, ch1, class)).await.unwrap();
        store.add_file(&new_file("c.txt", 4, ch2, class)).await.unwrap();

        let listing = store.list_files_by_class(class).await.unwrap();
        let ids: Vec<i64> = listing.chapters.iter().map(|c| c.chapter.id).collect();
        assert_eq!(ids, vec![ch1, ch2, empty]);
        assert_eq!(listing.chapters[0].files.len(), 1);
        assert_eq!(listing.chapters[1].files.len(), 2);
        assert_eq!(listing.chapters[1].chapter.total_size, 5);
        assert!(listing.chapters[2].files.is_empty());
        assert_eq!(listing.file_count(), 3);
    }

    #[tokio::test]
    async fn closed_store_reports_connectivity() {
        let store = store().await;
        store.close().await;
        let err = store.list_classes().await.unwrap_err();
        assert!(matches!(err, StoreError::Connectivity(_)));
    }
}
