//! Session façade: the operations a front end performs, composed from the
//! store, the extraction pipeline and the search engine.
//!
//! Adding a file from disk is two independent steps. The file is first
//! registered (metadata plus chapter size, atomically); text extraction is
//! then attempted on a blocking thread. An extraction failure is reported
//! in the returned [`AddedFile`] but never undoes the registration, and
//! neither does a failure to write the extracted text.
//!
//! Re-extraction replaces the stored text. When it produces no text, any
//! previously stored text is removed so the file no longer matches searches
//! for content it may not have anymore.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::StoreError;
use crate::extract::{self, ExtractError};
use crate::kinds::{declared_type_of, DocumentKind};
use crate::models::NewFile;
use crate::search::{self, SearchResultItem};
use crate::store::CorpusStore;

pub struct Session {
    store: CorpusStore,
    config: Config,
}

/// What happened to a file's text after it was registered.
#[derive(Debug)]
pub enum ExtractionOutcome {
    /// Text was extracted and stored.
    Stored { chars: usize },
    /// The declared type is not one we extract; no text was stored.
    Unsupported(String),
    /// Extraction was attempted and failed; no text was stored.
    Failed(ExtractError),
    /// Text was extracted but could not be written; no text was stored.
    NotStored(StoreError),
}

impl ExtractionOutcome {
    pub fn is_stored(&self) -> bool {
        matches!(self, ExtractionOutcome::Stored { .. })
    }
}

#[derive(Debug)]
pub struct AddedFile {
    pub file_id: i64,
    pub name: String,
    pub extraction: ExtractionOutcome,
}

impl Session {
    /// Open the configured database.
    pub async fn open(config: Config) -> Result<Self> {
        let store = CorpusStore::open(&config.db)
            .await
            .with_context(|| format!("Failed to open database: {}", config.db.path.display()))?;
        Ok(Self { store, config })
    }

    pub fn new(store: CorpusStore, config: Config) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &CorpusStore {
        &self.store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub async fn close(self) {
        self.store.close().await;
    }

    /// Register the file at `path` under a chapter, then extract and store
    /// its text.
    ///
    /// The name is the path's final component, the declared type its
    /// extension and the size its length on disk.
    pub async fn add_file_from_path(
        &self,
        path: &Path,
        chapter_id: i64,
        class_id: i64,
    ) -> Result<AddedFile> {
        let metadata = std::fs::metadata(path)
            .with_context(|| format!("Failed to read file metadata: {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let declared_type = declared_type_of(path);

        let file_id = self
            .store
            .add_file(&NewFile {
                name: name.clone(),
                address: path.display().to_string(),
                declared_type: declared_type.clone(),
                size: i64::try_from(metadata.len()).unwrap_or(i64::MAX),
                chapter_id,
                class_id,
            })
            .await
            .with_context(|| format!("Failed to register {}", path.display()))?;
        info!(file_id, name = %name, "file registered");

        let extraction = self
            .extract_into(file_id, path.to_path_buf(), &declared_type)
            .await;

        Ok(AddedFile {
            file_id,
            name,
            extraction,
        })
    }

    /// Re-run extraction for a registered file from its stored address.
    ///
    /// Returns `None` if the file does not exist.
    pub async fn reextract(&self, file_id: i64) -> Result<Option<ExtractionOutcome>> {
        let Some(info) = self.store.get_file_info(file_id).await? else {
            return Ok(None);
        };
        let address = PathBuf::from(info.address.unwrap_or_default());
        let declared_type = info.declared_type.unwrap_or_default();
        let outcome = self.extract_into(file_id, address, &declared_type).await;
        if !outcome.is_stored() {
            self.store
                .delete_text_content(file_id)
                .await
                .with_context(|| format!("Failed to clear stale text of file {}", file_id))?;
        }
        Ok(Some(outcome))
    }

    async fn extract_into(
        &self,
        file_id: i64,
        path: PathBuf,
        declared_type: &str,
    ) -> ExtractionOutcome {
        let kind = DocumentKind::from_declared(declared_type);
        if let DocumentKind::Unsupported(tag) = &kind {
            info!(file_id, declared_type = %tag, "extraction skipped: unsupported type");
            return ExtractionOutcome::Unsupported(tag.clone());
        }

        let extraction_config = self.config.extraction.clone();
        let task_kind = kind.clone();
        let result = tokio::task::spawn_blocking(move || {
            extract::extract(&path, &task_kind, &extraction_config)
        })
        .await
        .unwrap_or_else(|e| Err(ExtractError::Interrupted(e.to_string())));

        let text = match result {
            Ok(text) => text,
            Err(e) => {
                warn!(file_id, %kind, error = %e, "text extraction failed");
                return ExtractionOutcome::Failed(e);
            }
        };

        match self.store.add_text_content(file_id, &text).await {
            Ok(()) => ExtractionOutcome::Stored {
                chars: text.chars().count(),
            },
            Err(e) => {
                warn!(file_id, error = %e, "file registered but its text was not stored");
                ExtractionOutcome::NotStored(e)
            }
        }
    }

    /// Search with the configured match mode.
    pub async fn search(&self, keyword: &str) -> Result<Vec<SearchResultItem>> {
        let results =
            search::search_with_snippets(&self.store, keyword, self.config.search.mode).await?;
        Ok(results)
    }
}
