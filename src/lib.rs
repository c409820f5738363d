//! # Corpora
//!
//! A local store for course material: classes contain chapters, chapters
//! contain files, files carry tags and the plain text extracted from them,
//! and that text is searchable by keyword.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌─────────────┐   ┌──────────────┐
//! │  Session   │──▶│ CorpusStore │──▶│    SQLite    │
//! │ (CLI glue) │   │ hierarchy + │   │ tables, view │
//! └─────┬──────┘   │ cascades    │   │ FTS5 index   │
//!       │          └──────▲──────┘   └──────────────┘
//!       ▼                 │
//! ┌────────────┐   ┌──────┴──────┐
//! │ Extraction │   │   Search    │
//! │ pdf/docx/  │   │ match +     │
//! │ pptx/text  │   │ snippets    │
//! └────────────┘   └─────────────┘
//! ```
//!
//! ## Data Flow
//!
//! 1. A file is registered with [`store::CorpusStore::add_file`], which also
//!    recomputes its chapter's total size in the same transaction.
//! 2. [`extract`] turns the file into text according to its declared
//!    [`kinds::DocumentKind`]. Failure leaves the file registered without text.
//! 3. Text is stored with [`store::CorpusStore::add_text_content`] and
//!    indexed for full-text search.
//! 4. [`search`] finds matching files and builds display snippets.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`db`] | Single-connection SQLite pools |
//! | [`migrate`] | Idempotent schema creation |
//! | [`models`] | Classes, chapters, files, tags, listings |
//! | [`error`] | Store error taxonomy |
//! | [`store`] | The corpus store: atomic mutations and reads |
//! | [`kinds`] | Declared file types and viewer classification |
//! | [`extract`] | PDF, Word, presentation and plain-text extraction |
//! | [`search`] | Keyword search and snippet formatting |
//! | [`session`] | Add-from-disk and search workflows |
//! | [`commands`] | CLI command implementations |

pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod kinds;
pub mod migrate;
pub mod models;
pub mod search;
pub mod session;
pub mod store;

pub use error::StoreError;
pub use session::Session;
pub use store::CorpusStore;
