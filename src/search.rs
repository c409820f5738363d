//! Keyword search over extracted file text.
//!
//! Matching only ever looks at stored text content, never at file names.
//! Two matchers are available ([`MatchMode`]):
//!
//! - **fulltext** (default): SQLite FTS5. Each whitespace-separated term of
//!   the keyword is quoted as a phrase and the terms are OR-ed, so any term
//!   can match; results are ordered by BM25 rank.
//! - **substring**: case-sensitive `instr()` over the raw text, ordered by
//!   file id.
//!
//! Every hit is turned into a display snippet by [`format_snippet`]: a
//! window of at most [`SNIPPET_WINDOW`] characters that starts at the first
//! occurrence of the keyword, with `...` marking text cut on either side.

use serde::{Deserialize, Serialize};
use sqlx::Row;
use tracing::debug;

use crate::error::StoreResult;
use crate::store::CorpusStore;

/// Maximum number of characters of content shown in a snippet.
pub const SNIPPET_WINDOW: usize = 100;

pub const ELLIPSIS: &str = "...";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    #[default]
    FullText,
    Substring,
}

/// A file whose text matched, with its full text content.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub file_id: i64,
    pub content: String,
}

/// A display-ready search result.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResultItem {
    pub file_id: i64,
    pub file_name: Option<String>,
    pub file_address: Option<String>,
    pub file_type: Option<String>,
    pub file_size: i64,
    pub snippet: String,
}

/// Find files whose text matches `keyword`. A blank keyword matches nothing.
pub async fn search(
    store: &CorpusStore,
    keyword: &str,
    mode: MatchMode,
) -> StoreResult<Vec<SearchHit>> {
    if keyword.trim().is_empty() {
        return Ok(Vec::new());
    }

    let rows = match mode {
        MatchMode::FullText => {
            let Some(query) = fts_query(keyword) else {
                return Ok(Vec::new());
            };
            sqlx::query(
                r#"
                SELECT t.files_file_id, t.content
                FROM textfiles_fts
                JOIN textfiles t ON t.files_file_id = textfiles_fts.files_file_id
                WHERE textfiles_fts MATCH ?
                ORDER BY bm25(textfiles_fts), t.files_file_id
                "#,
            )
            .bind(query)
            .fetch_all(store.pool())
            .await?
        }
        MatchMode::Substring => {
            sqlx::query(
                r#"
                SELECT files_file_id, content
                FROM textfiles
                WHERE instr(content, ?) > 0
                ORDER BY files_file_id
                "#,
            )
            .bind(keyword)
            .fetch_all(store.pool())
            .await?
        }
    };

    let hits: Vec<SearchHit> = rows
        .iter()
        .map(|row| SearchHit {
            file_id: row.get("files_file_id"),
            content: row.get("content"),
        })
        .collect();

    debug!(keyword, ?mode, hits = hits.len(), "search");
    Ok(hits)
}

/// Search and build a snippet plus file metadata for every hit.
pub async fn search_with_snippets(
    store: &CorpusStore,
    keyword: &str,
    mode: MatchMode,
) -> StoreResult<Vec<SearchResultItem>> {
    let hits = search(store, keyword, mode).await?;
    let mut results = Vec::with_capacity(hits.len());

    for hit in hits {
        // A file deleted between the two queries simply drops out.
        if let Some(info) = store.get_file_info(hit.file_id).await? {
            results.push(SearchResultItem {
                file_id: hit.file_id,
                file_name: info.name,
                file_address: info.address,
                file_type: info.declared_type,
                file_size: info.size,
                snippet: format_snippet(&hit.content, keyword),
            });
        }
    }

    Ok(results)
}

/// Build an FTS5 query that ORs every term of `keyword` as a quoted phrase,
/// so user input can never be parsed as FTS syntax.
pub fn fts_query(keyword: &str) -> Option<String> {
    let terms: Vec<String> = keyword
        .split_whitespace()
        .map(|t| format!("\"{}\"", t.replace('"', "\"\"")))
        .collect();
    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" OR "))
    }
}

/// Cut a display snippet out of `content` starting at the first
/// (case-sensitive) occurrence of `keyword`.
///
/// Newlines become spaces. If the keyword does not occur, the whole
/// (newline-replaced) content is returned.
pub fn format_snippet(content: &str, keyword: &str) -> String {
    let content = content.replace('\n', " ");
    let Some(start) = content.find(keyword) else {
        return content;
    };

    let end = content[start..]
        .char_indices()
        .nth(SNIPPET_WINDOW)
        .map(|(offset, _)| start + offset)
        .unwrap_or(content.len());

    let mut snippet = String::with_capacity(end - start + 2 * ELLIPSIS.len());
    if start != 0 {
        snippet.push_str(ELLIPSIS);
    }
    snippet.push_str(&content[start..end]);
    if end != content.len() {
        snippet.push_str(ELLIPSIS);
    }
    snippet
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewFile;

    #[test]
    fn snippet_starts_at_the_match_with_both_ellipses() {
        // 30 chars of lead-in, then the keyword, padded to 140 chars total.
        let lead = "a".repeat(26) + "aaa ";
        let mut content = format!("{}foo bar baz ", lead);
        while content.len() < 140 {
            content.push('z');
        }
        assert_eq!(content.len(), 140);

        let snippet = format_snippet(&content, "foo");
        assert!(snippet.starts_with("...foo bar baz"));
        assert!(snippet.ends_with("..."));
        let body = &snippet[3..snippet.len() - 3];
        assert_eq!(body.chars().count(), 100);
        assert_eq!(body, &content[30..130]);
    }

    #[test]
    fn match_at_start_has_no_leading_ellipsis() {
        let content = format!("foo{}", "x".repeat(200));
        let snippet = format_snippet(&content, "foo");
        assert!(snippet.starts_with("foo"));
        assert!(snippet.ends_with("..."));
        assert_eq!(snippet.chars().count(), 103);
    }

    #[test]
    fn window_reaching_the_end_has_no_trailing_ellipsis() {
        let snippet = format_snippet("intro text foo tail", "foo");
        assert_eq!(snippet, "...foo tail");
    }

    #[test]
    fn short_content_matched_at_zero_is_unchanged() {
        assert_eq!(format_snippet("foo bar", "foo"), "foo bar");
    }

    #[test]
    fn exactly_one_window_to_the_end_is_not_truncated() {
        let content = format!("ab{}", "c".repeat(98));
        // match at 2, 98 chars remain: fits in the window
        let snippet = format_snippet(&content, "cc");
        assert_eq!(snippet, format!("...{}", "c".repeat(98)));
    }

    #[test]
    fn newlines_become_spaces() {
        let snippet = format_snippet("line one\nfoo\nline three", "foo");
        assert_eq!(snippet, "...foo line three");
    }

    #[test]
    fn missing_keyword_returns_content_unchanged() {
        assert_eq!(format_snippet("no match\nhere", "zzz"), "no match here");
    }

    #[test]
    fn matching_is_case_sensitive() {
        assert_eq!(format_snippet("say Foo", "foo"), "say Foo");
    }

    #[test]
    fn window_counts_characters_not_bytes() {
        let content = format!("前言 foo{}", "é".repeat(150));
        let snippet = format_snippet(&content, "foo");
        let body = snippet.trim_start_matches("...").trim_end_matches("...");
        assert_eq!(body.chars().count(), 100);
        assert!(body.starts_with("foo"));
    }

    #[test]
    fn fts_query_quotes_and_ors_terms() {
        assert_eq!(fts_query("foo"), Some("\"foo\"".to_string()));
        assert_eq!(
            fts_query("  rust  borrow-checker "),
            Some("\"rust\" OR \"borrow-checker\"".to_string())
        );
        assert_eq!(fts_query("say \"hi\""), Some("\"say\" OR \"\"\"hi\"\"\"".to_string()));
        assert_eq!(fts_query("   "), None);
    }

    #[test]
    fn match_mode_defaults_to_fulltext() {
        assert_eq!(MatchMode::default(), MatchMode::FullText);
    }

    async fn seeded() -> (CorpusStore, i64, i64) {
        let store = CorpusStore::open_in_memory().await.unwrap();
        let class = store.add_class("Compilers", "Aho").await.unwrap();
        let chapter = store.add_chapter(class, "Parsing").await.unwrap();
        let mut ids = Vec::new();
        for (name, text) in [
            ("lexer.txt", "Lexers turn characters into tokens."),
            ("parser.txt", "A parser builds a tree from tokens; LR parser tables."),
        ] {
            let id = store
                .add_file(&NewFile {
                    name: name.to_string(),
                    address: format!("/notes/{}", name),
                    declared_type: "txt".to_string(),
                    size: text.len() as i64,
                    chapter_id: chapter,
                    class_id: class,
                })
                .await
                .unwrap();
            store.add_text_content(id, text).await.unwrap();
            ids.push(id);
        }
        (store, ids[0], ids[1])
    }

    #[tokio::test]
    async fn fulltext_matches_content_not_file_names() {
        let (store, _lexer, parser) = seeded().await;
        let hits = search(&store, "tree", MatchMode::FullText).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].file_id, parser);

        let none = search(&store, "lexer.txt", MatchMode::FullText).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn fulltext_terms_are_alternatives() {
        let (store, _, _) = seeded().await;
        let hits = search(&store, "characters tree", MatchMode::FullText)
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[tokio::test]
    async fn fulltext_tolerates_query_syntax_in_keywords() {
        let (store, _, _) = seeded().await;
        for keyword in ["AND", "tokens*", "\"unbalanced", "a:b", "(x"] {
            search(&store, keyword, MatchMode::FullText).await.unwrap();
        }
    }

    #[tokio::test]
    async fn substring_mode_matches_inside_words() {
        let (store, lexer, parser) = seeded().await;
        let hits = search(&store, "oken", MatchMode::Substring).await.unwrap();
        let ids: Vec<i64> = hits.iter().map(|h| h.file_id).collect();
        assert_eq!(ids, vec![lexer, parser]);

        let none = search(&store, "LEXERS", MatchMode::Substring).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn blank_keyword_matches_nothing() {
        let (store, _, _) = seeded().await;
        assert!(search(&store, "  ", MatchMode::FullText).await.unwrap().is_empty());
        assert!(search(&store, "", MatchMode::Substring).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn results_carry_file_info_and_snippet() {
        let (store, _, parser) = seeded().await;
        let results = search_with_snippets(&store, "tree", MatchMode::FullText)
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        let item = &results[0];
        assert_eq!(item.file_id, parser);
        assert_eq!(item.file_name.as_deref(), Some("parser.txt"));
        assert_eq!(item.snippet, "...tree from tokens; LR parser tables.");
    }

    #[tokio::test]
    async fn deleted_files_leave_the_index() {
        let (store, lexer, _) = seeded().await;
        store.delete_file(lexer).await.unwrap();
        let hits = search(&store, "characters", MatchMode::FullText).await.unwrap();
        assert!(hits.is_empty());
    }
}
