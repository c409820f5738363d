//! Text extraction: `(path, declared type) → plain text`.
//!
//! Dispatch is on [`DocumentKind`], never on file contents. Each supported
//! format has one extractor:
//!
//! | Kind | Source | Output |
//! |------|--------|--------|
//! | PDF | page text via `pdf-extract` | pages concatenated as-is, first `pdf_max_pages` only |
//! | Word | `word/document.xml` | paragraph text in document order, no separator |
//! | Presentation | `ppt/slides/slideN.xml` | shape text in slide/shape order, no separator |
//! | Plain text | file bytes | verbatim UTF-8 |
//!
//! Long PDFs are cut down with `lopdf` before any page is decoded, so the
//! cost of extracting a PDF is bounded by the page cap, not by the document.
//! Extraction never panics; every failure is an [`ExtractError`].

use std::io::Read;
use std::path::Path;

use quick_xml::events::Event;
use thiserror::Error;

use crate::config::ExtractionConfig;
use crate::kinds::DocumentKind;

/// Maximum decompressed bytes to read from a single ZIP entry (zip-bomb protection).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("unsupported file type: {0}")]
    UnsupportedType(String),
    #[error("failed to read file: {0}")]
    Io(#[from] std::io::Error),
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
    #[error("OOXML extraction failed: {0}")]
    Ooxml(String),
    #[error("text is not valid UTF-8: {0}")]
    Encoding(String),
    #[error("extraction did not complete: {0}")]
    Interrupted(String),
}

/// Extract the text of the file at `path`.
///
/// Unsupported kinds fail before the file is opened.
pub fn extract(
    path: &Path,
    kind: &DocumentKind,
    config: &ExtractionConfig,
) -> Result<String, ExtractError> {
    if let DocumentKind::Unsupported(tag) = kind {
        return Err(ExtractError::UnsupportedType(tag.clone()));
    }
    let bytes = std::fs::read(path)?;
    extract_bytes(&bytes, kind, config)
}

/// Extract text from in-memory file content.
pub fn extract_bytes(
    bytes: &[u8],
    kind: &DocumentKind,
    config: &ExtractionConfig,
) -> Result<String, ExtractError> {
    match kind {
        DocumentKind::Pdf => extract_pdf(bytes, config.pdf_max_pages),
        DocumentKind::Word => extract_docx(bytes),
        DocumentKind::Presentation => extract_pptx(bytes),
        DocumentKind::PlainText(_) => String::from_utf8(bytes.to_vec())
            .map_err(|e| ExtractError::Encoding(e.to_string())),
        DocumentKind::Unsupported(tag) => Err(ExtractError::UnsupportedType(tag.clone())),
    }
}

// ============ PDF ============

fn extract_pdf(bytes: &[u8], max_pages: usize) -> Result<String, ExtractError> {
    let mut doc =
        lopdf::Document::load_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))?;

    let pages = if limit_pages(&mut doc, max_pages) {
        let mut truncated = Vec::new();
        doc.save_to(&mut truncated)
            .map_err(|e| ExtractError::Pdf(e.to_string()))?;
        pdf_extract::extract_text_from_mem_by_pages(&truncated)
    } else {
        pdf_extract::extract_text_from_mem_by_pages(bytes)
    }
    .map_err(|e| ExtractError::Pdf(e.to_string()))?;

    Ok(pages.concat())
}

/// Drop every page after the first `max_pages`. Returns whether anything
/// was removed.
pub fn limit_pages(doc: &mut lopdf::Document, max_pages: usize) -> bool {
    let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
    if page_numbers.len() <= max_pages {
        return false;
    }
    doc.delete_pages(&page_numbers[max_pages..]);
    doc.prune_objects();
    true
}

// ============ OOXML ============

fn open_archive(bytes: &[u8]) -> Result<zip::ZipArchive<std::io::Cursor<&[u8]>>, ExtractError> {
    zip::ZipArchive::new(std::io::Cursor::new(bytes)).map_err(|e| ExtractError::Ooxml(e.to_string()))
}

fn read_zip_entry_bounded(
    archive: &mut zip::ZipArchive<std::io::Cursor<&[u8]>>,
    name: &str,
    max_bytes: u64,
) -> Result<Vec<u8>, ExtractError> {
    let entry = archive
        .by_name(name)
        .map_err(|e| ExtractError::Ooxml(format!("{}: {}", name, e)))?;
    let mut out = Vec::new();
    entry
        .take(max_bytes)
        .read_to_end(&mut out)
        .map_err(|e| ExtractError::Ooxml(e.to_string()))?;
    if out.len() as u64 >= max_bytes {
        return Err(ExtractError::Ooxml(format!(
            "ZIP entry {} exceeds size limit ({} bytes)",
            name, max_bytes
        )));
    }
    Ok(out)
}

fn extract_docx(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive = open_archive(bytes)?;
    let xml = read_zip_entry_bounded(&mut archive, "word/document.xml", MAX_XML_ENTRY_BYTES)?;
    docx_paragraph_text(&xml)
}

/// Concatenate the run text of every body-level paragraph. Paragraphs nested
/// in tables, content controls or text boxes are skipped. Tabs and breaks
/// inside a run become `\t` and `\n`; tab stops in paragraph properties are
/// ignored.
fn docx_paragraph_text(xml: &[u8]) -> Result<String, ExtractError> {
    let mut out = String::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();
    // Element depth, and the depth of the open <w:body>.
    let mut depth = 0usize;
    let mut body_depth: Option<usize> = None;
    let mut para_depth: Option<usize> = None;
    let mut in_run = false;
    let mut in_text = false;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                depth += 1;
                match e.local_name().as_ref() {
                    b"body" if body_depth.is_none() => body_depth = Some(depth),
                    b"p" if para_depth.is_none() && body_depth.map(|b| b + 1) == Some(depth) => {
                        para_depth = Some(depth)
                    }
                    b"r" if para_depth.is_some() => in_run = true,
                    b"t" => in_text = in_run,
                    b"tab" if in_run => out.push('\t'),
                    b"br" | b"cr" if in_run => out.push('\n'),
                    _ => {}
                }
            }
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"tab" if in_run => out.push('\t'),
                b"br" | b"cr" if in_run => out.push('\n'),
                _ => {}
            },
            Ok(Event::End(e)) => {
                match e.local_name().as_ref() {
                    b"r" => in_run = false,
                    b"t" => in_text = false,
                    b"p" if para_depth == Some(depth) => para_depth = None,
                    b"body" if body_depth == Some(depth) => body_depth = None,
                    _ => {}
                }
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Text(te)) if in_text => {
                let text = te
                    .unescape()
                    .map_err(|e| ExtractError::Ooxml(e.to_string()))?;
                out.push_str(&text);
            }
            Ok(Event::CData(cd)) if in_text => {
                out.push_str(&String::from_utf8_lossy(&cd));
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ExtractError::Ooxml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(out)
}

fn extract_pptx(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive = open_archive(bytes)?;
    let mut slide_names: Vec<String> = archive
        .file_names()
        .filter(|n| n.starts_with("ppt/slides/slide") && n.ends_with(".xml"))
        .map(|s| s.to_string())
        .collect();
    slide_names.sort_by_key(|name| {
        name.trim_start_matches("ppt/slides/slide")
            .trim_end_matches(".xml")
            .parse::<u32>()
            .unwrap_or(u32::MAX)
    });

    let mut out = String::new();
    for name in slide_names {
        let xml = read_zip_entry_bounded(&mut archive, &name, MAX_XML_ENTRY_BYTES)?;
        out.push_str(&slide_shape_text(&xml)?);
    }
    Ok(out)
}

/// Text of every shape (`p:sp`) on a slide, in document order. A shape's
/// paragraphs are joined with `\n`; shapes follow each other directly.
fn slide_shape_text(xml: &[u8]) -> Result<String, ExtractError> {
    let mut out = String::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut paragraphs: Option<Vec<String>> = None;
    let mut in_text = false;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"sp" => paragraphs = Some(Vec::new()),
                b"p" => {
                    if let Some(paras) = paragraphs.as_mut() {
                        paras.push(String::new());
                    }
                }
                b"t" => in_text = paragraphs.is_some(),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"p" => {
                    if let Some(paras) = paragraphs.as_mut() {
                        paras.push(String::new());
                    }
                }
                b"br" => {
                    if let Some(para) = paragraphs.as_mut().and_then(|p| p.last_mut()) {
                        para.push('\n');
                    }
                }
                _ => {}
            },
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"sp" => {
                    if let Some(paras) = paragraphs.take() {
                        out.push_str(&paras.join("\n"));
                    }
                }
                b"t" => in_text = false,
                _ => {}
            },
            Ok(Event::Text(te)) if in_text => {
                let text = te
                    .unescape()
                    .map_err(|e| ExtractError::Ooxml(e.to_string()))?;
                if let Some(para) = paragraphs.as_mut().and_then(|p| p.last_mut()) {
                    para.push_str(&text);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ExtractError::Ooxml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(out)
}
