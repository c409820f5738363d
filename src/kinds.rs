//! Declared file types.
//!
//! A file's type is the tag it was registered with (normally its extension),
//! not anything sniffed from its bytes. [`DocumentKind`] decides which
//! extractor handles it; [`ViewerKind`] tells a launcher what kind of
//! program should open it.

use std::fmt;

/// Plain-text, source and markup tags, read verbatim.
pub const PLAIN_TEXT_TYPES: &[&str] = &[
    "txt", "py", "c", "cpp", "java", "html", "css", "js", "php", "sql", "xml", "json", "md",
];

const TEXT_EDITOR_TYPES: &[&str] = &[
    "txt", "py", "c", "cpp", "java", "html", "css", "js", "php", "sql", "xml", "json",
];

const SYSTEM_DEFAULT_TYPES: &[&str] = &[
    "jpg", "png", "bmp", "gif", "jpeg", "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx",
];

/// The extraction format for a declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    /// `doc` or `docx`.
    Word,
    /// `ppt` or `pptx`.
    Presentation,
    /// Text read as-is; holds the normalized tag.
    PlainText(String),
    /// Any tag outside the supported set.
    Unsupported(String),
}

impl DocumentKind {
    /// Classify a declared type tag. Case and a leading `.` are ignored.
    pub fn from_declared(tag: &str) -> Self {
        let tag = normalize(tag);
        match tag.as_str() {
            "pdf" => DocumentKind::Pdf,
            "doc" | "docx" => DocumentKind::Word,
            "ppt" | "pptx" => DocumentKind::Presentation,
            t if PLAIN_TEXT_TYPES.contains(&t) => DocumentKind::PlainText(tag),
            _ => DocumentKind::Unsupported(tag),
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, DocumentKind::Unsupported(_))
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKind::Pdf => write!(f, "pdf"),
            DocumentKind::Word => write!(f, "word document"),
            DocumentKind::Presentation => write!(f, "presentation"),
            DocumentKind::PlainText(t) => write!(f, "text ({})", t),
            DocumentKind::Unsupported(t) => write!(f, "unsupported ({})", t),
        }
    }
}

/// How a file of a given type should be opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerKind {
    TextEditor,
    SystemDefault,
    Unknown,
}

impl fmt::Display for ViewerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ViewerKind::TextEditor => "text editor",
            ViewerKind::SystemDefault => "system default",
            ViewerKind::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

pub fn viewer_for(tag: &str) -> ViewerKind {
    let tag = normalize(tag);
    if TEXT_EDITOR_TYPES.contains(&tag.as_str()) {
        ViewerKind::TextEditor
    } else if SYSTEM_DEFAULT_TYPES.contains(&tag.as_str()) {
        ViewerKind::SystemDefault
    } else {
        ViewerKind::Unknown
    }
}

/// The declared type of a path: everything after its last `.`, or the
/// empty string when the file name has no extension.
pub fn declared_type_of(path: &std::path::Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn normalize(tag: &str) -> String {
    tag.trim().trim_start_matches('.').to_ascii_lowercase()
}
