//! Turning study documents into one plain-text corpus.
//!
//! HTML documents lose their `<head>`, `<script>` and `<style>` elements and
//! every tag; common entities are decoded. All documents get their
//! whitespace collapsed. Documents are joined with [`CORPUS_SEPARATOR`].

use std::path::{Path, PathBuf};

use futures::future::try_join_all;

use crate::error::IngestionError;

/// Marks the boundary between two documents in a corpus.
pub const CORPUS_SEPARATOR: &str = "\n\n--- NEXT FILE ---\n\n";

const DROPPED_ELEMENTS: [&str; 3] = ["head", "script", "style"];

const ENTITIES: [(&str, &str); 7] = [
    ("&nbsp;", " "),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
    ("&apos;", "'"),
    // Last, so "&amp;lt;" stays "&lt;"
    ("&amp;", "&"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Html,
    Text,
}

impl DocumentKind {
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("html" | "htm") => DocumentKind::Html,
            _ => DocumentKind::Text,
        }
    }
}

/// Collapse every whitespace run to a single space and trim.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Visible text of an HTML document.
pub fn strip_html(html: &str) -> String {
    let mut text = html.to_string();
    for tag in DROPPED_ELEMENTS {
        text = remove_element(&text, tag);
    }

    let mut plain = String::with_capacity(text.len());
    let mut in_tag = false;
    for c in text.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                plain.push(' ');
            }
            _ if !in_tag => plain.push(c),
            _ => {}
        }
    }

    let decoded = ENTITIES
        .iter()
        .fold(plain, |acc, (entity, replacement)| acc.replace(entity, replacement));
    collapse_whitespace(&decoded)
}

/// Remove `<tag ...>...</tag>` blocks, matching the tag name case-insensitively.
fn remove_element(html: &str, tag: &str) -> String {
    // ASCII lowercasing keeps byte offsets aligned with `html`
    let lower = html.to_ascii_lowercase();
    let open = format!("<{tag}");
    let close = format!("</{tag}>");

    let mut out = String::with_capacity(html.len());
    let mut copied = 0;
    let mut search = 0;
    while let Some(found) = lower[search..].find(&open) {
        let start = search + found;
        let next = lower.as_bytes().get(start + open.len()).copied();
        if !matches!(next, Some(b'>' | b'/' | b' ' | b'\t' | b'\n' | b'\r')) {
            // "<header" is not "<head"
            search = start + open.len();
            continue;
        }
        out.push_str(&html[copied..start]);
        copied = match lower[start..].find(&close) {
            Some(end) => start + end + close.len(),
            None => html.len(),
        };
        search = copied;
    }
    out.push_str(&html[copied..]);
    out
}

pub fn extract_text(raw: &str, kind: DocumentKind) -> String {
    match kind {
        DocumentKind::Html => strip_html(raw),
        DocumentKind::Text => collapse_whitespace(raw),
    }
}

/// Join extracted documents in order.
pub fn join_documents<S: AsRef<str>>(documents: &[S]) -> String {
    documents
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(CORPUS_SEPARATOR)
}

async fn read_document(path: &Path) -> Result<String, IngestionError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| IngestionError::Io {
            path: path.display().to_string(),
            source,
        })?;
    let text = extract_text(&String::from_utf8_lossy(&bytes), DocumentKind::from_path(path));
    if text.is_empty() {
        return Err(IngestionError::Empty(path.display().to_string()));
    }
    tracing::debug!(path = %path.display(), chars = text.chars().count(), "document ingested");
    Ok(text)
}

/// Read every document concurrently and build the corpus.
///
/// Any unreadable or empty document fails the whole ingestion.
pub async fn ingest_files(paths: &[PathBuf]) -> Result<String, IngestionError> {
    if paths.is_empty() {
        return Err(IngestionError::NoDocuments);
    }
    let documents = try_join_all(paths.iter().map(|p| read_document(p))).await?;
    let corpus = join_documents(&documents);
    tracing::info!(
        documents = documents.len(),
        chars = corpus.chars().count(),
        "corpus ready"
    );
    Ok(corpus)
}
