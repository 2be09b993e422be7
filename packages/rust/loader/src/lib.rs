//! Document discovery, text extraction, and chunking.
//!
//! Enumerates the documents in an input directory, extracts their text
//! (PDF via `pdf-extract`, plain text and Markdown read as-is) and splits
//! each document into overlapping [`Chunk`]s ready for validation.

pub mod chunker;

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use docaudit_shared::{Chunk, ChunkMetadata, DocAuditError, Result};

pub use chunker::{ChunkParams, TextChunks, TextSpan, chunk, chunk_text};

/// Separator inserted between the pages of an extracted PDF.
pub const PAGE_BREAK: &str = "\n\n[PAGE_BREAK]\n\n";

// ---------------------------------------------------------------------------
// Document kinds
// ---------------------------------------------------------------------------

/// How a file's text is obtained, decided by its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    PlainText,
}

impl DocumentKind {
    /// Map a file extension (case-insensitive, without the dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "txt" | "md" | "markdown" => Some(Self::PlainText),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Discovery
// ---------------------------------------------------------------------------

/// List the regular files directly inside `dir` whose extension is in
/// `extensions` (case-insensitive), sorted by file name.
pub fn discover_documents(dir: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(DocAuditError::directory(dir));
    }

    let entries = std::fs::read_dir(dir).map_err(|e| DocAuditError::io(dir, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| DocAuditError::io(dir, e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| extensions.iter().any(|want| want.eq_ignore_ascii_case(ext)));
        if matches {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    debug!(dir = %dir.display(), count = files.len(), "documents discovered");
    Ok(files)
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Extract the full text of a document.
///
/// PDF pages are joined with [`PAGE_BREAK`].
pub fn extract_text(path: &Path) -> Result<String> {
    let kind = path
        .extension()
        .and_then(|e| e.to_str())
        .and_then(DocumentKind::from_extension)
        .ok_or_else(|| DocAuditError::extraction(path, "unsupported file type"))?;

    match kind {
        DocumentKind::Pdf => {
            let bytes = std::fs::read(path).map_err(|e| DocAuditError::io(path, e))?;
            let pages = pdf_extract::extract_text_from_mem_by_pages(&bytes)
                .map_err(|e| DocAuditError::extraction(path, e.to_string()))?;
            Ok(pages.join(PAGE_BREAK))
        }
        DocumentKind::PlainText => {
            std::fs::read_to_string(path).map_err(|e| DocAuditError::io(path, e))
        }
    }
}

// ---------------------------------------------------------------------------
// Chunking into records
// ---------------------------------------------------------------------------

/// Chunk one document's text into [`Chunk`] records tagged with `source`.
pub fn chunk_document(source: &str, text: &str, params: ChunkParams) -> Vec<Chunk> {
    chunk(text, params)
        .enumerate()
        .map(|(chunk_index, span)| Chunk {
            text: span.text.to_string(),
            metadata: ChunkMetadata {
                source: source.to_string(),
                chunk_index,
                start: span.start,
                end: span.end,
            },
        })
        .collect()
}

/// Load every matching document in `dir` and chunk it.
///
/// Documents whose extracted text is blank, or whose extraction fails, are
/// skipped with a log line. `chunk_index` restarts at 0 for each document.
#[instrument(skip_all, fields(dir = %dir.display()))]
pub fn load_and_chunk(dir: &Path, params: ChunkParams, extensions: &[String]) -> Result<Vec<Chunk>> {
    let files = discover_documents(dir, extensions)?;

    let mut chunks = Vec::new();
    for path in &files {
        let source = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let text = match extract_text(path) {
            Ok(text) => text,
            Err(e) => {
                warn!(source = %source, error = %e, "extraction failed, skipping document");
                continue;
            }
        };

        if text.trim().is_empty() {
            debug!(source = %source, "no extractable text, skipping document");
            continue;
        }

        let doc_chunks = chunk_document(&source, &text, params);
        debug!(source = %source, chunks = doc_chunks.len(), "document chunked");
        chunks.extend(doc_chunks);
    }

    info!(
        documents = files.len(),
        chunks = chunks.len(),
        "documents loaded and chunked"
    );

    Ok(chunks)
}
