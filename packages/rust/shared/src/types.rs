//! Core domain types for docaudit validation runs.

use serde::{Deserialize, Serialize};

/// Number of characters kept in a verdict's text preview.
pub const TEXT_PREVIEW_CHARS: usize = 100;

// ---------------------------------------------------------------------------
// Chunk
// ---------------------------------------------------------------------------

/// Provenance and position of a chunk within its source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Source file name.
    pub source: String,
    /// Position of the chunk within its document, starting at 0.
    pub chunk_index: usize,
    /// Start character offset (inclusive).
    pub start: usize,
    /// End character offset (exclusive).
    pub end: usize,
}

/// A bounded substring of a source document plus its metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub metadata: ChunkMetadata,
}

impl Chunk {
    /// Preview of the chunk text: the first 100 characters, with `...`
    /// appended when the text is longer.
    pub fn preview(&self) -> String {
        if self.text.chars().count() > TEXT_PREVIEW_CHARS {
            let head: String = self.text.chars().take(TEXT_PREVIEW_CHARS).collect();
            format!("{head}...")
        } else {
            self.text.clone()
        }
    }
}

// ---------------------------------------------------------------------------
// Verdicts
// ---------------------------------------------------------------------------

/// Interpreted outcome of one classification call (typo or logic check).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindingResult {
    /// False only when the response contains the negative sentinel.
    pub has_findings: bool,
    /// Full (trimmed) model response.
    pub findings_text: String,
    /// Approximate number of findings; 0 when `has_findings` is false.
    pub finding_count: usize,
}

/// Coarse triage label for a validated chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Clean,
    Warning,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Clean => "clean",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured validation outcome for a single chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkVerdict {
    pub chunk_index: usize,
    pub source: String,
    pub text_preview: String,
    /// Absent when the typo check was disabled.
    pub typo_result: Option<FindingResult>,
    /// Absent when the logic check was disabled.
    pub logic_result: Option<FindingResult>,
    pub is_valid: bool,
    pub severity: Severity,
}

impl ChunkVerdict {
    /// Findings text of the typo check, if it ran and found something.
    pub fn typo_findings(&self) -> Option<&str> {
        self.typo_result
            .as_ref()
            .filter(|r| r.has_findings)
            .map(|r| r.findings_text.as_str())
    }

    /// Findings text of the logic check, if it ran and found something.
    pub fn logic_findings(&self) -> Option<&str> {
        self.logic_result
            .as_ref()
            .filter(|r| r.has_findings)
            .map(|r| r.findings_text.as_str())
    }
}

// ---------------------------------------------------------------------------
// AggregateReport
// ---------------------------------------------------------------------------

/// Document-level result of a complete validation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateReport {
    pub chunk_verdicts: Vec<ChunkVerdict>,
    pub total: usize,
    pub clean: usize,
    pub warning: usize,
    pub critical: usize,
    /// `clean / total`, or 0.0 for an empty run.
    pub quality_score: f64,
    /// Free-text synthesis of cross-chunk error patterns.
    pub aggregate_findings: String,
}

// ---------------------------------------------------------------------------
// Summaries
// ---------------------------------------------------------------------------

/// Model-written summary of one chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkSummary {
    pub summary: String,
    pub metadata: ChunkMetadata,
}

/// Two-stage summary of a set of chunks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryReport {
    pub chunk_summaries: Vec<ChunkSummary>,
    pub final_summary: String,
}
