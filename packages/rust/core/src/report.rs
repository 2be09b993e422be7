//! Human-readable and JSON renderings of run results.

use std::path::Path;

use serde::Serialize;
use tracing::info;

use docaudit_shared::{
    AggregateReport, ChunkVerdict, DocAuditError, Result, Severity, SummaryReport,
};

const RULE_WIDTH: usize = 60;

/// Aggregate findings longer than this are cut in the text report.
const AGGREGATE_PREVIEW_CHARS: usize = 500;

/// Typo findings shown per problematic chunk.
const FINDINGS_PREVIEW_CHARS: usize = 200;

/// Problematic chunks listed in the text report.
const MAX_PROBLEM_CHUNKS: usize = 5;

/// Chunk summaries printed after the final summary.
const MAX_CHUNK_SUMMARIES: usize = 5;

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((byte, _)) => &text[..byte],
        None => text,
    }
}

/// Verdicts gathered by a run that stopped on a failed chunk.
#[derive(Debug, Serialize)]
pub struct PartialReport<'a> {
    pub chunk_verdicts: &'a [ChunkVerdict],
    pub validated: usize,
    pub error: String,
}

impl<'a> PartialReport<'a> {
    pub fn new(chunk_verdicts: &'a [ChunkVerdict], error: impl std::fmt::Display) -> Self {
        Self {
            chunk_verdicts,
            validated: chunk_verdicts.len(),
            error: error.to_string(),
        }
    }
}

/// Lines listing the first few non-clean verdicts.
fn problem_chunk_lines(verdicts: &[ChunkVerdict]) -> Vec<String> {
    let problematic: Vec<_> = verdicts
        .iter()
        .filter(|v| v.severity != Severity::Clean)
        .collect();
    if problematic.is_empty() {
        return Vec::new();
    }

    let mut lines = vec![format!("\nProblematic chunks ({} total):", problematic.len())];
    for (i, verdict) in problematic.iter().take(MAX_PROBLEM_CHUNKS).enumerate() {
        lines.push(format!(
            "\n  [{}] Chunk {} ({})",
            i + 1,
            verdict.chunk_index,
            verdict.source
        ));
        lines.push(format!(
            "      Severity: {}",
            verdict.severity.as_str().to_uppercase()
        ));
        if let Some(findings) = verdict.typo_findings() {
            lines.push("      Typos found:".to_string());
            lines.push(format!(
                "      {}...",
                truncate_chars(findings, FINDINGS_PREVIEW_CHARS)
            ));
        }
    }
    lines
}

/// Render a validation report for the terminal.
pub fn format_report(report: &AggregateReport) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let typo_chunks = report
        .chunk_verdicts
        .iter()
        .filter(|v| v.typo_findings().is_some())
        .count();
    let logic_chunks = report
        .chunk_verdicts
        .iter()
        .filter(|v| v.logic_findings().is_some())
        .count();

    let mut lines = vec![
        rule.clone(),
        "Document Validation Report".to_string(),
        rule.clone(),
        "\nSummary:".to_string(),
        format!("  Total chunks:    {}", report.total),
        format!("  Clean chunks:    {}", report.clean),
        format!("  Warning chunks:  {}", report.warning),
        format!("  Critical chunks: {}", report.critical),
        format!("  Quality score:   {:.2} / 1.00", report.quality_score),
        format!("  Chunks with typos:        {typo_chunks}"),
        format!("  Chunks with logic errors: {logic_chunks}"),
        "\nAggregate findings:".to_string(),
    ];

    let findings = &report.aggregate_findings;
    let shown = truncate_chars(findings, AGGREGATE_PREVIEW_CHARS);
    lines.push(if findings.is_empty() {
        "  (none)".to_string()
    } else if shown.len() < findings.len() {
        format!("{shown}...")
    } else {
        shown.to_string()
    });

    lines.extend(problem_chunk_lines(&report.chunk_verdicts));
    lines.push(format!("\n{rule}"));
    lines.join("\n")
}

/// Render what an aborted run validated before it stopped.
pub fn format_partial(partial: &PartialReport<'_>) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let count = |s: Severity| {
        partial
            .chunk_verdicts
            .iter()
            .filter(|v| v.severity == s)
            .count()
    };

    let mut lines = vec![
        rule.clone(),
        "Document Validation Report (incomplete)".to_string(),
        rule.clone(),
        format!("\nRun aborted: {}", partial.error),
        "\nValidated before the failure:".to_string(),
        format!("  Chunks:          {}", partial.validated),
        format!("  Clean chunks:    {}", count(Severity::Clean)),
        format!("  Warning chunks:  {}", count(Severity::Warning)),
        format!("  Critical chunks: {}", count(Severity::Critical)),
    ];
    lines.extend(problem_chunk_lines(partial.chunk_verdicts));
    lines.push(format!("\n{rule}"));
    lines.join("\n")
}

/// Write `value` as pretty-printed JSON.
pub fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| DocAuditError::Serialization(e.to_string()))?;
    std::fs::write(path, json).map_err(|e| DocAuditError::io(path, e))?;
    info!(path = %path.display(), "report written");
    Ok(())
}

/// Render a summary report: the final summary, then the first few chunk
/// summaries.
pub fn format_summary(report: &SummaryReport) -> String {
    let mut lines = vec![
        "=== Final summary ===".to_string(),
        report.final_summary.clone(),
    ];

    if !report.chunk_summaries.is_empty() {
        lines.push(format!(
            "\n=== Chunk summaries (first {MAX_CHUNK_SUMMARIES}) ==="
        ));
        for item in report.chunk_summaries.iter().take(MAX_CHUNK_SUMMARIES) {
            lines.push(format!(
                "- {} #{}",
                item.metadata.source, item.metadata.chunk_index
            ));
            lines.push(item.summary.clone());
        }
    }
    lines.join("\n")
}
