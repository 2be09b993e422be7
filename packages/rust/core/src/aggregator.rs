//! Folds per-chunk verdicts into a document-level [`AggregateReport`].

use tracing::{info, instrument, warn};

use docaudit_llm::{LanguageModel, render_template};
use docaudit_shared::{AggregateReport, ChunkVerdict, Severity, ValidationConfig};

/// Severity counts and quality score for a set of verdicts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tally {
    pub total: usize,
    pub clean: usize,
    pub warning: usize,
    pub critical: usize,
    pub quality_score: f64,
}

/// Count verdicts per severity. `quality_score` is `clean / total`, or 0.0
/// when there are no verdicts.
pub fn tally(verdicts: &[ChunkVerdict]) -> Tally {
    let count = |s: Severity| verdicts.iter().filter(|v| v.severity == s).count();

    let total = verdicts.len();
    let clean = count(Severity::Clean);
    let quality_score = if total > 0 {
        clean as f64 / total as f64
    } else {
        0.0
    };

    Tally {
        total,
        clean,
        warning: count(Severity::Warning),
        critical: count(Severity::Critical),
        quality_score,
    }
}

/// Build the findings digest fed to the synthesis prompt.
///
/// Only the first `sample_size` verdicts are included to bound prompt size;
/// later verdicts still appear in the structured report.
pub fn synthesis_input(verdicts: &[ChunkVerdict], sample_size: usize) -> String {
    verdicts
        .iter()
        .take(sample_size)
        .map(|v| {
            let typo = v
                .typo_result
                .as_ref()
                .map_or("N/A", |r| r.findings_text.as_str());
            let logic = v
                .logic_result
                .as_ref()
                .map_or("N/A", |r| r.findings_text.as_str());
            format!(
                "Chunk {} ({}):\n  Typo check: {typo}\n  Logic check: {logic}",
                v.chunk_index, v.source
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Produces the aggregate report, including one synthesis call.
pub struct Aggregator<'a, M> {
    model: &'a M,
    config: &'a ValidationConfig,
}

impl<'a, M: LanguageModel> Aggregator<'a, M> {
    pub fn new(model: &'a M, config: &'a ValidationConfig) -> Self {
        Self { model, config }
    }

    /// Aggregate `verdicts` into a report.
    ///
    /// A failed synthesis call leaves `aggregate_findings` empty instead of
    /// discarding the per-chunk results. No call is made for an empty run.
    #[instrument(skip_all, fields(verdicts = verdicts.len()))]
    pub async fn aggregate(&self, verdicts: &[ChunkVerdict]) -> AggregateReport {
        let counts = tally(verdicts);

        let aggregate_findings = if verdicts.is_empty() {
            String::new()
        } else {
            let digest = synthesis_input(verdicts, self.config.aggregate_sample_size);
            let prompt =
                render_template(&self.config.prompts.aggregate, "validation_results", &digest);
            match self.model.complete(&prompt).await {
                Ok(text) => text.trim().to_string(),
                Err(e) => {
                    warn!(error = %e, "aggregate synthesis failed, continuing without it");
                    String::new()
                }
            }
        };

        info!(
            total = counts.total,
            clean = counts.clean,
            warning = counts.warning,
            critical = counts.critical,
            quality_score = counts.quality_score,
            "aggregation complete"
        );

        AggregateReport {
            chunk_verdicts: verdicts.to_vec(),
            total: counts.total,
            clean: counts.clean,
            warning: counts.warning,
            critical: counts.critical,
            quality_score: counts.quality_score,
            aggregate_findings,
        }
    }
}
