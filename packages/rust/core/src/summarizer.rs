//! Two-stage document summarization: one summary per chunk, then one
//! combined summary over all of them.

use tracing::{debug, info, instrument};

use docaudit_llm::{LanguageModel, render_template};
use docaudit_shared::{Chunk, ChunkSummary, PromptsConfig, Result, SummaryReport};

/// Summarizes chunks with a language model.
pub struct Summarizer<'a, M> {
    model: &'a M,
    prompts: &'a PromptsConfig,
}

impl<'a, M: LanguageModel> Summarizer<'a, M> {
    pub fn new(model: &'a M, prompts: &'a PromptsConfig) -> Self {
        Self { model, prompts }
    }

    /// Summarize every chunk, then merge the summaries.
    ///
    /// The first model failure is returned as-is; summaries are not kept
    /// for a partially summarized document.
    #[instrument(skip_all, fields(chunks = chunks.len()))]
    pub async fn summarize_chunks(&self, chunks: &[Chunk]) -> Result<SummaryReport> {
        let mut chunk_summaries = Vec::with_capacity(chunks.len());

        for chunk in chunks {
            let prompt = render_template(&self.prompts.summary, "text", &chunk.text);
            let summary = self.model.complete(&prompt).await?;
            debug!(
                source = %chunk.metadata.source,
                chunk = chunk.metadata.chunk_index,
                "chunk summarized"
            );
            chunk_summaries.push(ChunkSummary {
                summary: summary.trim().to_string(),
                metadata: chunk.metadata.clone(),
            });
        }

        let joined = chunk_summaries
            .iter()
            .map(|s| format!("- {}", s.summary))
            .collect::<Vec<_>>()
            .join("\n\n");
        let prompt = render_template(&self.prompts.summary_aggregate, "summaries", &joined);
        let final_summary = self.model.complete(&prompt).await?.trim().to_string();

        info!(summaries = chunk_summaries.len(), "summarization complete");

        Ok(SummaryReport {
            chunk_summaries,
            final_summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use docaudit_llm::ScriptedModel;
    use docaudit_shared::{ChunkMetadata, DocAuditError};

    use super::*;

    fn chunk(index: usize, text: &str) -> Chunk {
        Chunk {
            text: text.into(),
            metadata: ChunkMetadata {
                source: "minutes.pdf".into(),
                chunk_index: index,
                start: 0,
                end: text.chars().count(),
            },
        }
    }

    #[tokio::test]
    async fn summarizes_each_chunk_then_merges() {
        let model = ScriptedModel::new("unexpected")
            .respond_when("combined summary", "  The committee approved the budget.  ")
            .respond_when("FIRST", "budget discussed")
            .respond_when("SECOND", "vote held");
        let prompts = PromptsConfig::default();

        let report = Summarizer::new(&model, &prompts)
            .summarize_chunks(&[chunk(0, "FIRST part"), chunk(1, "SECOND part")])
            .await
            .unwrap();

        assert_eq!(report.chunk_summaries.len(), 2);
        assert_eq!(report.chunk_summaries[0].summary, "budget discussed");
        assert_eq!(report.chunk_summaries[1].metadata.chunk_index, 1);
        assert_eq!(report.final_summary, "The committee approved the budget.");

        let sent = model.prompts();
        assert_eq!(sent.len(), 3);
        assert!(sent[2].contains("- budget discussed\n\n- vote held"));
    }

    #[tokio::test]
    async fn model_failure_propagates() {
        let model = ScriptedModel::new("ok").fail_when("BROKEN", "upstream 502");
        let prompts = PromptsConfig::default();

        let err = Summarizer::new(&model, &prompts)
            .summarize_chunks(&[chunk(0, "BROKEN")])
            .await
            .unwrap_err();

        assert!(matches!(err, DocAuditError::Model(_)));
        assert_eq!(model.call_count(), 1);
    }
}
