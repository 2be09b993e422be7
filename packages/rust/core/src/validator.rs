//! Per-chunk typo and logic validation.
//!
//! Each chunk gets two independent classification calls. The free-text
//! responses are interpreted with a sentinel heuristic and graded into a
//! [`ChunkVerdict`].

use tracing::{debug, instrument};

use docaudit_llm::{LanguageModel, render_template};
use docaudit_shared::{
    Chunk, ChunkVerdict, DocAuditError, FindingResult, Result, Severity, ValidationConfig,
};

/// Interpret a classifier response.
///
/// This is a best-effort heuristic: `has_findings` is simply
/// `!response.contains(sentinel)`, an exact, case-sensitive substring test
/// against free text. A model that rephrases the sentinel ("No errors were
/// found") is read as reporting findings. `finding_count` is the number of
/// newline boundaries in the trimmed response and only approximates the
/// number of errors.
pub fn interpret_response(response: &str, sentinel: &str) -> FindingResult {
    let findings_text = response.trim().to_string();
    let has_findings = !findings_text.contains(sentinel);
    let finding_count = if has_findings {
        findings_text.matches('\n').count()
    } else {
        0
    };

    FindingResult {
        has_findings,
        findings_text,
        finding_count,
    }
}

/// Grade a chunk from its check results.
///
/// Returns `(is_valid, severity)`. A chunk is valid when no check that ran
/// has findings; it is critical when the typo count exceeds
/// `typo_threshold` or the logic count exceeds `logic_threshold`.
pub fn classify(
    typo: Option<&FindingResult>,
    logic: Option<&FindingResult>,
    typo_threshold: usize,
    logic_threshold: usize,
) -> (bool, Severity) {
    let has_typos = typo.is_some_and(|r| r.has_findings);
    let has_logic = logic.is_some_and(|r| r.has_findings);
    let is_valid = !has_typos && !has_logic;

    let severity = if is_valid {
        Severity::Clean
    } else if typo.is_some_and(|r| r.finding_count > typo_threshold)
        || logic.is_some_and(|r| r.finding_count > logic_threshold)
    {
        Severity::Critical
    } else {
        Severity::Warning
    };

    (is_valid, severity)
}

/// Runs the model-backed checks for a single chunk.
pub struct ChunkValidator<'a, M> {
    model: &'a M,
    config: &'a ValidationConfig,
}

impl<'a, M: LanguageModel> ChunkValidator<'a, M> {
    pub fn new(model: &'a M, config: &'a ValidationConfig) -> Self {
        Self { model, config }
    }

    /// Validate one chunk.
    ///
    /// Any model failure is reported as [`DocAuditError::Validation`]
    /// carrying the chunk's index and source.
    #[instrument(skip_all, fields(source = %chunk.metadata.source, chunk = chunk.metadata.chunk_index))]
    pub async fn validate_chunk(&self, chunk: &Chunk) -> Result<ChunkVerdict> {
        let prompts = &self.config.prompts;

        let typo_result = if self.config.check_typos {
            Some(
                self.run_check(chunk, &prompts.typo, &prompts.typo_sentinel)
                    .await?,
            )
        } else {
            None
        };

        let logic_result = if self.config.check_logic {
            Some(
                self.run_check(chunk, &prompts.logic, &prompts.logic_sentinel)
                    .await?,
            )
        } else {
            None
        };

        let (is_valid, severity) = classify(
            typo_result.as_ref(),
            logic_result.as_ref(),
            self.config.typo_critical_threshold,
            self.config.logic_critical_threshold,
        );

        debug!(%severity, is_valid, "chunk validated");

        Ok(ChunkVerdict {
            chunk_index: chunk.metadata.chunk_index,
            source: chunk.metadata.source.clone(),
            text_preview: chunk.preview(),
            typo_result,
            logic_result,
            is_valid,
            severity,
        })
    }

    async fn run_check(&self, chunk: &Chunk, template: &str, sentinel: &str) -> Result<FindingResult> {
        let prompt = render_template(template, "text", &chunk.text);
        let response = self.model.complete(&prompt).await.map_err(|e| {
            DocAuditError::validation(
                chunk.metadata.chunk_index,
                chunk.metadata.source.clone(),
                e.to_string(),
            )
        })?;
        Ok(interpret_response(&response, sentinel))
    }
}

#[cfg(test)]
mod tests {
    use docaudit_llm::ScriptedModel;
    use docaudit_shared::ChunkMetadata;

    use super::*;

    const TYPO_MARKER: &str = "typo and grammatical error";
    const LOGIC_MARKER: &str = "logical errors or consistency";

    fn chunk(text: &str) -> Chunk {
        Chunk {
            text: text.into(),
            metadata: ChunkMetadata {
                source: "memo.pdf".into(),
                chunk_index: 4,
                start: 0,
                end: text.chars().count(),
            },
        }
    }

    fn result(count: usize) -> FindingResult {
        FindingResult {
            has_findings: true,
            findings_text: "x".into(),
            finding_count: count,
        }
    }

    fn clean() -> FindingResult {
        FindingResult {
            has_findings: false,
            findings_text: "no errors found".into(),
            finding_count: 0,
        }
    }

    #[test]
    fn sentinel_marks_no_findings() {
        let r = interpret_response("  no errors found\n", "no errors found");
        assert!(!r.has_findings);
        assert_eq!(r.finding_count, 0);
        assert_eq!(r.findings_text, "no errors found");
    }

    #[test]
    fn missing_sentinel_counts_newlines() {
        let r = interpret_response("1. teh -> the\n2. recieve -> receive\n", "no errors found");
        assert!(r.has_findings);
        assert_eq!(r.finding_count, 1);
    }

    #[test]
    fn sentinel_match_is_best_effort() {
        // Rephrased or capitalized sentinels are not recognized.
        let r = interpret_response("No errors found.", "no errors found");
        assert!(r.has_findings);
    }

    #[test]
    fn many_typos_is_critical() {
        let (valid, severity) = classify(Some(&result(6)), Some(&clean()), 5, 3);
        assert!(!valid);
        assert_eq!(severity, Severity::Critical);
    }

    #[test]
    fn many_logic_errors_is_critical() {
        let (_, severity) = classify(Some(&clean()), Some(&result(4)), 5, 3);
        assert_eq!(severity, Severity::Critical);
    }

    #[test]
    fn counts_at_threshold_are_warnings() {
        let (_, severity) = classify(Some(&result(5)), Some(&result(3)), 5, 3);
        assert_eq!(severity, Severity::Warning);
    }

    #[test]
    fn single_typo_is_warning() {
        let (valid, severity) = classify(Some(&result(1)), None, 5, 3);
        assert!(!valid);
        assert_eq!(severity, Severity::Warning);
    }

    #[test]
    fn clean_iff_valid() {
        let cases = [
            (None, None),
            (Some(clean()), Some(clean())),
            (Some(result(0)), None),
            (None, Some(result(9))),
            (Some(result(2)), Some(clean())),
        ];
        for (typo, logic) in &cases {
            let (valid, severity) = classify(typo.as_ref(), logic.as_ref(), 5, 3);
            assert_eq!(valid, severity == Severity::Clean);
        }
    }

    #[tokio::test]
    async fn one_typo_no_logic_errors_is_warning() {
        let model = ScriptedModel::new("unexpected")
            .respond_when(TYPO_MARKER, "1. 'has a typo' should be rewritten\n")
            .respond_when(LOGIC_MARKER, "no logical errors found");
        let config = ValidationConfig::default();
        let validator = ChunkValidator::new(&model, &config);

        let verdict = validator
            .validate_chunk(&chunk("Sentence one has a typo. Sentence two is fine."))
            .await
            .unwrap();

        let typo = verdict.typo_result.as_ref().unwrap();
        let logic = verdict.logic_result.as_ref().unwrap();
        assert!(typo.has_findings);
        assert!(!logic.has_findings);
        assert!(!verdict.is_valid);
        assert_eq!(verdict.severity, Severity::Warning);
        assert_eq!(verdict.chunk_index, 4);
        assert_eq!(verdict.source, "memo.pdf");
        assert_eq!(model.call_count(), 2);
    }

    #[tokio::test]
    async fn chunk_text_is_substituted_into_prompts() {
        let model = ScriptedModel::new("no errors found, no logical errors found");
        let config = ValidationConfig::default();
        let validator = ChunkValidator::new(&model, &config);

        validator.validate_chunk(&chunk("UNIQUE-BODY")).await.unwrap();

        let prompts = model.prompts();
        assert_eq!(prompts.len(), 2);
        assert!(prompts.iter().all(|p| p.contains("UNIQUE-BODY")));
        assert!(prompts.iter().all(|p| !p.contains("{text}")));
    }

    #[tokio::test]
    async fn disabled_check_is_absent() {
        let model = ScriptedModel::new("no errors found");
        let config = ValidationConfig {
            check_logic: false,
            ..ValidationConfig::default()
        };
        let validator = ChunkValidator::new(&model, &config);

        let verdict = validator.validate_chunk(&chunk("fine")).await.unwrap();
        assert!(verdict.logic_result.is_none());
        assert!(verdict.is_valid);
        assert_eq!(verdict.severity, Severity::Clean);
        assert_eq!(model.call_count(), 1);
    }

    #[tokio::test]
    async fn model_failure_becomes_validation_error() {
        let model = ScriptedModel::new("no errors found").fail_when(LOGIC_MARKER, "timeout");
        let config = ValidationConfig::default();
        let validator = ChunkValidator::new(&model, &config);

        let err = validator.validate_chunk(&chunk("text")).await.unwrap_err();
        match err {
            DocAuditError::Validation {
                chunk_index,
                source_name,
                reason,
            } => {
                assert_eq!(chunk_index, 4);
                assert_eq!(source_name, "memo.pdf");
                assert!(reason.contains("timeout"));
            }
            other => panic!("expected Validation, got {other:?}"),
        }
    }
}
