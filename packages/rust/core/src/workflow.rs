//! Validation workflow driver.
//!
//! Sequences every chunk through the [`ChunkValidator`] and then the
//! [`Aggregator`]. Two entry points share the same stages:
//!
//! - [`ValidationWorkflow`] is a step-wise state machine; each
//!   [`step`](ValidationWorkflow::step) performs exactly one transition and
//!   the run can be inspected between steps.
//! - [`validate_direct`] runs the stages as one sequential call.
//!
//! Chunks are validated strictly one after another. A validator failure
//! aborts the run: no further chunks are processed, and the verdicts
//! gathered so far are returned alongside the error.

use serde::Serialize;
use tracing::{debug, error, info, instrument};

use docaudit_llm::LanguageModel;
use docaudit_shared::{AggregateReport, Chunk, ChunkVerdict, DocAuditError, Result, ValidationConfig};

use crate::aggregator::Aggregator;
use crate::validator::ChunkValidator;

// ---------------------------------------------------------------------------
// States and routing
// ---------------------------------------------------------------------------

/// Lifecycle of a validation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    Initializing,
    Validating,
    Aggregating,
    Done,
    Errored,
}

impl WorkflowState {
    /// `Done` and `Errored` absorb every further step.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Errored)
    }
}

/// Where the run goes after the validating state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    ValidateChunk,
    Aggregate,
}

/// Continue-or-finish decision for the validating state.
pub fn route(index: usize, chunk_count: usize) -> Route {
    if index >= chunk_count {
        Route::Aggregate
    } else {
        Route::ValidateChunk
    }
}

// ---------------------------------------------------------------------------
// Run results
// ---------------------------------------------------------------------------

/// A typo or logic finding recorded against the chunk it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorizedFinding {
    pub chunk_index: usize,
    pub source: String,
    pub findings: String,
}

/// Everything a run produced, complete or not.
#[derive(Debug)]
pub struct ValidationRun {
    /// Verdicts gathered before the run ended (all of them when completed).
    pub verdicts: Vec<ChunkVerdict>,
    /// Chunks whose typo check reported findings.
    pub typo_errors: Vec<CategorizedFinding>,
    /// Chunks whose logic check reported findings.
    pub logic_errors: Vec<CategorizedFinding>,
    /// Present when the run reached `Done`.
    pub report: Option<AggregateReport>,
    /// Present when the run reached `Errored`.
    pub error: Option<DocAuditError>,
}

impl ValidationRun {
    pub fn is_complete(&self) -> bool {
        self.report.is_some()
    }

    /// The report of a completed run, or the error that stopped it.
    pub fn into_result(self) -> Result<AggregateReport> {
        match (self.report, self.error) {
            (Some(report), _) => Ok(report),
            (None, Some(err)) => Err(err),
            (None, None) => Err(DocAuditError::Unfinished {
                validated: self.verdicts.len(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Progress trait
// ---------------------------------------------------------------------------

/// Progress callback for validation runs.
pub trait ValidationProgress: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each chunk's verdict is recorded.
    fn chunk_validated(&self, verdict: &ChunkVerdict, current: usize, total: usize);
}

/// No-op validation progress.
pub struct SilentValidationProgress;

impl ValidationProgress for SilentValidationProgress {
    fn phase(&self, _name: &str) {}
    fn chunk_validated(&self, _verdict: &ChunkVerdict, _current: usize, _total: usize) {}
}

/// Push a verdict's findings onto the running side-lists.
fn categorize(
    verdict: &ChunkVerdict,
    typo_errors: &mut Vec<CategorizedFinding>,
    logic_errors: &mut Vec<CategorizedFinding>,
) {
    if let Some(findings) = verdict.typo_findings() {
        typo_errors.push(CategorizedFinding {
            chunk_index: verdict.chunk_index,
            source: verdict.source.clone(),
            findings: findings.to_string(),
        });
    }
    if let Some(findings) = verdict.logic_findings() {
        logic_errors.push(CategorizedFinding {
            chunk_index: verdict.chunk_index,
            source: verdict.source.clone(),
            findings: findings.to_string(),
        });
    }
}

// ---------------------------------------------------------------------------
// Step-wise driver
// ---------------------------------------------------------------------------

/// Step-wise validation state machine over a fixed list of chunks.
pub struct ValidationWorkflow<'a, M> {
    model: &'a M,
    config: &'a ValidationConfig,
    progress: &'a dyn ValidationProgress,
    chunks: Vec<Chunk>,
    state: WorkflowState,
    index: usize,
    verdicts: Vec<ChunkVerdict>,
    typo_errors: Vec<CategorizedFinding>,
    logic_errors: Vec<CategorizedFinding>,
    report: Option<AggregateReport>,
    error: Option<DocAuditError>,
}

impl<'a, M: LanguageModel> ValidationWorkflow<'a, M> {
    /// Create a workflow in the `Initializing` state.
    pub fn new(model: &'a M, config: &'a ValidationConfig, chunks: Vec<Chunk>) -> Self {
        Self {
            model,
            config,
            progress: &SilentValidationProgress,
            chunks,
            state: WorkflowState::Initializing,
            index: 0,
            verdicts: Vec::new(),
            typo_errors: Vec::new(),
            logic_errors: Vec::new(),
            report: None,
            error: None,
        }
    }

    /// Report progress to `progress` instead of discarding it.
    pub fn with_progress(mut self, progress: &'a dyn ValidationProgress) -> Self {
        self.progress = progress;
        self
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    /// Index of the next chunk to validate.
    pub fn current_index(&self) -> usize {
        self.index
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn verdicts(&self) -> &[ChunkVerdict] {
        &self.verdicts
    }

    /// The failure that moved the run to `Errored`, if any.
    pub fn last_error(&self) -> Option<&DocAuditError> {
        self.error.as_ref()
    }

    /// Perform one transition and return the new state.
    pub async fn step(&mut self) -> WorkflowState {
        match self.state {
            WorkflowState::Initializing => {
                self.index = 0;
                self.verdicts.clear();
                self.typo_errors.clear();
                self.logic_errors.clear();
                self.report = None;
                self.error = None;
                self.progress
                    .phase(&format!("Starting validation of {} chunks", self.chunks.len()));
                self.state = WorkflowState::Validating;
            }
            WorkflowState::Validating => match route(self.index, self.chunks.len()) {
                Route::Aggregate => self.state = WorkflowState::Aggregating,
                Route::ValidateChunk => self.validate_current().await,
            },
            WorkflowState::Aggregating => {
                self.progress.phase("Aggregating findings");
                let aggregator = Aggregator::new(self.model, self.config);
                self.report = Some(aggregator.aggregate(&self.verdicts).await);
                self.state = WorkflowState::Done;
            }
            WorkflowState::Done | WorkflowState::Errored => {}
        }

        debug!(state = ?self.state, index = self.index, "workflow step");
        self.state
    }

    /// Validate the chunk at the running index and record the outcome.
    async fn validate_current(&mut self) {
        let total = self.chunks.len();
        let validator = ChunkValidator::new(self.model, self.config);

        match validator.validate_chunk(&self.chunks[self.index]).await {
            Ok(verdict) => {
                categorize(&verdict, &mut self.typo_errors, &mut self.logic_errors);
                self.index += 1;
                self.progress.chunk_validated(&verdict, self.index, total);
                self.verdicts.push(verdict);

                if route(self.index, total) == Route::Aggregate {
                    self.state = WorkflowState::Aggregating;
                }
            }
            Err(e) => {
                error!(index = self.index, error = %e, "chunk validation failed, aborting run");
                self.error = Some(e);
                self.state = WorkflowState::Errored;
            }
        }
    }

    /// Step until a terminal state is reached.
    #[instrument(skip_all, fields(chunks = self.chunks.len()))]
    pub async fn run(mut self) -> ValidationRun {
        while !self.state.is_terminal() {
            self.step().await;
        }

        info!(
            state = ?self.state,
            validated = self.verdicts.len(),
            typo_chunks = self.typo_errors.len(),
            logic_chunks = self.logic_errors.len(),
            "validation workflow finished"
        );

        self.into_run()
    }

    /// Consume the workflow, keeping whatever it has produced so far.
    pub fn into_run(self) -> ValidationRun {
        ValidationRun {
            verdicts: self.verdicts,
            typo_errors: self.typo_errors,
            logic_errors: self.logic_errors,
            report: self.report,
            error: self.error,
        }
    }
}

// ---------------------------------------------------------------------------
// Direct entry point
// ---------------------------------------------------------------------------

/// Validate every chunk, then aggregate, as one sequential call.
#[instrument(skip_all, fields(chunks = chunks.len()))]
pub async fn validate_direct<M: LanguageModel>(
    model: &M,
    config: &ValidationConfig,
    chunks: &[Chunk],
    progress: &dyn ValidationProgress,
) -> ValidationRun {
    let validator = ChunkValidator::new(model, config);
    let total = chunks.len();

    let mut run = ValidationRun {
        verdicts: Vec::with_capacity(total),
        typo_errors: Vec::new(),
        logic_errors: Vec::new(),
        report: None,
        error: None,
    };

    progress.phase(&format!("Starting validation of {total} chunks"));
    for chunk in chunks {
        match validator.validate_chunk(chunk).await {
            Ok(verdict) => {
                categorize(&verdict, &mut run.typo_errors, &mut run.logic_errors);
                progress.chunk_validated(&verdict, run.verdicts.len() + 1, total);
                run.verdicts.push(verdict);
            }
            Err(e) => {
                error!(index = run.verdicts.len(), error = %e, "chunk validation failed, aborting run");
                run.error = Some(e);
                return run;
            }
        }
    }

    progress.phase("Aggregating findings");
    run.report = Some(Aggregator::new(model, config).aggregate(&run.verdicts).await);

    info!(validated = run.verdicts.len(), "direct validation finished");
    run
}
