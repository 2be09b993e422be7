//! Validation and summarization workflows for docaudit.
//!
//! Ties the language model to chunked document text: per-chunk checks
//! ([`validator`]), document-level aggregation ([`aggregator`]), the
//! validation state machine ([`workflow`]), summarization
//! ([`summarizer`]) and report rendering ([`report`]).

pub mod aggregator;
pub mod report;
pub mod summarizer;
pub mod validator;
pub mod workflow;

pub use aggregator::{Aggregator, Tally, synthesis_input, tally};
pub use report::{PartialReport, format_partial, format_report, format_summary, write_json};
pub use summarizer::Summarizer;
pub use validator::{ChunkValidator, classify, interpret_response};
pub use workflow::{
    CategorizedFinding, Route, SilentValidationProgress, ValidationProgress, ValidationRun,
    ValidationWorkflow, WorkflowState, route, validate_direct,
};
