//! Shared types, error model, and configuration for docaudit.
//!
//! This crate is the foundation depended on by all other docaudit crates:
//! the unified [`DocAuditError`], the domain types ([`Chunk`],
//! [`ChunkVerdict`], [`AggregateReport`], ...) and configuration loading.

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, ChecksConfig, DefaultsConfig, LlmConfig, PromptsConfig, RunMode, ValidationConfig,
    config_dir, config_file_path, init_config, load_config, load_config_from, validate_api_key,
};
pub use error::{DocAuditError, Result};
pub use types::{
    AggregateReport, Chunk, ChunkMetadata, ChunkSummary, ChunkVerdict, FindingResult, Severity,
    SummaryReport, TEXT_PREVIEW_CHARS,
};
