//! Application configuration for docaudit.
//!
//! User config lives at `~/.docaudit/docaudit.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DocAuditError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "docaudit.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".docaudit";

// ---------------------------------------------------------------------------
// Default prompt templates
// ---------------------------------------------------------------------------

/// Negative sentinel the typo prompt asks the model to emit.
pub const DEFAULT_TYPO_SENTINEL: &str = "no errors found";

/// Negative sentinel the logic prompt asks the model to emit.
pub const DEFAULT_LOGIC_SENTINEL: &str = "no logical errors found";

pub const DEFAULT_TYPO_PROMPT: &str = "Read the following text carefully and find every typo and grammatical error.

Requirements:
1. Point out each error clearly and say where it occurs (e.g. \"'recieve' in the 3rd sentence should be 'receive'\")
2. Classify each error (typo, grammar, spacing, ...)
3. Suggest a correction for each error
4. If there are no errors, state exactly \"no errors found\"

Text:
{text}

Result:
";

pub const DEFAULT_LOGIC_PROMPT: &str = "Read the following text and decide whether it contains logical errors or consistency problems.

Requirements:
1. Find contradictory statements or unnatural logical flow
2. Check for subject/predicate mismatches and unclear references
3. Explain why each logical error is a problem
4. Suggest an improvement for each
5. If there are no logical errors, state exactly \"no logical errors found\"

Text:
{text}

Logic review:
";

pub const DEFAULT_AGGREGATE_PROMPT: &str = "Below are validation results collected from several chunks of one document. Summarize the main errors and patterns across the whole document.

Requirements:
1. Identify recurring error patterns (e.g. the same word misspelled repeatedly)
2. Summarize logical consistency problems across the document
3. List the items to fix first, in priority order
4. Summarize the problems per section

Chunk results:
{validation_results}

Overall analysis:
";

pub const DEFAULT_SUMMARY_PROMPT: &str = "Read the following text and summarize it concisely in 3 to 6 lines covering only the key points.

Text:
{text}

Summary:
";

pub const DEFAULT_SUMMARY_AGGREGATE_PROMPT: &str = "The following are summaries of several pieces of one document. Write a single combined summary of the whole document.
- Use 5 to 10 sentences covering the key conclusions and important details.
- Remove duplication and connect the points logically.

Summaries:
{summaries}

Combined summary:
";

// ---------------------------------------------------------------------------
// Config structs (matching docaudit.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Language model endpoint settings.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Which checks run and how verdicts are graded.
    #[serde(default)]
    pub checks: ChecksConfig,

    /// Prompt templates and their sentinels.
    #[serde(default)]
    pub prompts: PromptsConfig,
}

/// How the validation workflow is driven.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// One straight sequential call.
    #[default]
    Simple,
    /// Step-wise state machine.
    Graph,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Chunk size in characters.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: i64,

    /// Overlap between consecutive chunks in characters.
    #[serde(default = "default_overlap")]
    pub overlap: i64,

    /// Workflow mode.
    #[serde(default)]
    pub mode: RunMode,

    /// File extensions picked up from the input directory.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            overlap: default_overlap(),
            mode: RunMode::default(),
            extensions: default_extensions(),
        }
    }
}

fn default_chunk_size() -> i64 {
    1000
}
fn default_overlap() -> i64 {
    300
}
fn default_extensions() -> Vec<String> {
    vec!["pdf".into()]
}

/// `[llm]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL of an OpenAI-compatible API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Model identifier sent with every request.
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature.
    #[serde(default)]
    pub temperature: f32,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            model: default_model(),
            temperature: 0.0,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "https://openrouter.ai/api/v1".into()
}
fn default_api_key_env() -> String {
    "OPENROUTER_API_KEY".into()
}
fn default_model() -> String {
    "openai/gpt-4".into()
}
fn default_timeout_secs() -> u64 {
    120
}

/// `[checks]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecksConfig {
    /// Run the typo/grammar check.
    #[serde(default = "default_true")]
    pub typos: bool,

    /// Run the logic/consistency check.
    #[serde(default = "default_true")]
    pub logic: bool,

    /// A chunk is critical when its typo finding count exceeds this.
    #[serde(default = "default_typo_threshold")]
    pub typo_critical_threshold: usize,

    /// A chunk is critical when its logic finding count exceeds this.
    #[serde(default = "default_logic_threshold")]
    pub logic_critical_threshold: usize,

    /// Number of leading verdicts fed to the aggregate synthesis prompt.
    #[serde(default = "default_aggregate_sample_size")]
    pub aggregate_sample_size: usize,
}

impl Default for ChecksConfig {
    fn default() -> Self {
        Self {
            typos: true,
            logic: true,
            typo_critical_threshold: default_typo_threshold(),
            logic_critical_threshold: default_logic_threshold(),
            aggregate_sample_size: default_aggregate_sample_size(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_typo_threshold() -> usize {
    5
}
fn default_logic_threshold() -> usize {
    3
}
fn default_aggregate_sample_size() -> usize {
    10
}

/// `[prompts]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptsConfig {
    /// Typo check template; `{text}` is replaced with the chunk text.
    #[serde(default = "default_typo_prompt")]
    pub typo: String,

    /// Phrase in a typo response that means "nothing found".
    #[serde(default = "default_typo_sentinel")]
    pub typo_sentinel: String,

    /// Logic check template; `{text}` is replaced with the chunk text.
    #[serde(default = "default_logic_prompt")]
    pub logic: String,

    /// Phrase in a logic response that means "nothing found".
    #[serde(default = "default_logic_sentinel")]
    pub logic_sentinel: String,

    /// Aggregate synthesis template; `{validation_results}` is substituted.
    #[serde(default = "default_aggregate_prompt")]
    pub aggregate: String,

    /// Per-chunk summary template; `{text}` is substituted.
    #[serde(default = "default_summary_prompt")]
    pub summary: String,

    /// Final summary template; `{summaries}` is substituted.
    #[serde(default = "default_summary_aggregate_prompt")]
    pub summary_aggregate: String,
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self {
            typo: default_typo_prompt(),
            typo_sentinel: default_typo_sentinel(),
            logic: default_logic_prompt(),
            logic_sentinel: default_logic_sentinel(),
            aggregate: default_aggregate_prompt(),
            summary: default_summary_prompt(),
            summary_aggregate: default_summary_aggregate_prompt(),
        }
    }
}

fn default_typo_prompt() -> String {
    DEFAULT_TYPO_PROMPT.into()
}
fn default_typo_sentinel() -> String {
    DEFAULT_TYPO_SENTINEL.into()
}
fn default_logic_prompt() -> String {
    DEFAULT_LOGIC_PROMPT.into()
}
fn default_logic_sentinel() -> String {
    DEFAULT_LOGIC_SENTINEL.into()
}
fn default_aggregate_prompt() -> String {
    DEFAULT_AGGREGATE_PROMPT.into()
}
fn default_summary_prompt() -> String {
    DEFAULT_SUMMARY_PROMPT.into()
}
fn default_summary_aggregate_prompt() -> String {
    DEFAULT_SUMMARY_AGGREGATE_PROMPT.into()
}

// ---------------------------------------------------------------------------
// Validation config (runtime, derived from the app config)
// ---------------------------------------------------------------------------

/// Runtime configuration handed to the validation workflow at construction.
#[derive(Debug, Clone)]
pub struct ValidationConfig {
    /// Run the typo check.
    pub check_typos: bool,
    /// Run the logic check.
    pub check_logic: bool,
    pub typo_critical_threshold: usize,
    pub logic_critical_threshold: usize,
    /// Leading verdicts included in the aggregate synthesis prompt.
    pub aggregate_sample_size: usize,
    pub prompts: PromptsConfig,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for ValidationConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            check_typos: config.checks.typos,
            check_logic: config.checks.logic,
            typo_critical_threshold: config.checks.typo_critical_threshold,
            logic_critical_threshold: config.checks.logic_critical_threshold,
            aggregate_sample_size: config.checks.aggregate_sample_size,
            prompts: config.prompts.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.docaudit/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| DocAuditError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.docaudit/docaudit.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| DocAuditError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| DocAuditError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| DocAuditError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| DocAuditError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| DocAuditError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Check that the API key env var is set and non-empty, returning its value.
pub fn validate_api_key(config: &AppConfig) -> Result<String> {
    let var_name = &config.llm.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(DocAuditError::config(format!(
            "API key not found. Set the {var_name} environment variable."
        ))),
    }
}
