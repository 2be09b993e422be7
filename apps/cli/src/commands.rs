//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use docaudit_core::{
    PartialReport, Summarizer, ValidationProgress, ValidationRun, ValidationWorkflow,
    format_partial, format_report, format_summary, validate_direct, write_json,
};
use docaudit_llm::OpenRouterClient;
use docaudit_loader::{ChunkParams, load_and_chunk};
use docaudit_shared::{
    AppConfig, ChunkVerdict, DocAuditError, RunMode, ValidationConfig, init_config, load_config,
    validate_api_key,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// docaudit: find typos and logical errors in documents with an LLM.
#[derive(Parser)]
#[command(
    name = "docaudit",
    version,
    about = "Validate documents for typos and logical errors, or summarize them, using an LLM.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Validation entry point.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub(crate) enum ModeArg {
    /// One sequential call over all chunks.
    Simple,
    /// Step-wise state machine.
    Graph,
}

impl From<ModeArg> for RunMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Simple => RunMode::Simple,
            ModeArg::Graph => RunMode::Graph,
        }
    }
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Validate every document in a directory for typos and logical errors.
    Validate {
        /// Directory containing the documents.
        dir: PathBuf,

        /// Chunk size in characters (defaults to config, then 1000).
        #[arg(long, allow_negative_numbers = true)]
        chunk_size: Option<i64>,

        /// Overlap between consecutive chunks in characters (defaults to config, then 300).
        #[arg(long, allow_negative_numbers = true)]
        overlap: Option<i64>,

        /// Validation mode: simple or graph.
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,

        /// Write the full report as JSON to this file.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Summarize every document in a directory.
    Summarize {
        /// Directory containing the documents.
        dir: PathBuf,

        /// Chunk size in characters.
        #[arg(long, allow_negative_numbers = true)]
        chunk_size: Option<i64>,

        /// Overlap between consecutive chunks in characters.
        #[arg(long, allow_negative_numbers = true)]
        overlap: Option<i64>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "docaudit=info",
        1 => "docaudit=debug",
        _ => "docaudit=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Validate {
            dir,
            chunk_size,
            overlap,
            mode,
            output,
        } => cmd_validate(&dir, chunk_size, overlap, mode, output.as_deref()).await,
        Command::Summarize {
            dir,
            chunk_size,
            overlap,
        } => cmd_summarize(&dir, chunk_size, overlap).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

/// Resolve chunking parameters: CLI flags override the config file.
fn chunk_params(config: &AppConfig, chunk_size: Option<i64>, overlap: Option<i64>) -> Result<ChunkParams> {
    let params = ChunkParams::new(
        chunk_size.unwrap_or(config.defaults.chunk_size),
        overlap.unwrap_or(config.defaults.overlap),
    )?;
    Ok(params)
}

/// Build the model client from config and the API key environment variable.
fn model_client(config: &AppConfig) -> Result<OpenRouterClient> {
    let api_key = validate_api_key(config)?;
    let client = OpenRouterClient::new(&config.llm, api_key)?;
    Ok(client)
}

async fn cmd_validate(
    dir: &Path,
    chunk_size: Option<i64>,
    overlap: Option<i64>,
    mode: Option<ModeArg>,
    output: Option<&Path>,
) -> Result<()> {
    let config = load_config()?;
    let params = chunk_params(&config, chunk_size, overlap)?;
    let mode = mode.map(RunMode::from).unwrap_or(config.defaults.mode);

    if !dir.is_dir() {
        eprintln!("Error: {} is not a valid directory", dir.display());
        return Ok(());
    }

    let client = model_client(&config)?;

    info!(
        dir = %dir.display(),
        chunk_size = params.chunk_size(),
        overlap = params.overlap(),
        ?mode,
        model = client.model(),
        "validating documents"
    );

    let chunks = load_and_chunk(dir, params, &config.defaults.extensions)?;
    if chunks.is_empty() {
        warn!("no text found in the matching documents");
    }

    let validation_config = ValidationConfig::from(&config);
    let progress = CliProgress::new();

    let run = match mode {
        RunMode::Simple => validate_direct(&client, &validation_config, &chunks, &progress).await,
        RunMode::Graph => {
            ValidationWorkflow::new(&client, &validation_config, chunks)
                .with_progress(&progress)
                .run()
                .await
        }
    };
    progress.finish();

    report_run(run, output)
}

/// Print a run's report and write it to `output` when given.
///
/// An aborted run still prints and saves the verdicts it gathered, together
/// with the failure, before the failure is returned.
fn report_run(run: ValidationRun, output: Option<&Path>) -> Result<()> {
    let ValidationRun {
        verdicts,
        report,
        error,
        ..
    } = run;

    let Some(report) = report else {
        let error = error.unwrap_or(DocAuditError::Unfinished {
            validated: verdicts.len(),
        });
        let partial = PartialReport::new(&verdicts, &error);
        println!("{}", format_partial(&partial));

        if let Some(path) = output {
            write_json(&partial, path)?;
            println!("\nPartial results saved to: {}", path.display());
        }

        return Err(eyre!(
            "validation aborted after {} chunk(s): {error}",
            verdicts.len()
        ));
    };

    println!("{}", format_report(&report));

    if let Some(path) = output {
        write_json(&report, path)?;
        println!("\nResults saved to: {}", path.display());
    }

    Ok(())
}

async fn cmd_summarize(dir: &Path, chunk_size: Option<i64>, overlap: Option<i64>) -> Result<()> {
    let config = load_config()?;
    let params = chunk_params(&config, chunk_size, overlap)?;

    if !dir.is_dir() {
        eprintln!("Error: {} is not a valid directory", dir.display());
        return Ok(());
    }

    let client = model_client(&config)?;
    let chunks = load_and_chunk(dir, params, &config.defaults.extensions)?;

    info!(dir = %dir.display(), chunks = chunks.len(), "summarizing documents");

    let progress = CliProgress::new();
    progress.phase(&format!("Summarizing {} chunks", chunks.len()));
    let result = Summarizer::new(&client, &config.prompts)
        .summarize_chunks(&chunks)
        .await;
    progress.finish();

    println!("{}", format_summary(&result?));
    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            spinner.set_style(
                style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
            );
        }
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }

    fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl ValidationProgress for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn chunk_validated(&self, verdict: &ChunkVerdict, current: usize, total: usize) {
        self.spinner.set_message(format!(
            "Validated [{current}/{total}] {} #{} ({})",
            verdict.source, verdict.chunk_index, verdict.severity
        ));
    }
}

#[cfg(test)]
mod tests {
    use docaudit_core::SilentValidationProgress;
    use docaudit_llm::ScriptedModel;
    use docaudit_shared::{Chunk, ChunkMetadata};

    use super::*;

    #[test]
    fn validate_flags_parse() {
        let cli = Cli::try_parse_from([
            "docaudit",
            "validate",
            "docs",
            "--chunk-size",
            "500",
            "--overlap",
            "100",
            "--mode",
            "graph",
            "--output",
            "out.json",
            "-v",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 1);
        match cli.command {
            Command::Validate {
                dir,
                chunk_size,
                overlap,
                mode,
                output,
            } => {
                assert_eq!(dir, PathBuf::from("docs"));
                assert_eq!(chunk_size, Some(500));
                assert_eq!(overlap, Some(100));
                assert!(matches!(mode, Some(ModeArg::Graph)));
                assert_eq!(output, Some(PathBuf::from("out.json")));
            }
            _ => panic!("expected validate"),
        }
    }

    #[test]
    fn negative_overlap_reaches_parameter_check() {
        let cli = Cli::try_parse_from(["docaudit", "validate", "docs", "--overlap", "-1"]).unwrap();
        let Command::Validate { chunk_size, overlap, .. } = cli.command else {
            panic!("expected validate");
        };
        assert!(chunk_params(&AppConfig::default(), chunk_size, overlap).is_err());
    }

    fn chunks(texts: &[&str]) -> Vec<Chunk> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| Chunk {
                text: t.to_string(),
                metadata: ChunkMetadata {
                    source: "a.txt".into(),
                    chunk_index: i,
                    start: 0,
                    end: t.chars().count(),
                },
            })
            .collect()
    }

    #[tokio::test]
    async fn aborted_run_still_saves_validated_chunks() {
        let model = ScriptedModel::new("no errors found. no logical errors found.")
            .fail_when("SECOND", "HTTP 500 Internal Server Error");
        let config = ValidationConfig::default();
        let run = ValidationWorkflow::new(&model, &config, chunks(&["FIRST", "SECOND", "THIRD"]))
            .run()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        let err = report_run(run, Some(&path)).unwrap_err();

        assert!(err.to_string().contains("aborted after 1 chunk(s)"));
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["validated"], 1);
        assert_eq!(value["chunk_verdicts"][0]["chunk_index"], 0);
        assert_eq!(value["chunk_verdicts"][0]["severity"], "clean");
        assert!(value["error"].as_str().unwrap().contains("HTTP 500"));
    }

    #[tokio::test]
    async fn completed_run_writes_full_report() {
        let model = ScriptedModel::new("no errors found. no logical errors found.");
        let config = ValidationConfig::default();
        let run = validate_direct(
            &model,
            &config,
            &chunks(&["fine", "also fine"]),
            &SilentValidationProgress,
        )
        .await;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        report_run(run, Some(&path)).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["total"], 2);
        assert_eq!(value["quality_score"], 1.0);
    }

    #[test]
    fn flags_override_config_defaults() {
        let params = chunk_params(&AppConfig::default(), Some(2000), None).unwrap();
        assert_eq!(params.chunk_size(), 2000);
        assert_eq!(params.overlap(), 300);
    }
}
