//! docaudit CLI: LLM-assisted typo and logic validation for documents.
//!
//! Loads the documents in a directory, splits them into overlapping chunks
//! and checks each chunk with a language model, then prints a
//! document-level report.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
