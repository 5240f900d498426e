use anyhow::{Context, Result};
use clap::Parser;
use junit_triage::cli::Cli;
use junit_triage::pipeline;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let root = std::env::current_dir().context("failed to determine working directory")?;

    pipeline::triage(&root, &cli.patterns()).await?;

    Ok(())
}
