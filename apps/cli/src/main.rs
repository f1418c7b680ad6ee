//! Curricle CLI: search the encyclopedia for syllabus topics and manage a
//! department's units, topics, and unit-topic links from the terminal.

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
