mod cli;
mod config;
mod logger;
mod matcher;
mod output;
mod resolver;
mod rewrite;
mod walker;

use anyhow::{Result, bail};
use clap::Parser;

use cli::Cli;
use config::RunConfig;
use output::print_summary;
use rewrite::rewrite_tree;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::init_logger(cli.verbose, cli.quiet);

    let config = RunConfig::from_cli(&cli)?;
    let stats = rewrite_tree(&config).await?;

    if cli.json || !cli.quiet {
        print_summary(&stats, cli.json);
    }

    if stats.strict_failures > 0 {
        bail!(
            "{} unresolved specifier(s); affected files were left unchanged",
            stats.strict_failures
        );
    }

    Ok(())
}
