mod catalog;
mod cli;
mod commands;
mod export;
mod filter;
mod loader;
mod model;
mod normalize;
mod session;
mod trends;
mod util;
mod value;
mod window;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::Workspace;

fn main() {
    init_tracing();

    if let Err(err) = run() {
        error!(error = %err, "command failed");
        for cause in err.chain().skip(1) {
            error!(cause = %cause, "caused by");
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let command = match cli.command {
        Commands::Cell(args) => return commands::cell::run(args),
        command => command,
    };

    let workspace = Workspace::open(&cli.data_root, cli.catalog.as_deref())?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    runtime.block_on(dispatch(&workspace, command))
}

async fn dispatch(workspace: &Workspace, command: Commands) -> Result<()> {
    match command {
        Commands::Table(args) => commands::table::run(workspace, args).await,
        Commands::Export(args) => commands::export::run(workspace, args).await,
        Commands::Trends(args) => commands::trends::run(workspace, args).await,
        Commands::Catalog(args) => commands::catalog::run(workspace, args),
        Commands::Cell(args) => commands::cell::run(args),
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
