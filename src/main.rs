use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod completion;
mod config;
mod dashboard;
mod models;
mod remote;
mod session;
mod signals;
mod utils;

use cli::{Cli, Commands};

fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("yeehaw")
        .join("logs")
}

/// Installs the global subscriber. The returned guard must outlive the
/// program so buffered file logs are flushed.
fn init_tracing(to_file: bool) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if to_file {
        let appender = tracing_appender::rolling::daily(log_dir(), "yeehaw.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(writer)
            .with_ansi(false)
            .init();
        Some(guard)
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
        None
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = init_tracing(cli.command.logs_to_file());

    match cli.command {
        Commands::Dashboard(args) => commands::dashboard::execute(args).await,
        Commands::Hosts(args) => commands::hosts::execute(args).await,
        Commands::Complete(args) => commands::complete::execute(args).await,
        Commands::Signal(args) => commands::signal::execute(args).await,
        Commands::Signals(args) => commands::signals::execute(args).await,
    }
}
