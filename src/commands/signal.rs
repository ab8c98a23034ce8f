use anyhow::{Context, Result};
use clap::Args as ClapArgs;
use std::path::PathBuf;

use crate::config::Config;
use crate::models::SignalStatus;
use crate::signals::SignalStore;

#[derive(ClapArgs)]
pub struct Args {
    /// New status: working, waiting, idle or error
    pub status: SignalStatus,

    /// Pane identifier (defaults to $TMUX_PANE)
    #[arg(long)]
    pub pane: Option<String>,

    /// Custom config file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

fn resolve_pane(pane: Option<String>) -> Result<String> {
    pane.or_else(|| std::env::var("TMUX_PANE").ok())
        .filter(|p| !p.trim().is_empty())
        .context("No pane given and TMUX_PANE is not set")
}

pub async fn execute(args: Args) -> Result<()> {
    let config = Config::load(args.config)?;
    let pane_id = resolve_pane(args.pane)?;

    let store = SignalStore::from_config(&config);
    let path = store.write(&pane_id, args.status).await?;
    tracing::debug!("signal {} for {} written to {:?}", args.status, pane_id, path);

    Ok(())
}
