use anyhow::Result;
use clap::Args as ClapArgs;
use std::path::PathBuf;

use crate::config::Config;
use crate::session::TmuxClient;
use crate::signals::SignalStore;
use crate::utils::truncate_str;

#[derive(ClapArgs)]
pub struct Args {
    /// Delete expired and unparsable signal files first
    #[arg(long)]
    pub sweep: bool,

    /// Custom config file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

pub async fn execute(args: Args) -> Result<()> {
    let config = Config::load(args.config)?;
    let store = SignalStore::from_config(&config);

    if args.sweep {
        let removed = store.sweep().await?;
        println!("Swept {} signal file(s) from {}", removed, store.dir().display());
    }

    let tmux = TmuxClient::from_config(&config);
    if !tmux.session_exists().await {
        println!("Session {} is not running.", tmux.session_name());
        return Ok(());
    }

    let panes = tmux.list_panes().await;
    if panes.is_empty() {
        println!("No panes in session {}.", tmux.session_name());
        return Ok(());
    }

    println!("{:<8} {:<40} {}", "PANE", "LABEL", "SIGNAL");
    println!("{}", "-".repeat(64));

    for pane in panes {
        let signal = match store.read(&pane.pane_id).await {
            Some(record) => format!("{} {}", record.status.symbol(), record.status),
            None => "-".to_string(),
        };
        println!(
            "{:<8} {:<40} {}",
            pane.pane_id,
            truncate_str(&pane.label(), 40),
            signal
        );
    }

    Ok(())
}
