use anyhow::{Context, Result};
use clap::Args as ClapArgs;
use std::path::PathBuf;

use crate::completion::{resolve_tab, Completion, CompletionCache, CompletionFetcher};
use crate::config::Config;

#[derive(ClapArgs)]
pub struct Args {
    /// Partial path to complete
    pub partial: String,

    /// Configured host to complete on (defaults to the local filesystem)
    #[arg(long)]
    pub host: Option<String>,

    /// Custom config file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

pub async fn execute(args: Args) -> Result<()> {
    let config = Config::load(args.config)?;

    let host = match &args.host {
        Some(name) => Some(
            config
                .get_host(name)
                .with_context(|| format!("Host '{}' is not configured", name))?
                .clone(),
        ),
        None => None,
    };

    let (mut fetcher, _updates) = CompletionFetcher::from_config(&config, CompletionCache::new());

    let candidates = match host.as_ref() {
        Some(host) if !host.is_local() => {
            if !host.is_ssh_eligible() {
                eprintln!("Host '{}' is missing SSH settings.", host.name);
            }
            fetcher.complete_remote_now(&args.partial, host).await
        }
        _ => match fetcher.complete(&args.partial, None) {
            Completion::Ready(candidates) => candidates,
            Completion::Pending => Vec::new(),
        },
    };

    if candidates.is_empty() {
        println!("No completions.");
        return Ok(());
    }

    for candidate in &candidates {
        println!("{}", candidate);
    }

    if let Some(input) = resolve_tab(&args.partial, &candidates).input() {
        println!("\n-> {}", input);
    }

    Ok(())
}
