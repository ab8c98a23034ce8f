use anyhow::Result;
use clap::Args as ClapArgs;
use std::path::PathBuf;

use crate::config::Config;
use crate::models::HostDescriptor;
use crate::remote::PollingCoordinator;
use crate::utils::truncate_str;

#[derive(ClapArgs)]
pub struct Args {
    /// Custom config file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

fn target_column(host: &HostDescriptor) -> String {
    if host.is_local() {
        return "-".to_string();
    }
    match host.ssh_target() {
        Some(target) => target.identity(),
        None => "(incomplete)".to_string(),
    }
}

pub async fn execute(args: Args) -> Result<()> {
    let config = Config::load(args.config)?;

    if config.hosts.is_empty() {
        println!("No hosts configured.");
        return Ok(());
    }

    if config.eligible_hosts().next().is_none() {
        eprintln!("No host has complete SSH settings; nothing to probe.");
    }

    let mut coordinator = PollingCoordinator::from_config(&config);
    if coordinator.force_refresh() {
        coordinator.wait().await;
    }

    println!("{:<16} {:<36} {}", "NAME", "TARGET", "STATE");
    println!("{}", "-".repeat(64));

    for host in coordinator.hosts() {
        let state = coordinator.state(&host.name);
        println!(
            "{:<16} {:<36} {} {}",
            truncate_str(&host.name, 16),
            truncate_str(&target_column(host), 36),
            state.symbol(),
            state
        );
    }

    let environments: Vec<&str> = coordinator
        .environments()
        .iter()
        .map(|h| h.name.as_str())
        .collect();

    println!();
    if environments.is_empty() {
        println!("No environments running {}.", config.session_name);
    } else {
        println!("Environments: {}", environments.join(", "));
    }

    Ok(())
}
