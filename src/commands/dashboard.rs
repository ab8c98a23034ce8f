use anyhow::Result;
use clap::Args as ClapArgs;
use std::path::PathBuf;

use crate::config::Config;
use crate::dashboard::DashboardApp;

#[derive(ClapArgs)]
pub struct Args {
    /// Custom config file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

pub async fn execute(args: Args) -> Result<()> {
    let config = Config::load(args.config.clone())?;

    let mut app = DashboardApp::new(config, args.config);
    app.run().await?;

    Ok(())
}
