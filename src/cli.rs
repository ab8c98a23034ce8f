use clap::{Parser, Subcommand};

use crate::commands::{complete, dashboard, hosts, signal, signals};

#[derive(Parser)]
#[command(name = "yeehaw")]
#[command(about = "Yeehaw - Track development sessions across local and remote hosts")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Launch the environment dashboard
    Dashboard(dashboard::Args),

    /// Probe configured hosts and show which run the managed session
    Hosts(hosts::Args),

    /// Print directory completions for a local or remote partial path
    Complete(complete::Args),

    /// Record the activity status of a pane (for assistant hooks)
    Signal(signal::Args),

    /// List panes of the local session with their current signal
    Signals(signals::Args),
}

impl Commands {
    /// The dashboard owns the terminal, so its logs go to a file.
    pub fn logs_to_file(&self) -> bool {
        matches!(self, Commands::Dashboard(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SignalStatus;

    #[test]
    fn parses_complete_with_host() {
        let cli = Cli::try_parse_from(["yeehaw", "complete", "~/pro", "--host", "devbox"]).unwrap();
        match cli.command {
            Commands::Complete(args) => {
                assert_eq!(args.partial, "~/pro");
                assert_eq!(args.host.as_deref(), Some("devbox"));
            }
            _ => panic!("expected complete command"),
        }
    }

    #[test]
    fn parses_signal_status_case_insensitively() {
        let cli = Cli::try_parse_from(["yeehaw", "signal", "Working", "--pane", "%3"]).unwrap();
        match cli.command {
            Commands::Signal(args) => {
                assert_eq!(args.status, SignalStatus::Working);
                assert_eq!(args.pane.as_deref(), Some("%3"));
            }
            _ => panic!("expected signal command"),
        }
    }

    #[test]
    fn rejects_unknown_signal_status() {
        assert!(Cli::try_parse_from(["yeehaw", "signal", "sleeping"]).is_err());
    }

    #[test]
    fn only_dashboard_logs_to_file() {
        let cli = Cli::try_parse_from(["yeehaw", "dashboard"]).unwrap();
        assert!(cli.command.logs_to_file());

        let cli = Cli::try_parse_from(["yeehaw", "signals", "--sweep"]).unwrap();
        assert!(!cli.command.logs_to_file());
    }
}
